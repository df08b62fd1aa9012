//! Keyword heuristic deciding whether free text plausibly asks for a query
//! over the `transaction` table.

use trxql_common::TRANSACTION_COLUMNS;

/// Inputs shorter than this (in characters, after trimming) are rejected.
pub const MIN_INPUT_CHARS: usize = 5;

/// SQL vocabulary and domain terms.
const SQL_KEYWORDS: &[&str] = &[
    "sql", "query", "select", "where", "from", "join", "group by", "order by",
    "top", "retrieve", "get", "find", "show", "list", "count", "sum", "avg",
    "max", "min", "merchant", "revenue", "transaction", "sales", "table",
    "column", "filter", "sort", "aggregate", "trx", "amount", "date", "card",
    "issuer", "acquirer", "mcc", "wallet", "currency", "city", "timestamp",
];

/// Short nouns that count as a schema reference on top of the column names.
const SCHEMA_NOUNS: &[&str] = &[
    "transaction", "merchant", "card", "amount", "currency", "mcc", "wallet",
];

/// Phrases typical of chit-chat or unrelated requests.
const OFF_TOPIC_PATTERNS: &[&str] = &[
    "hello", "hi", "how are you", "what can you do", "tell me about",
    "explain yourself", "who are you", "what is", "define", "help me with",
    "write a poem", "joke", "story", "code in", "python", "javascript",
];

/// Outcome of the relevance check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relevance {
    Accepted,
    /// Fewer than [`MIN_INPUT_CHARS`] characters.
    TooShort,
    /// Matches an off-topic phrase and has no domain term at all.
    OffTopic,
    /// Neither a SQL keyword nor a schema reference.
    NoDomainReference,
}

impl Relevance {
    pub fn is_accepted(self) -> bool {
        self == Relevance::Accepted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Relevance::Accepted          => "accepted",
            Relevance::TooShort          => "too_short",
            Relevance::OffTopic          => "off_topic",
            Relevance::NoDomainReference => "no_domain_reference",
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn has_schema_reference(text: &str) -> bool {
    contains_any(text, &TRANSACTION_COLUMNS) || contains_any(text, SCHEMA_NOUNS)
}

/// Classify raw user input.
pub fn check_relevance(input: &str) -> Relevance {
    let text = input.trim().to_lowercase();

    if text.chars().count() < MIN_INPUT_CHARS {
        return Relevance::TooShort;
    }

    let has_sql_keyword = contains_any(&text, SQL_KEYWORDS);
    let has_schema_ref = has_schema_reference(&text);

    // A schema reference overrides off-topic phrasing: "hi, list pos_entry_mode values".
    if contains_any(&text, OFF_TOPIC_PATTERNS) && !has_sql_keyword && !has_schema_ref {
        return Relevance::OffTopic;
    }

    if has_sql_keyword || has_schema_ref {
        Relevance::Accepted
    } else {
        Relevance::NoDomainReference
    }
}

/// Convenience wrapper over [`check_relevance`].
pub fn is_relevant(input: &str) -> bool {
    check_relevance(input).is_accepted()
}
