//! Argument parsing and the single-shot query flow.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use trxql_query::{format_table, QueryPipeline};

#[derive(Debug, Parser)]
#[command(name = "trxql", version, about = "Ask questions about the transaction table in plain language")]
pub struct Args {
    /// Request text; words are joined with spaces. Prompted for when omitted.
    pub prompt: Vec<String>,

    /// Append a natural-language analysis of the result.
    #[arg(long, conflicts_with = "sql_only")]
    pub analyze: bool,

    /// Print the generated SQL without running it.
    #[arg(long)]
    pub sql_only: bool,

    /// Path to trxql.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Joined positional words, `None` when there are none.
    pub fn prompt_text(&self) -> Option<String> {
        let text = self.prompt.join(" ");
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SqlOnly,
    Run { analyze: bool },
}

impl From<&Args> for Mode {
    fn from(args: &Args) -> Self {
        if args.sql_only {
            Mode::SqlOnly
        } else {
            Mode::Run { analyze: args.analyze }
        }
    }
}

/// Run one request, writing results to `out` and failures to `err`.
/// Returns the process exit code.
pub async fn execute(
    pipeline: &QueryPipeline,
    prompt: &str,
    mode: Mode,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<i32> {
    let result = match mode {
        Mode::SqlOnly => pipeline.generate_sql(prompt).await.map(|sql| {
            writeln!(out, "{sql}")
        }),
        Mode::Run { analyze } => pipeline.run(prompt, analyze).await.map(|outcome| {
            writeln!(out, "{}", format_table(&outcome.result))?;
            if let Some(analysis) = outcome.analysis {
                writeln!(out, "\nAnalysis:\n{analysis}")?;
            }
            Ok(())
        }),
    };

    match result {
        Ok(written) => {
            written?;
            Ok(0)
        }
        Err(e) => {
            writeln!(err, "Error: {e}")?;
            if let Some(sql) = e.sql() {
                writeln!(err, "Query: {sql}")?;
            }
            Ok(1)
        }
    }
}
