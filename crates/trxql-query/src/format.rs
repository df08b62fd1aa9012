//! Plain-text table for terminal output.

use trxql_common::ResultSet;

pub const MAX_COLUMN_WIDTH: usize = 50;
pub const NULL_TEXT: &str = "NULL";
const ELLIPSIS: &str = "...";

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_COLUMN_WIDTH {
        return value.to_string();
    }
    let kept: String = value.chars().take(MAX_COLUMN_WIDTH - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

/// Render `result` as an aligned table followed by a `(N rows)` footer.
pub fn format_table(result: &ResultSet) -> String {
    if result.columns.is_empty() {
        return "Query executed successfully. No columns returned.".to_string();
    }

    let header: Vec<String> = result.columns.iter().map(|c| truncate(c)).collect();
    let body: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| truncate(cell.as_deref().unwrap_or(NULL_TEXT)))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render(&header));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|&w| "-".repeat(w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &body {
        out.push_str(&render(row));
        out.push('\n');
    }

    let n = result.row_count();
    out.push_str(&format!("({n} row{})", if n == 1 { "" } else { "s" }));
    out
}
