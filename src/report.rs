//! Result aggregation and message formatting.
//!
//! Sorts scan results by the predicate's ranking key, truncates to the
//! configured top-K, and renders either a monospace table or an
//! itemized list with flow icons. An empty result set renders a
//! distinct "no qualifying instrument" message, never an empty table.

use chrono::NaiveDate;

use crate::types::{ScanResult, SortOrder};

/// Rank and truncate: sort by `rank_key` in the given order, keep top-K.
/// NaN ranking keys sort last regardless of order.
pub fn rank(mut results: Vec<ScanResult>, order: SortOrder, top_k: usize) -> Vec<ScanResult> {
    use std::cmp::Ordering;
    results.sort_by(|a, b| match (a.rank_key.is_nan(), b.rank_key.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => {
            let cmp = a.rank_key.partial_cmp(&b.rank_key).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => cmp,
                SortOrder::Descending => cmp.reverse(),
            }
        }
    });
    results.truncate(top_k);
    results
}

/// Shared report header: date plus the predicate's human title.
fn header(date: NaiveDate, label: &str) -> String {
    format!("📅 {} {}", date.format("%Y-%m-%d"), label)
}

/// The message posted when nothing qualified.
pub fn format_empty(date: NaiveDate, label: &str) -> String {
    format!("{}\n오늘은 조건에 맞는 종목이 없습니다.", header(date, label))
}

/// Monospace table: one row per result, the listed metrics as columns.
pub fn format_table(
    date: NaiveDate,
    label: &str,
    results: &[ScanResult],
    columns: &[&str],
) -> String {
    if results.is_empty() {
        return format_empty(date, label);
    }

    let name_width = results
        .iter()
        .map(|r| r.instrument.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut lines = Vec::new();
    lines.push(header(date, label));
    lines.push("```".to_string());

    let head: Vec<String> = std::iter::once(format!("{:<name_width$}", "종목"))
        .chain(columns.iter().map(|c| format!("{c:>12}")))
        .collect();
    lines.push(head.join(" "));

    for r in results {
        let mut cells = vec![format!("{:<name_width$}", r.instrument.name)];
        for col in columns {
            let cell = match r.metric(col) {
                Some(v) => format!("{v:>12.2}"),
                None => format!("{:>12}", "-"),
            };
            cells.push(cell);
        }
        lines.push(cells.join(" "));
    }

    lines.push("```".to_string());
    lines.join("\n")
}

/// Itemized list: one line per result with a flow icon and the ranking
/// metric, e.g. for the pullback scan.
pub fn format_itemized(date: NaiveDate, label: &str, results: &[ScanResult]) -> String {
    if results.is_empty() {
        return format_empty(date, label);
    }

    let mut lines = Vec::new();
    lines.push(header(date, label));
    for (i, r) in results.iter().enumerate() {
        let icon = r.flow.map(|f| f.icon()).unwrap_or("▫️");
        let mut line = format!(
            "{}. {} {} ({}) — {:.2}",
            i + 1,
            icon,
            r.instrument.name,
            r.instrument.code,
            r.rank_key,
        );
        if let Some(f) = r.flow {
            line.push_str(&format!(
                " [기관 {:+.0}백만, 외국인 {:+.0}백만]",
                f.institutional / 1_000_000.0,
                f.foreign / 1_000_000.0,
            ));
        }
        lines.push(line);
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
