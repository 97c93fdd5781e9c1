//! Column alignment for pipe tables.
//!
//! Consecutive lines starting with `|` form one table. Cells are padded to
//! their column width; columns where most non-empty cells look numeric are
//! right-aligned. `|-` rows become full `|---+---|` rules. Other lines pass
//! through untouched.

use std::sync::LazyLock;

use regex::Regex;

/// Amounts, decimal hours and `h:mm` durations, optionally bold.
static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*?\$?-?\d+(?:[.:]\d+)?\*?$").unwrap());

#[derive(Debug)]
enum Row<'a> {
    Rule,
    Cells(Vec<&'a str>),
}

/// Aligns every table in `text`.
pub fn align_tables(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut table: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim_start().starts_with('|') {
            table.push(line);
            continue;
        }
        flush_table(&mut out, &mut table);
        out.push_str(line);
        out.push('\n');
    }
    flush_table(&mut out, &mut table);

    out
}

fn flush_table(out: &mut String, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    for row in align_rows(lines) {
        out.push_str(&row);
        out.push('\n');
    }
    lines.clear();
}

fn parse_row(line: &str) -> Row<'_> {
    let line = line.trim();
    if line.starts_with("|-") {
        return Row::Rule;
    }
    let inner = line.trim_start_matches('|');
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Row::Cells(inner.split('|').map(str::trim).collect())
}

fn align_rows(lines: &[&str]) -> Vec<String> {
    let rows: Vec<Row<'_>> = lines.iter().map(|l| parse_row(l)).collect();
    let columns = rows
        .iter()
        .filter_map(|r| match r {
            Row::Cells(cells) => Some(cells.len()),
            Row::Rule => None,
        })
        .max()
        .unwrap_or(0);

    let mut widths = vec![1usize; columns];
    let mut numeric = vec![0usize; columns];
    let mut filled = vec![0usize; columns];
    for row in &rows {
        if let Row::Cells(cells) = row {
            for (i, cell) in cells.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
                if !cell.is_empty() {
                    filled[i] += 1;
                    if NUMERIC_RE.is_match(cell) {
                        numeric[i] += 1;
                    }
                }
            }
        }
    }
    let right_aligned: Vec<bool> = (0..columns).map(|i| numeric[i] * 2 > filled[i]).collect();

    rows.iter()
        .map(|row| match row {
            Row::Rule => {
                let rules: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
                format!("|{}|", rules.join("+"))
            }
            Row::Cells(cells) => {
                let padded: Vec<String> = (0..columns)
                    .map(|i| {
                        let cell = cells.get(i).copied().unwrap_or("");
                        let width = widths[i];
                        if right_aligned[i] {
                            format!(" {cell:>width$} ")
                        } else {
                            format!(" {cell:<width$} ")
                        }
                    })
                    .collect();
                format!("|{}|", padded.join("|"))
            }
        })
        .collect()
}
