//! Plain ASCII box table, emitted line by line into the run log.

#![allow(missing_docs)]

use crate::logger::LoggerHandle;
use crate::sweep::repositories::Repository;

/// Render `rows` under `headers` as a `+---+` boxed table, one string per
/// line. Columns are left-aligned and sized to their widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let mut out = Vec::with_capacity(rows.len() + 4);
    out.push(rule.clone());
    out.push(boxed_line(&widths, headers.iter().copied()));
    out.push(rule.clone());
    for row in rows {
        out.push(boxed_line(&widths, row.iter().map(String::as_str)));
    }
    out.push(rule);
    out
}

fn boxed_line<'a>(widths: &[usize], mut cells: impl Iterator<Item = &'a str>) -> String {
    let padded: Vec<String> = widths
        .iter()
        .map(|&w| format!("{:<w$}", cells.next().unwrap_or("")))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Log the discovered repositories as a `Repository | Class` table.
pub fn log_repository_table(logger: &LoggerHandle, repos: &[Repository]) {
    let rows: Vec<Vec<String>> = repos
        .iter()
        .map(|repo| vec![repo.key.clone(), repo.rclass.clone()])
        .collect();
    for line in render_table(&["Repository", "Class"], &rows) {
        logger.info(line);
    }
}
