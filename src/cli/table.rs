//! Plain-text rendering of result sets

use crate::db::ResultSet;
use unicode_truncate::UnicodeTruncateStr;
use unicode_width::UnicodeWidthStr;

const NULL_DISPLAY: &str = "NULL";
const MIN_WIDTH: usize = 4;

/// Render `rs` as an aligned table with a row-count footer.
pub fn render(rs: &ResultSet, max_width: usize) -> String {
    if rs.columns.is_empty() {
        return format!("(column names unavailable, {} rows)\n", rs.len());
    }
    let max_width = max_width.max(MIN_WIDTH);

    let rows: Vec<Vec<String>> = (0..rs.len())
        .filter_map(|i| rs.row_values(i))
        .map(|values| {
            values
                .into_iter()
                .map(|v| truncate(v.unwrap_or(NULL_DISPLAY), max_width))
                .collect()
        })
        .collect();
    let header: Vec<String> = rs.columns.iter().map(|c| truncate(c, max_width)).collect();
    let widths = column_widths(&header, &rows);

    let mut out = String::new();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &rows {
        push_line(&mut out, row, &widths);
    }
    let noun = if rs.len() == 1 { "row" } else { "rows" };
    out.push_str(&format!("({} {})\n", rs.len(), noun));
    out
}

fn column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{}{}", cell, " ".repeat(w.saturating_sub(cell.width()))))
        .collect();
    out.push_str(padded.join(" | ").trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    // Multi-line values would break the grid
    let flat = s.replace(['\n', '\r'], " ");
    if flat.width() <= max {
        return flat;
    }
    let (head, _) = flat.unicode_truncate(max - 1);
    format!("{}…", head)
}
