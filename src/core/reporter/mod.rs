//! # Reporter Module
//!
//! Human-readable pipeline summaries.
//!
//! Renders the per-layer summary as a bordered text table with centered
//! cells:
//!
//! ```text
//! +-------+-------------------+------------------------------------------+
//! | Index |        Name       |                Parameters                |
//! +-------+-------------------+------------------------------------------+
//! |   #1  | Read images(read) |               Path: images               |
//! +-------+-------------------+------------------------------------------+
//! ```

use serde::{Deserialize, Serialize};

const HEADERS: [&str; 3] = ["Index", "Name", "Parameters"];

/// One layer in a pipeline summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Position in the pipeline, starting at 1
    pub index: usize,
    /// `<name>(<type>)`
    pub name: String,
    /// Parameter description of the layer
    pub parameters: String,
}

impl SummaryRow {
    fn cells(&self) -> [String; 3] {
        [
            format!("#{}", self.index),
            self.name.clone(),
            self.parameters.clone(),
        ]
    }
}

/// Render `rows` as a text table
pub fn render_table(rows: &[SummaryRow]) -> String {
    let cells: Vec<[String; 3]> = rows.iter().map(SummaryRow::cells).collect();

    let mut widths = HEADERS.map(|header| header.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = border(&widths);
    let mut table = String::new();
    table.push_str(&border);
    table.push_str(&line(&HEADERS.map(String::from), &widths));
    table.push_str(&border);
    for row in &cells {
        table.push_str(&line(row, &widths));
    }
    if !cells.is_empty() {
        table.push_str(&border);
    }
    table
}

fn border(widths: &[usize; 3]) -> String {
    let mut out = String::from("+");
    for width in widths {
        out.push_str(&"-".repeat(width + 2));
        out.push('+');
    }
    out.push('\n');
    out
}

fn line(cells: &[String; 3], widths: &[usize; 3]) -> String {
    let mut out = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        out.push_str(&format!(" {:^width$} |", cell, width = width));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, name: &str, parameters: &str) -> SummaryRow {
        SummaryRow {
            index,
            name: name.to_string(),
            parameters: parameters.to_string(),
        }
    }

    #[test]
    fn table_has_header_and_one_line_per_row() {
        let table = render_table(&[
            row(1, "Read images(read)", "Path: images"),
            row(2, "Resize images(resize)", "Dim: (100, 100), Interpolation: linear"),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("Index") && lines[1].contains("Parameters"));
        assert!(lines[3].contains("#1") && lines[3].contains("Read images(read)"));
        assert!(lines[4].contains("Dim: (100, 100), Interpolation: linear"));
    }

    #[test]
    fn every_line_has_the_same_width() {
        let table = render_table(&[row(1, "a", "bbbbbbbbbbbb"), row(10, "long name here", "-")]);
        let widths: Vec<usize> = table.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn empty_summary_renders_header_only() {
        let table = render_table(&[]);
        assert_eq!(table.lines().count(), 3);
    }
}
