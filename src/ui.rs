//! Terminal output helpers: section banners, status cells and a box table
//! that shrinks its widest columns to fit the terminal.

use colored::*;
use console::{Term, measure_text_width, truncate_str};

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
    fn SetConsoleCP(wCodePageID: u32) -> i32;
}

/// Switches the Windows console to UTF-8 so status glyphs render.
#[cfg(windows)]
pub fn enable_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
pub fn enable_utf8_console() {}

/// Columns are never shrunk below this many characters.
const MIN_COLUMN: usize = 8;

pub fn section(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{}", rule.cyan());
    println!("{}", format!("  {}", title).cyan().bold());
    println!("{}", rule.cyan());
}

/// Outcome of one check, rendered as a colored table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn from_available(available: bool) -> Self {
        if available { Status::Pass } else { Status::Fail }
    }

    pub fn cell(self) -> String {
        match self {
            Status::Pass => "✓ OK".green().to_string(),
            Status::Warn => "! WARN".yellow().to_string(),
            Status::Fail => "x MISSING".red().to_string(),
        }
    }
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are ignored.
    pub fn add_row(&mut self, row: Vec<String>) -> &mut Self {
        if row.len() == self.headers.len() {
            self.rows.push(row.iter().map(|c| flatten(c)).collect());
        }
        self
    }

    pub fn print(&self) {
        let (_, width) = Term::stdout().size();
        print!("{}", self.render(width as usize));
    }

    pub fn render(&self, max_width: usize) -> String {
        if self.headers.is_empty() {
            return String::new();
        }
        let widths = self.column_widths(max_width);

        let border = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}\n", left, segments.join(mid), right)
        };
        let line = |cells: &[String], bold: bool| {
            let mut out = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = truncate_str(cell, width, "...");
                let pad = width.saturating_sub(measure_text_width(&text));
                let text = if bold {
                    text.bold().to_string()
                } else {
                    text.into_owned()
                };
                out.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            out.push('\n');
            out
        };

        let mut out = border("┌", "┬", "┐");
        out.push_str(&line(&self.headers, true));
        out.push_str(&border("├", "┼", "┤"));
        for row in &self.rows {
            out.push_str(&line(row, false));
        }
        out.push_str(&border("└", "┴", "┘"));
        out
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(measure_text_width(cell));
            }
        }

        // Indent, outer borders and one space either side of every cell.
        let overhead = 3 + 3 * widths.len();
        let budget = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > budget {
            let Some(widest) = widths
                .iter_mut()
                .filter(|w| **w > MIN_COLUMN)
                .max_by_key(|w| **w)
            else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn flatten(cell: &str) -> String {
    cell.replace(['\n', '\r', '\t'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_layout() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Tool", "Status"]);
        table
            .add_row(vec!["cmake".to_string(), "ok".to_string()])
            .add_row(vec!["too".to_string(), "many".to_string(), "cells".to_string()]);

        let out = table.render(120);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  ┌───────┬────────┐");
        assert_eq!(lines[1], "  │ Tool  │ Status │");
        assert_eq!(lines[3], "  │ cmake │ ok     │");
    }

    #[test]
    fn test_wide_columns_shrink_to_fit() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Name", "Message"]);
        table.add_row(vec!["zlib".to_string(), "x".repeat(200)]);

        let out = table.render(40);
        for line in out.lines() {
            assert!(measure_text_width(line) <= 40, "{}", line);
        }
        assert!(out.contains("..."));
    }

    #[test]
    fn test_multiline_cells_are_flattened() {
        assert_eq!(flatten("a\nb\tc"), "a b c");
    }
}
