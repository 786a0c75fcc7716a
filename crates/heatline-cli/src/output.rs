//! Terminal output

use console::{style, Style, Term};
use heatline::{FileHeat, LineHeat, LineRecord, TOP_TIER};

/// Writes status lines and heat tables to the terminal
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a reporter writing to stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "OK".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print data that must appear even in quiet mode
    pub fn data(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Print sidebar rows
    pub fn file_table(&self, rows: &[FileHeat]) {
        for row in rows {
            self.data(&format_file_row(row, self.use_color));
        }
    }

    /// Print source lines with their counts
    pub fn line_table(&self, source: &[String], rows: &[LineHeat]) {
        for row in display_rows(rows, source.len()) {
            let text = source.get(row.lineno - 1).map_or("", String::as_str);
            self.data(&format_line_row(&row, text, self.use_color));
        }
    }
}

/// Rows for every source line
///
/// Source lines past the end of the coverage rows show as not executable;
/// coverage rows past the end of the source are kept.
#[must_use]
pub fn display_rows(rows: &[LineHeat], source_lines: usize) -> Vec<LineHeat> {
    let mut out = rows.to_vec();
    let covered = rows.last().map_or(0, |row| row.lineno);
    out.extend((covered + 1..=source_lines).map(|lineno| LineHeat {
        lineno,
        record: LineRecord::NotExecutable,
        tier: 0,
    }));
    out
}

/// Terminal style of a tier
#[must_use]
pub fn tier_style(tier: u8) -> Style {
    match tier {
        0 => Style::new().dim(),
        10..=30 => Style::new().cyan(),
        40..=60 => Style::new().yellow(),
        t if t >= TOP_TIER => Style::new().red().bold(),
        _ => Style::new().red(),
    }
}

/// One sidebar row: tier, total, path
#[must_use]
pub fn format_file_row(row: &FileHeat, use_color: bool) -> String {
    let tier = format!("{:>3}", row.tier);
    let tier = if use_color {
        tier_style(row.tier).apply_to(tier).to_string()
    } else {
        tier
    };
    format!("{tier} {:>10}  {}", row.total, row.path)
}

/// One source row: line number, count (blank if not executable), text
#[must_use]
pub fn format_line_row(row: &LineHeat, text: &str, use_color: bool) -> String {
    let count = match row.record {
        LineRecord::NotExecutable => String::new(),
        LineRecord::HitCount(n) => n.to_string(),
    };
    let count = format!("{count:>8}");
    let count = if use_color {
        tier_style(row.tier).apply_to(count).to_string()
    } else {
        count
    };
    format!("{:>5} {count} | {text}", row.lineno)
}
