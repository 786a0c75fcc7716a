//! HTML rendering for the coverage viewer
//!
//! One page: a sidebar of project files colored by their total, and the
//! selected file's source colored line by line. Colors come from
//! `tier-NN` classes, one per decile.

use crate::output::display_rows;
use heatline::{Attribution, FileHeat, FileReport, LineHeat, LineRecord};
use std::fmt::Write as _;

/// Base path of the viewer
pub const VIEWER_PATH: &str = "/heatline";

const STYLE: &str = r"
body { margin: 0; font-family: sans-serif; display: flex; }
nav { width: 28em; height: 100vh; overflow-y: auto; border-right: 1px solid #ccc; }
nav a { display: block; padding: 2px 8px; color: #000; text-decoration: none; font-size: 13px; }
nav a.current { outline: 2px solid #333; }
main { flex: 1; height: 100vh; overflow-y: auto; }
header { padding: 6px 12px; border-bottom: 1px solid #ccc; }
table { border-collapse: collapse; font-family: monospace; font-size: 13px; }
td { padding: 0 8px; white-space: pre; }
td.lineno, td.count { text-align: right; color: #666; }
.warning { color: #a60; }
.tier-0 { background: #ffffff; }
.tier-10 { background: #fff5f0; }
.tier-20 { background: #fee0d2; }
.tier-30 { background: #fcbba1; }
.tier-40 { background: #fc9272; }
.tier-50 { background: #fb6a4a; }
.tier-60 { background: #ef3b2c; }
.tier-70 { background: #cb181d; color: #fff; }
.tier-80 { background: #a50f15; color: #fff; }
.tier-90 { background: #67000d; color: #fff; }
";

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Viewer URL for a file
#[must_use]
pub fn viewer_url(path: Option<&str>) -> String {
    match path {
        Some(path) => format!("{VIEWER_PATH}?path={}", urlencoding::encode(path)),
        None => VIEWER_PATH.to_string(),
    }
}

/// Reset URL that returns to a file
#[must_use]
pub fn reset_url(path: Option<&str>) -> String {
    match path {
        Some(path) => format!("{VIEWER_PATH}/reset?path={}", urlencoding::encode(path)),
        None => format!("{VIEWER_PATH}/reset"),
    }
}

fn render_sidebar(out: &mut String, files: &[FileHeat], current: Option<&str>) {
    out.push_str("<nav>\n");
    for file in files {
        let class = if current == Some(file.path.as_str()) {
            format!("tier-{} current", file.tier)
        } else {
            format!("tier-{}", file.tier)
        };
        let _ = writeln!(
            out,
            "<a class=\"{class}\" href=\"{}\" title=\"{} hits\">{}</a>",
            escape_html(&viewer_url(Some(&file.path))),
            file.total,
            escape_html(&file.path),
        );
    }
    out.push_str("</nav>\n");
}

fn render_lines(out: &mut String, lines: &[LineHeat], source: &[String]) {
    out.push_str("<table>\n");
    for line in &display_rows(lines, source.len()) {
        let count = match line.record {
            LineRecord::NotExecutable => String::new(),
            LineRecord::HitCount(n) => n.to_string(),
        };
        let text = source.get(line.lineno - 1).map_or("", String::as_str);
        let _ = writeln!(
            out,
            "<tr class=\"tier-{}\"><td class=\"lineno\">{}</td><td class=\"count\">{count}</td><td>{}</td></tr>",
            line.tier,
            line.lineno,
            escape_html(text),
        );
    }
    out.push_str("</table>\n");
}

/// Render the full viewer page
///
/// `source` holds the lines of the reported file. Every source line gets a
/// row; coverage rows past the end of a shortened file are kept.
#[must_use]
pub fn render_page(files: &[FileHeat], report: &FileReport, source: &[String]) -> String {
    let current = report.path();
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        out,
        "<title>heatline: {}</title>",
        escape_html(current.unwrap_or("coverage"))
    );
    let _ = writeln!(out, "<style>{STYLE}</style>\n</head>\n<body>");
    render_sidebar(&mut out, files, current);
    out.push_str("<main>\n<header>");
    if let Some(path) = current {
        let _ = write!(out, "<strong>{}</strong> ", escape_html(path));
    }
    let _ = write!(
        out,
        "<a href=\"{}\">reset</a>",
        escape_html(&reset_url(current))
    );
    if let FileReport::Lines {
        attribution: Attribution::Unavailable { reason },
        ..
    } = report
    {
        let _ = write!(
            out,
            " <span class=\"warning\">raw counts shown: {}</span>",
            escape_html(reason)
        );
    }
    out.push_str("</header>\n");
    match report {
        FileReport::Lines { lines, .. } => render_lines(&mut out, lines, source),
        other => {
            let message = other.message().unwrap_or_default();
            let _ = writeln!(out, "<p>{}</p>", escape_html(&message));
        }
    }
    out.push_str("</main>\n</body>\n</html>\n");
    out
}
