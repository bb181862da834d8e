//! Console and JSON reporting for lint results.
//!
//! Visual layout follows a table-and-summary report style; JSON export
//! uses a flat, serde-derived result struct.

use std::collections::BTreeMap;

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{style, Emoji};
use serde::Serialize;

use crate::violation::{Severity, Violation};

static MAGNIFIER: Emoji<'_, '_> = Emoji("\u{1F50D} ", "");
static CHECK: Emoji<'_, '_> = Emoji("\u{2705} ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("\u{26A0}\u{FE0F}  ", "[!] ");

/// Prints a header, summary, and findings table for one file's violations.
pub fn print_report(file: &str, violations: &[Violation]) {
    print_header(file);

    if violations.is_empty() {
        println!("\n  {}{}\n", CHECK, style("No issues found!").green().bold());
        print_footer();
        return;
    }

    print_summary(violations);
    print_table(violations);
    print_footer();
}

fn print_header(file: &str) {
    println!("\n{}", style("\u{2501}".repeat(80)).dim());
    println!("{}{} {}", MAGNIFIER, style("Linting Dockerfile:").bold().cyan(), style(file).bold().white());
    println!("{}", style("\u{2501}".repeat(80)).dim());
}

fn print_footer() {
    println!("{}\n", style("\u{2501}".repeat(80)).dim());
}

fn print_summary(violations: &[Violation]) {
    let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
    for v in violations {
        *counts.entry(v.severity).or_insert(0) += 1;
    }

    print!("\n  {}", WARN);
    print!("{} ", style(format!("{} issues found:", violations.len())).bold().yellow());

    let mut parts = Vec::new();
    if let Some(&n) = counts.get(&Severity::Error) {
        parts.push(style(format!("{n} error")).red().bold().to_string());
    }
    if let Some(&n) = counts.get(&Severity::Warning) {
        parts.push(style(format!("{n} warning")).yellow().to_string());
    }
    if let Some(&n) = counts.get(&Severity::Info) {
        parts.push(style(format!("{n} info")).blue().to_string());
    }
    if let Some(&n) = counts.get(&Severity::Style) {
        parts.push(style(format!("{n} style")).dim().to_string());
    }
    println!("{}\n", parts.join(", "));
}

fn print_table(violations: &[Violation]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Rule").add_attribute(Attribute::Bold),
            Cell::new("Line").add_attribute(Attribute::Bold),
            Cell::new("Message").add_attribute(Attribute::Bold),
        ]);

    for v in violations {
        let (text, color) = severity_display(v.severity);
        let line = if v.location.is_file_level() { "\u{2014}".to_string() } else { v.location.start.line.to_string() };
        table.add_row(vec![
            Cell::new(text).fg(color).add_attribute(Attribute::Bold),
            Cell::new(&v.rule_code).fg(Color::Cyan),
            Cell::new(line),
            Cell::new(&v.message),
        ]);
    }

    println!("{table}\n");
}

fn severity_display(severity: Severity) -> (&'static str, Color) {
    match severity {
        Severity::Error => ("ERROR", Color::Red),
        Severity::Warning => ("WARNING", Color::Yellow),
        Severity::Info => ("INFO", Color::Blue),
        Severity::Style => ("STYLE", Color::White),
        Severity::Off => ("OFF", Color::DarkGrey),
    }
}

/// Flat, serializable view of one file's lint result for `--format json`.
#[derive(Debug, Serialize)]
pub struct JsonReport {
    pub file: String,
    pub total: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub findings: Vec<JsonFinding>,
}

#[derive(Debug, Serialize)]
pub struct JsonFinding {
    pub rule_code: String,
    pub severity: String,
    pub line: Option<i64>,
    pub message: String,
    pub doc_url: Option<String>,
}

impl JsonReport {
    pub fn from_violations(file: &str, violations: &[Violation]) -> Self {
        let error_count = violations.iter().filter(|v| v.severity == Severity::Error).count();
        let warning_count = violations.iter().filter(|v| v.severity == Severity::Warning).count();
        JsonReport {
            file: file.to_string(),
            total: violations.len(),
            error_count,
            warning_count,
            findings: violations
                .iter()
                .map(|v| JsonFinding {
                    rule_code: v.rule_code.clone(),
                    severity: v.severity.as_str().to_string(),
                    line: if v.location.is_file_level() { None } else { Some(v.location.start.line) },
                    message: v.message.clone(),
                    doc_url: v.doc_url.clone(),
                })
                .collect(),
        }
    }
}
