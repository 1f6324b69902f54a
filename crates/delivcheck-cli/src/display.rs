//! Vertical card display for analysis results and batch reports.
//!
//! Cards group the suggested address, the derived verdict, and every stored
//! status code with its label and a severity marker.

use std::fmt::Write;

use delivcheck_core::codes::{CodeSeverity, describe, severity};
use delivcheck_core::{AddressId, AnalysisResult};
use delivcheck_engine::ProcessReport;

const MAX_LIST_ITEMS: usize = 10;

// ── Public API ──

pub fn print_result_card(result: &AnalysisResult) {
    print!("{}", render_result_card(result));
}

pub fn print_report(report: &ProcessReport) {
    print!("{}", render_report(report));
}

/// One line per code: marker, code, label.
pub fn print_codes(codes: &[String]) {
    for code in codes {
        println!("{}", code_line(code));
    }
}

// ── Rendering ──

pub fn render_result_card(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== address {} ===", result.address_id);
    let _ = writeln!(out, "{}", result.verdict());
    out.push('\n');

    let name = format!("{} {}", result.first_name, result.last_name);
    let locality = format!("{} {}", result.postal_code, result.city);
    let fields = [
        ("name", name.trim().to_string()),
        ("street", result.street_line()),
        ("locality", locality.trim().to_string()),
    ];
    if fields.iter().any(|(_, v)| !v.is_empty()) {
        out.push_str("Address\n");
        for (label, value) in &fields {
            if !value.is_empty() {
                let _ = writeln!(out, "  {label:<12} {value}");
            }
        }
        out.push('\n');
    }

    out.push_str("Status codes\n");
    if result.status_codes.is_empty() {
        out.push_str("  (none)\n");
    }
    for code in &result.status_codes {
        let _ = writeln!(out, "  {}", code_line(code));
    }
    out
}

pub fn render_report(report: &ProcessReport) -> String {
    let mut out = String::new();
    if let Some(err) = &report.gateway_error {
        let _ = writeln!(out, "verification failed: {err}");
        out.push('\n');
    }
    if let Some(err) = &report.store_error {
        let _ = writeln!(out, "stored results unavailable, nothing changed: {err}");
        out.push('\n');
    }

    if !report.statuses.is_empty() {
        out.push_str("Statuses\n");
        for (order, status) in &report.statuses {
            let _ = writeln!(out, "  {:<12} {}", order.to_string(), status);
        }
        out.push('\n');
    }

    for (header, ids) in [
        ("Held", &report.held),
        ("Cancelled", &report.cancelled),
        ("Corrected", &report.corrected),
    ] {
        if ids.is_empty() {
            continue;
        }
        let shown: Vec<String> = ids
            .iter()
            .take(MAX_LIST_ITEMS)
            .map(|id| id.to_string())
            .collect();
        let _ = write!(out, "{header} ({}): {}", ids.len(), shown.join(", "));
        if ids.len() > MAX_LIST_ITEMS {
            let _ = write!(out, " ... and {} more", ids.len() - MAX_LIST_ITEMS);
        }
        out.push('\n');
    }

    if !report.failed.is_empty() {
        let _ = writeln!(out, "Failed ({}):", report.failed.len());
        for failed in &report.failed {
            let _ = writeln!(out, "  {:<12} {}", failed.order_id.to_string(), failed.reason);
        }
    }
    if report.is_empty() {
        out.push_str("nothing to do\n");
    }
    out
}

/// Summary line for an address with no stored result.
pub fn render_missing(id: AddressId) -> String {
    format!("=== address {id} ===\nnot analysed\n")
}

fn code_line(code: &str) -> String {
    format!("{} {:<10} {}", marker(severity(code)), code, describe(code))
}

fn marker(severity: CodeSeverity) -> char {
    match severity {
        CodeSeverity::Positive => '+',
        CodeSeverity::Negative => '!',
        CodeSeverity::Correction => '~',
        CodeSeverity::Neutral => ' ',
    }
}
