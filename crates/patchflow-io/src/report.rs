//! Plain-text rendering of a [`PatchReport`].

use patchflow_core::PatchReport;
use std::fmt::Write;

const HEADERS: [&str; 9] = [
    "FID", "Name", "Manufacturer", "Type", "Mode", "Patch", "Location", "Fixed", "Chs",
];

/// Render a report as an aligned text table with a title and totals line
pub fn render_text(title: &str, report: &PatchReport) -> String {
    let cells: Vec<[String; 9]> = report
        .rows
        .iter()
        .map(|r| {
            [
                r.fid.to_string(),
                r.name.clone(),
                r.manufacturer.clone(),
                r.type_name.clone(),
                r.mode.clone(),
                r.patch.clone(),
                r.location.clone(),
                if r.is_fixed { "Yes" } else { "No" }.to_string(),
                r.channels.to_string(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(
        out,
        "Fixtures: {} | Parameters: {}",
        report.fixture_count(),
        report.total_parameters
    );
    let _ = writeln!(out);
    write_row(&mut out, &HEADERS.map(String::from), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));
    for row in &cells {
        write_row(&mut out, row, &widths);
    }
    out
}

fn write_row(out: &mut String, row: &[String; 9], widths: &[usize; 9]) {
    let line: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}
