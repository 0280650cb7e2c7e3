//! Output formatting for CLI results

use crate::report::{EstimationSummary, Notice};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Format an estimation summary for terminal output
pub fn format_summary(summary: &EstimationSummary, verbose: bool) -> String {
    let mut output = String::new();

    let status_color = if summary.has_warnings() {
        "\x1b[33m" // yellow
    } else {
        "\x1b[32m" // green
    };
    let status_symbol = if summary.has_warnings() { "⚠" } else { "✓" };

    output.push_str(&format!(
        "{}{} {}Facies estimation{} {}[{}]{}\n",
        status_color,
        status_symbol,
        BOLD,
        RESET,
        DIM,
        summary.method.name(),
        RESET,
    ));
    output.push_str(&format!(
        "  {} observations in {} well(s), {} rejected\n",
        summary.total_count(),
        summary.wells.len(),
        summary.rejected.len()
    ));

    output.push_str("\n  Facies:\n");
    output.push_str(&format_facies_table(summary));

    if verbose {
        output.push_str(&format!(
            "\n  {}Bandwidth: vp {:.4} | vs {:.4} | rho {:.4}{}\n",
            DIM, summary.bandwidth[0], summary.bandwidth[1], summary.bandwidth[2], RESET
        ));
        output.push_str(&format!(
            "  {}Lattice: {} x {} x {} | passed frequency bins: {}{}\n",
            DIM,
            summary.lattice[0],
            summary.lattice[1],
            summary.lattice[2],
            summary.passed_frequency_bins,
            RESET
        ));
        if !summary.wells.is_empty() {
            output.push_str("\n  Wells:\n");
            output.push_str(&format_well_table(summary));
        }
    }

    if let Some(stats) = &summary.classification {
        output.push_str(&format!(
            "\n  Classified {} voxel(s) in {} layer(s), {} missing\n",
            stats.classified, stats.layers, stats.missing
        ));
    }

    if !summary.notices.is_empty() {
        output.push_str("\n  Notices:\n");
        for notice in &summary.notices {
            output.push_str(&format_notice(notice));
        }
    }

    output
}

fn format_facies_table(summary: &EstimationSummary) -> String {
    let mut output = String::new();
    for (f, name) in summary.facies_names.iter().enumerate() {
        let count = summary.counts.get(f).copied().unwrap_or(0);
        let prior = summary.priors.get(f).copied().unwrap_or(0.0);
        let line = format!("    {:<16} {:>8}  prior {:.4}", name, count, prior);
        if count == 0 {
            output.push_str(&format!("{}{}{}\n", DIM, line, RESET));
        } else {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

fn format_well_table(summary: &EstimationSummary) -> String {
    let mut output = String::new();
    let header: String = summary
        .facies_names
        .iter()
        .map(|n| format!("{:>10}", n))
        .collect();
    output.push_str(&format!("    {}{:<20}{}{}\n", DIM, "Well", header, RESET));
    for well in &summary.wells {
        let row: String = well.counts.iter().map(|c| format!("{:>10}", c)).collect();
        output.push_str(&format!("    {:<20}{}\n", well.well, row));
    }
    output
}

fn format_notice(notice: &Notice) -> String {
    format!(
        "    {}{}{} {}\n",
        notice.severity.color_code(),
        notice.severity.symbol(),
        RESET,
        notice.message
    )
}

/// Format an estimation summary as JSON
pub fn format_json(summary: &EstimationSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}
