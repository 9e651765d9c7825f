//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! The `format_*` functions build the text; the `display_*` functions print it.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::executor::ExecutionReport;
use crate::git::FollowUpLinks;
use crate::lens::VersionLens;
use crate::plan::{BatchExecutionPlan, OperationKind};
use crate::snapshot::VersionSnapshot;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a boundary warning to the user.
///
/// Shows a yellow warning icon followed by the warning message.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Current version of every platform that was found.
pub fn format_snapshot(snapshot: &VersionSnapshot) -> String {
    let mut out = format!("{}\n", style("Current versions:").bold());
    for record in snapshot.records() {
        out.push_str(&format!(
            "  {:<8} {}\n",
            record.platform().label(),
            style(record.to_string()).cyan()
        ));
    }
    out
}

pub fn display_snapshot(snapshot: &VersionSnapshot) {
    print!("\n{}", format_snapshot(snapshot));
}

/// Preview of a plan: version updates, then git steps, then the summary.
///
/// # Arguments
/// * `plan` - The plan about to be confirmed
pub fn format_plan(plan: &BatchExecutionPlan) -> String {
    let mut out = format!("{}\n", style("Planned changes:").bold());

    for operation in plan.version_operations() {
        out.push_str(&format!(
            "  {:<8} {} → {}\n",
            operation.platform_label(),
            style(&operation.old_value).red(),
            style(&operation.new_value).green()
        ));
    }
    for entry in &plan.failed {
        out.push_str(&format!(
            "  {:<8} {} ({})\n",
            entry.platform.label(),
            style("cannot be read").red(),
            entry.reason
        ));
    }

    if plan.operations.iter().any(|op| op.kind() == OperationKind::Git) {
        out.push_str(&format!("{}\n", style("Git:").bold()));
        for operation in plan.git_operations() {
            out.push_str(&format!(
                "  {:<15} {}\n",
                operation.action,
                style(&operation.new_value).cyan()
            ));
        }
    }

    out.push_str(&format!("\n{}\n", plan.summary));
    out
}

pub fn display_plan(plan: &BatchExecutionPlan) {
    print!("\n{}", format_plan(plan));
}

/// One line per result (`✓`/`✗`), then `successful/total`.
pub fn format_results(report: &ExecutionReport) -> String {
    let mut out = format!("{}\n", style("Results:").bold());

    for result in &report.results {
        let mark = if result.success {
            style("✓").green()
        } else {
            style("✗").red()
        };
        out.push_str(&format!("  {} {}: {}", mark, result.platform, result.message));
        if let Some(error) = &result.error {
            out.push_str(&format!(" ({})", style(error).red()));
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "\n{}/{} operations succeeded\n",
        report.successful(),
        report.total()
    ));
    out
}

pub fn display_results(report: &ExecutionReport) {
    print!("\n{}", format_results(report));
}

/// Prints `path:line  label` for each lens.
pub fn display_lenses(lenses: &[VersionLens]) {
    if lenses.is_empty() {
        return;
    }
    println!("\n{}", style("Version fields:").bold());
    for lens in lenses {
        println!(
            "  {}:{}  {}",
            lens.path.display(),
            lens.line,
            style(&lens.label).dim()
        );
    }
}

/// Display the links to open after a release was pushed.
///
/// # Arguments
/// * `links` - Release and pull-request URLs; absent ones are not shown
pub fn display_follow_up_links(links: &FollowUpLinks) {
    if let Some(url) = &links.create_release {
        println!("{} Create release: {}", style("→").yellow(), style(url).cyan());
    }
    if let Some(url) = &links.create_pull_request {
        println!(
            "{} Create pull request: {}",
            style("→").yellow(),
            style(url).cyan()
        );
    }
}
