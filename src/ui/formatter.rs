//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Errors and warnings go to stderr, everything else to stdout.

use console::style;

use crate::domain::policy::{PromotionPlan, TagAction};
use crate::domain::resolver::PromotionDecision;

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

pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Show where a promotion lands and what triggered it.
pub fn display_decision(decision: &PromotionDecision) {
    println!("\n{}", style("Promotion target:").bold());
    println!("  Branch:  {}", style(&decision.target_ref).cyan());
    println!("  Trigger: {}", decision.deploy_type);
}

/// Show the tags a promotion is about to write.
///
/// Tags that re-point an existing tag are shown in yellow, new ones in green.
/// When the exact version tag already exists, a warning line follows the list.
pub fn display_tag_plan(plan: &PromotionPlan) {
    println!("\n{}", style("Tags to write:").bold());
    for mutation in plan.plan.iter() {
        let name = match mutation.action {
            TagAction::Create => style(&mutation.tag_name).green(),
            TagAction::Replace => style(&mutation.tag_name).yellow(),
        };
        println!("  {:<8} {}", mutation.action.to_string(), name);
    }

    if plan.had_conflict {
        display_warning("this version has been promoted before; its tags will be overwritten");
    }
}

/// Show the release notes about to be written to the changelog
pub fn display_changelog(entry: &str) {
    println!("\n{}", style("Release notes:").bold());
    for line in entry.lines() {
        println!("  {}", line);
    }
}

/// Display manual push instruction for refs left unpushed.
///
/// # Arguments
/// * `refs` - Branch and tag names created locally
/// * `remote` - The remote name (e.g., "origin")
pub fn display_manual_push_instruction(refs: &[String], remote: &str) {
    if refs.is_empty() {
        return;
    }
    println!(
        "\n{} To push these changes later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push --force {} {}", remote, refs.join(" "))).cyan()
    );
}
