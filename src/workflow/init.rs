//! Interactive creation of `gitpromote.toml`.

use std::path::Path;

use tracing::info;

use crate::config::{save_config, Config};
use crate::domain::version::Version;
use crate::error::Result;
use crate::ui::{display_success, Prompter};
use crate::workflow::Outcome;

fn validate_required(input: &str) -> std::result::Result<(), String> {
    if input.trim().is_empty() {
        Err("a value is required".to_string())
    } else {
        Ok(())
    }
}

fn validate_name(input: &str) -> std::result::Result<(), String> {
    validate_required(input)?;
    if input.contains('/') {
        return Err(format!("'{}' must not contain '/'", input));
    }
    Ok(())
}

fn validate_version(input: &str) -> std::result::Result<(), String> {
    Version::parse(input).map(|_| ()).map_err(|e| e.to_string())
}

fn accept_any(_: &str) -> std::result::Result<(), String> {
    Ok(())
}

/// Ask for every configurable value and write the result to `path`.
///
/// Values already present in `existing` are offered as defaults. Fields left
/// at their default are not written.
pub fn init<P: Prompter + ?Sized>(
    path: &Path,
    existing: &Config,
    prompter: &P,
) -> Result<Outcome<Config>> {
    let mut config = existing.clone();

    let name = prompter.input_text(
        "Application name",
        existing.application.name.as_deref(),
        &validate_name,
    )?;
    let version = prompter.input_text(
        "Application version",
        existing.application.version.as_deref(),
        &validate_version,
    )?;
    let remote = prompter.input_text(
        "Downstream git repository URL",
        existing.deploy.remote.as_deref(),
        &validate_required,
    )?;
    let dist = prompter.input_text(
        "Build output directory",
        Some(existing.deploy.dist.as_str()),
        &validate_required,
    )?;
    let target = prompter.input_text(
        "Target directory inside the repository",
        Some(existing.deploy.target.as_str()),
        &accept_any,
    )?;

    config.application.name = Some(name.trim().to_string());
    config.application.version = Some(version.trim().to_string());
    config.deploy.remote = Some(remote.trim().to_string());
    config.deploy.dist = dist.trim().to_string();
    config.deploy.target = target.trim().to_string();

    if path.exists() && !prompter.confirm(&format!("Overwrite {}?", path.display()), true)? {
        return Ok(Outcome::cancelled(format!("{} was left untouched", path.display())));
    }

    save_config(path, &config)?;
    info!(path = %path.display(), "configuration written");
    display_success(&format!("Wrote {}", path.display()));

    Ok(Outcome::Completed(config))
}
