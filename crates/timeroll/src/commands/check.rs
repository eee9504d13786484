//! Check command - validate a rolling configuration before using it

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use timeroll_logs::{ActiveFile, TimeBasedRollingPolicy};

use crate::cli::PolicyArgs;
use crate::commands::resolve_config;
use crate::output::is_json_mode;

#[derive(Debug, Serialize)]
struct CheckReport {
    pattern: String,
    date_format: String,
    time_zone: String,
    compression: String,
    current_name: String,
    active_file: String,
    decoupled: bool,
}

pub fn execute(args: PolicyArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let policy = TimeBasedRollingPolicy::activate(&config)?;

    let template = policy.template();
    let report = CheckReport {
        pattern: template.raw().to_string(),
        date_format: template.date_format().to_string(),
        time_zone: format!("{:?}", template.time_zone()).to_lowercase(),
        compression: format!("{:?}", policy.compression()).to_lowercase(),
        current_name: policy.state().last_rendered_name().to_string(),
        active_file: policy.active_file_path().display().to_string(),
        decoupled: matches!(policy.active_file(), ActiveFile::Decoupled(_)),
    };

    if is_json_mode() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} {}", "✓".green(), "Configuration is valid".bold());
    println!("  {:<14} {}", "pattern:", report.pattern);
    println!("  {:<14} {}", "date format:", report.date_format);
    println!("  {:<14} {}", "time zone:", report.time_zone);
    println!("  {:<14} {}", "compression:", report.compression);
    println!("  {:<14} {}", "current name:", report.current_name);
    println!(
        "  {:<14} {}{}",
        "active file:",
        report.active_file,
        if report.decoupled { " (fixed)".dimmed().to_string() } else { String::new() }
    );

    Ok(())
}
