//! Render command - show the file name a pattern produces for an instant

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use timeroll_logs::{CompressionSuffix, RotationTemplate};

use crate::cli::RenderArgs;
use crate::commands::resolve_config;
use crate::output::is_json_mode;

#[derive(Serialize)]
struct RenderOutput {
    at: String,
    rendered: String,
    base: String,
    compression: String,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let config = resolve_config(&args.policy)?;
    let template = RotationTemplate::parse(config.pattern()?)?.with_time_zone(config.time_zone);

    let at = match &args.at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .with_context(|| format!("Invalid RFC 3339 instant: {}", at))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let rendered = template.render(at);
    let compression = CompressionSuffix::detect(&rendered);

    if is_json_mode() {
        let output = RenderOutput {
            at: at.to_rfc3339(),
            base: compression.strip(&rendered).to_string(),
            compression: format!("{:?}", compression).to_lowercase(),
            rendered,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", rendered);
    }

    Ok(())
}
