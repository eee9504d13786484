//! Run command - copy stdin into rotating log files

use anyhow::Result;
use timeroll_logs::LogCapture;
use tracing::info;

use crate::cli::RunArgs;
use crate::commands::resolve_config;

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = resolve_config(&args.policy)?;
    let writer = timeroll_logs::open(&config)?;

    info!("Writing to {}", writer.path().display());

    let handle = LogCapture::new(writer)
        .raw(args.raw)
        .spawn_capture(tokio::io::stdin());

    let writer = handle.await?;
    info!("Input closed, waiting for pending compression");
    writer.close()?;

    Ok(())
}
