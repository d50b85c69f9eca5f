//! Detect command - decide whether the buildpack applies

use crate::cli::args::DetectArgs;
use crate::cli::resolve_working_dir;
use crate::config::BuildConfig;
use crate::detect::detect;
use crate::error::ComposerResult;
use tracing::info;

/// Execute the detect command
pub async fn execute(args: DetectArgs, config: &BuildConfig) -> ComposerResult<()> {
    let working_dir = resolve_working_dir(args.working_dir)?;

    let plan = detect(&working_dir, config).await?;
    plan.write(&args.plan).await?;

    info!("Detection passed, plan written to {}", args.plan.display());
    Ok(())
}
