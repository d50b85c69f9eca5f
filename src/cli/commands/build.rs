//! Build command - install, cache and publish Composer packages

use crate::cache::Sha256Calculator;
use crate::cli::args::BuildArgs;
use crate::cli::resolve_working_dir;
use crate::config::BuildConfig;
use crate::error::ComposerResult;
use crate::layer::{BuildpackPlan, Layers};
use crate::orchestration::ComposerExecutable;
use crate::pipeline::{BuildRequest, InstallPipeline};
use crate::ui::BuildLog;
use tracing::info;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &BuildConfig) -> ComposerResult<()> {
    let working_dir = resolve_working_dir(args.working_dir)?;

    let plan = match args.plan {
        Some(path) => BuildpackPlan::load(&path).await?,
        None => BuildpackPlan::default(),
    };

    let log = BuildLog::stdout(config.is_debug());
    log.title("Composer Layer Buildpack", env!("CARGO_PKG_VERSION"));

    let request = BuildRequest {
        working_dir,
        layers: Layers::new(args.layers),
        plan,
    };

    let executable = ComposerExecutable::new();
    let outcome = InstallPipeline::new(config, &executable, &Sha256Calculator, log)
        .run(&request)
        .await?;

    info!(
        "Build finished: layer {} ({}), {} missing extension(s)",
        outcome.packages_layer.path.display(),
        outcome.decision,
        outcome.missing_extensions.len()
    );
    Ok(())
}
