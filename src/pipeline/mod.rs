//! Composer install pipeline
//!
//! Phases run strictly in order, each gated on its trigger:
//!
//! 1. write php.ini (always)
//! 2. `composer global require` (global packages configured)
//! 3. cache decision
//! 4. adopt an existing vendor tree (rebuild, tree present)
//! 5. `composer install` (rebuild)
//! 6. publish the layer's vendor directory (always)
//! 7. `composer dump-autoload` from the published path (rebuild, install
//!    ran with `--no-autoloader`)
//! 8. `composer check-platform-reqs` (always)
//!
//! Any failure stops the pipeline. A reused layer skips 4, 5 and 7.

pub mod context;
pub mod platform;
pub mod publish;


pub use context::PipelineContext;
pub use platform::{
    missing_extensions, parse_requirements, PlatformRequirement, RequirementStatus,
    PARTIALLY_UNMET_EXIT_CODE,
};
pub use publish::{PublishMethod, VendorState};

use crate::cache::{self, CacheDecision, CacheKey, Calculator};
use crate::composer::{install_options, requires_autoload_dump, ComposerFiles};
use crate::config::BuildConfig;
use crate::error::{ComposerError, ComposerResult};
use crate::layer::{
    BuildpackPlan, Layer, Layers, GLOBAL_LAYER, PACKAGES_DEPENDENCY, PACKAGES_LAYER,
    PHP_INI_LAYER,
};
use crate::orchestration::{EnvironmentBuilder, Executable, Execution, ProcessOutput};
use crate::ui::BuildLog;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the generated runtime configuration file
pub const PHP_INI_FILE: &str = "composer-php.ini";

/// Inputs of one build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub working_dir: PathBuf,
    pub layers: Layers,
    pub plan: BuildpackPlan,
}

/// Result of a successful build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The packages layer as written to disk
    pub packages_layer: Layer,
    pub decision: CacheDecision,
    /// Extensions written to the generated ini fragment
    pub missing_extensions: Vec<String>,
    pub extensions_ini: PathBuf,
}

/// Runs the phases for one build
pub struct InstallPipeline<'a> {
    config: &'a BuildConfig,
    executable: &'a dyn Executable,
    calculator: &'a dyn Calculator,
    log: BuildLog,
}

impl<'a> InstallPipeline<'a> {
    pub fn new(
        config: &'a BuildConfig,
        executable: &'a dyn Executable,
        calculator: &'a dyn Calculator,
        log: BuildLog,
    ) -> Self {
        Self {
            config,
            executable,
            calculator,
            log,
        }
    }

    /// Run every phase for `request`
    pub async fn run(&self, request: &BuildRequest) -> ComposerResult<BuildOutcome> {
        let ctx = PipelineContext::new(&request.working_dir, &self.config.path);
        let ctx = self.write_php_ini(&request.layers, ctx).await?;
        let ctx = self.global_bootstrap(&request.layers, ctx).await?;

        let files = ComposerFiles::locate(&request.working_dir, self.config);
        let fingerprint = self.calculator.sum(&files.fingerprint_inputs())?;
        self.log.debug_subprocess(&format!(
            "Calculated checksum of {} for composer.lock",
            fingerprint
        ));
        let key = CacheKey::new(fingerprint, &self.config.stack_id);

        let layer = request.layers.get(PACKAGES_LAYER).await?;
        let decision = match cache::decide(&layer, &key) {
            CacheDecision::Reuse if !layer.path.join("vendor").is_dir() => {
                warn!(
                    "Cached layer {} has no vendor directory, rebuilding",
                    layer.path.display()
                );
                CacheDecision::Rebuild
            }
            decision => decision,
        };
        let types = cache::layer_types(request.plan.merge_layer_types(PACKAGES_DEPENDENCY));
        info!("Packages layer cache decision: {}", decision);

        let visible = self.config.workspace_vendor_dir(&request.working_dir);

        let packages_layer = match decision {
            CacheDecision::Reuse => {
                self.log
                    .process(&format!("Reusing cached layer {}", layer.path.display()));
                self.log.line_break();

                let mut layer = layer;
                layer.types = types;
                self.log_types("Setting cached layer types", &layer);
                layer.save().await?;

                if publish::discard_existing(&visible).await? {
                    self.log.debug_subprocess(&format!(
                        "Removed pre-existing {} in favor of the cached layer",
                        visible.display()
                    ));
                }
                self.publish(&layer, &visible).await?;
                layer
            }
            CacheDecision::Rebuild => {
                let mut layer = cache::reset(layer).await?;
                layer.types = types;
                self.log_types("Setting layer types", &layer);

                let staging_vendor = layer.path.join("vendor");
                self.adopt_existing(&visible, &staging_vendor).await?;

                let options = install_options(self.config.install_options.as_deref());
                self.main_install(&ctx, &files, &layer, &options).await?;

                self.publish(&layer, &visible).await?;

                if requires_autoload_dump(&options) {
                    self.dump_autoload(&ctx, &files, &layer, &visible).await?;
                }

                // The key is only recorded once the vendor tree is complete
                cache::persist(&mut layer, &key).await?;
                layer
            }
        };

        if self.log.is_debug() {
            self.list_vendor(&packages_layer.path.join("vendor")).await?;
        }

        let (missing_extensions, extensions_ini) =
            self.scan_platform_requirements(&ctx, &files, &visible).await?;

        Ok(BuildOutcome {
            packages_layer,
            decision,
            missing_extensions,
            extensions_ini,
        })
    }

    /// Phase 1: php.ini used by every composer invocation
    async fn write_php_ini(
        &self,
        layers: &Layers,
        ctx: PipelineContext,
    ) -> ComposerResult<PipelineContext> {
        let layer = layers.get(PHP_INI_LAYER).await?.reset().await?;
        let path = layer.path.join(PHP_INI_FILE);

        self.log.debug_process("Writing php.ini for composer");
        self.log.debug_subprocess(&format!(
            "Writing {} to {}",
            PHP_INI_FILE,
            path.display()
        ));

        let contents = render_php_ini(&self.config.php_extension_dir);
        self.log
            .debug_subprocess(&format!("Writing php.ini contents: '{}'", contents));

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| ComposerError::io(format!("writing {}", path.display()), e))?;

        Ok(ctx.with_php_ini(path))
    }

    /// Phase 2: `composer global require`, when packages are configured
    async fn global_bootstrap(
        &self,
        layers: &Layers,
        ctx: PipelineContext,
    ) -> ComposerResult<PipelineContext> {
        if self.config.global_packages.is_empty() {
            return Ok(ctx);
        }

        self.log.process("Running 'composer global require'");

        let layer = layers.get(GLOBAL_LAYER).await?.reset().await?;
        let layer_path = layer.path.to_string_lossy().into_owned();

        let mut args = vec![
            "global".to_string(),
            "require".to_string(),
            "--no-progress".to_string(),
        ];
        args.extend(self.config.global_packages.iter().cloned());

        let execution = Execution {
            args,
            dir: layer.path.clone(),
            env: self
                .environment(&ctx)
                .var("COMPOSER_HOME", &layer_path)
                .var("COMPOSER_VENDOR_DIR", "vendor")
                .build(),
        };
        self.run_tool(&execution, None).await?;

        let bin = layer.path.join("vendor").join("bin");
        if self.log.is_debug() {
            self.log.debug_process("Adding global Composer packages to PATH:");
            for name in list_dir(&bin).await? {
                self.log.debug_detail(&format!("- {}", name));
            }
        }

        Ok(ctx.with_global_bin(bin))
    }

    /// Phase 4: seed the staging area with a vendor tree from the app
    async fn adopt_existing(&self, visible: &Path, staging_vendor: &Path) -> ComposerResult<()> {
        if publish::inspect(visible).await? == VendorState::Directory {
            self.log.debug_process(&format!(
                "Copying from {} => to {}",
                visible.display(),
                staging_vendor.display()
            ));
        }
        if publish::adopt_existing(visible, staging_vendor).await? {
            debug!("Adopted existing vendor directory {}", visible.display());
        }
        Ok(())
    }

    /// Phase 5: `composer install` into the staging layer
    async fn main_install(
        &self,
        ctx: &PipelineContext,
        files: &ComposerFiles,
        layer: &Layer,
        options: &[String],
    ) -> ComposerResult<()> {
        self.log.process("Running 'composer install'");

        let mut args = vec!["install".to_string()];
        args.extend(options.iter().cloned());

        let execution = Execution {
            args,
            dir: layer.path.clone(),
            env: self
                .environment(ctx)
                .var("COMPOSER", files.manifest.to_string_lossy())
                .var(
                    "COMPOSER_HOME",
                    layer.path.join(".composer").to_string_lossy(),
                )
                .var("COMPOSER_VENDOR_DIR", "vendor")
                .build(),
        };
        self.run_tool(&execution, None).await?;
        Ok(())
    }

    /// Phase 6: expose the staged vendor directory to the project
    async fn publish(&self, layer: &Layer, visible: &Path) -> ComposerResult<()> {
        self.log
            .process(&format!("Writing symlink to {}", visible.display()));
        let method = publish::publish(&layer.path.join("vendor"), visible).await?;
        if method == PublishMethod::Copy {
            self.log.debug_subprocess("Symlinks unavailable, copied instead");
        }
        Ok(())
    }

    /// Phase 7: regenerate the autoloader from the published location
    async fn dump_autoload(
        &self,
        ctx: &PipelineContext,
        files: &ComposerFiles,
        layer: &Layer,
        visible: &Path,
    ) -> ComposerResult<()> {
        self.log.process("Running 'composer dump-autoload'");

        let execution = Execution {
            args: vec![
                "dump-autoload".to_string(),
                "--classmap-authoritative".to_string(),
            ],
            dir: ctx.working_dir.clone(),
            env: self
                .environment(ctx)
                .var("COMPOSER", files.manifest.to_string_lossy())
                .var(
                    "COMPOSER_HOME",
                    layer.path.join(".composer").to_string_lossy(),
                )
                .var("COMPOSER_VENDOR_DIR", visible.to_string_lossy())
                .build(),
        };
        self.run_tool(&execution, None).await?;
        Ok(())
    }

    /// Phase 8: record extensions the installed packages need
    async fn scan_platform_requirements(
        &self,
        ctx: &PipelineContext,
        files: &ComposerFiles,
        visible: &Path,
    ) -> ComposerResult<(Vec<String>, PathBuf)> {
        self.log.process("Running 'composer check-platform-reqs'");

        let execution = Execution {
            args: vec!["check-platform-reqs".to_string()],
            dir: ctx.working_dir.clone(),
            env: self
                .environment(ctx)
                .var("COMPOSER", files.manifest.to_string_lossy())
                .var("COMPOSER_VENDOR_DIR", visible.to_string_lossy())
                .build(),
        };
        let output = self
            .run_tool(&execution, Some(PARTIALLY_UNMET_EXIT_CODE))
            .await?;

        let extensions = missing_extensions(&parse_requirements(&output.stdout));
        self.log.debug_subprocess(&format!(
            "Ran 'composer check-platform-reqs', found extensions '{}'",
            extensions.join(", ")
        ));

        let path = platform::write_extensions_ini(&ctx.working_dir, &extensions).await?;
        debug!("Wrote {} extension(s) to {}", extensions.len(), path.display());

        Ok((extensions, path))
    }

    /// Variables shared by every phase
    fn environment(&self, ctx: &PipelineContext) -> EnvironmentBuilder<'a> {
        EnvironmentBuilder::new(&self.config.ambient)
            .var("PHPRC", ctx.phprc())
            .path(&ctx.base_path, ctx.path_prefix())
    }

    /// Run one phase's command.
    ///
    /// On failure the captured output is written to the build log before
    /// the error is returned. `tolerated_exit` is treated as success.
    async fn run_tool(
        &self,
        execution: &Execution,
        tolerated_exit: Option<i32>,
    ) -> ComposerResult<ProcessOutput> {
        let mut output = ProcessOutput::default();
        let command_line = execution.command_line();

        match self.executable.execute(execution, &mut output).await {
            Ok(()) => {}
            Err(e) if tolerated_exit.is_some() && e.exit_code() == tolerated_exit => {
                debug!("'{}' exited with tolerated status {:?}", command_line, tolerated_exit);
            }
            Err(e) => {
                self.log.subprocess(&output.combined);
                return Err(e);
            }
        }

        self.log.debug_subprocess(&output.combined);
        self.log.debug_subprocess(&format!("Ran '{}'", command_line));
        Ok(output)
    }

    fn log_types(&self, prefix: &str, layer: &Layer) {
        self.log.debug_subprocess(&format!(
            "{}: launch=[{}], build=[{}], cache=[{}]",
            prefix, layer.types.launch, layer.types.build, layer.types.cache
        ));
    }

    async fn list_vendor(&self, vendor: &Path) -> ComposerResult<()> {
        self.log
            .debug_process(&format!("Listing files in {}:", vendor.display()));
        for name in list_dir(vendor).await? {
            self.log.debug_detail(&format!("- {}", name));
        }
        Ok(())
    }
}

/// php.ini for composer: the PHP buildpack's extension dir plus openssl
pub fn render_php_ini(extension_dir: &str) -> String {
    format!(
        "[PHP]\nextension_dir = \"{}\"\nextension = openssl.so",
        extension_dir
    )
}

/// Sorted entry names of a directory; empty when it does not exist
async fn list_dir(dir: &Path) -> ComposerResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ComposerError::io(format!("listing {}", dir.display()), e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ComposerError::io(format!("listing {}", dir.display()), e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
