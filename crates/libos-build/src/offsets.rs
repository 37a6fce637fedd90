//! `cargo shim offsets`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{debug, info, warn};

use crate::cargo::{build_declaration_unit, host_triple};
use crate::config::{Config, CONFIG_FILE};
use crate::extract::extract_artifact;
use crate::findup::workspace_root;
use crate::render::{render, write_if_changed, Format, WriteOutcome};
use crate::triple::TargetConfig;

/// Extract the shim offset table and regenerate the configured outputs
#[derive(Args, Debug, Clone, Default)]
pub struct OffsetsArgs {
    /// Config file (default: shim-offsets.toml at the workspace root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Target triple to extract for (default: config, then host)
    #[arg(long, env = "SHIM_OFFSETS_TARGET")]
    pub target: Option<String>,

    /// Cargo profile used to build the declaration unit
    #[arg(long)]
    pub profile: Option<String>,

    /// Package holding the declarations
    #[arg(long, short = 'p')]
    pub package: Option<String>,

    /// Read this rlib/object instead of building
    #[arg(long)]
    pub artifact: Option<PathBuf>,

    /// Fail if any output is out of date instead of rewriting it
    #[arg(long)]
    pub check: bool,

    /// Print the table to stdout in the given format
    #[arg(long, value_enum)]
    pub print: Option<Format>,
}

pub fn run(args: OffsetsArgs) -> Result<()> {
    let root = workspace_root()?;
    let config_path = args.config.clone().unwrap_or_else(|| root.join(CONFIG_FILE));
    let config = if config_path.exists() {
        Config::load(&config_path)?
    } else if args.config.is_some() {
        bail!("config file {} not found", config_path.display());
    } else {
        warn!(path = %config_path.display(), "no config file, using defaults");
        Config::default()
    };
    let config = apply_overrides(config, &args);
    debug!(?config, "resolved config");

    let triple = match &config.target {
        Some(t) => t.clone(),
        None => host_triple()?,
    };
    let target = TargetConfig::parse(&triple)?;

    let artifact = match &args.artifact {
        Some(path) => path.clone(),
        None => {
            build_declaration_unit(&root, &config.package, &triple, &config.profile, None)?
        }
    };
    info!(artifact = %artifact.display(), "extracting offsets");

    let data =
        std::fs::read(&artifact).with_context(|| format!("reading {}", artifact.display()))?;
    let table = extract_artifact(&data).with_context(|| format!("in {}", artifact.display()))?;
    table.check_target(&target)?;
    table.check_required(&config.require)?;

    if let Some(format) = args.print {
        print!("{}", render(&table, format)?);
    }

    let mut stale = Vec::new();
    for output in &config.outputs {
        let text = render(&table, output.format)?;
        if write_if_changed(&output.path, &text, args.check)? == WriteOutcome::Stale {
            stale.push(output.path.display().to_string());
        }
    }
    if !stale.is_empty() {
        bail!(
            "generated offsets are out of date: {} (rerun `cargo shim offsets`)",
            stale.join(", ")
        );
    }

    info!(
        constants = table.constants.len(),
        outputs = config.outputs.len(),
        target = %triple,
        "offsets up to date"
    );
    Ok(())
}

fn apply_overrides(mut config: Config, args: &OffsetsArgs) -> Config {
    if let Some(target) = &args.target {
        config.target = Some(target.clone());
    }
    if let Some(profile) = &args.profile {
        config.profile = profile.clone();
    }
    if let Some(package) = &args.package {
        config.package = package.clone();
    }
    config
}
