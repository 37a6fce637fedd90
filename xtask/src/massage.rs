use anyhow::Result;
use clap::Args;

use crate::sh::{ShOptionsBuilder, StreamMode};

/// Massage packages by running cargo fix, clippy, fmt, check and test, then
/// regenerate the offset include files
#[derive(Args, Debug)]
pub struct MassageArgs {
    #[command(flatten)]
    workspace: clap_cargo::Workspace,

    /// Enable verbose output (show warnings)
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// Skip regenerating the offset include files
    #[arg(long)]
    pub no_offsets: bool,
}

/// One shell script and where its stderr goes.
#[derive(Debug)]
struct Step {
    script: String,
    stderr: StreamMode,
}

fn steps(args: &MassageArgs) -> Vec<Step> {
    // Build target flags: either "--workspace" or per-package `-p` flags.
    let target_flags = if args.workspace.workspace || args.workspace.package.is_empty() {
        "--workspace".to_string()
    } else {
        args.workspace
            .package
            .iter()
            .map(|p| format!("-p {p}"))
            .collect::<Vec<_>>()
            .join(" ")
    };
    let total = if args.no_offsets { 5 } else { 6 };

    let quiet = if args.verbose {
        StreamMode::Inherit
    } else {
        StreamMode::Null
    };
    let mut steps = vec![Step {
        script: format!(
            r#"
set -e

echo [1/{total}] Running cargo fix...
cargo fix --allow-dirty --allow-staged --quiet {target_flags}

echo [2/{total}] Running cargo clippy --fix...
cargo clippy --fix --allow-dirty --allow-staged --quiet {target_flags}

echo [3/{total}] Running cargo fmt...
cargo fmt --all --quiet

echo [4/{total}] Running cargo check...
cargo check --quiet {target_flags}

echo [5/{total}] Running cargo test...
RUST_BACKTRACE=1 cargo nextest run --no-tests pass {target_flags}
"#
        ),
        stderr: quiet,
    }];

    // Extraction failures are only reported on stderr.
    if !args.no_offsets {
        steps.push(Step {
            script: r#"
set -e

echo [6/6] Regenerating offsets...
cargo shim offsets
"#
            .to_string(),
            stderr: StreamMode::Inherit,
        });
    }
    steps
}

pub fn run(args: MassageArgs) -> Result<()> {
    for step in steps(&args) {
        let opts = ShOptionsBuilder::default().stderr(step.stderr).build()?;
        crate::sh!(options(opts), step.script)?;
    }
    log::info!("massage finished");
    Ok(())
}
