//! Thin wrappers around `rustc` and `cargo` invocations.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

fn rustc() -> String {
    std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string())
}

fn cargo() -> String {
    std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string())
}

/// Host triple as reported by `rustc -vV`.
pub fn host_triple() -> Result<String> {
    let output = Command::new(rustc())
        .arg("-vV")
        .output()
        .context("running rustc -vV")?;
    if !output.status.success() {
        bail!("rustc -vV exited with {}", output.status);
    }
    parse_host_triple(&String::from_utf8_lossy(&output.stdout))
}

fn parse_host_triple(version: &str) -> Result<String> {
    version
        .lines()
        .find_map(|line| line.strip_prefix("host: "))
        .map(|host| host.trim().to_string())
        .ok_or_else(|| anyhow!("no `host:` line in rustc -vV output"))
}

#[derive(Debug, Deserialize)]
struct ArtifactTarget {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
enum Message {
    CompilerArtifact {
        target: ArtifactTarget,
        filenames: Vec<PathBuf>,
    },
    #[serde(other)]
    Other,
}

/// Picks the package's rlib out of cargo's JSON message stream.
pub fn find_rlib<I, S>(package: &str, lines: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let crate_name = package.replace('-', "_");
    let mut found = None;
    for line in lines {
        let line = line.as_ref();
        if !line.starts_with('{') {
            continue;
        }
        let Ok(Message::CompilerArtifact { target, filenames }) = serde_json::from_str(line) else {
            continue;
        };
        if target.name.replace('-', "_") != crate_name {
            continue;
        }
        if let Some(rlib) = filenames
            .into_iter()
            .find(|f| f.extension().is_some_and(|e| e == "rlib"))
        {
            found = Some(rlib);
        }
    }
    found
}

/// Environment variable overriding `lto` for a cargo profile.
pub fn profile_lto_var(profile: &str) -> String {
    let profile = match profile {
        "debug" => "dev",
        "bench" => "release",
        other => other,
    };
    format!(
        "CARGO_PROFILE_{}_LTO",
        profile.to_ascii_uppercase().replace('-', "_")
    )
}

/// Builds `package`'s library for `target` and returns the rlib path.
///
/// LTO is forced off: an LTO rlib carries LLVM bitcode instead of object
/// code, and the marker sections only exist in object code.
pub fn build_declaration_unit(
    workspace: &Path,
    package: &str,
    target: &str,
    profile: &str,
    target_dir: Option<&Path>,
) -> Result<PathBuf> {
    info!(package, target, profile, "building declaration unit");

    let mut cmd = Command::new(cargo());
    cmd.current_dir(workspace)
        .args(["build", "--lib", "--message-format=json-render-diagnostics"])
        .args(["-p", package])
        .args(["--target", target])
        .args(["--profile", profile])
        .env(profile_lto_var(profile), "off")
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    if let Some(dir) = target_dir {
        cmd.arg("--target-dir").arg(dir);
    }
    debug!(?cmd, "spawning cargo");

    let mut child = cmd.spawn().context("spawning cargo build")?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("cargo stdout was not captured"))?;
    let lines: Vec<String> = std::io::BufReader::new(stdout)
        .lines()
        .collect::<std::io::Result<_>>()
        .context("reading cargo output")?;

    let status = child.wait().context("waiting for cargo build")?;
    if !status.success() {
        bail!("cargo build -p {package} --target {target} failed with {status}");
    }

    find_rlib(package, &lines)
        .ok_or_else(|| anyhow!("cargo did not report an rlib for `{package}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_triple() {
        let out = "rustc 1.82.0 (f6e511eec 2024-10-15)\n\
                   binary: rustc\n\
                   host: x86_64-unknown-linux-gnu\n\
                   release: 1.82.0\n";
        assert_eq!(parse_host_triple(out).unwrap(), "x86_64-unknown-linux-gnu");
        assert!(parse_host_triple("rustc 1.82.0\n").is_err());
    }

    #[test]
    fn test_profile_lto_var() {
        assert_eq!(profile_lto_var("release"), "CARGO_PROFILE_RELEASE_LTO");
        assert_eq!(profile_lto_var("dev"), "CARGO_PROFILE_DEV_LTO");
        assert_eq!(profile_lto_var("bench"), "CARGO_PROFILE_RELEASE_LTO");
        assert_eq!(profile_lto_var("release-lto"), "CARGO_PROFILE_RELEASE_LTO_LTO");
    }

    #[test]
    fn test_find_rlib_matches_package() {
        let lines = [
            r#"{"reason":"compiler-artifact","target":{"name":"libos_offsets"},"filenames":["/t/liblibos_offsets-1.rlib","/t/liblibos_offsets-1.rmeta"]}"#,
            r#"{"reason":"build-script-executed","package_id":"x"}"#,
            r#"{"reason":"compiler-artifact","target":{"name":"libos_layout"},"filenames":["/t/liblibos_layout-2.rmeta","/t/liblibos_layout-2.rlib"]}"#,
            r#"{"reason":"build-finished","success":true}"#,
            "not json",
        ];
        assert_eq!(
            find_rlib("libos-layout", lines),
            Some(PathBuf::from("/t/liblibos_layout-2.rlib"))
        );
        assert_eq!(find_rlib("other", lines), None);
    }
}
