use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::render::Format;

pub const CONFIG_FILE: &str = "shim-offsets.toml";

/// Contents of `shim-offsets.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Package holding the `declare_constants!` unit.
    #[serde(default = "default_package")]
    pub package: String,

    #[serde(default = "default_profile")]
    pub profile: String,

    /// Target triple; the host triple when absent.
    #[serde(default)]
    pub target: Option<String>,

    /// Names that must be present in the extracted table.
    #[serde(default)]
    pub require: Vec<String>,

    #[serde(default, rename = "output")]
    pub outputs: Vec<OutputConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Relative paths resolve against the directory holding the config file.
    pub path: PathBuf,
    pub format: Format,
}

fn default_package() -> String {
    "libos-layout".to_string()
}

fn default_profile() -> String {
    "dev".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package: default_package(),
            profile: default_profile(),
            target: None,
            require: Vec::new(),
            outputs: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut config =
            Self::from_toml_str(&text).with_context(|| format!("parsing {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for output in &mut config.outputs {
            if output.path.is_relative() {
                output.path = base.join(&output.path);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.package.is_empty() {
            bail!("`package` must not be empty");
        }
        if self.profile.is_empty() {
            bail!("`profile` must not be empty");
        }
        for (i, name) in self.require.iter().enumerate() {
            if self.require[..i].contains(name) {
                bail!("`{name}` listed twice in `require`");
            }
        }
        for (i, output) in self.outputs.iter().enumerate() {
            if self.outputs[..i].iter().any(|o| o.path == output.path) {
                bail!("output `{}` listed twice", output.path.display());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.package, "libos-layout");
        assert_eq!(config.profile, "dev");
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
package = "my-shim"
profile = "release"
target = "riscv64gc-unknown-linux-gnu"
require = ["SHIM_TCB_OFFSET", "TCB_REGS"]

[[output]]
path = "gen/offsets.h"
format = "c"

[[output]]
path = "gen/offsets.S"
format = "asm"
"#,
        )
        .unwrap();

        assert_eq!(config.package, "my-shim");
        assert_eq!(config.target.as_deref(), Some("riscv64gc-unknown-linux-gnu"));
        assert_eq!(config.require, ["SHIM_TCB_OFFSET", "TCB_REGS"]);
        assert_eq!(config.outputs.len(), 2);
        assert_eq!(config.outputs[1].format, Format::Asm);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("packages = \"x\"").is_err());
        assert!(Config::from_toml_str("[[output]]\npath = \"a.h\"\nformat = \"yaml\"").is_err());
    }

    #[test]
    fn test_duplicates_are_rejected() {
        assert!(Config::from_toml_str("require = [\"TCB_SP\", \"TCB_SP\"]").is_err());
        let twice = "[[output]]\npath = \"a.h\"\nformat = \"c\"\n\
                     [[output]]\npath = \"a.h\"\nformat = \"asm\"\n";
        assert!(Config::from_toml_str(twice).is_err());
    }

    #[test]
    fn test_load_resolves_relative_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[[output]]\npath = \"gen/offsets.h\"\nformat = \"c\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.outputs[0].path, dir.path().join("gen/offsets.h"));
    }
}
