use anyhow::{bail, Result};

use super::arch::{extract_base_arch, get_arch_spec};

/// This follows the standard target triple format: {arch}-{vendor}-{sys}[-{abi}]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub arch: String,

    pub vendor: String,

    pub os: String,
    /// ABI (e.g., "musl", "gnu", "" for none)
    pub abi: String,
}

impl TargetConfig {
    /// Parameters follow target triple order: arch, vendor, os, abi
    pub fn new(arch: String, vendor: String, os: String, abi: String) -> Self {
        Self {
            arch,
            vendor,
            os,
            abi,
        }
    }

    pub fn parse(triple: &str) -> Result<Self> {
        let parts: Vec<&str> = triple.split('-').collect();
        if parts.iter().any(|p| p.is_empty()) {
            bail!("malformed target triple `{triple}`");
        }
        let (arch, vendor, os, abi) = match parts.as_slice() {
            [arch, os] => (*arch, "unknown", *os, ""),
            [arch, vendor, os] => (*arch, *vendor, *os, ""),
            [arch, vendor, os, abi] => (*arch, *vendor, *os, *abi),
            _ => bail!("malformed target triple `{triple}`"),
        };
        Ok(Self::new(
            arch.to_string(),
            vendor.to_string(),
            os.to_string(),
            abi.to_string(),
        ))
    }

    /// Format: {arch}-{vendor}-{os}[-{abi}]
    pub fn target_triple(&self) -> String {
        if self.abi.is_empty() {
            format!("{}-{}-{}", self.arch, self.vendor, self.os)
        } else {
            format!("{}-{}-{}-{}", self.arch, self.vendor, self.os, self.abi)
        }
    }

    pub fn base_arch(&self) -> &str {
        extract_base_arch(&self.arch)
    }

    /// Pointer width implied by the triple, accounting for ILP32 ABIs on
    /// 64-bit architectures (`x86_64-*-gnux32`, `aarch64-*-gnu_ilp32`).
    pub fn pointer_width(&self) -> Option<u64> {
        let spec = get_arch_spec(&self.arch)?;
        if spec.pointer_width == 64 && (self.abi.ends_with("x32") || self.abi.contains("ilp32")) {
            Some(32)
        } else {
            Some(spec.pointer_width)
        }
    }
}
