#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchSpec {
    /// Base architecture as reported by the marker records (e.g. "riscv64").
    pub arch: &'static str,

    /// Native pointer width; ILP32 ABIs narrow it per target.
    pub pointer_width: u64,
    /// C preprocessor condition that holds only when compiling for this arch.
    pub c_condition: &'static str,
    /// Rust `cfg` predicate matching this arch.
    pub rust_cfg: &'static str,
}

pub fn extract_base_arch(arch: &str) -> &str {
    match arch {
        a if a.starts_with("riscv64") => "riscv64",
        a if a.starts_with("riscv32") => "riscv32",
        "x86_64" | "amd64" => "x86_64",
        "aarch64" | "arm64" => "aarch64",
        "i386" | "i586" | "i686" | "x86" => "x86",
        a if a.starts_with("armv") || a.starts_with("thumbv") || a == "arm" => "arm",
        _ => arch,
    }
}

pub fn get_arch_spec(arch: &str) -> Option<ArchSpec> {
    let spec = match extract_base_arch(arch) {
        "x86_64" => ArchSpec {
            arch: "x86_64",
            pointer_width: 64,
            c_condition: "defined(__x86_64__)",
            rust_cfg: "target_arch = \"x86_64\"",
        },
        "aarch64" => ArchSpec {
            arch: "aarch64",
            pointer_width: 64,
            c_condition: "defined(__aarch64__)",
            rust_cfg: "target_arch = \"aarch64\"",
        },
        "riscv64" => ArchSpec {
            arch: "riscv64",
            pointer_width: 64,
            c_condition: "defined(__riscv) && __riscv_xlen == 64",
            rust_cfg: "target_arch = \"riscv64\"",
        },
        "riscv32" => ArchSpec {
            arch: "riscv32",
            pointer_width: 32,
            c_condition: "defined(__riscv) && __riscv_xlen == 32",
            rust_cfg: "target_arch = \"riscv32\"",
        },
        "x86" => ArchSpec {
            arch: "x86",
            pointer_width: 32,
            c_condition: "defined(__i386__)",
            rust_cfg: "target_arch = \"x86\"",
        },
        "arm" => ArchSpec {
            arch: "arm",
            pointer_width: 32,
            c_condition: "defined(__arm__)",
            rust_cfg: "target_arch = \"arm\"",
        },
        _ => return None,
    };
    Some(spec)
}

/// Marker-style arch name for an object file's machine type.
pub fn object_arch_name(arch: object::Architecture) -> Option<&'static str> {
    use object::Architecture;

    match arch {
        Architecture::X86_64 | Architecture::X86_64_X32 => Some("x86_64"),
        Architecture::Aarch64 | Architecture::Aarch64_Ilp32 => Some("aarch64"),
        Architecture::Riscv64 => Some("riscv64"),
        Architecture::Riscv32 => Some("riscv32"),
        Architecture::I386 => Some("x86"),
        Architecture::Arm => Some("arm"),
        _ => None,
    }
}
