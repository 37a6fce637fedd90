use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub const TARGET_ARCH: &str = "x86_64";
    } else if #[cfg(target_arch = "aarch64")] {
        pub const TARGET_ARCH: &str = "aarch64";
    } else if #[cfg(target_arch = "riscv64")] {
        pub const TARGET_ARCH: &str = "riscv64";
    } else if #[cfg(target_arch = "riscv32")] {
        pub const TARGET_ARCH: &str = "riscv32";
    } else if #[cfg(target_arch = "x86")] {
        pub const TARGET_ARCH: &str = "x86";
    } else if #[cfg(target_arch = "arm")] {
        pub const TARGET_ARCH: &str = "arm";
    } else {
        pub const TARGET_ARCH: &str = "unknown";
    }
}

/// Pointer width in bits of the target this crate was compiled for.
pub const POINTER_WIDTH: u64 = usize::BITS as u64;
