fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Fail fast: the register file is only laid out for these architectures.
    let arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    match arch.as_str() {
        "x86_64" | "aarch64" | "riscv64" | "riscv32" => {}
        other => panic!(
            "{} has no register file layout for target_arch `{}` (supported: x86_64, aarch64, riscv64, riscv32).",
            env!("CARGO_PKG_NAME"),
            other
        ),
    }
}
