//! Text renderings of an extracted offset table.
//!
//! Output depends only on the table: names are sorted, values are decimal and
//! there are no timestamps, so regenerating an unchanged table is a no-op.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::extract::ExtractedTable;
use crate::triple::get_arch_spec;

const BANNER: &str = "Generated by `cargo shim offsets`. Do not edit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// C header with `#define`s.
    C,
    /// GNU assembler `.equ` directives.
    Asm,
    /// Rust `pub const` items.
    Rust,
}

pub fn render(table: &ExtractedTable, format: Format) -> Result<String> {
    let arch = get_arch_spec(&table.target.arch)
        .ok_or_else(|| anyhow!("no output guard known for arch `{}`", table.target.arch))?;
    let target = format!("{} ({}-bit)", arch.arch, table.target.pointer_width);

    let mut out = String::new();
    match format {
        Format::C => {
            let guard = "SHIM_GENERATED_OFFSETS_H";
            writeln!(out, "/* {BANNER} */")?;
            writeln!(out, "/* target: {target} */")?;
            writeln!(out, "#ifndef {guard}")?;
            writeln!(out, "#define {guard}")?;
            writeln!(out)?;
            write_cpp_guard(&mut out, arch.c_condition, table.target.pointer_width, &target)?;
            writeln!(out)?;
            for (name, constant) in &table.constants {
                writeln!(out, "#define {name} {}", constant.value)?;
            }
            writeln!(out)?;
            writeln!(out, "#endif /* {guard} */")?;
        }
        Format::Asm => {
            writeln!(out, "/* {BANNER} */")?;
            writeln!(out, "/* target: {target} */")?;
            writeln!(out)?;
            write_cpp_guard(&mut out, arch.c_condition, table.target.pointer_width, &target)?;
            writeln!(out)?;
            for (name, constant) in &table.constants {
                writeln!(out, ".equ {name}, {}", constant.value)?;
            }
        }
        Format::Rust => {
            writeln!(out, "// {BANNER}")?;
            writeln!(out, "// target: {target}")?;
            writeln!(out)?;
            writeln!(
                out,
                "#[cfg(not(all({}, target_pointer_width = \"{}\")))]",
                arch.rust_cfg, table.target.pointer_width
            )?;
            writeln!(
                out,
                "compile_error!(\"shim offsets were generated for {target}\");"
            )?;
            writeln!(out)?;
            for (name, constant) in &table.constants {
                writeln!(out, "pub const {name}: usize = {};", constant.value)?;
            }
        }
    }
    Ok(out)
}

/// Preprocessor check that stops a C or `.S` build for the wrong target.
fn write_cpp_guard(
    out: &mut String,
    condition: &str,
    pointer_width: u64,
    target: &str,
) -> std::fmt::Result {
    writeln!(
        out,
        "#if !({condition} && __SIZEOF_POINTER__ == {})",
        pointer_width / 8
    )?;
    writeln!(out, "#error \"shim offsets were generated for {target}\"")?;
    writeln!(out, "#endif")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Unchanged,
    Written,
    /// The file differs and `check` forbade writing it.
    Stale,
}

/// Writes `contents` to `path` unless the file already holds exactly that.
pub fn write_if_changed(path: &Path, contents: &str, check: bool) -> Result<WriteOutcome> {
    match std::fs::read(path) {
        Ok(existing) if existing == contents.as_bytes() => {
            debug!(path = %path.display(), "up to date");
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    }

    if check {
        return Ok(WriteOutcome::Stale);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote");
    Ok(WriteOutcome::Written)
}
