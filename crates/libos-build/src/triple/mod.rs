mod arch;
mod target;

pub use arch::{extract_base_arch, get_arch_spec, object_arch_name, ArchSpec};
pub use target::TargetConfig;
