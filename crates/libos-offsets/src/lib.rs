//! Build-time offset tables for code that cannot see Rust types.
//!
//! Entry/exit paths written in assembly index into control blocks with raw
//! byte offsets. [`declare_constants!`] turns each `offset`, `size` or
//! `define` request into a `const` evaluated by the compiler, a
//! [`ConstantTable`] entry, and a [`Marker`] record in the `.shim_offsets`
//! link section that external tooling reads back from the compiled object.

#![no_std]

mod declare;
pub mod marker;
pub mod table;
pub mod target;

pub use marker::{Marker, MarkerError, MarkerRecord, MARKER_SIZE, NAME_CAPACITY};
pub use table::{Constant, ConstantKind, ConstantTable};
pub use target::{POINTER_WIDTH, TARGET_ARCH};

/// Section holding marker records on ELF and COFF objects.
pub const MARKER_SECTION: &str = ".shim_offsets";

/// Section holding marker records on Mach-O objects (`__DATA` segment).
pub const MARKER_SECTION_MACHO: &str = "__shim_offsets";

#[doc(hidden)]
pub mod __private {
    /// Accepts only a projection from `R` to a field of exactly type `F`.
    pub const fn field_has_type<R, F>(_project: fn(&R) -> &F) {}
}
