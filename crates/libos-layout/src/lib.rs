//! Layout of the shim's per-thread control block.
//!
//! The libc/PAL thread block ([`LibcTcb`]) embeds the shim block
//! ([`ShimTcb`]) by value, which embeds the execution context
//! ([`ShimContext`]) and the saved register file ([`ShimRegs`]). Entry code
//! reaches any of it from the thread-local base pointer using the constants
//! in [`offsets`].

#![no_std]

pub mod context;
pub mod offsets;
pub mod regs;
pub mod stack;
pub mod tcb;

pub use context::{ExecutionContext, ShimContext, SwitchPoint, NO_SYSCALL};
pub use offsets::SHIM_OFFSETS;
pub use regs::{PtRegs, RegisterFile, ShimRegs};
pub use stack::{entry_stack_pointer, red_zone, RED_ZONE_SIZE, STACK_ALIGN};
pub use tcb::{shim_tcb_from_base, LibcTcb, ShimTcb, ThreadControlBlock, SHIM_TCB_CANARY};
