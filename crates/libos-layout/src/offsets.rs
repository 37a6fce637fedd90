//! Offsets and sizes consumed by the shim's entry/exit assembly.
//!
//! Entry code written with `asm!`/`global_asm!` takes these consts directly
//! as `const` operands. The same values are left as marker records in the
//! compiled object so `cargo shim offsets` can emit headers for non-Rust
//! consumers.

use core::mem::offset_of;

use crate::context::ShimContext;
use crate::regs::ShimRegs;
use crate::tcb::{LibcTcb, ShimTcb};

libos_offsets::declare_constants! {
    pub static SHIM_OFFSETS;

    offset(SHIM_TCB_OFFSET, LibcTcb, shim_tcb => ShimTcb);

    offset(TCB_CANARY, ShimTcb, canary => u64);
    offset(TCB_SELF, ShimTcb, self_ptr => *mut ShimTcb);
    offset(TCB_SYSCALL_NR, ShimTcb, context.syscall_nr => i64);
    offset(TCB_SP, ShimTcb, context.sp => usize);
    offset(TCB_RET_IP, ShimTcb, context.ret_ip => usize);
    offset(TCB_REGS, ShimTcb, context.regs => ShimRegs);
    size(SHIM_TCB_SIZE, ShimTcb);

    size(SHIM_REGS_SIZE, ShimRegs);
    define(SHIM_REGS_SP, ShimRegs::SP_OFFSET);
    define(SHIM_REGS_IP, ShimRegs::IP_OFFSET);

    define(RED_ZONE_SIZE, crate::stack::RED_ZONE_SIZE);
}

const _: () = assert!(SHIM_REGS_SIZE % 16 == 0);
const _: () = assert!(TCB_REGS + SHIM_REGS_SIZE <= SHIM_TCB_SIZE);
const _: () = assert!(SHIM_REGS_SP < SHIM_REGS_SIZE && SHIM_REGS_IP < SHIM_REGS_SIZE);

// The context is packed: syscall_nr, sp, ret_ip, then the register file.
#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(offset_of!(ShimContext, syscall_nr) == 0);
    assert!(TCB_SP == TCB_SYSCALL_NR + 8);
    assert!(TCB_RET_IP == TCB_SP + 8);
    assert!(TCB_REGS == TCB_RET_IP + 8);
};

// %fs:0x28 is the stack protector slot.
#[cfg(target_arch = "x86_64")]
const _: () = assert!(offset_of!(LibcTcb, stack_guard) == 0x28);
