use crate::offsets::SHIM_REGS_SIZE;
use crate::regs::{RegisterFile, ShimRegs};

/// `syscall_nr` value outside an interception window.
///
/// Reserved: a guest syscall number that reads back as `-1` never opens a
/// window, see [`ShimContext::begin_syscall`].
pub const NO_SYSCALL: i64 = -1;

/// Execution state saved by entry code and restored on the way out.
///
/// Field order is part of the ABI with the entry/exit assembly; see
/// [`crate::offsets`].
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ShimContext {
    /// Syscall being emulated. Only meaningful between interception and the
    /// end of dispatch.
    pub syscall_nr: i64,
    /// Stack pointer saved at a context switch point.
    pub sp: usize,
    /// Return address saved at a context switch point.
    pub ret_ip: usize,
    /// Guest registers, restored once emulation completes.
    pub regs: ShimRegs,
}

pub type ExecutionContext = ShimContext;

/// A saved `(sp, ret_ip)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchPoint {
    pub sp: usize,
    pub ret_ip: usize,
}

impl Default for ShimContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ShimContext {
    pub const fn new() -> Self {
        Self {
            syscall_nr: NO_SYSCALL,
            sp: 0,
            ret_ip: 0,
            regs: ShimRegs::new(),
        }
    }

    /// Opens the interception window for the syscall described by `regs`.
    ///
    /// The registers are saved either way. Returns `None` without opening a
    /// window when the number is [`NO_SYSCALL`]; the caller fails that call
    /// with `ENOSYS`, as the kernel does for `syscall(-1)`.
    pub fn begin_syscall(&mut self, regs: &ShimRegs) -> Option<i64> {
        self.regs = *regs;
        let nr = regs.syscall_number() as i64;
        self.syscall_nr = nr;
        if nr == NO_SYSCALL {
            return None;
        }
        Some(nr)
    }

    pub fn syscall_nr(&self) -> Option<i64> {
        if self.in_syscall() {
            Some(self.syscall_nr)
        } else {
            None
        }
    }

    #[inline]
    pub fn in_syscall(&self) -> bool {
        self.syscall_nr != NO_SYSCALL
    }

    /// Closes the interception window and hands back the registers to restore.
    pub fn end_syscall(&mut self) -> ShimRegs {
        self.syscall_nr = NO_SYSCALL;
        self.regs
    }

    pub fn save_switch_point(&mut self, sp: usize, ret_ip: usize) {
        self.sp = sp;
        self.ret_ip = ret_ip;
    }

    /// Returns the saved switch point and clears it; a second call sees `None`.
    pub fn take_switch_point(&mut self) -> Option<SwitchPoint> {
        if self.sp == 0 && self.ret_ip == 0 {
            return None;
        }
        let point = SwitchPoint {
            sp: self.sp,
            ret_ip: self.ret_ip,
        };
        self.sp = 0;
        self.ret_ip = 0;
        Some(point)
    }

    pub fn regs_bytes(&self) -> &[u8; SHIM_REGS_SIZE] {
        // SAFETY: ShimRegs is repr(C), padding free, and SHIM_REGS_SIZE is its size.
        unsafe { &*(&self.regs as *const ShimRegs as *const [u8; SHIM_REGS_SIZE]) }
    }

    pub fn copy_regs_from(&mut self, raw: &[u8; SHIM_REGS_SIZE]) {
        // SAFETY: every bit pattern is a valid ShimRegs (plain integers).
        self.regs = unsafe { core::ptr::read_unaligned(raw.as_ptr() as *const ShimRegs) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest_regs(nr: usize, sp: usize) -> ShimRegs {
        let mut regs = ShimRegs::new();
        regs.set_sp(sp);
        regs.set_ip(0x40_0000);
        #[cfg(target_arch = "x86_64")]
        {
            regs.orig_rax = nr as u64;
        }
        #[cfg(target_arch = "aarch64")]
        {
            regs.x[8] = nr as u64;
        }
        #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))]
        {
            regs.a7 = nr;
        }
        regs
    }

    #[test]
    fn test_syscall_window() {
        let mut ctx = ShimContext::new();
        assert!(!ctx.in_syscall());
        assert_eq!(ctx.syscall_nr(), None);

        let regs = guest_regs(39, 0x7ffe_0000);
        assert_eq!(ctx.begin_syscall(&regs), Some(39));
        assert_eq!(ctx.syscall_nr(), Some(39));
        assert_eq!(ctx.regs, regs);

        let restored = ctx.end_syscall();
        assert_eq!(restored, regs);
        assert_eq!(ctx.syscall_nr(), None);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_reserved_syscall_number_opens_no_window() {
        let mut ctx = ShimContext::new();
        let regs = guest_regs(usize::MAX, 0x7ffe_0000);

        assert_eq!(ctx.begin_syscall(&regs), None);
        assert!(!ctx.in_syscall());
        assert_eq!(ctx.syscall_nr(), None);
        assert_eq!(ctx.regs, regs);

        // A later real syscall still opens normally.
        assert_eq!(ctx.begin_syscall(&guest_regs(60, 0x7ffe_0000)), Some(60));
        assert!(ctx.in_syscall());
    }

    #[test]
    fn test_switch_point_is_read_once() {
        let mut ctx = ShimContext::new();
        assert_eq!(ctx.take_switch_point(), None);

        ctx.save_switch_point(0x7ffd_0000, 0x40_1234);
        assert_eq!(
            ctx.take_switch_point(),
            Some(SwitchPoint {
                sp: 0x7ffd_0000,
                ret_ip: 0x40_1234
            })
        );
        assert_eq!(ctx.take_switch_point(), None);
    }

    #[test]
    fn test_raw_register_copy_is_bounded_by_size() {
        let mut src = ShimContext::new();
        src.regs = guest_regs(1, 0x7ffc_0000);
        let raw = *src.regs_bytes();
        assert_eq!(raw.len(), core::mem::size_of::<ShimRegs>());

        let mut dst = ShimContext::new();
        dst.copy_regs_from(&raw);
        assert_eq!(dst.regs, src.regs);
        assert_eq!(dst.syscall_nr, NO_SYSCALL);
        assert_eq!(dst.sp, 0);
    }
}
