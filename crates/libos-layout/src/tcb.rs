use core::ffi::c_void;
use core::ptr;

use crate::context::ShimContext;
use crate::offsets::SHIM_TCB_OFFSET;

pub const SHIM_TCB_CANARY: u64 = 0xdead_beef;

/// Per-thread shim state, embedded in [`LibcTcb`].
#[repr(C)]
pub struct ShimTcb {
    pub canary: u64,
    pub self_ptr: *mut ShimTcb,
    /// Runtime thread object, opaque to the layout.
    pub thread: *mut c_void,
    pub context: ShimContext,
    pub tid: u32,
    pub pal_errno: i32,
    pub debug_buf: *mut c_void,
}

pub type ThreadControlBlock = ShimTcb;

impl Default for ShimTcb {
    fn default() -> Self {
        Self::new()
    }
}

impl ShimTcb {
    pub const fn new() -> Self {
        Self {
            canary: SHIM_TCB_CANARY,
            self_ptr: ptr::null_mut(),
            thread: ptr::null_mut(),
            context: ShimContext::new(),
            tid: 0,
            pal_errno: 0,
            debug_buf: ptr::null_mut(),
        }
    }

    /// Resets the block in place. The block must not move afterwards.
    pub fn init(&mut self, tid: u32) {
        *self = Self::new();
        let this: *mut ShimTcb = self;
        self.self_ptr = this;
        self.tid = tid;
    }

    pub fn is_valid(&self) -> bool {
        self.canary == SHIM_TCB_CANARY && ptr::eq(self.self_ptr, self)
    }
}

/// Thread-local base block owned by the libc/PAL side.
///
/// The prefix mirrors glibc's `tcbhead_t` so `%fs:0x28` keeps pointing at
/// the stack guard on x86_64.
#[repr(C)]
pub struct LibcTcb {
    pub tcb: *mut LibcTcb,
    pub dtv: *mut c_void,
    pub self_ptr: *mut LibcTcb,
    pub multiple_threads: i32,
    pub gscope_flag: i32,
    pub sysinfo: usize,
    pub stack_guard: usize,
    pub pointer_guard: usize,
    pub shim_tcb: ShimTcb,
}

impl Default for LibcTcb {
    fn default() -> Self {
        Self::new()
    }
}

impl LibcTcb {
    pub const fn new() -> Self {
        Self {
            tcb: ptr::null_mut(),
            dtv: ptr::null_mut(),
            self_ptr: ptr::null_mut(),
            multiple_threads: 0,
            gscope_flag: 0,
            sysinfo: 0,
            stack_guard: 0,
            pointer_guard: 0,
            shim_tcb: ShimTcb::new(),
        }
    }

    /// Points the self references at this block and initialises the
    /// embedded shim block. The block must not move afterwards.
    pub fn init(&mut self, tid: u32) {
        let this: *mut LibcTcb = self;
        self.tcb = this;
        self.self_ptr = this;
        self.shim_tcb.init(tid);
    }
}

/// Locates the shim block the way entry code does: thread-local base plus
/// `SHIM_TCB_OFFSET`.
///
/// # Safety
/// `base` must point to a live `LibcTcb`.
#[inline(always)]
pub unsafe fn shim_tcb_from_base(base: *mut LibcTcb) -> *mut ShimTcb {
    unsafe { base.cast::<u8>().add(SHIM_TCB_OFFSET).cast::<ShimTcb>() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offsets::{TCB_RET_IP, TCB_SP, TCB_SYSCALL_NR};

    #[test]
    fn test_init_sets_self_references() {
        let mut tcb = LibcTcb::new();
        assert!(!tcb.shim_tcb.is_valid());

        tcb.init(7);
        assert!(ptr::eq(tcb.tcb, &tcb));
        assert!(ptr::eq(tcb.self_ptr, &tcb));
        assert!(tcb.shim_tcb.is_valid());
        assert_eq!(tcb.shim_tcb.tid, 7);
        assert!(!tcb.shim_tcb.context.in_syscall());
    }

    #[test]
    fn test_corrupt_canary_is_detected() {
        let mut tcb = ShimTcb::new();
        tcb.init(1);
        tcb.canary = 0;
        assert!(!tcb.is_valid());
    }

    #[test]
    fn test_base_pointer_reaches_shim_block() {
        let mut tcb = LibcTcb::new();
        tcb.init(3);
        let base: *mut LibcTcb = &mut tcb;

        let shim = unsafe { shim_tcb_from_base(base) };
        assert!(ptr::eq(shim, unsafe { &raw mut (*base).shim_tcb }));
        assert!(unsafe { (*shim).is_valid() });
    }

    #[test]
    fn test_raw_offsets_alias_typed_fields() {
        let mut tcb = LibcTcb::new();
        tcb.init(9);
        let base: *mut LibcTcb = &mut tcb;

        unsafe {
            let shim = shim_tcb_from_base(base).cast::<u8>();
            shim.add(TCB_SYSCALL_NR).cast::<i64>().write(231);
            shim.add(TCB_SP).cast::<usize>().write(0x7fff_1000);
            shim.add(TCB_RET_IP).cast::<usize>().write(0x40_2000);

            let ctx = &(*base).shim_tcb.context;
            assert_eq!(ctx.syscall_nr(), Some(231));
            assert_eq!(ctx.sp, 0x7fff_1000);
            assert_eq!(ctx.ret_ip, 0x40_2000);
        }
    }
}
