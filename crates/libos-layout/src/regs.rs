//! Saved general-purpose register file.
//!
//! Every variant is `repr(C)` with word-sized fields only, so it has no
//! padding and its size is a multiple of 16.

use cfg_if::cfg_if;
use core::mem::offset_of;

/// Accessors the shim needs on a saved register file.
pub trait RegisterFile: Clone + Copy + Sized {
    fn sp(&self) -> usize;
    fn set_sp(&mut self, sp: usize);

    fn ip(&self) -> usize;
    fn set_ip(&mut self, ip: usize);

    fn syscall_number(&self) -> usize;
    fn arg(&self, idx: usize) -> usize;
}

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct ShimRegs {
            pub orig_rax: u64,
            pub rsp: u64,
            pub r15: u64,
            pub r14: u64,
            pub r13: u64,
            pub r12: u64,
            pub r11: u64,
            pub r10: u64,
            pub r9: u64,
            pub r8: u64,
            pub rcx: u64,
            pub rdx: u64,
            pub rsi: u64,
            pub rdi: u64,
            pub rbx: u64,
            pub rbp: u64,
            pub rflags: u64,
            pub rip: u64,
        }

        impl ShimRegs {
            pub const WORDS: usize = 18;
            pub const SP_OFFSET: usize = offset_of!(ShimRegs, rsp);
            pub const IP_OFFSET: usize = offset_of!(ShimRegs, rip);

            pub const fn new() -> Self {
                Self {
                    orig_rax: 0,
                    rsp: 0,
                    r15: 0,
                    r14: 0,
                    r13: 0,
                    r12: 0,
                    r11: 0,
                    r10: 0,
                    r9: 0,
                    r8: 0,
                    rcx: 0,
                    rdx: 0,
                    rsi: 0,
                    rdi: 0,
                    rbx: 0,
                    rbp: 0,
                    rflags: 0,
                    rip: 0,
                }
            }
        }

        impl RegisterFile for ShimRegs {
            fn sp(&self) -> usize {
                self.rsp as usize
            }
            fn set_sp(&mut self, sp: usize) {
                self.rsp = sp as u64;
            }
            fn ip(&self) -> usize {
                self.rip as usize
            }
            fn set_ip(&mut self, ip: usize) {
                self.rip = ip as u64;
            }
            fn syscall_number(&self) -> usize {
                self.orig_rax as usize
            }
            #[inline(always)]
            fn arg(&self, idx: usize) -> usize {
                let reg = match idx {
                    0 => self.rdi,
                    1 => self.rsi,
                    2 => self.rdx,
                    3 => self.r10,
                    4 => self.r8,
                    5 => self.r9,
                    _ => 0,
                };
                reg as usize
            }
        }
    } else if #[cfg(target_arch = "aarch64")] {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct ShimRegs {
            pub x: [u64; 31],
            pub sp: u64,
            pub pc: u64,
            pub pstate: u64,
        }

        impl ShimRegs {
            pub const WORDS: usize = 34;
            pub const SP_OFFSET: usize = offset_of!(ShimRegs, sp);
            pub const IP_OFFSET: usize = offset_of!(ShimRegs, pc);

            pub const fn new() -> Self {
                Self {
                    x: [0; 31],
                    sp: 0,
                    pc: 0,
                    pstate: 0,
                }
            }
        }

        impl RegisterFile for ShimRegs {
            fn sp(&self) -> usize {
                self.sp as usize
            }
            fn set_sp(&mut self, sp: usize) {
                self.sp = sp as u64;
            }
            fn ip(&self) -> usize {
                self.pc as usize
            }
            fn set_ip(&mut self, ip: usize) {
                self.pc = ip as u64;
            }
            fn syscall_number(&self) -> usize {
                self.x[8] as usize
            }
            #[inline(always)]
            fn arg(&self, idx: usize) -> usize {
                if idx < 6 {
                    self.x[idx] as usize
                } else {
                    0
                }
            }
        }
    } else if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
        #[repr(C)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct ShimRegs {
            pub ra: usize,
            pub sp: usize,
            pub gp: usize,
            pub tp: usize,
            pub t0: usize,
            pub t1: usize,
            pub t2: usize,
            pub s0: usize,
            pub s1: usize,
            pub a0: usize,
            pub a1: usize,
            pub a2: usize,
            pub a3: usize,
            pub a4: usize,
            pub a5: usize,
            pub a6: usize,
            pub a7: usize,
            pub s2: usize,
            pub s3: usize,
            pub s4: usize,
            pub s5: usize,
            pub s6: usize,
            pub s7: usize,
            pub s8: usize,
            pub s9: usize,
            pub s10: usize,
            pub s11: usize,
            pub t3: usize,
            pub t4: usize,
            pub t5: usize,
            pub t6: usize,

            pub pc: usize,
        }

        impl ShimRegs {
            pub const WORDS: usize = 32;
            pub const SP_OFFSET: usize = offset_of!(ShimRegs, sp);
            pub const IP_OFFSET: usize = offset_of!(ShimRegs, pc);

            pub const fn new() -> Self {
                Self {
                    ra: 0,
                    sp: 0,
                    gp: 0,
                    tp: 0,
                    t0: 0,
                    t1: 0,
                    t2: 0,
                    s0: 0,
                    s1: 0,
                    a0: 0,
                    a1: 0,
                    a2: 0,
                    a3: 0,
                    a4: 0,
                    a5: 0,
                    a6: 0,
                    a7: 0,
                    s2: 0,
                    s3: 0,
                    s4: 0,
                    s5: 0,
                    s6: 0,
                    s7: 0,
                    s8: 0,
                    s9: 0,
                    s10: 0,
                    s11: 0,
                    t3: 0,
                    t4: 0,
                    t5: 0,
                    t6: 0,
                    pc: 0,
                }
            }
        }

        impl RegisterFile for ShimRegs {
            fn sp(&self) -> usize {
                self.sp
            }
            fn set_sp(&mut self, sp: usize) {
                self.sp = sp;
            }
            fn ip(&self) -> usize {
                self.pc
            }
            fn set_ip(&mut self, ip: usize) {
                self.pc = ip;
            }
            fn syscall_number(&self) -> usize {
                self.a7
            }
            #[inline(always)]
            fn arg(&self, idx: usize) -> usize {
                match idx {
                    0 => self.a0,
                    1 => self.a1,
                    2 => self.a2,
                    3 => self.a3,
                    4 => self.a4,
                    5 => self.a5,
                    _ => 0,
                }
            }
        }
    }
}

pub type PtRegs = ShimRegs;

const _: () = assert!(core::mem::size_of::<ShimRegs>() == ShimRegs::WORDS * core::mem::size_of::<ShimRegsWord>());
const _: () = assert!(core::mem::size_of::<ShimRegs>() % 16 == 0);

cfg_if! {
    if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
        type ShimRegsWord = usize;
    } else {
        type ShimRegsWord = u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sp_and_ip_round_trip() {
        let mut regs = ShimRegs::new();
        regs.set_sp(0x7fff_0000);
        regs.set_ip(0x40_1000);
        assert_eq!(regs.sp(), 0x7fff_0000);
        assert_eq!(regs.ip(), 0x40_1000);
        assert_eq!(regs, {
            let mut expected = ShimRegs::default();
            expected.set_sp(0x7fff_0000);
            expected.set_ip(0x40_1000);
            expected
        });
    }

    #[test]
    fn test_sp_offset_points_at_sp() {
        let mut regs = ShimRegs::new();
        regs.set_sp(0x1234_5670);
        regs.set_ip(0xabc0);

        let base = &regs as *const ShimRegs as *const u8;
        let sp = unsafe { base.add(ShimRegs::SP_OFFSET).cast::<ShimRegsWord>().read() };
        let ip = unsafe { base.add(ShimRegs::IP_OFFSET).cast::<ShimRegsWord>().read() };
        assert_eq!(sp as usize, 0x1234_5670);
        assert_eq!(ip as usize, 0xabc0);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_syscall_arguments_follow_kernel_abi() {
        let regs = ShimRegs {
            orig_rax: 60,
            rdi: 1,
            rsi: 2,
            rdx: 3,
            r10: 4,
            r8: 5,
            r9: 6,
            rcx: 99,
            ..ShimRegs::new()
        };
        assert_eq!(regs.syscall_number(), 60);
        let args: [usize; 6] = core::array::from_fn(|i| regs.arg(i));
        assert_eq!(args, [1, 2, 3, 4, 5, 6]);
        assert_eq!(regs.arg(6), 0);
        assert_eq!(core::mem::size_of::<ShimRegs>(), 144);
    }
}
