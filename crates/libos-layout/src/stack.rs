use cfg_if::cfg_if;
use core::ops::Range;

cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        /// System V AMD64: 128 bytes below `%rsp` belong to the interrupted code.
        pub const RED_ZONE_SIZE: usize = 128;
        pub const STACK_ALIGN: usize = 16;
    } else if #[cfg(target_arch = "aarch64")] {
        pub const RED_ZONE_SIZE: usize = 0;
        pub const STACK_ALIGN: usize = 16;
    } else if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
        pub const RED_ZONE_SIZE: usize = 0;
        pub const STACK_ALIGN: usize = 16;
    }
}

/// Bytes below `sp` that entry code must not touch before moving `sp`.
#[inline]
pub const fn red_zone(sp: usize) -> Range<usize> {
    sp.wrapping_sub(RED_ZONE_SIZE)..sp
}

/// First usable stack pointer for entry code interrupting a frame at `sp`:
/// below the red zone and aligned for the ABI.
#[inline]
pub const fn entry_stack_pointer(sp: usize) -> usize {
    sp.wrapping_sub(RED_ZONE_SIZE) & !(STACK_ALIGN - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_sp_clears_red_zone() {
        for sp in [0x7fff_f000usize, 0x7fff_f008, 0x7fff_effc, 0x1000_0001] {
            let entry = entry_stack_pointer(sp);
            let zone = red_zone(sp);
            assert!(entry <= zone.start, "sp={sp:#x}");
            assert_eq!(entry % STACK_ALIGN, 0);
            assert!(sp - entry < RED_ZONE_SIZE + STACK_ALIGN);
            assert_eq!(zone.end - zone.start, RED_ZONE_SIZE);
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_sysv_red_zone() {
        assert_eq!(RED_ZONE_SIZE, 128);
        assert_eq!(entry_stack_pointer(0x7fff_f100), 0x7fff_f080);
        assert_eq!(entry_stack_pointer(0x7fff_f108), 0x7fff_f080);
    }
}
