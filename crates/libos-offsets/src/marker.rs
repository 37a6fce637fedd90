//! Fixed-size records left in the object file for each declared constant.
//!
//! Layout (72 bytes, no padding):
//!
//! | bytes  | field      |
//! |--------|------------|
//! | 0..4   | magic `SHOF` |
//! | 4      | kind       |
//! | 5      | name length |
//! | 6..64  | name, zero padded |
//! | 64..72 | value, target byte order |

use core::fmt;

use crate::table::ConstantKind;
use crate::target::{POINTER_WIDTH, TARGET_ARCH};

pub const MARKER_MAGIC: [u8; 4] = *b"SHOF";
pub const MARKER_SIZE: usize = 72;
pub const NAME_CAPACITY: usize = 58;

/// Kind byte of the record describing the compilation target. Its name is the
/// target arch and its value the pointer width in bits.
pub const KIND_TARGET: u8 = 0xff;

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Marker {
    magic: [u8; 4],
    kind: u8,
    name_len: u8,
    name: [u8; NAME_CAPACITY],
    value: u64,
}

const _: () = assert!(core::mem::size_of::<Marker>() == MARKER_SIZE);

impl Marker {
    pub const fn new(kind: ConstantKind, name: &str, value: u64) -> Self {
        Self::with_kind(kind as u8, name, value)
    }

    pub const fn target() -> Self {
        Self::with_kind(KIND_TARGET, TARGET_ARCH, POINTER_WIDTH)
    }

    const fn with_kind(kind: u8, name: &str, value: u64) -> Self {
        let bytes = name.as_bytes();
        assert!(!bytes.is_empty(), "marker name must not be empty");
        assert!(
            bytes.len() <= NAME_CAPACITY,
            "marker name does not fit in a marker record"
        );

        let mut buf = [0u8; NAME_CAPACITY];
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            assert!(
                b.is_ascii_alphanumeric() || b == b'_',
                "marker names must be identifiers"
            );
            buf[i] = b;
            i += 1;
        }

        Self {
            magic: MARKER_MAGIC,
            kind,
            name_len: bytes.len() as u8,
            name: buf,
            value,
        }
    }

    pub fn as_bytes(&self) -> &[u8; MARKER_SIZE] {
        // SAFETY: `Marker` is `repr(C)`, exactly MARKER_SIZE bytes and has no padding.
        unsafe { &*(self as *const Self as *const [u8; MARKER_SIZE]) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerError {
    Truncated(usize),
    BadMagic([u8; 4]),
    BadKind(u8),
    BadName,
}

impl fmt::Display for MarkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated(len) => write!(f, "marker record truncated to {len} bytes"),
            Self::BadMagic(magic) => write!(f, "bad marker magic {magic:02x?}"),
            Self::BadKind(kind) => write!(f, "unknown marker kind {kind:#04x}"),
            Self::BadName => f.write_str("marker name is not a valid identifier"),
        }
    }
}

/// A decoded marker. `kind` is `None` for the target record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRecord<'a> {
    pub kind: Option<ConstantKind>,
    pub name: &'a str,
    pub value: u64,
}

impl<'a> MarkerRecord<'a> {
    pub fn decode(bytes: &'a [u8], big_endian: bool) -> Result<Self, MarkerError> {
        if bytes.len() < MARKER_SIZE {
            return Err(MarkerError::Truncated(bytes.len()));
        }
        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if magic != MARKER_MAGIC {
            return Err(MarkerError::BadMagic(magic));
        }

        let kind = match bytes[4] {
            KIND_TARGET => None,
            other => Some(ConstantKind::from_u8(other).ok_or(MarkerError::BadKind(other))?),
        };

        let name_len = bytes[5] as usize;
        if name_len == 0 || name_len > NAME_CAPACITY {
            return Err(MarkerError::BadName);
        }
        let name = core::str::from_utf8(&bytes[6..6 + name_len]).map_err(|_| MarkerError::BadName)?;
        if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(MarkerError::BadName);
        }

        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[64..72]);
        let value = if big_endian {
            u64::from_be_bytes(raw)
        } else {
            u64::from_le_bytes(raw)
        };

        Ok(Self { kind, name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_decodes_in_native_order() {
        let marker = Marker::new(ConstantKind::Offset, "TCB_SP", 32);
        let record = MarkerRecord::decode(marker.as_bytes(), cfg!(target_endian = "big")).unwrap();
        assert_eq!(record.kind, Some(ConstantKind::Offset));
        assert_eq!(record.name, "TCB_SP");
        assert_eq!(record.value, 32);
    }

    #[test]
    fn test_target_marker() {
        let marker = Marker::target();
        let record = MarkerRecord::decode(marker.as_bytes(), cfg!(target_endian = "big")).unwrap();
        assert_eq!(record.kind, None);
        assert_eq!(record.name, TARGET_ARCH);
        assert_eq!(record.value, usize::BITS as u64);
    }

    #[test]
    fn test_name_fills_capacity() {
        let name = "A234567890123456789012345678901234567890123456789012345678";
        assert_eq!(name.len(), NAME_CAPACITY);
        let marker = Marker::new(ConstantKind::Define, name, 1);
        let record = MarkerRecord::decode(marker.as_bytes(), cfg!(target_endian = "big")).unwrap();
        assert_eq!(record.name, name);
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_name_too_long() {
        let _ = Marker::new(
            ConstantKind::Define,
            "A2345678901234567890123456789012345678901234567890123456789",
            1,
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let mut bytes = *Marker::new(ConstantKind::Size, "SHIM_REGS_SIZE", 144).as_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            MarkerRecord::decode(&bytes, false),
            Err(MarkerError::BadMagic(_))
        ));

        let mut bytes = *Marker::new(ConstantKind::Size, "SHIM_REGS_SIZE", 144).as_bytes();
        bytes[4] = 9;
        assert_eq!(MarkerRecord::decode(&bytes, false), Err(MarkerError::BadKind(9)));

        assert_eq!(
            MarkerRecord::decode(&bytes[..40], false),
            Err(MarkerError::Truncated(40))
        );
    }

    #[test]
    fn test_decode_big_endian_value() {
        let mut bytes = *Marker::new(ConstantKind::Offset, "TCB_REGS", 0).as_bytes();
        bytes[64..72].copy_from_slice(&48u64.to_be_bytes());
        let record = MarkerRecord::decode(&bytes, true).unwrap();
        assert_eq!(record.value, 48);
    }
}
