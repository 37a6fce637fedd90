#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    /// Byte offset of a field path inside a root type.
    Offset = 1,
    /// `size_of` a type.
    Size = 2,
    /// A plain constant exported as-is.
    Define = 3,
}

impl ConstantKind {
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Offset),
            2 => Some(Self::Size),
            3 => Some(Self::Define),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Size => "size",
            Self::Define => "define",
        }
    }
}

/// One resolved declaration.
///
/// `root` and `path` keep the declaration's spelling for diagnostics: the root
/// type and dotted field path for offsets, the measured type for sizes, and
/// both empty for plain defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant {
    pub name: &'static str,
    pub kind: ConstantKind,
    pub root: &'static str,
    pub path: &'static str,
    pub value: u64,
}

impl Constant {
    pub const fn offset(
        name: &'static str,
        root: &'static str,
        path: &'static str,
        value: usize,
    ) -> Self {
        Self {
            name,
            kind: ConstantKind::Offset,
            root,
            path,
            value: value as u64,
        }
    }

    pub const fn size(name: &'static str, ty: &'static str, value: usize) -> Self {
        Self {
            name,
            kind: ConstantKind::Size,
            root: ty,
            path: "",
            value: value as u64,
        }
    }

    pub const fn define(name: &'static str, value: usize) -> Self {
        Self {
            name,
            kind: ConstantKind::Define,
            root: "",
            path: "",
            value: value as u64,
        }
    }
}

/// Immutable name to value table. Names are unique; construction in a
/// `static` fails the build otherwise.
#[derive(Debug, Clone, Copy)]
pub struct ConstantTable {
    entries: &'static [Constant],
}

impl ConstantTable {
    pub const fn new(entries: &'static [Constant]) -> Self {
        let mut i = 0;
        while i < entries.len() {
            let mut j = i + 1;
            while j < entries.len() {
                assert!(
                    !str_eq(entries[i].name, entries[j].name),
                    "duplicate constant name in offset table"
                );
                j += 1;
            }
            i += 1;
        }
        Self { entries }
    }

    pub const fn entries(&self) -> &'static [Constant] {
        self.entries
    }

    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn find(&self, name: &str) -> Option<&'static Constant> {
        let entries = self.entries;
        let mut i = 0;
        while i < entries.len() {
            if str_eq(entries[i].name, name) {
                return Some(&entries[i]);
            }
            i += 1;
        }
        None
    }

    pub const fn get(&self, name: &str) -> Option<u64> {
        match self.find(name) {
            Some(constant) => Some(constant.value),
            None => None,
        }
    }

    pub fn iter(&self) -> core::slice::Iter<'static, Constant> {
        self.entries.iter()
    }
}

impl IntoIterator for &ConstantTable {
    type Item = &'static Constant;
    type IntoIter = core::slice::Iter<'static, Constant>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

const fn str_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}
