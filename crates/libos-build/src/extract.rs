//! Reads marker records back out of a compiled declaration unit.
//!
//! The values are copied verbatim from the object file; nothing here knows
//! about struct layout.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use anyhow::{anyhow, bail, ensure, Context, Result};
use libos_offsets::{ConstantKind, MarkerRecord, MARKER_SECTION, MARKER_SECTION_MACHO, MARKER_SIZE};
use object::read::archive::ArchiveFile;
use object::{Object, ObjectSection};
use tracing::{debug, trace};

use crate::triple::{object_arch_name, TargetConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub arch: String,
    pub pointer_width: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedConstant {
    pub kind: ConstantKind,
    pub value: u64,
}

/// Constants found in one artifact, keyed (and therefore ordered) by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub target: TargetInfo,
    /// Machine type of the object files the markers came from, when known.
    pub object_arch: Option<&'static str>,
    pub constants: BTreeMap<String, ExtractedConstant>,
}

impl ExtractedTable {
    pub fn new(target: TargetInfo) -> Self {
        Self {
            target,
            object_arch: None,
            constants: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: &str, kind: ConstantKind, value: u64) -> Result<()> {
        match self.constants.entry(name.to_string()) {
            Entry::Occupied(existing) => bail!(
                "duplicate constant `{name}` ({} {} and {} {value})",
                existing.get().kind.as_str(),
                existing.get().value,
                kind.as_str(),
            ),
            Entry::Vacant(slot) => {
                slot.insert(ExtractedConstant { kind, value });
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.constants.get(name).map(|c| c.value)
    }

    /// Refuses a table compiled for anything other than `target`.
    pub fn check_target(&self, target: &TargetConfig) -> Result<()> {
        let wanted = target.base_arch();
        ensure!(
            self.target.arch == wanted,
            "offsets were extracted for `{}` but the target is `{}` ({wanted})",
            self.target.arch,
            target.target_triple(),
        );
        if let Some(width) = target.pointer_width() {
            ensure!(
                self.target.pointer_width == width,
                "offsets were extracted with {}-bit pointers but `{}` uses {width}-bit pointers",
                self.target.pointer_width,
                target.target_triple(),
            );
        }
        if let Some(object_arch) = self.object_arch {
            ensure!(
                object_arch == self.target.arch,
                "object files are `{object_arch}` but their markers say `{}`",
                self.target.arch,
            );
        }
        Ok(())
    }

    pub fn check_required<S: AsRef<str>>(&self, required: &[S]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.constants.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            bail!("required constant(s) not found: {}", missing.join(", "));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Collector {
    target: Option<TargetInfo>,
    object_arch: Option<&'static str>,
    records: Vec<(String, ConstantKind, u64)>,
}

impl Collector {
    fn scan_object(&mut self, origin: &str, data: &[u8]) -> Result<()> {
        let file = object::File::parse(data).with_context(|| format!("{origin}: not an object file"))?;
        let big_endian = !file.is_little_endian();

        let mut found = false;
        for section in file.sections() {
            let Ok(name) = section.name() else {
                continue;
            };
            if name != MARKER_SECTION && name != MARKER_SECTION_MACHO {
                continue;
            }
            found = true;
            let bytes = section
                .data()
                .with_context(|| format!("{origin}: reading section {name}"))?;
            trace!(origin, section = name, len = bytes.len(), "marker section");
            self.scan_section(origin, bytes, big_endian)?;
        }

        if found {
            let arch = object_arch_name(file.architecture());
            match (self.object_arch, arch) {
                (Some(seen), Some(arch)) if seen != arch => {
                    bail!("{origin}: object is `{arch}` but earlier objects were `{seen}`")
                }
                (None, Some(arch)) => self.object_arch = Some(arch),
                _ => {}
            }
        }
        Ok(())
    }

    fn scan_section(&mut self, origin: &str, bytes: &[u8], big_endian: bool) -> Result<()> {
        let mut offset = 0;
        while offset < bytes.len() {
            let rest = &bytes[offset..];
            // Alignment padding between records.
            let pad = rest.len().min(8);
            if rest[..pad].iter().all(|b| *b == 0) {
                offset += pad;
                continue;
            }

            let record = MarkerRecord::decode(rest, big_endian)
                .map_err(|e| anyhow!("{origin}: marker at {offset:#x}: {e}"))?;
            match record.kind {
                Some(kind) => {
                    self.records.push((record.name.to_string(), kind, record.value));
                }
                None => self.set_target(origin, record.name, record.value)?,
            }
            offset += MARKER_SIZE;
        }
        Ok(())
    }

    fn set_target(&mut self, origin: &str, arch: &str, pointer_width: u64) -> Result<()> {
        let info = TargetInfo {
            arch: arch.to_string(),
            pointer_width,
        };
        match &self.target {
            Some(seen) if *seen != info => bail!(
                "{origin}: target marker `{arch}`/{pointer_width}-bit disagrees with `{}`/{}-bit",
                seen.arch,
                seen.pointer_width
            ),
            Some(_) => {}
            None => self.target = Some(info),
        }
        Ok(())
    }

    fn finish(self) -> Result<ExtractedTable> {
        let target = self
            .target
            .ok_or_else(|| anyhow!("no target marker found; was the unit built with libos-offsets?"))?;
        ensure!(!self.records.is_empty(), "no offset markers found");

        let mut table = ExtractedTable::new(target);
        table.object_arch = self.object_arch;
        for (name, kind, value) in self.records {
            table.insert(&name, kind, value)?;
        }
        Ok(table)
    }
}

const BITCODE_MAGIC: [u8; 4] = *b"BC\xC0\xDE";
const BITCODE_WRAPPER_MAGIC: [u8; 4] = [0xde, 0xc0, 0x17, 0x0b];

fn is_bitcode(data: &[u8]) -> bool {
    data.starts_with(&BITCODE_MAGIC) || data.starts_with(&BITCODE_WRAPPER_MAGIC)
}

/// Extracts the offset table from an rlib/static archive or a single object.
pub fn extract_artifact(data: &[u8]) -> Result<ExtractedTable> {
    let mut collector = Collector::default();

    if data.starts_with(&object::archive::MAGIC) {
        let archive = ArchiveFile::parse(data).context("parsing archive")?;
        let mut objects = 0usize;
        let mut bitcode = 0usize;
        for member in archive.members() {
            let member = member.context("reading archive member")?;
            let name = String::from_utf8_lossy(member.name()).into_owned();
            let bytes = member
                .data(data)
                .with_context(|| format!("reading archive member {name}"))?;
            if object::File::parse(bytes).is_err() {
                if is_bitcode(bytes) {
                    bitcode += 1;
                }
                debug!(member = %name, "skipping non-object archive member");
                continue;
            }
            objects += 1;
            collector.scan_object(&name, bytes)?;
        }
        if objects == 0 && bitcode > 0 {
            bail!(
                "archive holds LLVM bitcode only ({bitcode} member(s)), no object code; \
                 rebuild the declaration unit with `lto` off for its profile"
            );
        }
    } else if is_bitcode(data) {
        bail!("input is LLVM bitcode, not an object file; rebuild without LTO");
    } else {
        collector.scan_object("input", data)?;
    }

    let table = collector.finish()?;
    debug!(
        arch = %table.target.arch,
        constants = table.constants.len(),
        "extracted offset table"
    );
    Ok(table)
}
