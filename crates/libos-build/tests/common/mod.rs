#![allow(dead_code)]

use libos_offsets::marker::{KIND_TARGET, MARKER_MAGIC};
use libos_offsets::{ConstantKind, MARKER_SECTION, MARKER_SIZE, NAME_CAPACITY};
use object::write;
use object::{Architecture, BinaryFormat, Endianness, SectionKind};

/// Marker record bytes for an arbitrary target, independent of the host.
pub fn record(kind: u8, name: &str, value: u64, endian: Endianness) -> Vec<u8> {
    let mut out = Vec::with_capacity(MARKER_SIZE);
    out.extend_from_slice(&MARKER_MAGIC);
    out.push(kind);
    out.push(name.len() as u8);
    let mut padded = [0u8; NAME_CAPACITY];
    padded[..name.len()].copy_from_slice(name.as_bytes());
    out.extend_from_slice(&padded);
    match endian {
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()),
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()),
    }
    out
}

pub fn constant(kind: ConstantKind, name: &str, value: u64) -> Vec<u8> {
    record(kind as u8, name, value, Endianness::Little)
}

pub fn target(arch: &str, pointer_width: u64) -> Vec<u8> {
    record(KIND_TARGET, arch, pointer_width, Endianness::Little)
}

/// An ELF relocatable holding `records` in the marker section, next to some
/// unrelated code.
pub fn elf_object(arch: Architecture, endian: Endianness, records: &[Vec<u8>]) -> Vec<u8> {
    let mut obj = write::Object::new(BinaryFormat::Elf, arch, endian);

    let text = obj.section_id(write::StandardSection::Text);
    obj.append_section_data(text, &[0x90; 16], 16);

    let markers = obj.add_section(
        Vec::new(),
        MARKER_SECTION.as_bytes().to_vec(),
        SectionKind::Data,
    );
    obj.append_section_data(markers, &records.concat(), 8);

    obj.write().unwrap()
}

pub fn x86_64_object(records: &[Vec<u8>]) -> Vec<u8> {
    elf_object(Architecture::X86_64, Endianness::Little, records)
}

/// A GNU-style `ar` archive, the container format of an rlib.
pub fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = object::archive::MAGIC.to_vec();
    for (name, data) in members {
        let header = format!(
            "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
            format!("{name}/"),
            0,
            0,
            0,
            644,
            data.len()
        );
        assert_eq!(header.len(), 60);
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 == 1 {
            out.push(b'\n');
        }
    }
    out
}

/// The layout a 64-bit x86 build of the shim produces.
pub fn x86_64_records() -> Vec<Vec<u8>> {
    vec![
        target("x86_64", 64),
        constant(ConstantKind::Offset, "SHIM_TCB_OFFSET", 64),
        constant(ConstantKind::Offset, "TCB_SYSCALL_NR", 24),
        constant(ConstantKind::Offset, "TCB_SP", 32),
        constant(ConstantKind::Offset, "TCB_RET_IP", 40),
        constant(ConstantKind::Offset, "TCB_REGS", 48),
        constant(ConstantKind::Size, "SHIM_REGS_SIZE", 144),
        constant(ConstantKind::Define, "RED_ZONE_SIZE", 128),
    ]
}

pub const REQUIRED: [&str; 7] = [
    "SHIM_TCB_OFFSET",
    "TCB_SYSCALL_NR",
    "TCB_SP",
    "TCB_RET_IP",
    "TCB_REGS",
    "SHIM_REGS_SIZE",
    "RED_ZONE_SIZE",
];
