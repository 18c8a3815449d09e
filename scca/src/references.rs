use crate::reader::{ReadSeek, read_at};
use crate::utils::nom_helper::{Endian, nom_unsigned_eight_bytes, nom_unsigned_four_bytes};
use log::warn;
use serde::Serialize;

/// An NTFS file reference, 48 bits of MFT entry and 16 bits of sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileReference {
    pub mft_entry: u64,
    pub mft_sequence: u16,
}

impl FileReference {
    pub(crate) fn from_raw(reference: u64) -> FileReference {
        let entry_mask = 0xffffffffffff;
        FileReference {
            mft_entry: reference & entry_mask,
            mft_sequence: (reference >> 48) as u16,
        }
    }
}

/// Per-volume table of references to every file backing a metrics entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReferenceTable {
    pub version: u32,
    pub number_references: u32,
    pub references: Vec<FileReference>,
}

/// Decode each volume's file reference table, located relative to the volume
/// information base. A volume whose table fails yields `None` and the
/// remaining volumes continue.
pub(crate) fn parse_file_references<R: ReadSeek>(
    source: &mut R,
    base_offset: u32,
    table_offsets: &[u32],
) -> Vec<Option<FileReferenceTable>> {
    let mut tables = Vec::with_capacity(table_offsets.len());
    for (index, table_offset) in table_offsets.iter().enumerate() {
        let position = base_offset as u64 + u64::from(*table_offset);
        let table = read_reference_table(source, position);
        if table.is_none() {
            warn!("[prefetch] Could not decode file reference table for volume {index}");
        }
        tables.push(table);
    }
    tables
}

fn read_reference_table<R: ReadSeek>(source: &mut R, position: u64) -> Option<FileReferenceTable> {
    let header_size = 8;
    let header_data = read_at(source, position, header_size).ok()?;
    let (_, (version, number_references)) = table_header(&header_data).ok()?;

    let reference_size = 8;
    let references_data = read_at(
        source,
        position + header_size as u64,
        number_references as usize * reference_size,
    )
    .ok()?;
    let (_, references) = reference_entries(&references_data, number_references).ok()?;

    Some(FileReferenceTable {
        version,
        number_references,
        references,
    })
}

fn table_header(data: &[u8]) -> nom::IResult<&[u8], (u32, u32)> {
    let (input, version) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, number_references) = nom_unsigned_four_bytes(input, Endian::Le)?;
    Ok((input, (version, number_references)))
}

fn reference_entries(data: &[u8], count: u32) -> nom::IResult<&[u8], Vec<FileReference>> {
    let mut input = data;
    let mut references = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (remaining, raw) = nom_unsigned_eight_bytes(input, Endian::Le)?;
        references.push(FileReference::from_raw(raw));
        input = remaining;
    }
    Ok((input, references))
}
