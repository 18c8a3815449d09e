use crate::error::PrefetchError;
use crate::sections::Section;
use crate::utils::nom_helper::{Endian, nom_unsigned_four_bytes};
use crate::utils::strings::extract_utf16_string;
use log::error;
use nom::bytes::complete::take;
use serde::Serialize;

/// Fixed header size, identical across all layout versions
pub(crate) const HEADER_SIZE: usize = 84;

/// Expected header signature (SCCA)
const SCCA_SIGNATURE: u32 = 0x41434353;

/// The four on-disk layout versions, selected by the header version tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefetchVersion {
    /// Version 17, Windows XP and 2003
    Xp,
    /// Version 23, Windows Vista and 7
    Seven,
    /// Version 26, Windows 8.x
    Eight,
    /// Version 30, Windows 10 and 11
    Ten,
}

impl PrefetchVersion {
    /// Map a raw version tag to its layout. Windows 11 stamps 31 but keeps
    /// the version 30 layout.
    pub(crate) fn from_tag(tag: u32) -> Option<PrefetchVersion> {
        match tag {
            17 => Some(PrefetchVersion::Xp),
            23 => Some(PrefetchVersion::Seven),
            26 => Some(PrefetchVersion::Eight),
            30 | 31 => Some(PrefetchVersion::Ten),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub version: PrefetchVersion,
    /// Artifact size recorded in the header
    pub size: u32,
    /// Executable name, truncated at the first null terminator
    pub filename: String,
    /// Prefetch hash as uppercase hex without a radix prefix
    pub hash: String,
}

/// Parse the fixed header record. A bad signature or unknown version tag is
/// fatal for the whole artifact.
pub(crate) fn parse_header(data: &[u8]) -> Result<Header, PrefetchError> {
    let result = header_fields(data);
    let (_, (version_tag, signature, size, filename_data, hash)) = match result {
        Ok(fields) => fields,
        Err(err) => {
            error!("[prefetch] Failed to read header fields: {err:?}");
            return Err(PrefetchError::Section(Section::Header));
        }
    };

    if signature != SCCA_SIGNATURE {
        error!("[prefetch] Unexpected header signature: {signature:X}");
        return Err(PrefetchError::Signature);
    }
    let version = match PrefetchVersion::from_tag(version_tag) {
        Some(version) => version,
        None => {
            error!("[prefetch] Unsupported prefetch version: {version_tag}");
            return Err(PrefetchError::Version);
        }
    };

    let header = Header {
        version,
        size,
        filename: extract_utf16_string(filename_data),
        hash: format!("{hash:X}"),
    };
    Ok(header)
}

fn header_fields(data: &[u8]) -> nom::IResult<&[u8], (u32, u32, u32, &[u8], u32)> {
    let (input, version) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, signature) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, size) = nom_unsigned_four_bytes(input, Endian::Le)?;

    let filename_size: usize = 60;
    let (input, filename_data) = take(filename_size)(input)?;
    let (input, hash) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _unknown_flags) = nom_unsigned_four_bytes(input, Endian::Le)?;

    Ok((input, (version, signature, size, filename_data, hash)))
}

#[cfg(test)]
mod tests {
    use super::{HEADER_SIZE, PrefetchVersion, parse_header};
    use crate::error::PrefetchError;

    fn build_header(version: u32, signature: u32, name: &str, hash: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&version.to_le_bytes());
        data.extend_from_slice(&signature.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&14130u32.to_le_bytes());
        let mut name_field = [0u8; 60];
        for (index, unit) in name.encode_utf16().enumerate() {
            name_field[index * 2..index * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&name_field);
        data.extend_from_slice(&hash.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    #[test]
    fn test_parse_header() {
        let data = build_header(23, 0x41434353, "CMD.EXE", 0xAC113AA8);
        assert_eq!(data.len(), HEADER_SIZE);

        let header = parse_header(&data).unwrap();
        assert_eq!(header.version, PrefetchVersion::Seven);
        assert_eq!(header.size, 14130);
        assert_eq!(header.filename, "CMD.EXE");
        assert_eq!(header.hash, "AC113AA8");
    }

    #[test]
    fn test_parse_header_hash_has_no_leading_zeros() {
        let data = build_header(30, 0x41434353, "7Z.EXE", 0x1A2B3C);
        let header = parse_header(&data).unwrap();
        assert_eq!(header.hash, "1A2B3C");
    }

    #[test]
    fn test_parse_header_bad_signature() {
        let data = build_header(23, 0x41434354, "CMD.EXE", 0xAC113AA8);
        assert_eq!(parse_header(&data), Err(PrefetchError::Signature));
    }

    #[test]
    fn test_parse_header_unknown_version() {
        let data = build_header(99, 0x41434353, "CMD.EXE", 0xAC113AA8);
        assert_eq!(parse_header(&data), Err(PrefetchError::Version));
    }

    #[test]
    fn test_version_from_tag() {
        assert_eq!(PrefetchVersion::from_tag(17), Some(PrefetchVersion::Xp));
        assert_eq!(PrefetchVersion::from_tag(31), Some(PrefetchVersion::Ten));
        assert_eq!(PrefetchVersion::from_tag(24), None);
    }
}
