/**
 * When parsing binary formats often we parse X bytes and convert the bytes to
 * a number. These helpers wrap the nom number parsers so callers state the
 * width and endianess once and get a plain value back.
 */
use nom::{
    bytes::complete::take,
    number::complete::{be_u8, be_u16, be_u32, be_u64, le_u8, le_u16, le_u32, le_u64},
};

pub(crate) enum Endian {
    /**Little Endian */
    Le,
    /**Big Endian */
    Be,
}

/// Nom one (1) byte to u8
pub(crate) fn nom_unsigned_one_byte(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u8> {
    match endian {
        Endian::Le => le_u8(data),
        Endian::Be => be_u8(data),
    }
}

/// Nom two (2) bytes to u16
pub(crate) fn nom_unsigned_two_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u16> {
    match endian {
        Endian::Le => le_u16(data),
        Endian::Be => be_u16(data),
    }
}

/// Nom four (4) bytes to u32
pub(crate) fn nom_unsigned_four_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u32> {
    match endian {
        Endian::Le => le_u32(data),
        Endian::Be => be_u32(data),
    }
}

/// Nom eight (8) bytes to u64
pub(crate) fn nom_unsigned_eight_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u64> {
    match endian {
        Endian::Le => le_u64(data),
        Endian::Be => be_u64(data),
    }
}

/// Nom an arbitrary amount of data and return the bytes remaining and bytes nom'd
pub(crate) fn nom_data(data: &[u8], count: u64) -> nom::IResult<&[u8], &[u8]> {
    take(count)(data)
}
