use crate::utils::nom_helper::{Endian, nom_unsigned_four_bytes};

pub(crate) mod error;
mod huffman;

pub use error::CompressionError;

pub(crate) struct CompressedHeader {
    pub(crate) signature: u32,
    pub(crate) uncompressed_size: u32,
}

impl CompressedHeader {
    /// Parse the compressed prefetch container header. Default since Windows 10
    pub(crate) fn parse_compressed_header(
        data: &[u8],
    ) -> nom::IResult<&[u8], CompressedHeader> {
        let (input, signature) = nom_unsigned_four_bytes(data, Endian::Le)?;
        let (input, uncompressed_size) = nom_unsigned_four_bytes(input, Endian::Le)?;
        let header = CompressedHeader {
            signature,
            uncompressed_size,
        };

        Ok((input, header))
    }

    /// Check for the compressed prefetch signature (MAM)
    pub(crate) fn is_compressed(data: &[u8]) -> nom::IResult<&[u8], bool> {
        let (input, signature) = nom_unsigned_four_bytes(data, Endian::Le)?;
        let compressed_sig = 0x44d414d; // MAM
        if signature == compressed_sig {
            return Ok((input, true));
        }
        Ok((input, false))
    }
}

/// Collaborator contract for unwrapping a compressed container into a flat
/// byte buffer
pub trait Decompressor {
    fn decompress(
        &self,
        data: &[u8],
        uncompressed_size: u32,
    ) -> Result<Vec<u8>, CompressionError>;
}

/// The LZXPRESS huffman collaborator used for real prefetch containers
pub struct XpressHuffman;

impl Decompressor for XpressHuffman {
    fn decompress(
        &self,
        data: &[u8],
        uncompressed_size: u32,
    ) -> Result<Vec<u8>, CompressionError> {
        huffman::decompress_lzxpress_huffman(data, uncompressed_size)
    }
}
