use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionError {
    CompressedHeader,
    HuffmanTable,
    XpressNoMoreData,
    XpressBadOffset,
    XpressBadSymbol,
    XpressTruncated,
}

impl std::error::Error for CompressionError {}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::CompressedHeader => {
                write!(f, "Failed to parse compressed container header")
            }
            CompressionError::HuffmanTable => write!(f, "Invalid huffman code length table"),
            CompressionError::XpressNoMoreData => write!(f, "No more xpress huffman data"),
            CompressionError::XpressBadOffset => write!(f, "Bad xpress match offset"),
            CompressionError::XpressBadSymbol => write!(f, "Got xpress symbol with no code"),
            CompressionError::XpressTruncated => write!(f, "Compressed xpress data is truncated"),
        }
    }
}
