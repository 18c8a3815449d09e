use crate::sections::Section;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchError {
    /// The byte source could not be read during setup
    ReadSource,
    /// Leading bytes match neither a known version tag nor the MAM container
    CompressedHeader,
    Decompress,
    Signature,
    Version,
    DependencyCycle,
    /// A section decoder failed, siblings are unaffected
    Section(Section),
    /// A dependency of the requested section previously failed
    Dependency(Section),
}

impl std::error::Error for PrefetchError {}

impl fmt::Display for PrefetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefetchError::ReadSource => write!(f, "Failed to read prefetch byte source"),
            PrefetchError::CompressedHeader => {
                write!(f, "Failed to parse compressed prefetch header")
            }
            PrefetchError::Decompress => write!(f, "Failed to decompress prefetch data"),
            PrefetchError::Signature => write!(f, "Prefetch signature did not match SCCA"),
            PrefetchError::Version => write!(f, "Unsupported prefetch version"),
            PrefetchError::DependencyCycle => {
                write!(f, "Section dependency declarations contain a cycle")
            }
            PrefetchError::Section(section) => {
                write!(f, "Failed to decode prefetch section {}", section.name())
            }
            PrefetchError::Dependency(section) => {
                write!(f, "Dependency section {} failed to decode", section.name())
            }
        }
    }
}
