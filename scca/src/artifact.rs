use crate::compression::{CompressedHeader, Decompressor, XpressHuffman};
use crate::directories;
use crate::error::PrefetchError;
use crate::fileinfo::{self, FileInfo};
use crate::filemetrics::{self, FileMetric};
use crate::filenames;
use crate::header::{self, HEADER_SIZE, Header, PrefetchVersion};
use crate::reader::{self, ReadSeek};
use crate::references::{self, FileReferenceTable};
use crate::sections::{self, Section, SectionState};
use crate::tracechains::{self, TraceChain};
use crate::volumes::{self, VolumeInfo};
use byteorder::{LittleEndian, ReadBytesExt};
use log::error;
use std::io::{Cursor, Read, Seek, SeekFrom};

/// Cache slot for one section, never a sentinel conflated with decoded data
enum Slot<T> {
    Unresolved,
    Resolved(T),
    Failed(PrefetchError),
}

impl<T> Slot<T> {
    fn state(&self) -> SectionState {
        match self {
            Slot::Unresolved => SectionState::Unresolved,
            Slot::Resolved(_) => SectionState::Resolved,
            Slot::Failed(_) => SectionState::Failed,
        }
    }

    fn failure(&self) -> Option<PrefetchError> {
        match self {
            Slot::Failed(err) => Some(*err),
            _ => None,
        }
    }
}

/// The byte source for one parse session, either the caller's raw stream or
/// the decompressed container payload
enum ByteSource<R> {
    Raw(R),
    Decompressed(Cursor<Vec<u8>>),
}

impl<R: ReadSeek> Read for ByteSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            ByteSource::Raw(source) => source.read(buf),
            ByteSource::Decompressed(cursor) => cursor.read(buf),
        }
    }
}

impl<R: ReadSeek> Seek for ByteSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            ByteSource::Raw(source) => source.seek(pos),
            ByteSource::Decompressed(cursor) => cursor.seek(pos),
        }
    }
}

/// Borrowed view of one decoded section, keyed by `Section`
#[derive(Debug)]
pub enum SectionValue<'a> {
    Header(&'a Header),
    FileInfo(&'a FileInfo),
    FileMetrics(&'a [Option<FileMetric>]),
    FilenameStrings(&'a [Option<String>]),
    TraceChains(&'a [TraceChain]),
    VolumesInfo(&'a [VolumeInfo]),
    FileReferences(&'a [Option<FileReferenceTable>]),
    DirectoryStrings(&'a [Vec<Option<String>>]),
}

/// One prefetch file being decoded. Sections are computed on first access,
/// in dependency order, and cached for the life of the artifact.
///
/// All accessors take `&mut self`, so access to the single stream cursor is
/// serialized by construction. Sharing an artifact across threads requires an
/// external lock.
pub struct PrefetchArtifact<R> {
    source: ByteSource<R>,
    header: Slot<Header>,
    file_info: Slot<FileInfo>,
    file_metrics: Slot<Vec<Option<FileMetric>>>,
    filename_strings: Slot<Vec<Option<String>>>,
    trace_chains: Slot<Vec<TraceChain>>,
    volumes_info: Slot<Vec<VolumeInfo>>,
    file_references: Slot<Vec<Option<FileReferenceTable>>>,
    directory_strings: Slot<Vec<Vec<Option<String>>>>,
}

impl<R: ReadSeek> PrefetchArtifact<R> {
    /// Open an artifact over `source`, transparently unwrapping the MAM
    /// compressed container when the leading version probe fails
    pub fn new(source: R) -> Result<PrefetchArtifact<R>, PrefetchError> {
        PrefetchArtifact::with_decompressor(source, &XpressHuffman)
    }

    /// Open an artifact with a caller supplied decompression collaborator
    pub fn with_decompressor(
        mut source: R,
        decompressor: &dyn Decompressor,
    ) -> Result<PrefetchArtifact<R>, PrefetchError> {
        sections::verify_acyclic()?;

        let byte_source = if probe_version(&mut source)?.is_some() {
            ByteSource::Raw(source)
        } else {
            let decompressed = unwrap_compressed(&mut source, decompressor)?;
            ByteSource::Decompressed(Cursor::new(decompressed))
        };

        Ok(PrefetchArtifact {
            source: byte_source,
            header: Slot::Unresolved,
            file_info: Slot::Unresolved,
            file_metrics: Slot::Unresolved,
            filename_strings: Slot::Unresolved,
            trace_chains: Slot::Unresolved,
            volumes_info: Slot::Unresolved,
            file_references: Slot::Unresolved,
            directory_strings: Slot::Unresolved,
        })
    }

    pub fn header(&mut self) -> Result<&Header, PrefetchError> {
        self.ensure(Section::Header)?;
        self.header_value()
    }

    pub fn file_info(&mut self) -> Result<&FileInfo, PrefetchError> {
        self.ensure(Section::FileInfo)?;
        self.file_info_value()
    }

    pub fn file_metrics(&mut self) -> Result<&[Option<FileMetric>], PrefetchError> {
        self.ensure(Section::FileMetrics)?;
        Ok(self.file_metrics_value()?.as_slice())
    }

    pub fn filename_strings(&mut self) -> Result<&[Option<String>], PrefetchError> {
        self.ensure(Section::FilenameStrings)?;
        Ok(self.filename_strings_value()?.as_slice())
    }

    pub fn trace_chains(&mut self) -> Result<&[TraceChain], PrefetchError> {
        self.ensure(Section::TraceChains)?;
        Ok(self.trace_chains_value()?.as_slice())
    }

    pub fn volumes_info(&mut self) -> Result<&[VolumeInfo], PrefetchError> {
        self.ensure(Section::VolumesInfo)?;
        Ok(self.volumes_info_value()?.as_slice())
    }

    pub fn file_references(&mut self) -> Result<&[Option<FileReferenceTable>], PrefetchError> {
        self.ensure(Section::FileReferences)?;
        Ok(self.file_references_value()?.as_slice())
    }

    pub fn directory_strings(&mut self) -> Result<&[Vec<Option<String>>], PrefetchError> {
        self.ensure(Section::DirectoryStrings)?;
        Ok(self.directory_strings_value()?.as_slice())
    }

    /// Decode (when needed) and borrow a section by name
    pub fn section(&mut self, section: Section) -> Result<SectionValue<'_>, PrefetchError> {
        self.ensure(section)?;
        let value = match section {
            Section::Header => SectionValue::Header(self.header_value()?),
            Section::FileInfo => SectionValue::FileInfo(self.file_info_value()?),
            Section::FileMetrics => SectionValue::FileMetrics(self.file_metrics_value()?),
            Section::FilenameStrings => {
                SectionValue::FilenameStrings(self.filename_strings_value()?)
            }
            Section::TraceChains => SectionValue::TraceChains(self.trace_chains_value()?),
            Section::VolumesInfo => SectionValue::VolumesInfo(self.volumes_info_value()?),
            Section::FileReferences => {
                SectionValue::FileReferences(self.file_references_value()?)
            }
            Section::DirectoryStrings => {
                SectionValue::DirectoryStrings(self.directory_strings_value()?)
            }
        };
        Ok(value)
    }

    /// Report a slot's lifecycle without triggering a decode, so "not yet
    /// requested" stays distinguishable from decoded or failed
    pub fn section_state(&self, section: Section) -> SectionState {
        match section {
            Section::Header => self.header.state(),
            Section::FileInfo => self.file_info.state(),
            Section::FileMetrics => self.file_metrics.state(),
            Section::FilenameStrings => self.filename_strings.state(),
            Section::TraceChains => self.trace_chains.state(),
            Section::VolumesInfo => self.volumes_info.state(),
            Section::FileReferences => self.file_references.state(),
            Section::DirectoryStrings => self.directory_strings.state(),
        }
    }

    /// The failure recorded for a section, if its decoder ran and failed
    pub fn section_error(&self, section: Section) -> Option<PrefetchError> {
        match section {
            Section::Header => self.header.failure(),
            Section::FileInfo => self.file_info.failure(),
            Section::FileMetrics => self.file_metrics.failure(),
            Section::FilenameStrings => self.filename_strings.failure(),
            Section::TraceChains => self.trace_chains.failure(),
            Section::VolumesInfo => self.volumes_info.failure(),
            Section::FileReferences => self.file_references.failure(),
            Section::DirectoryStrings => self.directory_strings.failure(),
        }
    }

    /// Decode every section in declaration order. Section and dependency
    /// failures stay recorded in their slots; structural failures abort.
    pub fn decode_all(&mut self) -> Result<(), PrefetchError> {
        for section in Section::ALL {
            if let Err(err) = self.ensure(section) {
                match err {
                    PrefetchError::Section(_) | PrefetchError::Dependency(_) => {}
                    fatal => return Err(fatal),
                }
            }
        }
        Ok(())
    }

    /// Resolve a section depth first: dependencies before dependents, every
    /// decoder at most once, the cursor restored around each decode
    fn ensure(&mut self, section: Section) -> Result<(), PrefetchError> {
        match self.section_state(section) {
            SectionState::Resolved => return Ok(()),
            SectionState::Failed => {
                return Err(self
                    .section_error(section)
                    .unwrap_or(PrefetchError::Section(section)));
            }
            SectionState::Unresolved => {}
        }

        for dependency in section.dependencies() {
            self.ensure(*dependency)
                .map_err(|_| PrefetchError::Dependency(*dependency))?;
        }

        match self.decode(section) {
            Ok(()) => Ok(()),
            Err(err) => {
                let stored = match err {
                    PrefetchError::Signature
                    | PrefetchError::Version
                    | PrefetchError::Section(_)
                    | PrefetchError::Dependency(_) => err,
                    _ => PrefetchError::Section(section),
                };
                self.mark_failed(section, stored);
                Err(stored)
            }
        }
    }

    fn decode(&mut self, section: Section) -> Result<(), PrefetchError> {
        match section {
            Section::Header => {
                let value = reader::with_restored_position(&mut self.source, |source| {
                    let data = reader::read_at(source, 0, HEADER_SIZE)?;
                    header::parse_header(&data)
                })?;
                self.header = Slot::Resolved(value);
            }
            Section::FileInfo => {
                let version = self.header_value()?.version;
                let value = reader::with_restored_position(&mut self.source, |source| {
                    let data = reader::read_at(
                        source,
                        HEADER_SIZE as u64,
                        fileinfo::file_info_size(version),
                    )?;
                    match fileinfo::get_file_info(&data, version) {
                        Ok((_, info)) => Ok(info),
                        Err(err) => {
                            error!("[prefetch] Failed to parse file information: {err:?}");
                            Err(PrefetchError::Section(Section::FileInfo))
                        }
                    }
                })?;
                self.file_info = Slot::Resolved(value);
            }
            Section::FileMetrics => {
                let version = self.header_value()?.version;
                let (offset, count) = {
                    let info = self.file_info_value()?;
                    (info.file_array_offset, info.number_files)
                };
                let value = reader::with_restored_position(&mut self.source, |source| {
                    Ok(filemetrics::parse_file_metrics(
                        source, version, offset, count,
                    ))
                })?;
                self.file_metrics = Slot::Resolved(value);
            }
            Section::FilenameStrings => {
                let (offset, size) = {
                    let info = self.file_info_value()?;
                    (info.filename_offset, info.filename_size)
                };
                let metrics_count = self.file_metrics_value()?.len();
                let value = reader::with_restored_position(&mut self.source, |source| {
                    filenames::parse_filename_strings(source, offset, size, metrics_count)
                })?;
                self.filename_strings = Slot::Resolved(value);
            }
            Section::TraceChains => {
                let (offset, count) = {
                    let info = self.file_info_value()?;
                    (info.trace_chain_offset, info.number_trace_chains)
                };
                let value = reader::with_restored_position(&mut self.source, |source| {
                    tracechains::parse_trace_chains(source, offset, count)
                })?;
                self.trace_chains = Slot::Resolved(value);
            }
            Section::VolumesInfo => {
                let version = self.header_value()?.version;
                let (offset, count) = {
                    let info = self.file_info_value()?;
                    (info.volume_info_offset, info.number_volumes)
                };
                let value = reader::with_restored_position(&mut self.source, |source| {
                    volumes::parse_volumes_info(source, version, offset, count)
                })?;
                self.volumes_info = Slot::Resolved(value);
            }
            Section::FileReferences => {
                let base = self.file_info_value()?.volume_info_offset;
                let offsets: Vec<u32> = self
                    .volumes_info_value()?
                    .iter()
                    .map(|volume| volume.file_refs_offset)
                    .collect();
                let value = reader::with_restored_position(&mut self.source, |source| {
                    Ok(references::parse_file_references(source, base, &offsets))
                })?;
                self.file_references = Slot::Resolved(value);
            }
            Section::DirectoryStrings => {
                let base = self.file_info_value()?.volume_info_offset;
                let tables: Vec<(u32, u32)> = self
                    .volumes_info_value()?
                    .iter()
                    .map(|volume| {
                        (
                            volume.directory_strings_offset,
                            volume.number_directory_strings,
                        )
                    })
                    .collect();
                let value = reader::with_restored_position(&mut self.source, |source| {
                    directories::parse_directory_strings(source, base, &tables)
                })?;
                self.directory_strings = Slot::Resolved(value);
            }
        }
        Ok(())
    }

    fn mark_failed(&mut self, section: Section, error: PrefetchError) {
        match section {
            Section::Header => self.header = Slot::Failed(error),
            Section::FileInfo => self.file_info = Slot::Failed(error),
            Section::FileMetrics => self.file_metrics = Slot::Failed(error),
            Section::FilenameStrings => self.filename_strings = Slot::Failed(error),
            Section::TraceChains => self.trace_chains = Slot::Failed(error),
            Section::VolumesInfo => self.volumes_info = Slot::Failed(error),
            Section::FileReferences => self.file_references = Slot::Failed(error),
            Section::DirectoryStrings => self.directory_strings = Slot::Failed(error),
        }
    }

    fn header_value(&self) -> Result<&Header, PrefetchError> {
        resolved(&self.header, Section::Header)
    }

    fn file_info_value(&self) -> Result<&FileInfo, PrefetchError> {
        resolved(&self.file_info, Section::FileInfo)
    }

    fn file_metrics_value(&self) -> Result<&Vec<Option<FileMetric>>, PrefetchError> {
        resolved(&self.file_metrics, Section::FileMetrics)
    }

    fn filename_strings_value(&self) -> Result<&Vec<Option<String>>, PrefetchError> {
        resolved(&self.filename_strings, Section::FilenameStrings)
    }

    fn trace_chains_value(&self) -> Result<&Vec<TraceChain>, PrefetchError> {
        resolved(&self.trace_chains, Section::TraceChains)
    }

    fn volumes_info_value(&self) -> Result<&Vec<VolumeInfo>, PrefetchError> {
        resolved(&self.volumes_info, Section::VolumesInfo)
    }

    fn file_references_value(&self) -> Result<&Vec<Option<FileReferenceTable>>, PrefetchError> {
        resolved(&self.file_references, Section::FileReferences)
    }

    fn directory_strings_value(&self) -> Result<&Vec<Vec<Option<String>>>, PrefetchError> {
        resolved(&self.directory_strings, Section::DirectoryStrings)
    }
}

fn resolved<T>(slot: &Slot<T>, section: Section) -> Result<&T, PrefetchError> {
    match slot {
        Slot::Resolved(value) => Ok(value),
        Slot::Failed(err) => Err(*err),
        Slot::Unresolved => Err(PrefetchError::Dependency(section)),
    }
}

/// Probe the leading version tag without disturbing the cursor. `None` means
/// the bytes are not a raw artifact and the container path should run.
fn probe_version<R: ReadSeek>(source: &mut R) -> Result<Option<PrefetchVersion>, PrefetchError> {
    let position = source
        .stream_position()
        .map_err(|_| PrefetchError::ReadSource)?;
    let tag = source.read_u32::<LittleEndian>();
    source
        .seek(SeekFrom::Start(position))
        .map_err(|_| PrefetchError::ReadSource)?;

    match tag {
        Ok(value) => Ok(PrefetchVersion::from_tag(value)),
        Err(_) => Ok(None),
    }
}

/// Read the MAM container and hand its payload to the collaborator
fn unwrap_compressed<R: ReadSeek>(
    source: &mut R,
    decompressor: &dyn Decompressor,
) -> Result<Vec<u8>, PrefetchError> {
    let mut raw = Vec::new();
    source
        .read_to_end(&mut raw)
        .map_err(|_| PrefetchError::ReadSource)?;

    let is_compressed = match CompressedHeader::is_compressed(&raw) {
        Ok((_, result)) => result,
        Err(err) => {
            error!("[prefetch] Failed to check for compression signature: {err:?}");
            return Err(PrefetchError::CompressedHeader);
        }
    };
    if !is_compressed {
        error!("[prefetch] Leading bytes match neither a known version tag nor the MAM container");
        return Err(PrefetchError::CompressedHeader);
    }

    let (payload, compressed_header) = match CompressedHeader::parse_compressed_header(&raw) {
        Ok(result) => result,
        Err(err) => {
            error!("[prefetch] Failed to parse compressed header: {err:?}");
            return Err(PrefetchError::CompressedHeader);
        }
    };

    match decompressor.decompress(payload, compressed_header.uncompressed_size) {
        Ok(decompressed) => Ok(decompressed),
        Err(err) => {
            error!("[prefetch] Could not decompress data: {err}");
            Err(PrefetchError::Decompress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PrefetchArtifact;
    use crate::compression::{CompressionError, Decompressor};
    use crate::error::PrefetchError;
    use crate::header::PrefetchVersion;
    use crate::sections::{Section, SectionState};
    use std::io::Cursor;

    fn header_only(version: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&version.to_le_bytes());
        data.extend_from_slice(&0x41434353u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&84u32.to_le_bytes());
        let mut name_field = [0u8; 60];
        for (index, unit) in "CALC.EXE".encode_utf16().enumerate() {
            name_field[index * 2..index * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        data.extend_from_slice(&name_field);
        data.extend_from_slice(&0x3FBEF7FDu32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    struct Stored(Vec<u8>);

    impl Decompressor for Stored {
        fn decompress(
            &self,
            _data: &[u8],
            _uncompressed_size: u32,
        ) -> Result<Vec<u8>, CompressionError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl Decompressor for Failing {
        fn decompress(
            &self,
            _data: &[u8],
            _uncompressed_size: u32,
        ) -> Result<Vec<u8>, CompressionError> {
            Err(CompressionError::XpressTruncated)
        }
    }

    #[test]
    fn test_new_rejects_unknown_leading_bytes() {
        let result = PrefetchArtifact::new(Cursor::new(vec![9u8; 96]));
        assert!(matches!(result, Err(PrefetchError::CompressedHeader)));
    }

    #[test]
    fn test_header_section_is_cached() {
        let mut artifact = PrefetchArtifact::new(Cursor::new(header_only(30))).unwrap();
        assert_eq!(
            artifact.section_state(Section::Header),
            SectionState::Unresolved
        );

        let header = artifact.header().unwrap();
        assert_eq!(header.version, PrefetchVersion::Ten);
        assert_eq!(header.filename, "CALC.EXE");
        assert_eq!(header.hash, "3FBEF7FD");

        assert_eq!(
            artifact.section_state(Section::Header),
            SectionState::Resolved
        );
        let again = artifact.header().unwrap();
        assert_eq!(again.hash, "3FBEF7FD");
    }

    #[test]
    fn test_truncated_file_info_is_section_level() {
        let mut artifact = PrefetchArtifact::new(Cursor::new(header_only(23))).unwrap();

        let result = artifact.file_info();
        assert_eq!(result.err(), Some(PrefetchError::Section(Section::FileInfo)));
        assert_eq!(
            artifact.section_state(Section::FileInfo),
            SectionState::Failed
        );
        // The header sibling is untouched by the failure
        assert_eq!(
            artifact.section_state(Section::Header),
            SectionState::Resolved
        );

        let dependent = artifact.trace_chains();
        assert_eq!(
            dependent.err(),
            Some(PrefetchError::Dependency(Section::FileInfo))
        );
    }

    #[test]
    fn test_compressed_container_uses_collaborator() {
        let plaintext = header_only(23);
        let mut container = Vec::new();
        container.extend_from_slice(&[77, 65, 77, 4]);
        container.extend_from_slice(&(plaintext.len() as u32).to_le_bytes());
        container.extend_from_slice(&[0xAA; 32]);

        let collaborator = Stored(plaintext);
        let mut artifact =
            PrefetchArtifact::with_decompressor(Cursor::new(container), &collaborator).unwrap();
        let header = artifact.header().unwrap();
        assert_eq!(header.filename, "CALC.EXE");
        assert_eq!(header.version, PrefetchVersion::Seven);
    }

    #[test]
    fn test_decompression_failure_is_fatal() {
        let mut container = Vec::new();
        container.extend_from_slice(&[77, 65, 77, 4]);
        container.extend_from_slice(&100u32.to_le_bytes());
        container.extend_from_slice(&[0xAA; 32]);

        let result = PrefetchArtifact::with_decompressor(Cursor::new(container), &Failing);
        assert!(matches!(result, Err(PrefetchError::Decompress)));
    }

    #[test]
    fn test_unknown_version_tag_is_fatal_before_sections() {
        // Tag 99 is not a known version, and the bytes are not a container
        let mut artifact_bytes = header_only(23);
        artifact_bytes[0] = 99;
        let result = PrefetchArtifact::new(Cursor::new(artifact_bytes));
        assert!(matches!(result, Err(PrefetchError::CompressedHeader)));
    }
}
