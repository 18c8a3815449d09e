use crate::artifact::PrefetchArtifact;
use crate::error::PrefetchError;
use crate::reader::ReadSeek;
use serde::Serialize;
use std::io::Cursor;

/// Execution evidence assembled from every decoded section of one artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prefetch {
    pub filename: String,
    pub hash: String,
    pub last_run_time: String,
    pub all_run_times: Vec<String>,
    pub run_count: u32,
    pub size: u32,
    pub volume_serial: Vec<String>,
    pub volume_creation: Vec<String>,
    pub volume_path: Vec<String>,
    pub accessed_files_count: u32,
    pub accessed_directories_count: u32,
    pub accessed_files: Vec<String>,
    pub accessed_directories: Vec<String>,
}

/// Parse prefetch bytes, compressed or raw, into the assembled summary
pub fn parse_prefetch(data: &[u8]) -> Result<Prefetch, PrefetchError> {
    let mut artifact = PrefetchArtifact::new(Cursor::new(data))?;
    Prefetch::from_artifact(&mut artifact)
}

impl Prefetch {
    /// Assemble the summary from an open artifact. Entries that decoded as
    /// `None` are skipped here; the per-section accessors keep the markers.
    pub fn from_artifact<R: ReadSeek>(
        artifact: &mut PrefetchArtifact<R>,
    ) -> Result<Prefetch, PrefetchError> {
        let (filename, hash, size) = {
            let header = artifact.header()?;
            (header.filename.clone(), header.hash.clone(), header.size)
        };
        let (run_times, run_count, number_files) = {
            let info = artifact.file_info()?;
            (info.run_times.clone(), info.run_count, info.number_files)
        };
        let accessed_files: Vec<String> = artifact
            .filename_strings()?
            .iter()
            .flatten()
            .cloned()
            .collect();

        let mut prefetch = Prefetch {
            filename,
            hash,
            last_run_time: run_times.first().cloned().unwrap_or_default(),
            all_run_times: run_times,
            run_count,
            size,
            volume_serial: Vec::new(),
            volume_creation: Vec::new(),
            volume_path: Vec::new(),
            accessed_files_count: number_files,
            accessed_directories_count: 0,
            accessed_files,
            accessed_directories: Vec::new(),
        };

        let volumes: Vec<(String, String, Option<String>, u32)> = artifact
            .volumes_info()?
            .iter()
            .map(|volume| {
                (
                    volume.serial.clone(),
                    volume.creation_time.clone(),
                    volume.device_path.clone(),
                    volume.number_directory_strings,
                )
            })
            .collect();
        let directories = artifact.directory_strings()?.to_vec();

        // Loop through multiple volumes if needed
        for (index, (serial, creation, path, directory_count)) in volumes.into_iter().enumerate()
        {
            prefetch.volume_serial.push(serial);
            prefetch.volume_creation.push(creation);
            prefetch.volume_path.push(path.unwrap_or_default());

            prefetch.accessed_directories_count += directory_count;
            if let Some(entries) = directories.get(index) {
                prefetch
                    .accessed_directories
                    .extend(entries.iter().flatten().cloned());
            }
        }

        Ok(prefetch)
    }
}
