//! services/api/src/adapters/archive.rs
//!
//! The lecture archive: a directory tree `root/<subject>/<unit>/<date>/`
//! holding media files and their sidecar transcripts. It implements the
//! `LectureArchive` port from the `core` crate.
//!
//! Files are written and read wholesale with no locking; two uploads to the
//! same path simply overwrite each other.

use async_trait::async_trait;
use classmate_core::domain::{LectureKey, MediaKind};
use classmate_core::lecture::{LectureCorpus, PreparedLecture, TRANSCRIPT_EXTENSION};
use classmate_core::ports::{LectureArchive, PortError, PortResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Rejects anything that could escape the directory it is joined onto.
pub fn safe_segment(segment: &str) -> PortResult<&str> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
        || segment.contains('\0');
    if invalid {
        Err(PortError::Invalid(format!("Invalid path segment '{}'", segment)))
    } else {
        Ok(segment)
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    if e.kind() == ErrorKind::NotFound {
        PortError::NotFound(path.display().to_string())
    } else {
        PortError::Unexpected(format!("{}: {}", path.display(), e))
    }
}

#[derive(Clone)]
pub struct FsLectureArchive {
    root: PathBuf,
}

impl FsLectureArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, segments: &[&str]) -> PortResult<PathBuf> {
        let mut path = self.root.clone();
        for segment in segments {
            path.push(safe_segment(segment)?);
        }
        Ok(path)
    }

    fn lecture_dir(&self, key: &LectureKey) -> PortResult<PathBuf> {
        self.dir(&[key.subject.as_str(), key.unit.as_str(), key.date.as_str()])
    }

    /// Sorted names of the entries in `dir` accepted by `keep`.
    ///
    /// A missing directory lists as empty.
    async fn list(
        &self,
        dir: PathBuf,
        keep: fn(&std::fs::FileType, &str) -> bool,
    ) -> PortResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let file_type = entry.file_type().await.map_err(|e| io_error(&dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if keep(&file_type, &name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

fn is_dir(file_type: &std::fs::FileType, _name: &str) -> bool {
    file_type.is_dir()
}

fn is_media(file_type: &std::fs::FileType, name: &str) -> bool {
    file_type.is_file() && MediaKind::from_file_name(name).is_some()
}

/// Walks `root` in file-name order, collecting every transcript.
fn read_corpus(root: &Path) -> PortResult<LectureCorpus> {
    if !root.exists() {
        return Ok(LectureCorpus::NoArchive);
    }

    let suffix = format!(".{}", TRANSCRIPT_EXTENSION);
    let mut transcripts = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| PortError::Unexpected(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(&suffix) {
            continue;
        }
        match std::fs::read_to_string(entry.path()) {
            Ok(contents) => transcripts.push((name, contents)),
            Err(e) => warn!("Skipping unreadable transcript {:?}: {}", entry.path(), e),
        }
    }
    Ok(LectureCorpus::from_transcripts(transcripts))
}

#[async_trait]
impl LectureArchive for FsLectureArchive {
    async fn store_lecture(&self, lecture: &PreparedLecture) -> PortResult<LectureKey> {
        let save_dir = self.dir(&lecture.directory_components())?;
        tokio::fs::create_dir_all(&save_dir)
            .await
            .map_err(|e| io_error(&save_dir, e))?;

        let media_path = save_dir.join(safe_segment(&lecture.media_file_name())?);
        tokio::fs::write(&media_path, &lecture.bytes)
            .await
            .map_err(|e| io_error(&media_path, e))?;

        let transcript_path = save_dir.join(lecture.transcript_file_name());
        if let Err(e) = tokio::fs::write(&transcript_path, lecture.placeholder_transcript()).await {
            // Media never stays behind without its transcript.
            if let Err(cleanup) = tokio::fs::remove_file(&media_path).await {
                warn!("Failed to remove {}: {}", media_path.display(), cleanup);
            }
            return Err(io_error(&transcript_path, e));
        }

        info!("Stored lecture at {}", media_path.display());
        Ok(LectureKey {
            subject: lecture.subject.clone(),
            unit: lecture.unit.clone(),
            date: lecture.date_stamp.clone(),
            file: lecture.media_file_name(),
        })
    }

    async fn list_subjects(&self) -> PortResult<Vec<String>> {
        self.list(self.root.clone(), is_dir).await
    }

    async fn list_units(&self, subject: &str) -> PortResult<Vec<String>> {
        self.list(self.dir(&[subject])?, is_dir).await
    }

    async fn list_dates(&self, subject: &str, unit: &str) -> PortResult<Vec<String>> {
        self.list(self.dir(&[subject, unit])?, is_dir).await
    }

    async fn list_lectures(
        &self,
        subject: &str,
        unit: &str,
        date: &str,
    ) -> PortResult<Vec<String>> {
        self.list(self.dir(&[subject, unit, date])?, is_media).await
    }

    async fn read_media(&self, key: &LectureKey) -> PortResult<Vec<u8>> {
        if MediaKind::from_file_name(&key.file).is_none() {
            return Err(PortError::Invalid(format!("'{}' is not a lecture recording", key.file)));
        }
        let path = self.lecture_dir(key)?.join(safe_segment(&key.file)?);
        tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))
    }

    async fn read_transcript(&self, key: &LectureKey) -> PortResult<String> {
        let path = self
            .lecture_dir(key)?
            .join(safe_segment(&key.transcript_file())?);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    async fn load_corpus(&self) -> PortResult<LectureCorpus> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || read_corpus(&root))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
    }
}
