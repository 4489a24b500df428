//! crates/classmate_core/src/lecture.rs
//!
//! Upload preparation and the lecture corpus handed to the chat router.
//!
//! An upload is validated and turned into a [`PreparedLecture`] before the
//! archive adapter touches the filesystem, so a rejected upload never
//! leaves a partial write behind.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::MediaKind;

/// Sentinel returned when the archive root does not exist.
pub const NO_ARCHIVE_MESSAGE: &str = "No lectures uploaded yet.";
/// Sentinel returned when the archive exists but holds no transcript text.
pub const EMPTY_ARCHIVE_MESSAGE: &str = "Lecture files are empty.";

pub const TRANSCRIPT_EXTENSION: &str = "txt";

/// Reduces free text to a filesystem-safe token.
///
/// Keeps word characters, whitespace and hyphens, then joins the remaining
/// words with single underscores: `"AI & ML!!"` becomes `"AI_ML"`.
pub fn sanitize_token(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Where the uploaded bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectureSource {
    /// A file picked by the user; the extension comes from its name.
    File { file_name: String, bytes: Vec<u8> },
    /// An in-browser recording, always stored as mp3.
    Recording { bytes: Vec<u8> },
}

impl LectureSource {
    fn bytes(&self) -> &[u8] {
        match self {
            LectureSource::File { bytes, .. } | LectureSource::Recording { bytes } => bytes,
        }
    }
}

/// The raw fields of the upload form.
#[derive(Debug, Clone, Default)]
pub struct LectureForm {
    pub subject: String,
    pub unit: String,
    pub topic: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub source: Option<LectureSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("⚠️ Please fill all fields and provide lecture content")]
    MissingFields,
    #[error("Unsupported lecture file type: {0}. Use mp4, mp3 or wav.")]
    UnsupportedMedia(String),
}

/// A validated upload with every path component already computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLecture {
    pub subject: String,
    pub unit: String,
    pub topic: String,
    pub date_stamp: String,
    pub time_stamp: String,
    pub media: MediaKind,
    pub bytes: Vec<u8>,
}

impl LectureForm {
    /// Validates the form. `today`/`now` fill in a missing date or time.
    pub fn prepare(self, today: NaiveDate, now: NaiveTime) -> Result<PreparedLecture, UploadError> {
        let source = match self.source {
            Some(source) if !source.bytes().is_empty() => source,
            _ => return Err(UploadError::MissingFields),
        };
        if [&self.subject, &self.unit, &self.topic]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(UploadError::MissingFields);
        }

        let subject = sanitize_token(&self.subject);
        let unit = sanitize_token(&self.unit);
        let topic = sanitize_token(&self.topic);
        // A field made only of punctuation sanitizes to nothing.
        if subject.is_empty() || unit.is_empty() || topic.is_empty() {
            return Err(UploadError::MissingFields);
        }

        let (media, bytes) = match source {
            LectureSource::File { file_name, bytes } => {
                let ext = file_name.rsplit('.').next().unwrap_or_default().to_string();
                let media = MediaKind::from_extension(&ext)
                    .ok_or(UploadError::UnsupportedMedia(ext))?;
                (media, bytes)
            }
            LectureSource::Recording { bytes } => (MediaKind::Mp3, bytes),
        };

        Ok(PreparedLecture {
            subject,
            unit,
            topic,
            date_stamp: self.date.unwrap_or(today).format("%Y-%m-%d").to_string(),
            time_stamp: self.time.unwrap_or(now).format("%H-%M").to_string(),
            media,
            bytes,
        })
    }
}

impl PreparedLecture {
    /// `<subject>/<unit>/<date>` relative to the archive root.
    pub fn directory_components(&self) -> [&str; 3] {
        [&self.subject, &self.unit, &self.date_stamp]
    }

    fn stem(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.subject, self.unit, self.topic, self.time_stamp
        )
    }

    pub fn media_file_name(&self) -> String {
        format!("{}.{}", self.stem(), self.media.extension())
    }

    pub fn transcript_file_name(&self) -> String {
        format!("{}.{}", self.stem(), TRANSCRIPT_EXTENSION)
    }

    /// Placeholder written next to the media file.
    ///
    /// No speech-to-text is run: this sentence is boilerplate built from the
    /// form fields, not derived from the recording.
    pub fn placeholder_transcript(&self) -> String {
        format!(
            "This lecture covers {} from {} of {}. It explains key concepts discussed during the session.",
            self.topic, self.unit, self.subject
        )
    }
}

/// Every transcript in the archive, or the reason there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectureCorpus {
    NoArchive,
    Empty,
    Loaded(String),
}

impl LectureCorpus {
    /// Builds the corpus from `(file name, contents)` pairs in walk order.
    pub fn from_transcripts<I, N, C>(transcripts: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let mut text = String::new();
        for (name, contents) in transcripts {
            text.push_str("\n\n--- ");
            text.push_str(name.as_ref());
            text.push_str(" ---\n");
            text.push_str(contents.as_ref());
        }
        if text.trim().is_empty() {
            LectureCorpus::Empty
        } else {
            LectureCorpus::Loaded(text)
        }
    }

    /// The loader's text: either the concatenation or one of the sentinels.
    pub fn as_text(&self) -> &str {
        match self {
            LectureCorpus::NoArchive => NO_ARCHIVE_MESSAGE,
            LectureCorpus::Empty => EMPTY_ARCHIVE_MESSAGE,
            LectureCorpus::Loaded(text) => text,
        }
    }

    /// Text to ground answers on. The sentinels are informational, not lecture content.
    pub fn context(&self) -> &str {
        match self {
            LectureCorpus::Loaded(text) => text,
            _ => "",
        }
    }
}
