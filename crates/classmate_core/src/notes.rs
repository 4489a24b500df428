//! crates/classmate_core/src/notes.rs
//!
//! Turns a lecture transcript into study notes with the generative-answer client.

use chrono::NaiveDate;

use crate::domain::NotesDocument;
use crate::ports::{GenerationFailure, GenerativeTextService};

#[derive(Debug, Clone)]
pub struct NotesRequest {
    pub title: String,
    pub subject: String,
    pub date: NaiveDate,
    pub transcript: String,
}

pub fn notes_prompt(request: &NotesRequest) -> String {
    format!(
        r#"You are a note-taking assistant for university students.

Summarize the lecture transcript below into clear study notes.
- Start with a one-line overview.
- Then list the key concepts as short bullet points starting with "- ".
- Finish with a short "Key takeaways" section.
Use plain text only, no markdown headings or tables.

LECTURE: {title}
SUBJECT: {subject}
DATE: {date}

TRANSCRIPT:
{transcript}
"#,
        title = request.title,
        subject = request.subject,
        date = request.date.format("%Y-%m-%d"),
        transcript = request.transcript,
    )
}

/// Generates notes. A failed generation is returned as an error so that no
/// document is ever rendered from an error message.
pub async fn generate_notes(
    llm: &dyn GenerativeTextService,
    request: NotesRequest,
) -> Result<NotesDocument, GenerationFailure> {
    let notes = llm.generate(&notes_prompt(&request)).await?;
    Ok(NotesDocument {
        title: request.title,
        subject: request.subject,
        date: request.date,
        notes: notes.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoLlm;

    #[async_trait]
    impl GenerativeTextService for EchoLlm {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
            Ok(format!("  notes for {} chars \n", prompt.len()))
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl GenerativeTextService for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerationFailure> {
            Err(GenerationFailure::Api("quota exceeded".into()))
        }
    }

    fn request() -> NotesRequest {
        NotesRequest {
            title: "Intro to Graphs".into(),
            subject: "Algorithms".into(),
            date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            transcript: "Graphs are made of vertices and edges.".into(),
        }
    }

    #[test]
    fn prompt_carries_the_transcript_and_metadata() {
        let prompt = notes_prompt(&request());
        assert!(prompt.contains("LECTURE: Intro to Graphs"));
        assert!(prompt.contains("SUBJECT: Algorithms"));
        assert!(prompt.contains("DATE: 2025-02-03"));
        assert!(prompt.contains("Graphs are made of vertices and edges."));
    }

    #[tokio::test]
    async fn notes_are_trimmed_model_output() {
        let notes = generate_notes(&EchoLlm, request()).await.unwrap();
        assert!(notes.notes.starts_with("notes for"));
        assert!(!notes.notes.ends_with('\n'));
        assert_eq!(notes.title, "Intro to Graphs");
    }

    #[tokio::test]
    async fn failures_are_not_turned_into_notes() {
        let err = generate_notes(&FailingLlm, request()).await.unwrap_err();
        assert_eq!(err, GenerationFailure::Api("quota exceeded".into()));
    }
}
