//! crates/classmate_core/src/answer.rs
//!
//! The hybrid-answer router: decides how a chat question is answered and
//! which source label the answer carries. The generative-answer client is
//! its only computation engine; the router itself performs no I/O.

use std::str::FromStr;
use std::sync::Arc;

use crate::domain::{DocumentContext, SourceLabel};
use crate::ports::GenerativeTextService;

/// Questions answered without a model call, compared after trimming and lower-casing.
pub const GREETINGS: [&str; 9] = [
    "hi",
    "hai",
    "hello",
    "hey",
    "hii",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

pub const GREETING_REPLY: &str = "Hello! 👋 How can I help you with your classroom lectures today?";

/// Reply the strict policy's grounded prompt asks for when the context falls short.
pub const NOT_FOUND_SENTINEL: &str = "NOT_FOUND";

/// How the router treats a context that does not contain the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerPolicy {
    /// One prompt that prefers the context but may fall back to general knowledge.
    #[default]
    Blended,
    /// A strict context-only prompt, then a separate open-domain prompt when the
    /// model answers `NOT_FOUND` or there is no context at all.
    StrictFallback,
}

impl FromStr for AnswerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blended" | "lenient" => Ok(AnswerPolicy::Blended),
            "strict_fallback" | "strict" => Ok(AnswerPolicy::StrictFallback),
            other => Err(format!("'{}' is not a valid answer policy", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedAnswer {
    pub answer: String,
    pub source: SourceLabel,
}

pub fn is_greeting(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    GREETINGS.contains(&normalized.as_str())
}

/// A document counts as attached only when it carries some text.
fn attached(document: Option<&DocumentContext>) -> Option<&DocumentContext> {
    document.filter(|doc| doc.has_text())
}

/// Combines the attached document (if any) and the lecture corpus into one context.
///
/// The lecture section is always present, even when the corpus is empty.
pub fn build_context(lecture_corpus: &str, document: Option<&DocumentContext>) -> String {
    let mut context = String::new();
    if let Some(doc) = attached(document) {
        context.push_str(&format!(
            "UPLOADED DOCUMENT ({}):\n{}\n\n",
            doc.file_name, doc.text
        ));
    }
    context.push_str("CLASSROOM LECTURE CONTENT:\n");
    context.push_str(lecture_corpus);
    context
}

/// Labels an answer by the inputs that were available, not by what the answer used.
pub fn source_label(lecture_corpus: &str, document: Option<&DocumentContext>) -> SourceLabel {
    if attached(document).is_some() {
        SourceLabel::Document
    } else if !lecture_corpus.trim().is_empty() {
        SourceLabel::Lectures
    } else {
        SourceLabel::External
    }
}

pub fn grounded_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are Classroom AI, a helpful classroom assistant.

Answer the QUESTION using the CONTEXT below. Prefer the uploaded document and the
classroom lecture content whenever they cover the question. If the context is empty
or does not contain enough information, use your general knowledge as needed.
Explain clearly and in a student-friendly way.

CONTEXT:
{context}

QUESTION:
{question}
"#
    )
}

pub fn strict_prompt(question: &str, context: &str) -> String {
    format!(
        r#"You are Classroom AI.

Answer the question STRICTLY using the classroom content below.
If the answer is not present or insufficient, reply with exactly:
{NOT_FOUND_SENTINEL}

CONTENT:
{context}

QUESTION:
{question}
"#
    )
}

pub fn external_prompt(question: &str) -> String {
    format!(
        r#"Answer the following question using your general knowledge.
Explain clearly and in a student-friendly way.

QUESTION:
{question}
"#
    )
}

/// Routes chat questions through the generative-answer client.
#[derive(Clone)]
pub struct AnswerRouter {
    llm: Arc<dyn GenerativeTextService>,
    policy: AnswerPolicy,
}

impl AnswerRouter {
    pub fn new(llm: Arc<dyn GenerativeTextService>, policy: AnswerPolicy) -> Self {
        Self { llm, policy }
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    /// Answers one question. Whatever text the client returns, including its
    /// failure explanations, is passed through unchanged.
    pub async fn answer(
        &self,
        question: &str,
        lecture_corpus: &str,
        document: Option<&DocumentContext>,
    ) -> RoutedAnswer {
        if is_greeting(question) {
            return RoutedAnswer {
                answer: GREETING_REPLY.to_string(),
                source: SourceLabel::System,
            };
        }

        let context = build_context(lecture_corpus, document);
        let source = source_label(lecture_corpus, document);

        match self.policy {
            AnswerPolicy::Blended => {
                let answer = self
                    .llm
                    .generate_text(&grounded_prompt(question, &context))
                    .await;
                RoutedAnswer { answer, source }
            }
            AnswerPolicy::StrictFallback => {
                if source != SourceLabel::External {
                    let answer = self
                        .llm
                        .generate_text(&strict_prompt(question, &context))
                        .await;
                    if answer.trim() != NOT_FOUND_SENTINEL {
                        return RoutedAnswer { answer, source };
                    }
                }
                let answer = self.llm.generate_text(&external_prompt(question)).await;
                RoutedAnswer {
                    answer,
                    source: SourceLabel::External,
                }
            }
        }
    }
}
