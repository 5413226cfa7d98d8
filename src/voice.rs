//! Speech-to-text entry: turns a transcript into task text.
//!
//! Transcripts arrive as "add task buy milk" or "Create task: call Sam". The
//! leading command phrase is stripped; the remainder becomes the task text.

use regex::{Regex, RegexBuilder};

use crate::{Error, Result};

/// Strips configured command phrases from the start of a transcript.
#[derive(Debug, Clone)]
pub struct VoiceCommandParser {
    pattern: Regex,
}

impl VoiceCommandParser {
    /// Build a parser for the given phrases. Longer phrases take precedence.
    pub fn new(keywords: &[String]) -> Result<Self> {
        let mut phrases: Vec<String> = keywords
            .iter()
            .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|k| !k.is_empty())
            .collect();
        if phrases.is_empty() {
            return Err(Error::Validation(
                "At least one voice keyword is required".to_string(),
            ));
        }
        phrases.sort_by(|a, b| b.len().cmp(&a.len()));

        let alternatives = phrases
            .iter()
            .map(|p| {
                p.split(' ')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>()
            .join("|");
        let source = format!(r"^\s*(?:{})\b[\s:,.-]*", alternatives);
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::Validation(format!("Invalid voice keyword: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Task text for a transcript. Empty when nothing follows the keyword.
    pub fn task_text(&self, transcript: &str) -> String {
        self.pattern.replace(transcript, "").trim().to_string()
    }
}
