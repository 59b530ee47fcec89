//! Text improvement backends for `/api/improve-text`.
//!
//! The shipped [`PlaceholderImprover`] only tidies text. A real model-backed
//! implementation plugs in through [`TextImprover`] without touching handlers.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImproveError {
    #[error("nothing to improve")]
    Empty,

    #[error("improvement backend failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TextImprover: Send + Sync {
    /// Return an improved version of `text`. `context` names the document
    /// section the text belongs to, when the caller knows it.
    async fn improve(&self, text: &str, context: Option<&str>) -> Result<String, ImproveError>;
}

static ACRONYM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:dfd|etp|tr|pca|cnpj|cpf|lgpd|ti)\b").expect("valid regex")
});

/// Normalizes whitespace, capitalizes sentences and uppercases procurement acronyms.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderImprover;

#[async_trait]
impl TextImprover for PlaceholderImprover {
    async fn improve(&self, text: &str, context: Option<&str>) -> Result<String, ImproveError> {
        let tidy = collapse_whitespace(text);
        if tidy.is_empty() {
            return Err(ImproveError::Empty);
        }
        tracing::debug!(context = context.unwrap_or("none"), chars = tidy.len(), "Improving text");

        let capitalized = capitalize_sentences(&tidy);
        Ok(ACRONYM
            .replace_all(&capitalized, |caps: &regex::Captures<'_>| caps[0].to_uppercase())
            .into_owned())
    }
}

/// Collapse runs of spaces inside lines and runs of blank lines between them.
fn collapse_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_sentence_start = true;
    for ch in text.chars() {
        if at_sentence_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            at_sentence_start = false;
            continue;
        }
        match ch {
            '.' | '!' | '?' | '\n' => at_sentence_start = true,
            c if c.is_alphanumeric() => at_sentence_start = false,
            _ => {}
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_tidies_text() {
        let out = PlaceholderImprover
            .improve("  o dfd   descreve a demanda.   a equipe de ti   valida.  ", None)
            .await
            .unwrap();
        assert_eq!(out, "O DFD descreve a demanda. A equipe de TI valida.");
    }

    #[tokio::test]
    async fn test_acronyms_only_as_whole_words() {
        let out = PlaceholderImprover
            .improve("trabalho com cnpj e tributos", Some("justificativa"))
            .await
            .unwrap();
        assert_eq!(out, "Trabalho com CNPJ e tributos");
    }

    #[tokio::test]
    async fn test_blank_lines_collapsed() {
        let out = PlaceholderImprover
            .improve("primeiro\n\n\n\nsegundo\n\n", None)
            .await
            .unwrap();
        assert_eq!(out, "Primeiro\n\nSegundo");
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let err = PlaceholderImprover.improve(" \n\t ", None).await.unwrap_err();
        assert!(matches!(err, ImproveError::Empty));
    }
}
