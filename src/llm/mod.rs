// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Boundary to an external text generator that proposes edit commands.
//!
//! Nothing in here talks to a network. The MCP server is the production
//! channel for agent edits; [`TextGenerator`] exists so one-shot pipelines
//! and tests can drive the same prompt → batch → apply flow with a scripted
//! generator.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::Node;
use crate::ops::{execute_commands, BatchReport, CommandBatch};

/// Produces a reply for a prompt. Implemented by closures, so a test can pass
/// `|_prompt| Ok(reply.to_owned())`.
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

impl<F> TextGenerator for F
where
    F: Fn(&str) -> Result<String, GenerateError>,
{
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateError {
    message: String,
}

impl GenerateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for GenerateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text generation failed: {}", self.message)
    }
}

impl std::error::Error for GenerateError {}

#[derive(Debug)]
pub enum ExtractError {
    /// The reply contained neither bare JSON nor a fenced ```json block.
    NoJsonPayload,
    /// A JSON payload was found but did not parse as a command batch. The
    /// whole batch is rejected; nothing is applied.
    MalformedBatch { source: serde_json::Error },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoJsonPayload => f.write_str("reply contains no JSON command batch"),
            Self::MalformedBatch { source } => {
                write!(f, "reply JSON is not a command batch: {source}")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoJsonPayload => None,
            Self::MalformedBatch { source } => Some(source),
        }
    }
}

#[derive(Debug)]
pub enum EditError {
    Prompt(serde_json::Error),
    Generate(GenerateError),
    Extract(ExtractError),
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt(source) => write!(f, "failed to serialize document tree: {source}"),
            Self::Generate(source) => source.fmt(f),
            Self::Extract(source) => source.fmt(f),
        }
    }
}

impl std::error::Error for EditError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Prompt(source) => Some(source),
            Self::Generate(source) => Some(source),
            Self::Extract(source) => Some(source),
        }
    }
}

/// Builds the edit prompt: the id-stamped tree as JSON, the instruction, and
/// the exact reply contract (`{"commands": [...]}`).
pub fn build_edit_prompt(root: &Node, instruction: &str) -> Result<String, serde_json::Error> {
    let tree_json = serde_json::to_string_pretty(root)?;
    Ok(format!(
        "You are editing a Markdown document represented as a JSON tree. Every \
node carries a stable \"id\"; commands address nodes by those ids.\n\n\
Document tree:\n{tree_json}\n\n\
Instruction: {instruction}\n\n\
Reply with a single JSON object of the form {{\"commands\": [...]}} and \
nothing else. Each command has an \"action\" of \"insert\", \"delete\", \
\"move\", \"modify\" or \"replace\", a \"target\" node id, and for insert/move \
a \"position\" of \"before\", \"after\", \"firstChild\", \"lastChild\" or a \
child index. Ids you put on new nodes are ignored; fresh ids are assigned on \
insert."
    ))
}

fn fenced_json_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced block pattern is valid")
    })
}

/// Pulls a command batch out of a generator reply.
///
/// Accepts either the bare `{"commands": [...]}`` object or that object
/// inside a ```json fence (generators routinely wrap JSON in prose).
/// Individual unrecognized commands survive parsing and fail later, one by
/// one; a payload that is not a JSON object at all rejects the whole batch.
pub fn extract_command_batch(reply: &str) -> Result<CommandBatch, ExtractError> {
    let trimmed = reply.trim();

    let candidate = if trimmed.starts_with('{') {
        trimmed
    } else {
        match fenced_json_regex().captures(trimmed) {
            Some(captures) => captures
                .get(1)
                .expect("pattern has one capture group")
                .as_str(),
            None => return Err(ExtractError::NoJsonPayload),
        }
    };

    serde_json::from_str(candidate).map_err(|source| ExtractError::MalformedBatch { source })
}

/// One round of agent editing: prompt, generate, extract, apply.
///
/// The tree is mutated in place; the report says which commands landed.
pub fn edit_document(
    generator: &dyn TextGenerator,
    root: &mut Node,
    instruction: &str,
) -> Result<BatchReport, EditError> {
    let prompt = build_edit_prompt(root, instruction).map_err(EditError::Prompt)?;
    let reply = generator.generate(&prompt).map_err(EditError::Generate)?;
    let batch = extract_command_batch(&reply).map_err(EditError::Extract)?;
    Ok(execute_commands(root, &batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::intro_tree;
    use crate::ops::CommandEntry;

    const DELETE_HEADING: &str = r#"{"commands":[{"action":"delete","target":"node-1"}]}"#;

    #[test]
    fn bare_json_reply_is_accepted() {
        let batch = extract_command_batch(DELETE_HEADING).expect("bare json");
        assert_eq!(batch.commands.len(), 1);
        assert!(matches!(batch.commands[0], CommandEntry::Parsed(_)));
    }

    #[test]
    fn fenced_json_reply_is_accepted() {
        let reply = format!("Here is the plan:\n\n```json\n{DELETE_HEADING}\n```\n\nDone.");
        let batch = extract_command_batch(&reply).expect("fenced json");
        assert_eq!(batch.commands.len(), 1);
    }

    #[test]
    fn fence_without_language_tag_is_accepted() {
        let reply = format!("```\n{DELETE_HEADING}\n```");
        let batch = extract_command_batch(&reply).expect("plain fence");
        assert_eq!(batch.commands.len(), 1);
    }

    #[test]
    fn prose_without_json_is_rejected() {
        let err = extract_command_batch("I could not produce any commands.")
            .expect_err("must reject");
        assert!(matches!(err, ExtractError::NoJsonPayload));
    }

    #[test]
    fn broken_json_rejects_the_whole_batch() {
        let err = extract_command_batch(r#"{"commands": [}"#).expect_err("must reject");
        assert!(matches!(err, ExtractError::MalformedBatch { .. }));
    }

    #[test]
    fn unknown_actions_parse_leniently_instead_of_rejecting() {
        let reply = r#"{"commands":[{"action":"transmogrify","target":"node-1"}]}"#;
        let batch = extract_command_batch(reply).expect("lenient parse");
        assert!(matches!(batch.commands[0], CommandEntry::Invalid { .. }));
    }

    #[test]
    fn prompt_carries_tree_ids_and_the_instruction() {
        let root = intro_tree();
        let prompt = build_edit_prompt(&root, "shorten the intro").expect("prompt");
        assert!(prompt.contains("\"node-0\""));
        assert!(prompt.contains("\"node-4\""));
        assert!(prompt.contains("shorten the intro"));
        assert!(prompt.contains(r#"{"commands": [...]}"#));
    }

    #[test]
    fn edit_round_applies_the_extracted_batch() {
        let mut root = intro_tree();
        let generator = |_prompt: &str| -> Result<String, GenerateError> {
            Ok(format!("```json\n{DELETE_HEADING}\n```"))
        };

        let report = edit_document(&generator, &mut root, "drop the heading").expect("edit");
        assert_eq!(report.applied(), 1);
        assert!(report.is_clean());
        // The heading subtree is gone; the paragraph survives.
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn generator_failure_propagates() {
        let mut root = intro_tree();
        let generator = |_prompt: &str| -> Result<String, GenerateError> {
            Err(GenerateError::new("backend offline"))
        };

        let err = edit_document(&generator, &mut root, "anything").expect_err("must fail");
        assert!(matches!(err, EditError::Generate(_)));
        assert_eq!(root.node_count(), 5);
    }
}
