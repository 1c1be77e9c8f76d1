// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

//! Structural edit commands for document trees.
//!
//! A batch of commands is applied command-by-command: each command either
//! fully applies or is skipped with a reported error. There is no whole-batch
//! rollback, and the executor always completes its pass over the batch.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::model::{IdAllocator, Node, NodeId, NodeKind};
use crate::query::{find_node_by_id, find_node_by_id_mut, find_parent_and_index_mut};

/// Where a node lands relative to its anchor.
///
/// `Before`/`After` anchor on a sibling; the other three anchor on the parent
/// itself. On the wire this is the bare keyword string or a non-negative
/// integer index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
    FirstChild,
    LastChild,
    Index(usize),
}

impl Position {
    /// True for placements that make the anchor the parent.
    pub fn is_into(self) -> bool {
        !matches!(self, Self::Before | Self::After)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Before => serializer.serialize_str("before"),
            Self::After => serializer.serialize_str("after"),
            Self::FirstChild => serializer.serialize_str("firstChild"),
            Self::LastChild => serializer.serialize_str("lastChild"),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl Visitor<'_> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(
                    "\"before\", \"after\", \"firstChild\", \"lastChild\", or a non-negative index",
                )
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Position, E> {
                match value {
                    "before" => Ok(Position::Before),
                    "after" => Ok(Position::After),
                    "firstChild" => Ok(Position::FirstChild),
                    "lastChild" => Ok(Position::LastChild),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Position, E> {
                let index = usize::try_from(value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))?;
                Ok(Position::Index(index))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Position, E> {
                let index = usize::try_from(value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))?;
                Ok(Position::Index(index))
            }
        }

        deserializer.deserialize_any(PositionVisitor)
    }
}

/// A node payload as supplied inside an insert/replace command.
///
/// Any `id` in the payload is carried for wire fidelity but never honored:
/// instantiation always mints fresh ids, for the payload root and every
/// descendant. An unspecified `type` defaults to a paragraph and unspecified
/// `children` to an empty sequence, so instantiated nodes are always
/// containers unless the payload says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeSpec>>,
}

impl NodeSpec {
    pub(crate) fn instantiate(&self, allocator: &mut IdAllocator) -> Node {
        let mut node = Node::leaf(self.kind.clone().unwrap_or(NodeKind::Paragraph));
        node.set_id(allocator.allocate());
        node.set_depth(self.depth);
        node.set_value(self.value.clone());
        if let Some(properties) = &self.properties {
            for (key, value) in properties {
                node.set_property(key.clone(), value.clone());
            }
        }
        let children = self
            .children
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|child| child.instantiate(allocator))
            .collect();
        node.set_children(Some(children));
        node
    }
}

/// One structural mutation, tagged by its `action` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Command {
    Insert {
        target: NodeId,
        position: Position,
        node: NodeSpec,
    },
    Delete {
        target: NodeId,
    },
    Move {
        target: NodeId,
        destination: NodeId,
        position: Position,
    },
    Modify {
        target: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        properties: Option<BTreeMap<String, serde_json::Value>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    Replace {
        target: NodeId,
        node: NodeSpec,
    },
}

/// One slot of a wire batch.
///
/// A slot that fails to parse as a [`Command`] (unknown or missing `action`,
/// wrong field shapes) is kept as `Invalid` rather than failing the whole
/// batch, so the executor can skip it and keep going.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEntry {
    Parsed(Command),
    Invalid {
        raw: serde_json::Value,
        reason: String,
    },
}

impl Serialize for CommandEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Parsed(command) => command.serialize(serializer),
            Self::Invalid { raw, .. } => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for CommandEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match serde_json::from_value::<Command>(raw.clone()) {
            Ok(command) => Ok(Self::Parsed(command)),
            Err(error) => Ok(Self::Invalid {
                raw,
                reason: error.to_string(),
            }),
        }
    }
}

/// The wire batch shape: `{ "commands": [ ... ] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub commands: Vec<CommandEntry>,
}

impl CommandBatch {
    pub fn parsed(commands: Vec<Command>) -> Self {
        Self {
            commands: commands.into_iter().map(CommandEntry::Parsed).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTargetReason {
    /// The operation needs the target's parent, but the target is the root.
    RootHasNoParent,
    /// An into-placement was aimed at a structural leaf.
    NotAContainer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    NotFound {
        node_id: NodeId,
    },
    InvalidTarget {
        node_id: NodeId,
        reason: InvalidTargetReason,
    },
    CycleWouldForm {
        target: NodeId,
        destination: NodeId,
    },
    UnrecognizedAction {
        reason: String,
    },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { node_id } => write!(f, "node not found (id={node_id})"),
            Self::InvalidTarget { node_id, reason } => match reason {
                InvalidTargetReason::RootHasNoParent => {
                    write!(f, "invalid target (id={node_id}): the root has no parent")
                }
                InvalidTargetReason::NotAContainer => {
                    write!(f, "invalid target (id={node_id}): node cannot have children")
                }
            },
            Self::CycleWouldForm {
                target,
                destination,
            } => write!(
                f,
                "move would form a cycle (target={target}, destination={destination})"
            ),
            Self::UnrecognizedAction { reason } => {
                write!(f, "unrecognized command: {reason}")
            }
        }
    }
}

impl std::error::Error for CommandError {}

/// What a successfully applied command did to the tree.
///
/// Insert and replace report the freshly minted id so callers can chain
/// follow-up commands against nodes created earlier in the same exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandEffect {
    Inserted { new_id: NodeId },
    Deleted { node_id: NodeId },
    Moved { node_id: NodeId },
    Modified { node_id: NodeId },
    Replaced { node_id: NodeId, new_id: NodeId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub index: usize,
    pub result: Result<CommandEffect, CommandError>,
}

/// Per-command results for a whole batch, in batch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<CommandOutcome>,
}

impl BatchReport {
    pub fn applied(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_ok())
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }
}

/// Applies every command in the batch to `root`, in order.
///
/// A failing command leaves the tree exactly as the previous command left it;
/// later commands still run against that state.
pub fn execute_commands(root: &mut Node, batch: &CommandBatch) -> BatchReport {
    let mut outcomes = Vec::with_capacity(batch.commands.len());
    // One allocator spans the batch: ids of nodes deleted by earlier commands
    // stay reserved, so a later insert cannot mint them again.
    let mut allocator = IdAllocator::for_tree(root);

    for (index, entry) in batch.commands.iter().enumerate() {
        let result = match entry {
            CommandEntry::Parsed(command) => apply_command(root, &mut allocator, command),
            CommandEntry::Invalid { reason, .. } => Err(CommandError::UnrecognizedAction {
                reason: reason.clone(),
            }),
        };
        outcomes.push(CommandOutcome { index, result });
    }

    BatchReport { outcomes }
}

// Extracted command-application implementation.
include!("ops_impl.rs");
