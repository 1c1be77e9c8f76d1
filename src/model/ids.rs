// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::node::Node;

/// A stable identifier used across the model and protocol surfaces.
///
/// This is intentionally std-only and does not enforce any particular format;
/// it only enforces that the id is a non-empty path segment (i.e. contains no
/// `/`), because document ids double as workspace file stems.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        validate_id_segment(&value)?;
        Ok(Self {
            value,
            _marker: PhantomData,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> AsRef<str> for Id<T> {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl<T> FromStr for Id<T> {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl<T> TryFrom<String> for Id<T> {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Empty,
    ContainsSlash,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("id must not be empty"),
            Self::ContainsSlash => f.write_str("id must not contain '/'"),
        }
    }
}

impl std::error::Error for IdError {}

fn validate_id_segment(value: &str) -> Result<(), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    if value.contains('/') {
        return Err(IdError::ContainsSlash);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SessionIdTag {}
pub type SessionId = Id<SessionIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentIdTag {}
pub type DocumentId = Id<DocumentIdTag>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeIdTag {}
pub type NodeId = Id<NodeIdTag>;

fn counter_node_id(counter: usize) -> NodeId {
    let mut buffer = itoa::Buffer::new();
    let digits = buffer.format(counter);
    let mut value = String::with_capacity("node-".len() + digits.len());
    value.push_str("node-");
    value.push_str(digits);
    NodeId::new(value).expect("counter node ids are non-empty and slash-free")
}

/// Stamps every node reachable from `root` (the root included) with a fresh
/// `node-<n>` id in pre-order, `<n>` counting from zero.
///
/// The counter is local to this call; re-running on the same tree overwrites
/// every id with a new assignment, so any ids handed out to an external batch
/// producer become invalid. Callers must treat assignment as a checkpoint and
/// not re-run it while a command batch referencing the old ids is in flight.
pub fn assign_node_ids(root: &mut Node) {
    fn walk(node: &mut Node, counter: &mut usize) {
        node.set_id(counter_node_id(*counter));
        *counter += 1;
        if let Some(children) = node.children_mut() {
            for child in children {
                walk(child, counter);
            }
        }
    }

    let mut counter = 0;
    walk(root, &mut counter);
}

/// Hands out `node-<n>` ids that do not collide with any id already present
/// in the tree it was seeded from, nor with any id it issued before.
///
/// Insert/Replace use this for the identities of nodes they create; an id
/// supplied in a command payload is never honored, so a batch producer cannot
/// pre-reference a node it is about to insert (a protocol limitation the wire
/// format keeps).
///
/// The counter starts past the highest `node-<n>` observed at seeding, and
/// every issued id stays reserved. Both matter for id stability: a node
/// deleted mid-batch must not have its id resurrected by a later insert.
#[derive(Debug)]
pub struct IdAllocator {
    used: BTreeSet<String>,
    next: usize,
}

impl IdAllocator {
    pub fn for_tree(root: &Node) -> Self {
        fn collect(node: &Node, used: &mut BTreeSet<String>, next: &mut usize) {
            if let Some(id) = node.id() {
                used.insert(id.as_str().to_owned());
                if let Some(counter) = id
                    .as_str()
                    .strip_prefix("node-")
                    .and_then(|digits| digits.parse::<usize>().ok())
                {
                    *next = (*next).max(counter + 1);
                }
            }
            if let Some(children) = node.children() {
                for child in children {
                    collect(child, used, next);
                }
            }
        }

        let mut used = BTreeSet::new();
        let mut next = 0;
        collect(root, &mut used, &mut next);
        Self { used, next }
    }

    pub fn allocate(&mut self) -> NodeId {
        loop {
            let candidate = counter_node_id(self.next);
            self.next += 1;
            if self.used.insert(candidate.as_str().to_owned()) {
                return candidate;
            }
        }
    }
}
