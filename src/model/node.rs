// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ids::NodeId;

/// The kind of a document node, tagged with the mdast-style name on the wire.
///
/// The set of kinds this tool operates on is closed; anything a parser or a
/// command payload supplies beyond it is carried through as [`NodeKind::Other`]
/// so foreign trees survive a round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Heading,
    Paragraph,
    Text,
    Emphasis,
    Strong,
    InlineCode,
    Code,
    Blockquote,
    List,
    ListItem,
    Link,
    Image,
    ThematicBreak,
    Break,
    Html,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "root",
            Self::Heading => "heading",
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::InlineCode => "inlineCode",
            Self::Code => "code",
            Self::Blockquote => "blockquote",
            Self::List => "list",
            Self::ListItem => "listItem",
            Self::Link => "link",
            Self::Image => "image",
            Self::ThematicBreak => "thematicBreak",
            Self::Break => "break",
            Self::Html => "html",
            Self::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "root" => Self::Root,
            "heading" => Self::Heading,
            "paragraph" => Self::Paragraph,
            "text" => Self::Text,
            "emphasis" => Self::Emphasis,
            "strong" => Self::Strong,
            "inlineCode" => Self::InlineCode,
            "code" => Self::Code,
            "blockquote" => Self::Blockquote,
            "list" => Self::List,
            "listItem" => Self::ListItem,
            "link" => Self::Link,
            "image" => Self::Image,
            "thematicBreak" => Self::ThematicBreak,
            "break" => Self::Break,
            "html" => Self::Html,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// One element of a document tree.
///
/// The wire shape is `{ "id"?, "type", "depth"?, "value"?, "properties"?,
/// "children"? }` and is the surface an external batch producer sees; keep it
/// stable. A node without `children` is a structural leaf and can never
/// receive children through a command; `Some(vec![])` means an empty
/// container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<NodeId>,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depth: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<Node>>,
}

impl Node {
    /// A structural leaf of the given kind (no `children` field).
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            id: None,
            kind,
            depth: None,
            value: None,
            properties: None,
            children: None,
        }
    }

    /// An empty container of the given kind (`children` present but empty).
    pub fn container(kind: NodeKind) -> Self {
        let mut node = Self::leaf(kind);
        node.children = Some(Vec::new());
        node
    }

    pub fn text(value: impl Into<String>) -> Self {
        let mut node = Self::leaf(NodeKind::Text);
        node.value = Some(value.into());
        node
    }

    pub fn heading(depth: u8) -> Self {
        let mut node = Self::container(NodeKind::Heading);
        node.depth = Some(depth);
        node
    }

    pub fn id(&self) -> Option<&NodeId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: NodeId) {
        self.id = Some(id);
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn depth(&self) -> Option<u8> {
        self.depth
    }

    pub fn set_depth(&mut self, depth: Option<u8>) {
        self.depth = depth;
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value<T: Into<String>>(&mut self, value: Option<T>) {
        self.value = value.map(Into::into);
    }

    pub fn properties(&self) -> Option<&BTreeMap<String, serde_json::Value>> {
        self.properties.as_ref()
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    pub fn children(&self) -> Option<&[Node]> {
        self.children.as_deref()
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        self.children.as_mut()
    }

    pub fn set_children(&mut self, children: Option<Vec<Node>>) {
        self.children = children;
    }

    pub fn push_child(&mut self, child: Node) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .flatten()
            .map(Node::node_count)
            .sum::<usize>()
    }

    /// Shallow-merges a wire `properties` map onto this node.
    ///
    /// Keys naming well-typed node fields (`type`, `depth`, `value`) overwrite
    /// the field; every other key lands in the open `properties` bag. `id` and
    /// `children` are not assignable through a merge: a node's identity is
    /// fixed at assignment, and structure changes go through insert/move.
    pub fn merge_wire_properties(&mut self, updates: &BTreeMap<String, serde_json::Value>) {
        for (key, value) in updates {
            match (key.as_str(), value) {
                ("id", _) | ("children", _) => {}
                ("type", serde_json::Value::String(tag)) => {
                    self.kind = NodeKind::from_tag(tag);
                }
                ("depth", serde_json::Value::Number(number)) => {
                    if let Some(depth) = number.as_u64().and_then(|raw| u8::try_from(raw).ok()) {
                        self.depth = Some(depth);
                    }
                }
                ("value", serde_json::Value::String(text)) => {
                    self.value = Some(text.clone());
                }
                _ => {
                    self.set_property(key.clone(), value.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{Node, NodeKind};

    #[test]
    fn kind_round_trips_known_and_unknown_tags() {
        assert_eq!(NodeKind::from_tag("listItem"), NodeKind::ListItem);
        assert_eq!(NodeKind::from_tag("listItem").as_str(), "listItem");

        let foreign = NodeKind::from_tag("footnoteDefinition");
        assert_eq!(foreign, NodeKind::Other("footnoteDefinition".to_owned()));
        assert_eq!(foreign.as_str(), "footnoteDefinition");
    }

    #[test]
    fn wire_shape_skips_absent_fields() {
        let node = Node::text("hello");
        let json = serde_json::to_value(&node).expect("serialize node");
        assert_eq!(json, serde_json::json!({ "type": "text", "value": "hello" }));

        let container = Node::container(NodeKind::Paragraph);
        let json = serde_json::to_value(&container).expect("serialize node");
        assert_eq!(json, serde_json::json!({ "type": "paragraph", "children": [] }));
    }

    #[test]
    fn merge_overwrites_fields_and_collects_open_keys() {
        let mut node = Node::heading(1);
        node.push_child(Node::text("Intro"));

        let mut updates = BTreeMap::new();
        updates.insert("depth".to_owned(), serde_json::json!(2));
        updates.insert("value".to_owned(), serde_json::json!("raw"));
        updates.insert("lang".to_owned(), serde_json::json!("en"));
        updates.insert("id".to_owned(), serde_json::json!("node-evil"));
        node.merge_wire_properties(&updates);

        assert_eq!(node.depth(), Some(2));
        assert_eq!(node.value(), Some("raw"));
        assert_eq!(
            node.properties().and_then(|map| map.get("lang")),
            Some(&serde_json::json!("en"))
        );
        assert_eq!(node.id(), None);
        assert_eq!(node.children().map(<[Node]>::len), Some(1));
    }

    #[test]
    fn node_count_includes_the_whole_subtree() {
        let mut root = Node::container(NodeKind::Root);
        let mut heading = Node::heading(1);
        heading.push_child(Node::text("Intro"));
        root.push_child(heading);
        root.push_child(Node::leaf(NodeKind::ThematicBreak));

        assert_eq!(root.node_count(), 4);
    }
}
