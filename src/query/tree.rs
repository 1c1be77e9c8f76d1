// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use crate::model::{Node, NodeId, NodeKind};

/// Finds the node carrying `id`, searching pre-order from `root`.
///
/// Trees produced by id assignment have unique ids; on a foreign tree with
/// duplicates the first pre-order match wins, which keeps lookups
/// deterministic.
pub fn find_node_by_id<'a>(root: &'a Node, id: &NodeId) -> Option<&'a Node> {
    if root.id() == Some(id) {
        return Some(root);
    }
    root.children()
        .into_iter()
        .flatten()
        .find_map(|child| find_node_by_id(child, id))
}

pub fn find_node_by_id_mut<'a>(root: &'a mut Node, id: &NodeId) -> Option<&'a mut Node> {
    if root.id() == Some(id) {
        return Some(root);
    }
    root.children_mut()?
        .iter_mut()
        .find_map(|child| find_node_by_id_mut(child, id))
}

/// Finds the parent of the node carrying `id` and the child's index within it.
///
/// Returns `None` when `id` names the root (it has no parent) or is absent.
pub fn find_parent_and_index<'a>(root: &'a Node, id: &NodeId) -> Option<(&'a Node, usize)> {
    let children = root.children()?;
    if let Some(index) = children.iter().position(|child| child.id() == Some(id)) {
        return Some((root, index));
    }
    children
        .iter()
        .find_map(|child| find_parent_and_index(child, id))
}

pub fn find_parent_and_index_mut<'a>(
    root: &'a mut Node,
    id: &NodeId,
) -> Option<(&'a mut Node, usize)> {
    let index = root
        .children()?
        .iter()
        .position(|child| child.id() == Some(id));
    if let Some(index) = index {
        return Some((root, index));
    }
    root.children_mut()?
        .iter_mut()
        .find_map(|child| find_parent_and_index_mut(child, id))
}

/// Finds the node carrying `id` together with its parent, in one pass.
/// The parent is `None` when `id` names the root itself.
pub fn find_node_and_parent<'a>(
    root: &'a Node,
    id: &NodeId,
) -> Option<(&'a Node, Option<&'a Node>)> {
    if root.id() == Some(id) {
        return Some((root, None));
    }

    fn walk<'a>(parent: &'a Node, id: &NodeId) -> Option<(&'a Node, &'a Node)> {
        for child in parent.children().into_iter().flatten() {
            if child.id() == Some(id) {
                return Some((child, parent));
            }
            if let Some(found) = walk(child, id) {
                return Some(found);
            }
        }
        None
    }

    walk(root, id).map(|(node, parent)| (node, Some(parent)))
}

/// All nodes of the given kind, in pre-order.
pub fn find_nodes_by_kind<'a>(root: &'a Node, kind: &NodeKind) -> Vec<&'a Node> {
    let mut results = Vec::new();

    fn walk<'a>(node: &'a Node, kind: &NodeKind, results: &mut Vec<&'a Node>) {
        if node.kind() == kind {
            results.push(node);
        }
        for child in node.children().into_iter().flatten() {
            walk(child, kind, results);
        }
    }

    walk(root, kind, &mut results);
    results
}
