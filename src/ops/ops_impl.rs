// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

/// Command-application implementation helpers used by `execute_commands`.
/// Keeps `ops::mod` focused on public command types and orchestration.
fn apply_command(
    root: &mut Node,
    allocator: &mut IdAllocator,
    command: &Command,
) -> Result<CommandEffect, CommandError> {
    match command {
        Command::Insert {
            target,
            position,
            node,
        } => apply_insert(root, allocator, target, *position, node),
        Command::Delete { target } => apply_delete(root, target),
        Command::Move {
            target,
            destination,
            position,
        } => apply_move(root, target, destination, *position),
        Command::Modify {
            target,
            properties,
            value,
        } => apply_modify(root, target, properties.as_ref(), value.as_deref()),
        Command::Replace { target, node } => apply_replace(root, allocator, target, node),
    }
}

fn apply_insert(
    root: &mut Node,
    allocator: &mut IdAllocator,
    target: &NodeId,
    position: Position,
    spec: &NodeSpec,
) -> Result<CommandEffect, CommandError> {
    validate_placement(root, target, position)?;

    let node = spec.instantiate(allocator);
    let new_id = node
        .id()
        .cloned()
        .expect("instantiated nodes carry a fresh id");

    place(root, target, position, node)?;
    Ok(CommandEffect::Inserted { new_id })
}

fn apply_delete(root: &mut Node, target: &NodeId) -> Result<CommandEffect, CommandError> {
    if root.id() == Some(target) {
        return Err(CommandError::InvalidTarget {
            node_id: target.clone(),
            reason: InvalidTargetReason::RootHasNoParent,
        });
    }

    let Some((parent, index)) = find_parent_and_index_mut(root, target) else {
        return Err(CommandError::NotFound {
            node_id: target.clone(),
        });
    };

    parent
        .children_mut()
        .expect("parent located via child index")
        .remove(index);

    Ok(CommandEffect::Deleted {
        node_id: target.clone(),
    })
}

fn apply_move(
    root: &mut Node,
    target: &NodeId,
    destination: &NodeId,
    position: Position,
) -> Result<CommandEffect, CommandError> {
    if root.id() == Some(target) {
        return Err(CommandError::InvalidTarget {
            node_id: target.clone(),
            reason: InvalidTargetReason::RootHasNoParent,
        });
    }

    let Some(target_node) = find_node_by_id(root, target) else {
        return Err(CommandError::NotFound {
            node_id: target.clone(),
        });
    };

    // A destination inside the moving subtree (the node itself included)
    // would detach the subtree from the tree and close it into a cycle.
    if find_node_by_id(target_node, destination).is_some() {
        return Err(CommandError::CycleWouldForm {
            target: target.clone(),
            destination: destination.clone(),
        });
    }

    // Placement is validated before the node is detached, so reinsertion
    // below cannot fail and the tree is never left without the node.
    validate_placement(root, destination, position)?;

    let (parent, index) =
        find_parent_and_index_mut(root, target).expect("non-root target located above");
    let node = parent
        .children_mut()
        .expect("parent located via child index")
        .remove(index);

    place(root, destination, position, node)?;
    Ok(CommandEffect::Moved {
        node_id: target.clone(),
    })
}

fn apply_modify(
    root: &mut Node,
    target: &NodeId,
    properties: Option<&BTreeMap<String, serde_json::Value>>,
    value: Option<&str>,
) -> Result<CommandEffect, CommandError> {
    let Some(node) = find_node_by_id_mut(root, target) else {
        return Err(CommandError::NotFound {
            node_id: target.clone(),
        });
    };

    if let Some(properties) = properties {
        node.merge_wire_properties(properties);
    }
    // A given value always lands, container or not; the serializer decides
    // what a value on an unconventional kind means.
    if let Some(value) = value {
        node.set_value(Some(value));
    }

    Ok(CommandEffect::Modified {
        node_id: target.clone(),
    })
}

fn apply_replace(
    root: &mut Node,
    allocator: &mut IdAllocator,
    target: &NodeId,
    spec: &NodeSpec,
) -> Result<CommandEffect, CommandError> {
    if root.id() == Some(target) {
        return Err(CommandError::InvalidTarget {
            node_id: target.clone(),
            reason: InvalidTargetReason::RootHasNoParent,
        });
    }

    if find_node_by_id(root, target).is_none() {
        return Err(CommandError::NotFound {
            node_id: target.clone(),
        });
    }

    let node = spec.instantiate(allocator);
    let new_id = node
        .id()
        .cloned()
        .expect("instantiated nodes carry a fresh id");

    let (parent, index) =
        find_parent_and_index_mut(root, target).expect("non-root target located above");
    parent
        .children_mut()
        .expect("parent located via child index")[index] = node;

    Ok(CommandEffect::Replaced {
        node_id: target.clone(),
        new_id,
    })
}

/// Checks that `anchor` can receive a node at `position` without mutating
/// anything: the anchor must exist, before/after need a parent, and
/// into-placements need the anchor to be a container.
fn validate_placement(
    root: &Node,
    anchor: &NodeId,
    position: Position,
) -> Result<(), CommandError> {
    let Some(anchor_node) = find_node_by_id(root, anchor) else {
        return Err(CommandError::NotFound {
            node_id: anchor.clone(),
        });
    };

    if position.is_into() {
        if !anchor_node.is_container() {
            return Err(CommandError::InvalidTarget {
                node_id: anchor.clone(),
                reason: InvalidTargetReason::NotAContainer,
            });
        }
    } else if root.id() == Some(anchor) {
        return Err(CommandError::InvalidTarget {
            node_id: anchor.clone(),
            reason: InvalidTargetReason::RootHasNoParent,
        });
    }

    Ok(())
}

fn place(
    root: &mut Node,
    anchor: &NodeId,
    position: Position,
    node: Node,
) -> Result<(), CommandError> {
    match position {
        Position::Before | Position::After => {
            let Some((parent, index)) = find_parent_and_index_mut(root, anchor) else {
                return Err(CommandError::InvalidTarget {
                    node_id: anchor.clone(),
                    reason: InvalidTargetReason::RootHasNoParent,
                });
            };
            let offset = if position == Position::After {
                index + 1
            } else {
                index
            };
            parent
                .children_mut()
                .expect("parent located via child index")
                .insert(offset, node);
        }
        Position::FirstChild | Position::LastChild | Position::Index(_) => {
            let Some(anchor_node) = find_node_by_id_mut(root, anchor) else {
                return Err(CommandError::NotFound {
                    node_id: anchor.clone(),
                });
            };
            let Some(children) = anchor_node.children_mut() else {
                return Err(CommandError::InvalidTarget {
                    node_id: anchor.clone(),
                    reason: InvalidTargetReason::NotAContainer,
                });
            };
            match position {
                Position::FirstChild => children.insert(0, node),
                Position::LastChild => children.push(node),
                Position::Index(index) => {
                    // Out-of-range indices clamp to an append.
                    let at = index.min(children.len());
                    children.insert(at, node);
                }
                Position::Before | Position::After => unreachable!("handled above"),
            }
        }
    }

    Ok(())
}
