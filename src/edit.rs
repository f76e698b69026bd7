//! Deferred tree edits.
//!
//! Analysis passes only describe structural changes as [`EditOperation`]s; [`apply`]
//! replays them in order once nothing is traversing the tree any more.

use crate::error::MigrateError;
use crate::syntax::{NodeId, Slot, SlotMut, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Replace {
        target: NodeId,
        candidate: NodeId,
    },
    Remove {
        target: NodeId,
    },
    InsertBefore {
        target: NodeId,
        candidate: NodeId,
    },
    InsertAfter {
        target: NodeId,
        candidate: NodeId,
    },
    /// Insert into a list field of `container` at a literal index, clamped to its length.
    InsertAt {
        container: NodeId,
        field: &'static str,
        position: usize,
        candidate: NodeId,
    },
    /// Append to the module body.
    AppendToBody {
        candidate: NodeId,
    },
}

impl EditOperation {
    pub fn action(&self) -> &'static str {
        match self {
            EditOperation::Replace { .. } => "replace",
            EditOperation::Remove { .. } => "remove",
            EditOperation::InsertBefore { .. } => "insert_before",
            EditOperation::InsertAfter { .. } => "insert_after",
            EditOperation::InsertAt { .. } => "insert_at",
            EditOperation::AppendToBody { .. } => "append_to_body",
        }
    }
}

/// Name of the field of `parent` that holds `child`, compared by identity.
pub fn find_field(tree: &Tree, parent: NodeId, child: NodeId) -> Option<&'static str> {
    tree.node(parent)
        .fields()
        .into_iter()
        .find_map(|(name, slot)| {
            let holds = match slot {
                Slot::Required(id) => *id == child,
                Slot::Optional(id) => *id == Some(child),
                Slot::Many(ids) => ids.contains(&child),
            };
            holds.then_some(name)
        })
}

/// Apply `operations` strictly in order, then recompute missing locations.
///
/// The first operation whose target cannot be located aborts the whole apply.
pub fn apply(tree: &mut Tree, operations: &[EditOperation]) -> Result<(), MigrateError> {
    for operation in operations {
        apply_one(tree, operation)?;
    }
    tree.fix_missing_locations();
    Ok(())
}

fn locate(
    tree: &Tree,
    operation: &'static str,
    target: NodeId,
) -> Result<(NodeId, &'static str), MigrateError> {
    let unreachable = || MigrateError::EditTargetUnreachable { operation, target };
    let parent = tree.parent(target).ok_or_else(unreachable)?;
    let field = find_field(tree, parent, target).ok_or_else(unreachable)?;
    if !tree.is_reachable(parent) {
        return Err(unreachable());
    }
    Ok((parent, field))
}

fn apply_one(tree: &mut Tree, operation: &EditOperation) -> Result<(), MigrateError> {
    let action = operation.action();
    match *operation {
        EditOperation::Replace { target, candidate } => {
            let (parent, field) = locate(tree, action, target)?;
            let replaced = match tree.slot_mut(parent, field) {
                Some(SlotMut::Required(slot)) => {
                    *slot = candidate;
                    true
                }
                Some(SlotMut::Optional(slot)) => {
                    *slot = Some(candidate);
                    true
                }
                Some(SlotMut::Many(items)) => match items.iter().position(|id| *id == target) {
                    Some(index) => {
                        items[index] = candidate;
                        true
                    }
                    None => false,
                },
                None => false,
            };
            if !replaced {
                return Err(invalid(action, target, field));
            }
            release(tree, parent, target);
            tree.set_parent(candidate, Some(parent));
        }
        EditOperation::Remove { target } => {
            let (parent, field) = locate(tree, action, target)?;
            let removed = match tree.slot_mut(parent, field) {
                Some(SlotMut::Optional(slot)) => {
                    *slot = None;
                    true
                }
                Some(SlotMut::Many(items)) => {
                    items.retain(|id| *id != target);
                    true
                }
                _ => false,
            };
            if !removed {
                return Err(invalid(action, target, field));
            }
            release(tree, parent, target);
        }
        EditOperation::InsertBefore { target, candidate }
        | EditOperation::InsertAfter { target, candidate } => {
            let offset = usize::from(matches!(operation, EditOperation::InsertAfter { .. }));
            let (parent, field) = locate(tree, action, target)?;
            let inserted = match tree.slot_mut(parent, field) {
                Some(SlotMut::Many(items)) => match items.iter().position(|id| *id == target) {
                    Some(index) => {
                        items.insert(index + offset, candidate);
                        true
                    }
                    None => false,
                },
                _ => false,
            };
            if !inserted {
                return Err(invalid(action, target, field));
            }
            tree.set_parent(candidate, Some(parent));
        }
        EditOperation::InsertAt {
            container,
            field,
            position,
            candidate,
        } => {
            if !tree.is_reachable(container) {
                return Err(MigrateError::EditTargetUnreachable {
                    operation: action,
                    target: container,
                });
            }
            let inserted = match tree.slot_mut(container, field) {
                Some(SlotMut::Many(items)) => {
                    let position = position.min(items.len());
                    items.insert(position, candidate);
                    true
                }
                _ => false,
            };
            if !inserted {
                return Err(invalid(action, container, field));
            }
            tree.set_parent(candidate, Some(container));
        }
        EditOperation::AppendToBody { candidate } => {
            let root = tree.root();
            if let Some(SlotMut::Many(items)) = tree.slot_mut(root, "body") {
                items.push(candidate);
            }
            tree.set_parent(candidate, Some(root));
        }
    }
    Ok(())
}

fn invalid(operation: &'static str, target: NodeId, field: &'static str) -> MigrateError {
    MigrateError::InvalidEdit {
        operation,
        target,
        field,
    }
}

// A candidate built around the target has already taken it over.
fn release(tree: &mut Tree, parent: NodeId, target: NodeId) {
    if tree.parent(target) == Some(parent) {
        tree.set_parent(target, None);
    }
}
