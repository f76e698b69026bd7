use crate::error::MigrateError;
use crate::syntax::tree::{NodeId, Slot, SlotMut, Tree};

/// Outcome of visiting one element of a list field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    Keep,
    ReplaceWithOne(NodeId),
    ReplaceWithMany(Vec<NodeId>),
    Delete,
}

/// Rebuild the list field `field` of `owner` from the rewrite of each element.
///
/// `visit` sees the elements as they were before the call; the list is swapped in
/// once every element has been visited.
pub fn splice_list<F>(
    tree: &mut Tree,
    owner: NodeId,
    field: &'static str,
    mut visit: F,
) -> Result<(), MigrateError>
where
    F: FnMut(&mut Tree, NodeId) -> Rewrite,
{
    let items = match tree
        .node(owner)
        .fields()
        .into_iter()
        .find(|(name, _)| *name == field)
    {
        Some((_, Slot::Many(items))) => items.clone(),
        _ => {
            return Err(MigrateError::InvalidEdit {
                operation: "splice",
                target: owner,
                field,
            });
        }
    };

    let mut spliced = Vec::with_capacity(items.len());
    for item in items {
        match visit(tree, item) {
            Rewrite::Keep => spliced.push(item),
            Rewrite::ReplaceWithOne(node) => {
                if node != item {
                    detach(tree, owner, item);
                }
                spliced.push(node);
            }
            Rewrite::ReplaceWithMany(nodes) => {
                if !nodes.contains(&item) {
                    detach(tree, owner, item);
                }
                spliced.extend(nodes);
            }
            Rewrite::Delete => detach(tree, owner, item),
        }
    }

    for id in &spliced {
        tree.set_parent(*id, Some(owner));
    }
    if let Some(SlotMut::Many(slot)) = tree.slot_mut(owner, field) {
        *slot = spliced;
    }
    Ok(())
}

// A replacement that wraps `item` has already re-parented it.
fn detach(tree: &mut Tree, owner: NodeId, item: NodeId) {
    if tree.parent(item) == Some(owner) {
        tree.set_parent(item, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Node, parse_module, unparse};

    #[test]
    fn splices_zero_one_and_many() {
        let mut tree = parse_module("a = 1\nb = 2\nc = 3\n").unwrap();
        let root = tree.root();
        let body = tree.module_body().to_vec();
        splice_list(&mut tree, root, "body", |tree, stmt| {
            if stmt == body[0] {
                Rewrite::Delete
            } else if stmt == body[1] {
                let pass = tree.alloc(Node::Pass);
                Rewrite::ReplaceWithMany(vec![pass, stmt])
            } else {
                Rewrite::Keep
            }
        })
        .unwrap();
        assert_eq!(unparse(&tree, root), "pass\nb = 2\nc = 3\n");
        assert!(!tree.is_reachable(body[0]));
        assert!(tree.is_reachable(body[1]));
    }

    #[test]
    fn rejects_non_list_fields() {
        let mut tree = parse_module("a = 1\n").unwrap();
        let stmt = tree.module_body()[0];
        let err = splice_list(&mut tree, stmt, "value", |_, _| Rewrite::Keep).unwrap_err();
        assert!(matches!(err, MigrateError::InvalidEdit { field: "value", .. }));
    }
}
