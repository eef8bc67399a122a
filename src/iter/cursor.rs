//! Per-axis cursor state and the algorithms that advance it.
//!
//! Cursors work on local indices and know nothing about handles. Every
//! cursor is fully initialized from a start node by [`Cursor::new`], which
//! is what makes iterators restartable.

use crate::axis::Axis;
use crate::id::PrefixId;
use crate::store::NodeStore;

#[derive(Debug, Clone)]
pub(crate) enum Cursor {
    /// Follows a sibling-style chain: child, attribute, following-sibling.
    Chain { next: Option<u32>, skip_namespaces: bool },
    /// Yields at most one node: parent and self.
    Single(Option<u32>),
    /// Follows parent links upward.
    Upward(Option<u32>),
    /// Scans a half-open range of structural indices upward: descendant,
    /// following.
    Range { next: u32, end: u32 },
    /// Scans downward from `below`, skipping the ancestors listed in
    /// descending order.
    Preceding {
        below: u32,
        ancestors: Vec<u32>,
        skip: usize,
    },
    /// Precomputed nodes, popped from the back.
    Stack(Vec<u32>),
    /// Precomputed nodes, read from the front.
    Queue { nodes: Vec<u32>, index: usize },
}

impl Cursor {
    pub(crate) fn new(axis: Axis, store: &NodeStore, start: u32) -> Self {
        let structural = store.is_structural(start);
        // attribute and namespace nodes sit where their element is
        let owner = if structural {
            start
        } else {
            store.parent(start).unwrap_or(start)
        };
        match axis {
            Axis::Child => Cursor::Chain {
                next: store.first_child(start),
                skip_namespaces: false,
            },
            Axis::Attribute => Cursor::Chain {
                next: if structural {
                    store.first_attribute(start)
                } else {
                    None
                },
                skip_namespaces: true,
            },
            Axis::FollowingSibling => Cursor::Chain {
                next: if structural {
                    store.next_sibling(start)
                } else {
                    None
                },
                skip_namespaces: false,
            },
            Axis::Parent => Cursor::Single(store.parent(start)),
            Axis::Self_ => Cursor::Single(Some(start)),
            Axis::Ancestor => Cursor::Upward(store.parent(start)),
            Axis::AncestorOrSelf => Cursor::Upward(Some(start)),
            Axis::Descendant if structural => Cursor::Range {
                next: start + 1,
                end: store.subtree_end(start),
            },
            Axis::DescendantOrSelf if structural => Cursor::Range {
                next: start,
                end: store.subtree_end(start),
            },
            Axis::Descendant => Cursor::Single(None),
            Axis::DescendantOrSelf => Cursor::Single(Some(start)),
            Axis::Following => Cursor::Range {
                next: if structural {
                    store.subtree_end(start)
                } else {
                    owner + 1
                },
                end: store.first_attribute,
            },
            Axis::Preceding => {
                let mut ancestors = Vec::new();
                let mut current = store.parent(owner);
                while let Some(index) = current {
                    ancestors.push(index);
                    current = store.parent(index);
                }
                Cursor::Preceding {
                    below: owner,
                    ancestors,
                    skip: 0,
                }
            }
            Axis::PrecedingSibling => {
                let mut nodes = Vec::new();
                if structural {
                    let mut current = store.parent(start).and_then(|parent| store.first_child(parent));
                    while let Some(index) = current {
                        if index == start {
                            break;
                        }
                        nodes.push(index);
                        current = store.next_sibling(index);
                    }
                }
                Cursor::Stack(nodes)
            }
            Axis::Namespace => Cursor::Queue {
                // only elements have namespace nodes
                nodes: if store.is_element(start) {
                    in_scope_namespaces(store, start)
                } else {
                    Vec::new()
                },
                index: 0,
            },
        }
    }

    pub(crate) fn next(&mut self, store: &NodeStore) -> Option<u32> {
        match self {
            Cursor::Chain {
                next,
                skip_namespaces,
            } => loop {
                let index = (*next)?;
                *next = store.next_sibling(index);
                if *skip_namespaces && store.is_namespace(index) {
                    continue;
                }
                return Some(index);
            },
            Cursor::Single(next) => next.take(),
            Cursor::Upward(next) => {
                let index = (*next)?;
                *next = store.parent(index);
                Some(index)
            }
            Cursor::Range { next, end } => {
                if *next >= *end {
                    return None;
                }
                let index = *next;
                *next += 1;
                Some(index)
            }
            Cursor::Preceding {
                below,
                ancestors,
                skip,
            } => loop {
                if *below == 0 {
                    return None;
                }
                *below -= 1;
                // ancestors are listed innermost first, so in descending order
                if ancestors.get(*skip).copied() == Some(*below) {
                    *skip += 1;
                    continue;
                }
                return Some(*below);
            },
            Cursor::Stack(nodes) => nodes.pop(),
            Cursor::Queue { nodes, index } => {
                let node = nodes.get(*index).copied()?;
                *index += 1;
                Some(node)
            }
        }
    }
}

/// Namespace nodes in scope on an element, innermost declaration first.
///
/// A prefix declared on several ancestors is reported once, for the
/// innermost declaration. An undeclaration of the default namespace
/// (`xmlns=""`) hides outer default declarations and is not reported.
pub(crate) fn in_scope_namespaces(store: &NodeStore, element: u32) -> Vec<u32> {
    let mut seen: Vec<PrefixId> = Vec::new();
    let mut nodes = Vec::new();
    let mut current = Some(element);
    while let Some(index) = current {
        let mut attribute = store.first_attribute(index);
        while let Some(candidate) = attribute {
            if store.is_namespace(candidate) {
                let prefix = store.prefixes[candidate as usize];
                if !seen.contains(&prefix) {
                    seen.push(prefix);
                    if !store.value_is_empty(candidate) {
                        nodes.push(candidate);
                    }
                }
            }
            attribute = store.next_sibling(candidate);
        }
        current = store.parent(index);
    }
    nodes
}
