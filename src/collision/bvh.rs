//! Bounding volume hierarchy over rigid bodies, stored in an arena.

use log::trace;

use super::bounding::BoundingVolume;
use crate::utils::allocator::{Arena, ArenaItem, BodyId, NodeId};

/// Pair of bodies whose bounding volumes overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PotentialContact {
    pub bodies: [BodyId; 2],
}

/// Leaves carry a body and no children; internal nodes carry exactly two
/// children and no body.
#[derive(Debug, Clone)]
pub struct BvhNode<V> {
    pub parent: Option<NodeId>,
    pub children: Option<[NodeId; 2]>,
    pub volume: V,
    pub body: Option<BodyId>,
}

impl<V> ArenaItem for BvhNode<V> {
    type Id = NodeId;
}

impl<V> BvhNode<V> {
    pub fn is_leaf(&self) -> bool {
        self.body.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Bvh<V: BoundingVolume> {
    nodes: Arena<BvhNode<V>>,
    root: Option<NodeId>,
}

impl<V: BoundingVolume> Default for Bvh<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: BoundingVolume> Bvh<V> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
        }
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&BvhNode<V>> {
        self.nodes.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total node count, internal nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Adds a leaf for `body` and returns its handle. The handle stays
    /// valid until the leaf is removed.
    pub fn insert(&mut self, body: BodyId, volume: V) -> NodeId {
        let Some(root) = self.root else {
            let leaf = self.nodes.insert(BvhNode {
                parent: None,
                children: None,
                volume,
                body: Some(body),
            });
            self.root = Some(leaf);
            return leaf;
        };

        // Walk down towards the child that grows least.
        let mut current = root;
        while let Some([left, right]) = self.nodes.get(current).and_then(|node| node.children) {
            let left_growth = self.nodes.get(left).map_or(f32::MAX, |n| n.volume.growth(&volume));
            let right_growth = self.nodes.get(right).map_or(f32::MAX, |n| n.volume.growth(&volume));
            current = if left_growth <= right_growth { left } else { right };
        }

        let Some((old_parent, old_volume)) = self
            .nodes
            .get(current)
            .map(|node| (node.parent, node.volume.clone()))
        else {
            return current;
        };

        let enclosing = V::enclosing(&old_volume, &volume);
        let leaf = self.nodes.insert(BvhNode {
            parent: None,
            children: None,
            volume,
            body: Some(body),
        });
        let branch = self.nodes.insert(BvhNode {
            parent: old_parent,
            children: Some([current, leaf]),
            volume: enclosing,
            body: None,
        });

        if let Some(node) = self.nodes.get_mut(current) {
            node.parent = Some(branch);
        }
        if let Some(node) = self.nodes.get_mut(leaf) {
            node.parent = Some(branch);
        }
        self.replace_child(old_parent, current, branch);
        self.refit_from(old_parent);

        trace!("bvh: inserted body {body} as leaf {leaf}");
        leaf
    }

    /// Removes `node` and everything below it. The sibling takes the
    /// parent's place and the volumes above it are recomputed. Returns
    /// `false` for a stale handle.
    pub fn remove(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get(node).map(|n| n.parent) else {
            return false;
        };

        match parent {
            None => self.root = None,
            Some(parent) => {
                let (grandparent, sibling) = match self.nodes.get(parent) {
                    Some(BvhNode {
                        parent: grandparent,
                        children: Some([left, right]),
                        ..
                    }) => (*grandparent, if *left == node { *right } else { *left }),
                    _ => return false,
                };

                if let Some(sibling_node) = self.nodes.get_mut(sibling) {
                    sibling_node.parent = grandparent;
                }
                self.replace_child(grandparent, parent, sibling);
                self.nodes.remove(parent);
                self.refit_from(grandparent);
            }
        }

        self.free_subtree(node);
        true
    }

    /// Replaces a leaf's volume and refits its ancestors.
    pub fn update_volume(&mut self, leaf: NodeId, volume: V) -> bool {
        let Some(node) = self.nodes.get_mut(leaf) else {
            return false;
        };
        node.volume = volume;
        let parent = node.parent;
        self.refit_from(parent);
        true
    }

    /// Appends up to `limit` candidate pairs to `out` and returns how many
    /// were added. Pairs inside each subtree are reported as well as pairs
    /// across siblings.
    pub fn potential_contacts(&self, out: &mut Vec<PotentialContact>, limit: usize) -> usize {
        match self.root {
            Some(root) => self.contacts_within(root, out, limit),
            None => 0,
        }
    }

    /// Candidate pairs with one body under `one` and the other under `two`.
    pub fn potential_contacts_with(
        &self,
        one: NodeId,
        two: NodeId,
        out: &mut Vec<PotentialContact>,
        limit: usize,
    ) -> usize {
        if limit == 0 {
            return 0;
        }
        let (Some(a), Some(b)) = (self.nodes.get(one), self.nodes.get(two)) else {
            return 0;
        };
        if !a.volume.overlaps(&b.volume) {
            return 0;
        }

        match (a.children, b.children) {
            (None, None) => match (a.body, b.body) {
                (Some(first), Some(second)) => {
                    out.push(PotentialContact {
                        bodies: [first, second],
                    });
                    1
                }
                _ => 0,
            },
            (Some([left, right]), None) => self.split_limit(left, right, two, out, limit),
            (Some([left, right]), Some(_)) if a.volume.size() >= b.volume.size() => {
                self.split_limit(left, right, two, out, limit)
            }
            (_, Some([left, right])) => self.split_limit(left, right, one, out, limit),
        }
    }

    /// True when the leaf/body/children invariant holds everywhere, parent
    /// links agree with child links and every internal volume encloses its
    /// children.
    pub fn is_consistent(&self) -> bool {
        let Some(root) = self.root else {
            return self.nodes.is_empty();
        };
        if self.nodes.get(root).map_or(true, |node| node.parent.is_some()) {
            return false;
        }

        let mut visited = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            visited += 1;
            if node.is_leaf() != node.children.is_none() {
                return false;
            }
            if let Some(children) = node.children {
                for child in children {
                    let Some(child_node) = self.nodes.get(child) else {
                        return false;
                    };
                    if child_node.parent != Some(id) || !node.volume.encloses(&child_node.volume) {
                        return false;
                    }
                    stack.push(child);
                }
            }
        }
        visited == self.nodes.len()
    }

    fn contacts_within(&self, node: NodeId, out: &mut Vec<PotentialContact>, limit: usize) -> usize {
        let Some([left, right]) = self.nodes.get(node).and_then(|n| n.children) else {
            return 0;
        };
        let mut count = self.potential_contacts_with(left, right, out, limit);
        count += self.contacts_within(left, out, limit - count);
        count += self.contacts_within(right, out, limit - count);
        count
    }

    fn split_limit(
        &self,
        left: NodeId,
        right: NodeId,
        other: NodeId,
        out: &mut Vec<PotentialContact>,
        limit: usize,
    ) -> usize {
        let count = self.potential_contacts_with(left, other, out, limit);
        count + self.potential_contacts_with(right, other, out, limit - count)
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: NodeId) {
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                if let Some(children) = self.nodes.get_mut(parent).and_then(|n| n.children.as_mut()) {
                    for child in children.iter_mut() {
                        if *child == old {
                            *child = new;
                        }
                    }
                }
            }
        }
    }

    /// Recomputes internal volumes from `start` up to the root.
    fn refit_from(&mut self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id) else {
                break;
            };
            let parent = node.parent;
            if let Some([left, right]) = node.children {
                if let (Some(l), Some(r)) = (self.nodes.get(left), self.nodes.get(right)) {
                    let volume = V::enclosing(&l.volume, &r.volume);
                    if let Some(node) = self.nodes.get_mut(id) {
                        node.volume = volume;
                    }
                }
            }
            current = parent;
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(removed) = self.nodes.remove(id) {
                if let Some(children) = removed.children {
                    stack.extend(children);
                }
            }
        }
    }
}
