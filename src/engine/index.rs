use crate::model::{Booking, SlotKey};

/// Stable handle into the node arena.
type NodeId = usize;

#[derive(Debug, Clone)]
struct Node {
    key: SlotKey,
    booking: Booking,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Which link of a parent points at a node. `None` parent means the root link.
#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// Unbalanced binary search tree over `SlotKey`, nodes stored in an arena.
///
/// Shape depends only on insertion order. Freed slots are recycled through
/// `free`, so handles stay valid for the lifetime of the node they name.
#[derive(Debug, Clone, Default)]
pub struct BookingIndex {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
    len: usize,
}

impl BookingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id].as_ref().expect("live node handle")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id].as_mut().expect("live node handle")
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        let node = self.nodes[id].take().expect("live node handle");
        self.free.push(id);
        node
    }

    fn link_mut(&mut self, parent: Option<(NodeId, Side)>) -> &mut Option<NodeId> {
        match parent {
            None => &mut self.root,
            Some((id, Side::Left)) => &mut self.node_mut(id).left,
            Some((id, Side::Right)) => &mut self.node_mut(id).right,
        }
    }

    /// Locate `key`, returning the link that points (or would point) at it.
    fn find(&self, key: &SlotKey) -> (Option<(NodeId, Side)>, Option<NodeId>) {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => return (parent, Some(id)),
                std::cmp::Ordering::Less => {
                    parent = Some((id, Side::Left));
                    cur = node.left;
                }
                std::cmp::Ordering::Greater => {
                    parent = Some((id, Side::Right));
                    cur = node.right;
                }
            }
        }
        (parent, None)
    }

    /// Insert unless the slot is taken. Returns false (and changes nothing) on a
    /// duplicate key.
    pub fn insert(&mut self, booking: Booking) -> bool {
        let key = booking.slot_key();
        let (parent, existing) = self.find(&key);
        if existing.is_some() {
            return false;
        }
        let id = self.alloc(Node {
            key,
            booking,
            left: None,
            right: None,
        });
        *self.link_mut(parent) = Some(id);
        self.len += 1;
        true
    }

    pub fn search(&self, key: &SlotKey) -> Option<&Booking> {
        let (_, found) = self.find(key);
        found.map(|id| &self.node(id).booking)
    }

    /// Remove the entry for `key`. A node with two children takes over its
    /// in-order successor's entry and the successor's node is unlinked instead.
    pub fn delete(&mut self, key: &SlotKey) -> bool {
        let (parent, Some(id)) = self.find(key) else {
            return false;
        };

        let (left, right) = {
            let node = self.node(id);
            (node.left, node.right)
        };

        match (left, right) {
            (None, None) => {
                *self.link_mut(parent) = None;
                self.release(id);
            }
            (None, Some(child)) | (Some(child), None) => {
                *self.link_mut(parent) = Some(child);
                self.release(id);
            }
            (Some(_), Some(right)) => {
                // Leftmost node of the right subtree; it has no left child.
                let mut succ_parent = (id, Side::Right);
                let mut succ = right;
                while let Some(next) = self.node(succ).left {
                    succ_parent = (succ, Side::Left);
                    succ = next;
                }
                let succ_right = self.node(succ).right;
                *self.link_mut(Some(succ_parent)) = succ_right;
                let moved = self.release(succ);
                let target = self.node_mut(id);
                target.key = moved.key;
                target.booking = moved.booking;
            }
        }
        self.len -= 1;
        true
    }

    /// In-order iterator (ascending `SlotKey`).
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            index: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        iter
    }

    pub fn traverse(&self, mut visit: impl FnMut(&Booking)) {
        for booking in self.iter() {
            visit(booking);
        }
    }

    pub fn traverse_filtered(
        &self,
        predicate: impl Fn(&Booking) -> bool,
        mut visit: impl FnMut(&Booking),
    ) {
        for booking in self.iter().filter(|b| predicate(b)) {
            visit(booking);
        }
    }

    /// Depth of the tree (0 when empty).
    pub fn height(&self) -> usize {
        let mut max = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            let node = self.node(id);
            stack.extend(node.left.map(|l| (l, depth + 1)));
            stack.extend(node.right.map(|r| (r, depth + 1)));
        }
        max
    }
}

pub struct Iter<'a> {
    index: &'a BookingIndex,
    stack: Vec<NodeId>,
}

impl Iter<'_> {
    fn push_left(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            self.stack.push(id);
            cur = self.index.node(id).left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Booking;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let index = self.index;
        let node = index.node(id);
        self.push_left(node.right);
        Some(&node.booking)
    }
}

impl<'a> IntoIterator for &'a BookingIndex {
    type Item = &'a Booking;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
