//! Node read recording
//!
//! Wraps a node source and records every finalized-node lookup, so tests can
//! check that proof generation touches O(height) stored nodes instead of
//! rebuilding the tree.

use std::cell::RefCell;

use super::source::NodeSource;
use crate::types::Bytes32;

/// One finalized-node lookup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRead {
    /// Level of the node
    pub level: u8,
    /// Position of the node within its level
    pub position: u64,
    /// Whether the source had the node stored
    pub hit: bool,
}

/// Node source that logs every lookup made through it
pub struct RecordingNodeSource<'a, S: ?Sized> {
    inner: &'a S,
    reads: RefCell<Vec<NodeRead>>,
}

impl<'a, S: NodeSource + ?Sized> RecordingNodeSource<'a, S> {
    /// Wraps `inner`
    pub fn new(inner: &'a S) -> Self { Self { inner, reads: RefCell::new(Vec::new()) } }

    /// Returns the lookups recorded so far
    pub fn reads(&self) -> Vec<NodeRead> { self.reads.borrow().clone() }

    /// Returns and clears the recorded lookups
    pub fn take_reads(&self) -> Vec<NodeRead> { self.reads.take() }
}

impl<S: NodeSource + ?Sized> NodeSource for RecordingNodeSource<'_, S> {
    fn height(&self) -> u8 { self.inner.height() }

    fn leaf_count(&self) -> u64 { self.inner.leaf_count() }

    fn finalized_node(&self, level: u8, position: u64) -> Option<Bytes32> {
        let node = self.inner.finalized_node(level, position);
        self.reads.borrow_mut().push(NodeRead { level, position, hit: node.is_some() });
        node
    }

    fn zero_hash(&self, level: u8) -> Bytes32 { self.inner.zero_hash(level) }
}
