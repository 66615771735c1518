//! Frame queue: coalesces scheduled messages into one processing pass per frame.

use std::collections::HashSet;

use crate::core::dom::NodeId;

/// Messages waiting for the next frame, in scheduling order.
#[derive(Debug, Default)]
pub struct FrameQueue {
    pending: Vec<NodeId>,
    queued: HashSet<NodeId>,
    frame_requested: bool,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `node` for the next frame. Returns false if it is already queued.
    pub fn schedule(&mut self, node: NodeId) -> bool {
        if !self.queued.insert(node) {
            return false;
        }
        self.pending.push(node);
        // one request covers everything queued before the frame runs
        self.frame_requested = true;
        true
    }

    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Start a frame: hand over everything queued and clear the request.
    pub fn take_frame(&mut self) -> Vec<NodeId> {
        self.frame_requested = false;
        self.queued.clear();
        std::mem::take(&mut self.pending)
    }
}
