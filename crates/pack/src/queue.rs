//! FIFO queue for step-wise placement.

use std::collections::VecDeque;
use u_pallet_core::PlaceRequest;

/// A validated request waiting to be placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedRequest {
    /// Position of the request in the list it was enqueued from.
    pub source_index: usize,
    /// The request.
    pub request: PlaceRequest,
}

/// Requests in the order they were enqueued. Never reordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementQueue {
    pending: VecDeque<QueuedRequest>,
}

impl PlacementQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    pub fn push(&mut self, source_index: usize, request: PlaceRequest) {
        self.pending.push_back(QueuedRequest {
            source_index,
            request,
        });
    }

    /// Removes and returns the oldest request.
    pub fn pop(&mut self) -> Option<QueuedRequest> {
        self.pending.pop_front()
    }

    /// Number of pending requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every pending request.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
