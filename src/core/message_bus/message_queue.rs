//=========================================================================
// Double-Buffered Message Queue
//=========================================================================
//
// Two FIFO buffers; exactly one accepts new messages at any instant.
//
// Dispatch cycle:
// ```text
//   frame N:   [current: A]  [idle: B]     pushes land in A
//   flip():    [idle: A] ──taken for drain──►  [current: B] (cleared)
//   drain A:   listeners push into B, unconsumed messages go back to B
//   recycle(): A's allocation returns as the idle buffer
// ```
//
// Anything queued while a buffer drains waits for the next flip, so a
// listener that keeps queueing cannot extend the pass it runs in.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

//=== Internal Dependencies ===============================================

use super::Message;

//=== Pending =============================================================

/// A queued message plus the number of dispatch passes it has been through.
#[derive(Debug, Clone)]
pub(super) struct Pending {
    pub message: Message,
    pub attempts: u32,
}

impl Pending {
    pub fn new(message: Message) -> Self {
        Self { message, attempts: 0 }
    }
}

//=== DoubleBufferedQueue =================================================

#[derive(Debug, Default)]
pub(super) struct DoubleBufferedQueue {
    buffers: [VecDeque<Pending>; 2],
    current: usize,
}

impl DoubleBufferedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the buffer currently accepting messages.
    pub fn push(&mut self, pending: Pending) {
        self.buffers[self.current].push_back(pending);
    }

    /// Swaps which buffer accepts messages and hands back the contents of
    /// the one that was accepting them, oldest first.
    ///
    /// The newly accepting buffer is cleared of stale content first.
    pub fn flip(&mut self) -> VecDeque<Pending> {
        let draining = self.current;
        self.current ^= 1;
        self.buffers[self.current].clear();
        std::mem::take(&mut self.buffers[draining])
    }

    /// Returns a drained buffer's allocation to the idle slot.
    pub fn recycle(&mut self, mut drained: VecDeque<Pending>) {
        drained.clear();
        let idle = self.current ^ 1;
        if self.buffers[idle].is_empty() {
            self.buffers[idle] = drained;
        }
    }

    /// Number of messages waiting in the accepting buffer.
    pub fn len(&self) -> usize {
        self.buffers[self.current].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
