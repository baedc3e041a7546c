//! Work Queue - FIFO queue of pending work items

use std::collections::VecDeque;
use tracing::debug;

use super::types::WorkItem;

/// FIFO work queue with delivery statistics.
///
/// Not synchronized on its own; [`super::Hub`] owns it behind a mutex.
#[derive(Debug, Default)]
pub struct WorkQueue {
    items: VecDeque<WorkItem>,
    /// 統計：已入隊數量
    enqueued_count: u64,
    /// 統計：其中由 filler 注入的數量
    synthetic_count: u64,
    /// 統計：已出隊數量
    dequeued_count: u64,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to the back of the queue
    pub fn enqueue(&mut self, item: WorkItem) {
        debug!(
            "Enqueuing work item {} (code {}, synthetic: {})",
            item.item_id,
            item.code,
            item.is_synthetic()
        );

        if item.is_synthetic() {
            self.synthetic_count += 1;
        }
        self.enqueued_count += 1;
        self.items.push_back(item);
    }

    /// Take the oldest item
    pub fn dequeue(&mut self) -> Option<WorkItem> {
        let item = self.items.pop_front()?;
        self.dequeued_count += 1;
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            current_size: self.items.len(),
            enqueued_total: self.enqueued_count,
            synthetic_total: self.synthetic_count,
            dequeued_total: self.dequeued_count,
        }
    }
}

/// 隊列統計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueueStats {
    pub current_size: usize,
    pub enqueued_total: u64,
    pub synthetic_total: u64,
    pub dequeued_total: u64,
}

impl std::fmt::Display for QueueStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queue[size={}, enq={}, synth={}, deq={}]",
            self.current_size, self.enqueued_total, self.synthetic_total, self.dequeued_total
        )
    }
}
