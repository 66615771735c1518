//! Mutation watcher: finds newly added message elements under the chat
//! container and hands each to the normalizer on the next frame.

mod selector;


pub use selector::{MessageSelector, SelectorError};

use crate::core::dom::{Document, MutationRecord, NodeId, ObserverId};
use crate::core::normalizer::Normalizer;
use crate::core::scheduler::FrameQueue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchError {
    #[error("watcher is already observing a container")]
    AlreadyObserving,
}

#[derive(Debug)]
pub struct Watcher {
    normalizer: Normalizer,
    selector: MessageSelector,
    frames: FrameQueue,
    observer: Option<ObserverId>,
}

impl Watcher {
    pub fn new(normalizer: Normalizer, selector: MessageSelector) -> Self {
        Self {
            normalizer,
            selector,
            frames: FrameQueue::new(),
            observer: None,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Start watching `container` and its subtree. Only one container per watcher.
    pub fn observe(&mut self, doc: &mut Document, container: NodeId) -> Result<(), WatchError> {
        if self.observer.is_some() {
            return Err(WatchError::AlreadyObserving);
        }
        self.observer = Some(doc.observe(container));
        log::debug!("watching {:?} for {}", container, self.selector);
        Ok(())
    }

    /// Deliver queued mutation records (the observer callback). Returns newly scheduled count.
    pub fn deliver(&mut self, doc: &mut Document) -> usize {
        let Some(observer) = self.observer else {
            return 0;
        };
        let records = doc.take_records(observer);
        if records.is_empty() {
            return 0;
        }
        self.on_mutations(doc, &records)
    }

    /// Schedule every message element among, or inside, the added nodes.
    pub fn on_mutations(&mut self, doc: &Document, records: &[MutationRecord]) -> usize {
        let mut scheduled = 0;
        for record in records {
            for &node in &record.added {
                if !doc.is_element(node) {
                    continue;
                }
                let candidates = std::iter::once(node).chain(doc.descendants(node));
                for candidate in candidates {
                    if self.selector.matches(doc, candidate)
                        && !self.normalizer.is_processed(candidate)
                        && self.frames.schedule(candidate)
                    {
                        scheduled += 1;
                    }
                }
            }
        }
        if scheduled > 0 {
            log::trace!(
                "scheduled {} message(s); {} queued for next frame",
                scheduled,
                self.frames.len()
            );
        }
        scheduled
    }

    pub fn frame_requested(&self) -> bool {
        self.frames.frame_requested()
    }

    /// Run one frame: normalize everything scheduled since the last frame.
    pub fn on_frame(&mut self, doc: &mut Document) -> usize {
        if self.frames.is_empty() {
            return 0;
        }
        let batch = self.frames.take_frame();
        for &element in &batch {
            self.normalizer.process(doc, element);
        }
        batch.len()
    }
}
