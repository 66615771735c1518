//! Single-threaded host loop: runs tasks against the document, delivers
//! mutation records at the checkpoint after each task, and runs frames.

use serde::Serialize;

use crate::core::config::Config;
use crate::core::dom::{Document, NodeId, ParseError};
use crate::core::normalizer::{Normalizer, NormalizerStats};
use crate::core::rules::RewriteOptions;
use crate::core::watcher::{WatchError, Watcher};

/// Upper bound on frames run by [`EventLoop::run_until_idle`].
pub const MAX_FRAMES_PER_IDLE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("no element with id {0:?}")]
    ContainerNotFound(String),
    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[derive(Debug)]
pub struct EventLoop {
    document: Document,
    watcher: Watcher,
}

impl EventLoop {
    pub fn new(document: Document, watcher: Watcher) -> Self {
        Self { document, watcher }
    }

    #[cfg(test)]
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Attach the watcher to the element with `container_id`.
    pub fn attach(&mut self, container_id: &str) -> Result<NodeId, AttachError> {
        let container = self
            .document
            .element_by_id(container_id)
            .ok_or_else(|| AttachError::ContainerNotFound(container_id.to_string()))?;
        self.watcher.observe(&mut self.document, container)?;
        Ok(container)
    }

    /// Run one task, then the checkpoint that delivers its mutations.
    pub fn run_task<R>(&mut self, task: impl FnOnce(&mut Document) -> R) -> R {
        let result = task(&mut self.document);
        self.checkpoint();
        result
    }

    fn checkpoint(&mut self) {
        if self.document.has_pending_records() {
            self.watcher.deliver(&mut self.document);
        }
    }

    /// Run the pending frame, if one was requested. Returns messages handled.
    pub fn animation_frame(&mut self) -> usize {
        if !self.watcher.frame_requested() {
            return 0;
        }
        let handled = self.watcher.on_frame(&mut self.document);
        self.checkpoint();
        handled
    }

    /// Run frames until none is requested. Returns the number of frames run.
    pub fn run_until_idle(&mut self) -> usize {
        let mut frames = 0;
        while self.watcher.frame_requested() {
            if frames == MAX_FRAMES_PER_IDLE {
                log::warn!("still busy after {} frames; yielding", frames);
                break;
            }
            self.animation_frame();
            frames += 1;
        }
        frames
    }
}

/// How replayed messages arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arrival {
    /// One task and one frame per message.
    #[default]
    Streamed,
    /// All messages appended in a single task.
    Burst,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("could not parse page: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Attach(#[from] AttachError),
}

/// Result of [`replay`].
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub markup: String,
    pub messages: usize,
    pub frames: usize,
    pub stats: NormalizerStats,
}

/// Replay a saved chat page as if its messages arrived live.
///
/// The container's existing children are detached, the watcher is attached,
/// and the children are appended back according to `arrival`.
pub fn replay(page: &str, config: &Config, arrival: Arrival) -> Result<ReplayReport, ReplayError> {
    let mut document = Document::parse(page)?;
    let container = document
        .element_by_id(&config.container_id)
        .ok_or_else(|| AttachError::ContainerNotFound(config.container_id.clone()))?;
    let children = document.children(container).to_vec();
    for child in &children {
        document.remove_child(container, *child);
    }

    let normalizer = Normalizer::new(RewriteOptions {
        skip_tags: config.skip_tags.clone(),
    });
    let watcher = Watcher::new(normalizer, config.message_selector.clone());
    let mut event_loop = EventLoop::new(document, watcher);
    event_loop.attach(&config.container_id)?;

    let mut frames = 0;
    match arrival {
        Arrival::Streamed => {
            for child in &children {
                event_loop.run_task(|doc| doc.append_child(container, *child));
                frames += event_loop.run_until_idle();
            }
        }
        Arrival::Burst => {
            event_loop.run_task(|doc| {
                for child in &children {
                    doc.append_child(container, *child);
                }
            });
            frames += event_loop.run_until_idle();
        }
    }

    let stats = event_loop.watcher().normalizer().stats();
    log::info!(
        "replayed {} node(s) in {} frame(s): {} rewritten, {} failed",
        children.len(),
        frames,
        stats.rewritten,
        stats.failed
    );
    let document = event_loop.into_document();
    Ok(ReplayReport {
        markup: document.inner_html(document.root()),
        messages: stats.calls,
        frames,
        stats,
    })
}
