//! Message normalizer: rewrites pseudo-math in one message element, once.
//!
//! Holds the processed set and the re-entrancy flag. Both use interior
//! mutability because everything runs on a single thread.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use serde::Serialize;

use crate::core::dom::{Document, NodeId, ParseError};
use crate::core::rules::{self, RewriteOptions};

/// What a call to [`Normalizer::process`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The element was handled earlier; nothing done.
    AlreadyProcessed,
    /// Another call was in flight; this one was dropped.
    Dropped,
    /// The detection gate found nothing math-like.
    GateMiss,
    /// Rules ran but produced identical markup.
    Unchanged,
    /// The element's markup was replaced.
    Rewritten,
    /// Rewriting failed; the element was left as is.
    Failed,
}

/// Counters over all calls to [`Normalizer::process`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizerStats {
    pub calls: usize,
    pub already_processed: usize,
    pub dropped: usize,
    pub gate_misses: usize,
    pub unchanged: usize,
    pub rewritten: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
enum RewriteError {
    #[error("could not parse message markup: {0}")]
    Parse(#[from] ParseError),
}

/// Clears the in-flight flag when dropped.
pub(crate) struct InFlight<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[derive(Debug, Default)]
pub struct Normalizer {
    options: RewriteOptions,
    processed: RefCell<HashSet<NodeId>>,
    in_flight: Cell<bool>,
    stats: Cell<NormalizerStats>,
}

impl Normalizer {
    pub fn new(options: RewriteOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn is_processed(&self, element: NodeId) -> bool {
        self.processed.borrow().contains(&element)
    }

    pub fn stats(&self) -> NormalizerStats {
        self.stats.get()
    }

    fn bump(&self, f: impl FnOnce(&mut NormalizerStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Claim the in-flight flag. `None` if a call is already running.
    pub(crate) fn enter(&self) -> Option<InFlight<'_>> {
        if self.in_flight.replace(true) {
            None
        } else {
            Some(InFlight {
                flag: &self.in_flight,
            })
        }
    }

    /// Normalize `element` in place. Idempotent per element.
    ///
    /// Never fails: a rewrite error leaves the element unchanged, is logged,
    /// and still marks the element processed so it is not retried.
    pub fn process(&self, doc: &mut Document, element: NodeId) -> Outcome {
        self.bump(|s| s.calls += 1);

        if self.is_processed(element) {
            self.bump(|s| s.already_processed += 1);
            return Outcome::AlreadyProcessed;
        }

        let Some(_guard) = self.enter() else {
            log::debug!("normalizer busy; dropping call for {:?}", element);
            self.bump(|s| s.dropped += 1);
            return Outcome::Dropped;
        };

        let markup = doc.inner_html(element);
        let outcome = if !rules::looks_like_math(&markup) {
            log::trace!("no math-like content in {:?}", element);
            Outcome::GateMiss
        } else {
            match self.rewrite_element(doc, element, &markup) {
                Ok(true) => {
                    log::debug!("rewrote math delimiters in {:?}", element);
                    Outcome::Rewritten
                }
                Ok(false) => Outcome::Unchanged,
                Err(e) => {
                    log::warn!("math normalization failed for {:?}: {}", element, e);
                    Outcome::Failed
                }
            }
        };

        self.processed.borrow_mut().insert(element);
        self.bump(|s| match outcome {
            Outcome::GateMiss => s.gate_misses += 1,
            Outcome::Unchanged => s.unchanged += 1,
            Outcome::Rewritten => s.rewritten += 1,
            Outcome::Failed => s.failed += 1,
            Outcome::AlreadyProcessed | Outcome::Dropped => {}
        });
        outcome
    }

    /// Returns whether the live element was written to.
    fn rewrite_element(
        &self,
        doc: &mut Document,
        element: NodeId,
        markup: &str,
    ) -> Result<bool, RewriteError> {
        let rewritten = rules::rewrite(markup, &self.options)?;
        if rewritten == markup {
            return Ok(false);
        }
        doc.set_inner_html(element, &rewritten)?;
        Ok(true)
    }
}
