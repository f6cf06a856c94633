//! "Occurs `min` to `max` times" predicate; only answers confined calls.

use super::PostingIterator;
use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{DocId, Posting};
use crate::scoring::Scorer;

pub struct CountIterator {
    counted: Box<PostingIterator>,
    min: u32,
    max: Option<u32>,
    state: CursorState,
}

impl CountIterator {
    pub fn new(mut counted: PostingIterator, min: u32, max: Option<u32>) -> Self {
        counted.set_ordered(true);
        Self { counted: Box::new(counted), min, max, state: CursorState::new() }
    }

    pub fn counted(&self) -> &PostingIterator {
        &self.counted
    }

    pub fn range(&self) -> (u32, Option<u32>) {
        (self.min, self.max)
    }

    /// Number of hits after which the outcome is decided.
    fn decisive_count(&self) -> u32 {
        match self.max {
            Some(max) => max.saturating_add(1),
            None => self.min.max(1),
        }
    }
}

impl PostingCursor for CountIterator {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let found = self.counted.skip_to_doc(doc)?;
        if self.min == 0 {
            // zero occurrences qualify, so every document is a candidate
            self.state.enter_doc(doc);
            return Ok(true);
        }
        if !found {
            return Ok(false);
        }
        self.state.enter_doc(self.counted.doc());
        Ok(true)
    }

    fn basic_skip_to_node(&mut self, _posting: Posting, _limit: Posting) -> Result<bool> {
        panic!("an occurrence count cannot be enumerated on its own; use it below a containment")
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        self.counted.reset_to(posting)?;
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        let cap = self.decisive_count();
        let mut count = 0u32;
        let mut first = None;
        if self.counted.doc() == self.state.doc {
            self.counted.reset_to(bounds.start)?;
            let mut found = self.counted.in_bounds(bounds)?;
            while found {
                count += 1;
                if first.is_none() {
                    first = Some((self.counted.posting(), self.counted.match_end(), self.counted.depth()));
                }
                if count >= cap {
                    break;
                }
                found = self.counted.next_before(bounds.end)?;
            }
        }
        let accepted = count >= self.min && self.max.is_none_or(|max| count <= max);
        tracing::trace!(count, accepted, "occurrence count");
        if !accepted {
            self.state.pin_node(bounds.end);
            return Ok(false);
        }
        let (posting, match_end, depth) = first.unwrap_or((bounds.start, bounds.start, bounds.depth.unwrap_or(0)));
        self.state.set_hit(posting, match_end, depth);
        if self.state.check_filters()? {
            return Ok(true);
        }
        self.state.pin_node(bounds.end);
        Ok(false)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        self.state.pin_node(end);
        Ok(false)
    }

    fn clone_fresh(&self) -> Self {
        Self { counted: Box::new(self.counted.clone_fresh()), min: self.min, max: self.max, state: self.state.fresh() }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        self.state.weight_norm = 1.0;
        self.counted.compute_weighting(scorer) * self.state.weight
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc || self.counted.doc() != doc {
            return Ok(0.0);
        }
        Ok(self.counted.compute_score(scorer, doc)? * self.state.weight * self.state.weight_norm)
    }

    fn depth_sensitive(&self) -> bool {
        self.state.depth_test.is_some() || self.counted.depth_sensitive()
    }
}
