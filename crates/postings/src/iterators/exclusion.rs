//! `what` hits that no `enclosing` hit covers ("not in").

use super::PostingIterator;
use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{BEFORE_FIRST, DocId, MAX_POSTING, Posting};
use crate::scoring::{Scorer, inverse_norm};

/// Progress of the enclosing cursor through the current range.
#[derive(Debug, Clone, Copy)]
struct Cover {
    end: Posting,
    /// The enclosing cursor sits on a hit not folded into `reach` yet.
    pending: bool,
    /// Largest end among enclosing hits starting at or before the last `what` hit.
    reach: Posting,
}

pub struct ExclusionIterator {
    what: Box<PostingIterator>,
    enclosing: Box<PostingIterator>,
    /// `None` until the enclosing cursor is aligned with the current range.
    cover: Option<Cover>,
    state: CursorState,
}

impl ExclusionIterator {
    pub fn new(what: PostingIterator, enclosing: PostingIterator) -> Self {
        Self { what: Box::new(what), enclosing: Box::new(enclosing), cover: None, state: CursorState::new() }
    }

    pub fn what(&self) -> &PostingIterator {
        &self.what
    }

    pub fn enclosing(&self) -> &PostingIterator {
        &self.enclosing
    }

    /// Puts the enclosing cursor on its first hit of a new range.
    fn align(&mut self, bounds: Bounds) -> Result<Cover> {
        let pending = if self.enclosing.doc() == self.what.doc() {
            self.enclosing.reset_to(bounds.start)?;
            self.enclosing.in_bounds(bounds)?
        } else {
            false
        };
        Ok(Cover { end: bounds.end, pending, reach: BEFORE_FIRST })
    }

    /// True when some enclosing hit starts at or before the current `what` hit
    /// and ends at or after it. `what` starts never decrease within a range, so
    /// the enclosing cursor only moves forward.
    fn is_enclosed(&mut self, bounds: Bounds) -> Result<bool> {
        let mut cover = match self.cover {
            Some(cover) => cover,
            None => self.align(bounds)?,
        };
        let (start, stop) = (self.what.posting(), self.what.match_end());
        while cover.reach < stop && cover.pending && self.enclosing.posting() <= start {
            cover.reach = cover.reach.max(self.enclosing.match_end());
            cover.pending = self.enclosing.next_before(cover.end)?;
        }
        self.cover = Some(cover);
        Ok(cover.reach >= stop)
    }

    fn take_what_hit(&mut self) {
        let (posting, match_end, depth) = (self.what.posting(), self.what.match_end(), self.what.depth());
        self.state.set_hit(posting, match_end, depth);
    }

    fn confined_search(&mut self, mut found: bool, bounds: Bounds) -> Result<bool> {
        while found {
            if !self.is_enclosed(bounds)? {
                self.take_what_hit();
                if self.state.check_filters()? {
                    return Ok(true);
                }
            }
            found = self.what.next_before(bounds.end)?;
        }
        self.state.pin_node(bounds.end);
        Ok(false)
    }
}

impl PostingCursor for ExclusionIterator {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        if !self.what.skip_to_doc(doc)? {
            return Ok(false);
        }
        let current = self.what.doc();
        self.enclosing.skip_to_doc(current)?;
        self.cover = None;
        self.state.enter_doc(current);
        Ok(true)
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        let mut target = posting;
        loop {
            if !self.what.skip_to_node(target, limit)? {
                return Ok(false);
            }
            if !self.is_enclosed(Bounds::new(0, MAX_POSTING))? {
                self.take_what_hit();
                return Ok(true);
            }
            target = self.what.posting().saturating_add(1);
        }
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        self.what.reset_to(posting)?;
        self.cover = None;
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        self.what.reset_to(bounds.start)?;
        self.cover = None;
        let found = self.what.in_bounds(bounds)?;
        self.confined_search(found, bounds)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        let bounds = self.state.confined.unwrap_or_else(Bounds::unbounded).with_end(end);
        let found = self.what.next_before(end)?;
        self.confined_search(found, bounds)
    }

    fn clone_fresh(&self) -> Self {
        Self {
            what: Box::new(self.what.clone_fresh()),
            enclosing: Box::new(self.enclosing.clone_fresh()),
            cover: None,
            state: self.state.fresh(),
        }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        let what = self.what.compute_weighting(scorer);
        let excluded = self.enclosing.compute_weighting(scorer);
        self.state.weight_norm = inverse_norm(scorer.norm_not(what, excluded));
        self.state.weight * self.state.weight_norm
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc {
            return Ok(0.0);
        }
        let what = if self.what.doc() == doc { self.what.compute_score(scorer, doc)? } else { 0.0 };
        let excluded = if self.enclosing.doc() == doc { self.enclosing.compute_score(scorer, doc)? } else { 0.0 };
        Ok(scorer.score_not(what, excluded) * self.state.weight * self.state.weight_norm)
    }

    fn set_ordered(&mut self, ordered: bool) {
        self.what.set_ordered(ordered);
    }

    fn is_contiguous(&self) -> bool {
        self.what.is_contiguous()
    }

    fn inner_range(&self) -> (Posting, Posting) {
        self.what.inner_range()
    }

    fn depth_sensitive(&self) -> bool {
        self.state.depth_test.is_some() || self.what.depth_sensitive()
    }
}
