//! N-ary disjunction.

use smallvec::SmallVec;

use super::PostingIterator;
use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{DocId, MAX_DOC, Posting};
use crate::scoring::{Scorer, inverse_norm};

/// Matches wherever one of its sub-iterators matches.
pub struct AnyIterator {
    subs: Vec<PostingIterator>,
    /// Sub-iterators positioned in the current document.
    active: Vec<bool>,
    /// Sub-iterator providing the current hit.
    current: Option<usize>,
    state: CursorState,
}

impl AnyIterator {
    pub fn new(subs: Vec<PostingIterator>) -> Self {
        assert!(!subs.is_empty(), "disjunction needs at least one operand");
        let active = vec![false; subs.len()];
        Self { subs, active, current: None, state: CursorState::new() }
    }

    pub fn subs(&self) -> &[PostingIterator] {
        &self.subs
    }

    /// Takes the hit of the active sub-iterator with the smallest posting before
    /// `end`; ties go to the earliest sub-iterator.
    fn pick(&mut self, end: Posting) -> bool {
        self.current = self
            .subs
            .iter()
            .enumerate()
            .filter(|(i, s)| self.active[*i] && s.state().on_hit && s.posting() < end)
            .min_by_key(|(i, s)| (s.posting(), *i))
            .map(|(i, _)| i);
        match self.current {
            Some(i) => {
                let sub = &self.subs[i];
                let (posting, match_end, depth) = (sub.posting(), sub.match_end(), sub.depth());
                self.state.set_hit(posting, match_end, depth);
                true
            }
            None => false,
        }
    }

    /// Advances the current sub-iterator and re-picks until the filters accept.
    fn advance(&mut self, end: Posting) -> Result<bool> {
        loop {
            let Some(current) = self.current else {
                return Ok(false);
            };
            self.subs[current].next_before(end)?;
            if !self.pick(end) {
                return Ok(false);
            }
            if self.state.check_filters()? {
                return Ok(true);
            }
        }
    }
}

impl PostingCursor for AnyIterator {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let mut lowest = MAX_DOC;
        for sub in &mut self.subs {
            sub.skip_to_doc(doc)?;
            lowest = lowest.min(sub.doc());
        }
        if lowest == MAX_DOC {
            return Ok(false);
        }
        for (flag, sub) in self.active.iter_mut().zip(&self.subs) {
            *flag = sub.doc() == lowest;
        }
        self.current = None;
        self.state.enter_doc(lowest);
        Ok(true)
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        for (sub, active) in self.subs.iter_mut().zip(&self.active) {
            if *active {
                sub.skip_to_node(posting, limit)?;
            }
        }
        Ok(self.pick(limit))
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        for (sub, active) in self.subs.iter_mut().zip(&self.active) {
            if *active {
                sub.reset_to(posting)?;
            }
        }
        self.current = None;
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        for (sub, active) in self.subs.iter_mut().zip(&self.active) {
            if *active {
                sub.reset_to(bounds.start)?;
                sub.in_bounds(bounds)?;
            }
        }
        if self.pick(bounds.end) && (self.state.check_filters()? || self.advance(bounds.end)?) {
            return Ok(true);
        }
        self.state.pin_node(bounds.end);
        Ok(false)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        if self.advance(end)? {
            return Ok(true);
        }
        self.state.pin_node(end);
        Ok(false)
    }

    fn clone_fresh(&self) -> Self {
        Self {
            subs: self.subs.iter().map(PostingCursor::clone_fresh).collect(),
            active: vec![false; self.subs.len()],
            current: None,
            state: self.state.fresh(),
        }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        let weights: SmallVec<[f32; 8]> = self.subs.iter_mut().map(|s| s.compute_weighting(scorer)).collect();
        self.state.weight_norm = inverse_norm(scorer.norm_or(&weights));
        self.state.weight * self.state.weight_norm
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc {
            return Ok(0.0);
        }
        let mut scores: SmallVec<[f32; 8]> = SmallVec::new();
        for sub in &mut self.subs {
            scores.push(if sub.doc() == doc { sub.compute_score(scorer, doc)? } else { 0.0 });
        }
        Ok(scorer.score_or(&scores) * self.state.weight * self.state.weight_norm)
    }

    fn set_ordered(&mut self, ordered: bool) {
        for sub in &mut self.subs {
            sub.set_ordered(ordered);
        }
    }

    fn is_contiguous(&self) -> bool {
        self.current.is_none_or(|i| self.subs[i].is_contiguous())
    }

    fn inner_range(&self) -> (Posting, Posting) {
        match self.current {
            Some(i) => self.subs[i].inner_range(),
            None => (self.posting(), self.match_end()),
        }
    }

    fn depth_sensitive(&self) -> bool {
        self.state.depth_test.is_some() || self.subs.iter().any(PostingCursor::depth_sensitive)
    }
}
