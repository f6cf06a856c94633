//! N-ary conjunction, with phrase/window/distance constraints.

use smallvec::SmallVec;

use super::PostingIterator;
use super::term::{check_boundary, check_word_distance};
use crate::constraints::{Constraints, ContentConstraint};
use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{DocId, MAX_POSTING, Posting};
use crate::scoring::{Scorer, inverse_norm};

type Order = SmallVec<[usize; 8]>;

enum Drag {
    Match,
    Miss,
    Exhausted,
}

/// Matches when every sub-iterator matches; the composite hit spans all parts.
pub struct AllIterator {
    subs: Vec<PostingIterator>,
    ordered: bool,
    constraints: Constraints,
    state: CursorState,
}

impl AllIterator {
    pub fn new(subs: Vec<PostingIterator>, ordered: bool, constraints: Constraints) -> Self {
        assert!(!subs.is_empty(), "conjunction needs at least one operand");
        Self { subs, ordered, constraints, state: CursorState::new() }
    }

    pub fn subs(&self) -> &[PostingIterator] {
        &self.subs
    }

    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    fn uses_fast_path(&self) -> bool {
        self.ordered
            && matches!(self.constraints.content(), ContentConstraint::Any | ContentConstraint::AtStart)
            && (self.constraints.window().is_some() || self.constraints.is_zero_distance())
    }

    /// Sub-iterator indices sorted by current position.
    fn document_order(&self) -> Order {
        let mut order: Order = (0..self.subs.len()).collect();
        order.sort_by_key(|&i| (self.subs[i].posting(), self.subs[i].match_end()));
        order
    }

    fn aggregate(&self) -> (Posting, Posting) {
        if self.ordered {
            (self.subs[0].posting(), self.subs[self.subs.len() - 1].match_end())
        } else {
            let start = self.subs.iter().map(PostingCursor::posting).min().unwrap_or(MAX_POSTING);
            let end = self.subs.iter().map(PostingCursor::match_end).max().unwrap_or(MAX_POSTING);
            (start, end)
        }
    }

    /// Positions sub-iterators `from..` on their first hit inside `bounds`. An
    /// ordered sub-iterator starts no earlier than its predecessor.
    fn seed(&mut self, from: usize, bounds: Bounds) -> Result<bool> {
        for i in from..self.subs.len() {
            let anchor = if self.ordered && i > 0 { self.subs[i - 1].posting() } else { bounds.start };
            let sub = &mut self.subs[i];
            sub.reset_to(anchor)?;
            if !sub.in_bounds(Bounds { start: anchor, ..bounds })? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Next combination, rightmost sub-iterator varying fastest.
    fn next_combination(&mut self, bounds: Bounds) -> Result<bool> {
        let mut i = self.subs.len() - 1;
        loop {
            if self.subs[i].next_before(bounds.end)? {
                if self.seed(i + 1, bounds)? {
                    return Ok(true);
                }
                continue;
            }
            if i == 0 {
                return Ok(false);
            }
            i -= 1;
            tracing::trace!(sub = i, "conjunction rolls back");
        }
    }

    fn satisfies_constraints(&self, start: Posting, end: Posting, bounds: Bounds) -> bool {
        if let Some(window) = self.constraints.window()
            && !check_word_distance(start, end, 0, 0, window)
        {
            return false;
        }
        if let Some((min, max)) = self.constraints.distance() {
            let order = self.document_order();
            for pair in order.windows(2) {
                let (prev, next) = (&self.subs[pair[0]], &self.subs[pair[1]]);
                // overlapping parts have no words in between
                if next.posting() < prev.match_end()
                    || !check_word_distance(prev.match_end(), next.posting(), 0, min, max)
                {
                    return false;
                }
            }
        }
        let last = end.saturating_sub(1);
        match self.constraints.content() {
            ContentConstraint::Any => true,
            ContentConstraint::AtStart => check_boundary(start, bounds.start, true),
            ContentConstraint::AtEnd => check_boundary(last, bounds.end, false),
            ContentConstraint::EntireContent => {
                check_boundary(start, bounds.start, true)
                    && check_boundary(last, bounds.end, false)
                    && self.is_contiguous()
            }
        }
    }

    /// Takes the current combination as the composite hit if it passes the
    /// constraints and the filters.
    fn accept_current(&mut self, bounds: Bounds) -> Result<bool> {
        let (start, end) = self.aggregate();
        if !self.satisfies_constraints(start, end, bounds) {
            return Ok(false);
        }
        let first = if self.ordered { 0 } else { self.document_order()[0] };
        let depth = self.subs[first].depth();
        self.state.set_hit(start, end, depth);
        self.state.check_filters()
    }

    /// Moves the later sub-iterators right behind their predecessor; with a
    /// zero distance each one has to start exactly where the previous ends.
    fn drag_rest(&mut self, bounds: Bounds) -> Result<Drag> {
        let adjacent = self.constraints.is_zero_distance();
        for i in 1..self.subs.len() {
            let prev = &self.subs[i - 1];
            let anchor = if adjacent { prev.match_end() } else { prev.posting() };
            let sub = &mut self.subs[i];
            sub.reset_to(anchor)?;
            if !sub.in_bounds(Bounds { start: anchor, ..bounds })? {
                return Ok(Drag::Exhausted);
            }
            if adjacent && sub.posting() != anchor {
                return Ok(Drag::Miss);
            }
        }
        Ok(Drag::Match)
    }

    fn drag_search(&mut self, bounds: Bounds, mut advance_first: bool) -> Result<bool> {
        loop {
            let moved = if advance_first {
                self.subs[0].next_before(bounds.end)?
            } else {
                self.subs[0].reset_to(bounds.start)?;
                self.subs[0].in_bounds(bounds)?
            };
            if !moved {
                return Ok(false);
            }
            advance_first = true;
            match self.drag_rest(bounds)? {
                Drag::Match if self.accept_current(bounds)? => return Ok(true),
                Drag::Match | Drag::Miss => {}
                Drag::Exhausted => return Ok(false),
            }
        }
    }

    /// Free-mode search: the accepted combination with the smallest start.
    ///
    /// Ordered combinations are enumerated by increasing first posting, so the
    /// first accepted one is the earliest. Unordered ones are not: the start is
    /// the minimum over all parts, so every combination has to be looked at
    /// (stopping early only at `bounds.start`) and the winner is then replayed.
    fn earliest(&mut self, bounds: Bounds) -> Result<bool> {
        if self.ordered {
            return self.search(bounds);
        }
        if !self.seed(0, bounds)? {
            return Ok(false);
        }
        let mut best: Option<Posting> = None;
        loop {
            if self.accept_current(bounds)? {
                let start = self.state.posting;
                if start == bounds.start {
                    return Ok(true);
                }
                if best.is_none_or(|b| start < b) {
                    best = Some(start);
                }
            }
            if !self.next_combination(bounds)? {
                break;
            }
        }
        let Some(best) = best else {
            return Ok(false);
        };
        tracing::trace!(posting = best, "conjunction replays earliest combination");
        if !self.seed(0, bounds)? {
            return Ok(false);
        }
        loop {
            if self.accept_current(bounds)? && self.state.posting == best {
                return Ok(true);
            }
            if !self.next_combination(bounds)? {
                return Ok(false);
            }
        }
    }

    fn search(&mut self, bounds: Bounds) -> Result<bool> {
        if self.uses_fast_path() {
            return self.drag_search(bounds, false);
        }
        if !self.seed(0, bounds)? {
            return Ok(false);
        }
        loop {
            if self.accept_current(bounds)? {
                return Ok(true);
            }
            if !self.next_combination(bounds)? {
                return Ok(false);
            }
        }
    }
}

impl PostingCursor for AllIterator {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let mut target = doc;
        loop {
            let mut highest = target;
            for sub in &mut self.subs {
                if !sub.skip_to_doc(target)? {
                    return Ok(false);
                }
                highest = highest.max(sub.doc());
            }
            if self.subs.iter().all(|s| s.doc() == highest) {
                self.state.enter_doc(highest);
                return Ok(true);
            }
            target = highest;
        }
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        self.earliest(Bounds::new(posting, limit))
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        for sub in &mut self.subs {
            sub.reset_to(posting)?;
        }
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        if self.search(bounds)? {
            return Ok(true);
        }
        self.state.pin_node(bounds.end);
        Ok(false)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        let bounds = self.state.confined.unwrap_or_else(Bounds::unbounded).with_end(end);
        let found = if self.uses_fast_path() {
            self.drag_search(bounds, true)?
        } else {
            loop {
                if !self.next_combination(bounds)? {
                    break false;
                }
                if self.accept_current(bounds)? {
                    break true;
                }
            }
        };
        if !found {
            self.state.pin_node(end);
        }
        Ok(found)
    }

    fn clone_fresh(&self) -> Self {
        Self {
            subs: self.subs.iter().map(PostingCursor::clone_fresh).collect(),
            ordered: self.ordered,
            constraints: self.constraints,
            state: self.state.fresh(),
        }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        let weights: SmallVec<[f32; 8]> = self.subs.iter_mut().map(|s| s.compute_weighting(scorer)).collect();
        self.state.weight_norm = inverse_norm(scorer.norm_all(&weights));
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
        Ok(scorer.score_all(&scores) * self.state.weight * self.state.weight_norm)
    }

    fn set_ordered(&mut self, ordered: bool) {
        self.ordered = ordered;
    }

    /// Parts follow each other without gaps, each part itself contiguous.
    fn is_contiguous(&self) -> bool {
        let order = self.document_order();
        order.windows(2).all(|pair| {
            let (prev, next) = (&self.subs[pair[0]], &self.subs[pair[1]]);
            next.posting() <= prev.match_end()
        }) && self.subs.iter().all(PostingCursor::is_contiguous)
    }

    fn depth_sensitive(&self) -> bool {
        self.state.depth_test.is_some() || self.subs.iter().any(PostingCursor::depth_sensitive)
    }
}
