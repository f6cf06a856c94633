//! Containing hits that enclose at least one contained hit.
//!
//! One mechanism covers descendant steps (`//a[.//b]`), attribute and element
//! content tests and `ftcontains`: they only differ in what the two cursors are.

use super::PostingIterator;
use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{DocId, Posting};
use crate::scoring::Scorer;

pub struct ContainmentIterator {
    containing: Box<PostingIterator>,
    contained: Box<PostingIterator>,
    /// Kept in document step with the others but not consulted by the search.
    ignored: Option<Box<PostingIterator>>,
    depth_sensitive: bool,
    state: CursorState,
}

impl ContainmentIterator {
    pub fn new(containing: PostingIterator, contained: PostingIterator, ignored: Option<PostingIterator>) -> Self {
        let depth_sensitive = contained.depth_sensitive();
        Self {
            containing: Box::new(containing),
            contained: Box::new(contained),
            ignored: ignored.map(Box::new),
            depth_sensitive,
            state: CursorState::new(),
        }
    }

    pub fn containing(&self) -> &PostingIterator {
        &self.containing
    }

    pub fn contained(&self) -> &PostingIterator {
        &self.contained
    }

    pub fn ignored(&self) -> Option<&PostingIterator> {
        self.ignored.as_deref()
    }

    /// Does the contained predicate hit inside the current containing match?
    fn probe(&mut self) -> Result<bool> {
        let (start, end) = self.containing.inner_range();
        let depth = self.containing.depth();
        let contained = &mut self.contained;
        // cursors only move forward, so a hit outside the new range is dropped
        let stale = !contained.state().on_hit || contained.match_end() <= start || contained.posting() >= end;
        if self.depth_sensitive || stale {
            contained.reset_to(start)?;
        }
        contained.in_bounds(Bounds { start, end, depth: Some(depth) })
    }

    fn take_containing_hit(&mut self) {
        let (posting, match_end, depth) =
            (self.containing.posting(), self.containing.match_end(), self.containing.depth());
        self.state.set_hit(posting, match_end, depth);
    }

    /// From the current containing hit on, finds one that passes the probe and
    /// this iterator's filters.
    fn confined_search(&mut self, mut found: bool, end: Posting) -> Result<bool> {
        while found {
            if self.probe()? {
                self.take_containing_hit();
                if self.state.check_filters()? {
                    return Ok(true);
                }
            }
            found = self.containing.next_before(end)?;
        }
        self.state.pin_node(end);
        Ok(false)
    }
}

impl PostingCursor for ContainmentIterator {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let mut target = doc;
        loop {
            if !self.containing.skip_to_doc(target)? {
                return Ok(false);
            }
            let candidate = self.containing.doc();
            if !self.contained.skip_to_doc(candidate)? {
                return Ok(false);
            }
            if self.contained.doc() == candidate {
                if let Some(ignored) = &mut self.ignored {
                    ignored.skip_to_doc(candidate)?;
                }
                self.state.enter_doc(candidate);
                return Ok(true);
            }
            target = self.contained.doc();
        }
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        let mut target = posting;
        loop {
            if !self.containing.skip_to_node(target, limit)? {
                return Ok(false);
            }
            if self.probe()? {
                self.take_containing_hit();
                return Ok(true);
            }
            target = self.containing.posting().saturating_add(1);
        }
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        self.containing.reset_to(posting)?;
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        self.containing.reset_to(bounds.start)?;
        let found = self.containing.in_bounds(bounds)?;
        self.confined_search(found, bounds.end)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        let found = self.containing.next_before(end)?;
        self.confined_search(found, end)
    }

    fn clone_fresh(&self) -> Self {
        Self {
            containing: Box::new(self.containing.clone_fresh()),
            contained: Box::new(self.contained.clone_fresh()),
            ignored: self.ignored.as_ref().map(|i| Box::new(i.clone_fresh())),
            depth_sensitive: self.depth_sensitive,
            state: self.state.fresh(),
        }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        self.state.weight_norm = 1.0;
        self.contained.compute_weighting(scorer) * self.state.weight
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc || self.contained.doc() != doc {
            return Ok(0.0);
        }
        Ok(self.contained.compute_score(scorer, doc)? * self.state.weight * self.state.weight_norm)
    }

    fn set_ordered(&mut self, ordered: bool) {
        self.contained.set_ordered(ordered);
    }

    fn inner_range(&self) -> (Posting, Posting) {
        self.containing.inner_range()
    }

    fn depth_sensitive(&self) -> bool {
        self.state.depth_test.is_some() || self.containing.depth_sensitive()
    }
}
