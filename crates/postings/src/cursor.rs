//! Cursor protocol shared by every posting iterator.
//!
//! Variants implement a handful of primitives (`basic_skip_to_doc`,
//! `basic_skip_to_node`, `reset_to`, `in_bounds`, `next_before`); the retry
//! loops, filter checks and sentinel pinning live in the default methods.

use core::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{BEFORE_FIRST, DocId, MAX_DOC, MAX_POSTING, Posting};
use crate::scoring::{Scorer, ScoringInfo};

/// Snapshot of a cursor position, handed to filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub doc: DocId,
    pub posting: Posting,
    pub match_end: Posting,
    pub depth: i32,
}

/// A confined range `[start, end)` plus the depth of the enclosing container
/// match, which depth tests are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub start: Posting,
    pub end: Posting,
    pub depth: Option<i32>,
}

impl Bounds {
    pub fn new(start: Posting, end: Posting) -> Self {
        Self { start, end, depth: None }
    }

    pub fn unbounded() -> Self {
        Self::new(0, MAX_POSTING)
    }

    pub fn with_depth(mut self, depth: i32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_end(mut self, end: Posting) -> Self {
        self.end = end;
        self
    }
}

/// Relative depth requirement of a cursor nested under a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthTest {
    Exactly(i32),
    AtLeast(i32),
}

impl DepthTest {
    /// Decodes the compact form: `-d` means "at least `d` levels below",
    /// `d >= 0` means "exactly `d` levels below".
    pub fn from_code(code: i32) -> Self {
        if code < 0 { DepthTest::AtLeast(-code) } else { DepthTest::Exactly(code) }
    }

    pub fn accepts(self, depth: i32, base: i32) -> bool {
        let relative = depth - base;
        match self {
            DepthTest::Exactly(d) => relative == d,
            DepthTest::AtLeast(d) => relative >= d,
        }
    }
}

/// Residual condition checked against each raw hit.
pub trait Filter: Send + Sync {
    fn accept(&self, hit: &Hit) -> Result<bool>;
}

impl<F> Filter for F
where
    F: Fn(&Hit) -> bool + Send + Sync,
{
    fn accept(&self, hit: &Hit) -> Result<bool> {
        Ok(self(hit))
    }
}

/// Mutable position plus the configuration every iterator carries.
pub struct CursorState {
    pub doc: DocId,
    pub posting: Posting,
    pub match_end: Posting,
    pub depth: i32,
    /// Set while `posting`/`match_end` describe an accepted raw hit, cleared by
    /// pinning and repositioning.
    pub on_hit: bool,
    /// Range of the last confined call.
    pub confined: Option<Bounds>,
    pub depth_test: Option<DepthTest>,
    pub filters: Vec<Arc<dyn Filter>>,
    pub weight: f32,
    pub weight_norm: f32,
    pub scoring: Option<ScoringInfo>,
}

impl Default for CursorState {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorState {
    pub fn new() -> Self {
        Self {
            doc: BEFORE_FIRST,
            posting: BEFORE_FIRST,
            match_end: BEFORE_FIRST,
            depth: 0,
            on_hit: false,
            confined: None,
            depth_test: None,
            filters: Vec::new(),
            weight: 1.0,
            weight_norm: 1.0,
            scoring: None,
        }
    }

    /// Same configuration, reset position and an empty score cache.
    pub fn fresh(&self) -> Self {
        Self {
            depth_test: self.depth_test,
            filters: self.filters.clone(),
            weight: self.weight,
            weight_norm: self.weight_norm,
            scoring: self.scoring.as_ref().map(ScoringInfo::fresh),
            ..Self::new()
        }
    }

    pub fn hit(&self) -> Hit {
        Hit { doc: self.doc, posting: self.posting, match_end: self.match_end, depth: self.depth }
    }

    pub fn pin_doc(&mut self) {
        self.doc = MAX_DOC;
        self.posting = MAX_POSTING;
        self.match_end = MAX_POSTING;
        self.on_hit = false;
    }

    pub fn pin_node(&mut self, limit: Posting) {
        self.posting = limit;
        self.match_end = limit;
        self.on_hit = false;
    }

    pub fn enter_doc(&mut self, doc: DocId) {
        self.doc = doc;
        self.posting = BEFORE_FIRST;
        self.match_end = BEFORE_FIRST;
        self.on_hit = false;
        self.confined = None;
    }

    /// Positions before `posting` so that the next advance may land on it.
    pub fn rewind(&mut self, posting: Posting) {
        self.posting = posting.saturating_sub(1);
        self.match_end = self.posting;
        self.on_hit = false;
    }

    pub fn set_hit(&mut self, posting: Posting, match_end: Posting, depth: i32) {
        self.posting = posting;
        self.match_end = match_end;
        self.depth = depth;
        self.on_hit = true;
    }

    /// Depth test (only while confined under a container) and then all filters.
    pub fn check_filters(&self) -> Result<bool> {
        if let (Some(test), Some(Bounds { depth: Some(base), .. })) = (self.depth_test, self.confined)
            && !test.accepts(self.depth, base)
        {
            return Ok(false);
        }
        let hit = self.hit();
        for filter in &self.filters {
            if !filter.accept(&hit)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl fmt::Debug for CursorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorState")
            .field("doc", &self.doc)
            .field("posting", &self.posting)
            .field("match_end", &self.match_end)
            .field("depth", &self.depth)
            .field("on_hit", &self.on_hit)
            .field("depth_test", &self.depth_test)
            .field("filters", &self.filters.len())
            .field("weight", &self.weight)
            .finish()
    }
}

/// Two-axis cursor over postings: documents, then positions inside a document.
pub trait PostingCursor: Sized {
    fn state(&self) -> &CursorState;
    fn state_mut(&mut self) -> &mut CursorState;

    /// Moves to the first candidate document `>= doc` and enters it.
    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool>;
    /// Moves to the first raw hit in `[posting, limit)` of the current document,
    /// without consulting filters.
    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool>;
    /// Repositions so that a following confined call finds hits `>= posting`.
    fn reset_to(&mut self, posting: Posting) -> Result<()>;
    /// Finds the first accepted hit inside `bounds`, filters included.
    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool>;
    /// Advances from the current hit to the next accepted one before `end`.
    fn next_before(&mut self, end: Posting) -> Result<bool>;
    /// Born-again copy: same configuration, reset position.
    fn clone_fresh(&self) -> Self;

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32;
    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32>;

    fn set_ordered(&mut self, _ordered: bool) {}

    /// True when the current match has no gaps between its parts.
    fn is_contiguous(&self) -> bool {
        true
    }

    /// Range a contained predicate is confined to.
    fn inner_range(&self) -> (Posting, Posting) {
        (self.posting(), self.match_end())
    }

    /// True when this cursor or one below it carries a depth test.
    fn depth_sensitive(&self) -> bool {
        self.state().depth_test.is_some()
    }

    fn doc(&self) -> DocId {
        self.state().doc
    }

    fn posting(&self) -> Posting {
        self.state().posting
    }

    fn match_end(&self) -> Posting {
        self.state().match_end
    }

    fn span(&self) -> Posting {
        self.match_end() - self.posting()
    }

    fn depth(&self) -> i32 {
        self.state().depth
    }

    fn check_filters(&self) -> Result<bool> {
        self.state().check_filters()
    }

    fn reset_to_before_first_doc(&mut self) {
        *self = self.clone_fresh();
    }

    fn skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let current = self.doc();
        if current == MAX_DOC {
            return Ok(false);
        }
        if current >= doc {
            return Ok(true);
        }
        if self.basic_skip_to_doc(doc.max(0))? {
            tracing::trace!(doc = self.doc(), "entered document");
            Ok(true)
        } else {
            self.state_mut().pin_doc();
            Ok(false)
        }
    }

    fn next_doc(&mut self) -> Result<bool> {
        let current = self.doc();
        if current == MAX_DOC {
            return Ok(false);
        }
        self.skip_to_doc(current.saturating_add(1).max(0))
    }

    /// First accepted hit in `[posting, limit)`. Never moves backwards inside a
    /// document: a target below the current position (a hit or a pinned limit)
    /// is raised to it. Only `reset_to` rewinds.
    fn skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        let mut target = posting.max(0).max(self.posting());
        loop {
            let state = self.state();
            if state.doc < 0 || state.doc == MAX_DOC || state.posting == MAX_POSTING {
                return Ok(false);
            }
            if target >= limit {
                self.state_mut().pin_node(limit);
                return Ok(false);
            }
            let stay = state.on_hit && state.posting >= target && state.posting < limit;
            if !stay && !self.basic_skip_to_node(target, limit)? {
                self.state_mut().pin_node(limit);
                return Ok(false);
            }
            if self.check_filters()? {
                return Ok(true);
            }
            target = self.posting().saturating_add(1);
        }
    }

    fn next_node(&mut self, limit: Posting) -> Result<bool> {
        let current = self.posting();
        if current == MAX_POSTING {
            return Ok(false);
        }
        self.skip_to_node(current.saturating_add(1), limit)
    }

    /// Next accepted hit in document order, moving on to later documents when
    /// the current one is exhausted.
    fn next_match(&mut self) -> Result<bool> {
        loop {
            let doc = self.doc();
            if doc == MAX_DOC {
                return Ok(false);
            }
            if doc >= 0 && self.next_node(MAX_POSTING)? {
                return Ok(true);
            }
            if !self.next_doc()? {
                return Ok(false);
            }
        }
    }

    fn in_range(&mut self, start: Posting, end: Posting) -> Result<bool> {
        self.in_bounds(Bounds::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 3, 3, true)]
    #[case(1, 3, 3, false)]
    #[case(1, 4, 3, true)]
    #[case(-1, 4, 3, true)]
    #[case(-1, 5, 3, true)]
    #[case(-2, 4, 3, false)]
    fn depth_codes(#[case] code: i32, #[case] depth: i32, #[case] base: i32, #[case] expected: bool) {
        assert_eq!(DepthTest::from_code(code).accepts(depth, base), expected);
    }

    #[rstest]
    fn depth_test_only_applies_when_confined_with_depth() {
        let mut state = CursorState::new();
        state.depth_test = Some(DepthTest::Exactly(1));
        state.set_hit(4, 6, 5);
        assert!(state.check_filters().unwrap());
        state.confined = Some(Bounds::new(0, 10));
        assert!(state.check_filters().unwrap());
        state.confined = Some(Bounds::new(0, 10).with_depth(4));
        assert!(state.check_filters().unwrap());
        state.confined = Some(Bounds::new(0, 10).with_depth(2));
        assert!(!state.check_filters().unwrap());
    }

    #[rstest]
    fn closures_are_filters() {
        let mut state = CursorState::new();
        state.filters.push(Arc::new(|hit: &Hit| hit.posting % 2 == 0));
        state.set_hit(3, 3, 0);
        assert!(!state.check_filters().unwrap());
        state.set_hit(4, 4, 0);
        assert!(state.check_filters().unwrap());
    }

    #[rstest]
    fn fresh_keeps_configuration_and_drops_position() {
        let mut state = CursorState::new();
        state.weight = 2.5;
        state.depth_test = Some(DepthTest::AtLeast(1));
        state.enter_doc(3);
        state.set_hit(7, 9, 2);
        let fresh = state.fresh();
        assert_eq!((fresh.doc, fresh.posting, fresh.on_hit), (BEFORE_FIRST, BEFORE_FIRST, false));
        assert_eq!(fresh.weight, 2.5);
        assert_eq!(fresh.depth_test, Some(DepthTest::AtLeast(1)));
    }
}
