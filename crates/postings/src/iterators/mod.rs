//! The closed set of posting iterators and their constructors.

use core::fmt;
use std::sync::Arc;

use itertools::Itertools;

use crate::constraints::Constraints;
use crate::cursor::{Bounds, CursorState, DepthTest, Filter, Hit, PostingCursor};
use crate::error::Result;
use crate::matcher::WordMatcher;
use crate::model::{Corpus, DocId, Posting};
use crate::scoring::{Scorer, ScoringInfo};
use crate::tokens::TokenStream;

mod all;
mod any;
mod containment;
mod count;
mod exclusion;
mod nodes;
mod term;

pub use all::AllIterator;
pub use any::AnyIterator;
pub use containment::ContainmentIterator;
pub use count::CountIterator;
pub use exclusion::ExclusionIterator;
pub use nodes::{NodeSource, NodeTest, ScopeSource};
pub use term::{TermSource, check_boundary, check_word_distance};

use term::TextSource;

/// A node of an iterator tree.
pub enum PostingIterator {
    Term(TermSource),
    Nodes(NodeSource),
    Scope(ScopeSource),
    All(AllIterator),
    Any(AnyIterator),
    Containment(ContainmentIterator),
    Exclusion(ExclusionIterator),
    Count(CountIterator),
}

macro_rules! dispatch {
    ($self:ident, $it:ident => $body:expr) => {
        match $self {
            PostingIterator::Term($it) => $body,
            PostingIterator::Nodes($it) => $body,
            PostingIterator::Scope($it) => $body,
            PostingIterator::All($it) => $body,
            PostingIterator::Any($it) => $body,
            PostingIterator::Containment($it) => $body,
            PostingIterator::Exclusion($it) => $body,
            PostingIterator::Count($it) => $body,
        }
    };
}

impl PostingCursor for PostingIterator {
    fn state(&self) -> &CursorState {
        dispatch!(self, it => it.state())
    }

    fn state_mut(&mut self) -> &mut CursorState {
        dispatch!(self, it => it.state_mut())
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        dispatch!(self, it => it.basic_skip_to_doc(doc))
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        dispatch!(self, it => it.basic_skip_to_node(posting, limit))
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        dispatch!(self, it => it.reset_to(posting))
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        dispatch!(self, it => it.in_bounds(bounds))
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        dispatch!(self, it => it.next_before(end))
    }

    fn clone_fresh(&self) -> Self {
        match self {
            PostingIterator::Term(it) => PostingIterator::Term(it.clone_fresh()),
            PostingIterator::Nodes(it) => PostingIterator::Nodes(it.clone_fresh()),
            PostingIterator::Scope(it) => PostingIterator::Scope(it.clone_fresh()),
            PostingIterator::All(it) => PostingIterator::All(it.clone_fresh()),
            PostingIterator::Any(it) => PostingIterator::Any(it.clone_fresh()),
            PostingIterator::Containment(it) => PostingIterator::Containment(it.clone_fresh()),
            PostingIterator::Exclusion(it) => PostingIterator::Exclusion(it.clone_fresh()),
            PostingIterator::Count(it) => PostingIterator::Count(it.clone_fresh()),
        }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        dispatch!(self, it => it.compute_weighting(scorer))
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        dispatch!(self, it => it.compute_score(scorer, doc))
    }

    fn set_ordered(&mut self, ordered: bool) {
        dispatch!(self, it => it.set_ordered(ordered))
    }

    fn is_contiguous(&self) -> bool {
        dispatch!(self, it => it.is_contiguous())
    }

    fn inner_range(&self) -> (Posting, Posting) {
        dispatch!(self, it => it.inner_range())
    }

    fn depth_sensitive(&self) -> bool {
        dispatch!(self, it => it.depth_sensitive())
    }
}

impl PostingIterator {
    /// Word positions matched by `matcher` across the corpus.
    pub fn term(corpus: Arc<dyn Corpus>, matcher: Arc<WordMatcher>) -> Self {
        PostingIterator::Term(TermSource::new(TextSource::Corpus(corpus), matcher))
    }

    /// Word positions of a single token stream, reported as document 0.
    pub fn term_single(tokens: Arc<TokenStream>, matcher: Arc<WordMatcher>) -> Self {
        PostingIterator::Term(TermSource::new(TextSource::Single(tokens), matcher))
    }

    pub fn nodes(corpus: Arc<dyn Corpus>, test: NodeTest) -> Self {
        PostingIterator::Nodes(NodeSource::new(corpus, test))
    }

    /// Nodes whose text confines a contained full-text predicate.
    pub fn scope(corpus: Arc<dyn Corpus>, test: NodeTest) -> Self {
        PostingIterator::Scope(ScopeSource::new(corpus, test))
    }

    pub fn all(subs: Vec<PostingIterator>) -> Self {
        Self::with_constraints(subs, false, Constraints::default())
    }

    pub fn all_ordered(subs: Vec<PostingIterator>) -> Self {
        Self::with_constraints(subs, true, Constraints::default())
    }

    pub fn with_constraints(subs: Vec<PostingIterator>, ordered: bool, constraints: Constraints) -> Self {
        PostingIterator::All(AllIterator::new(subs, ordered, constraints))
    }

    /// Adjacent words in the given order.
    pub fn phrase(subs: Vec<PostingIterator>) -> Self {
        Self::with_constraints(subs, true, Constraints::default().with_distance(0, 0))
    }

    pub fn any(subs: Vec<PostingIterator>) -> Self {
        PostingIterator::Any(AnyIterator::new(subs))
    }

    /// `containing` hits enclosing at least one `contained` hit.
    pub fn contains(containing: PostingIterator, contained: PostingIterator) -> Self {
        PostingIterator::Containment(ContainmentIterator::new(containing, contained, None))
    }

    pub fn contains_ignoring(containing: PostingIterator, contained: PostingIterator, ignored: PostingIterator) -> Self {
        PostingIterator::Containment(ContainmentIterator::new(containing, contained, Some(ignored)))
    }

    /// `what` hits not covered by any `enclosing` hit.
    pub fn not_in(what: PostingIterator, enclosing: PostingIterator) -> Self {
        PostingIterator::Exclusion(ExclusionIterator::new(what, enclosing))
    }

    /// Between `min` and `max` (unbounded if `None`) occurrences of `counted`.
    pub fn count(counted: PostingIterator, min: u32, max: Option<u32>) -> Self {
        PostingIterator::Count(CountIterator::new(counted, min, max))
    }

    pub fn add_filter(&mut self, filter: Arc<dyn Filter>) {
        self.state_mut().filters.push(filter);
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.add_filter(Arc::new(filter));
        self
    }

    pub fn set_depth_test(&mut self, test: DepthTest) {
        self.state_mut().depth_test = Some(test);
    }

    /// Depth test in its compact integer form, see [`DepthTest::from_code`].
    pub fn with_depth_test(mut self, code: i32) -> Self {
        self.set_depth_test(DepthTest::from_code(code));
        self
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.state_mut().weight = weight;
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.set_weight(weight);
        self
    }

    pub fn hit(&self) -> Hit {
        self.state().hit()
    }

    /// Marks this iterator as the operand of a top-level full-text predicate
    /// and runs the weighting pass.
    pub fn set_fulltext_selection(&mut self, scorer: Arc<dyn Scorer>) {
        self.state_mut().scoring = Some(ScoringInfo::new(scorer.clone()));
        let weight = self.compute_weighting(scorer.as_ref());
        tracing::debug!(weight, "full-text selection prepared");
    }

    /// Score of the current document, cached per document id.
    ///
    /// # Panics
    /// When no full-text selection has been set.
    pub fn score(&mut self) -> Result<f32> {
        let doc = self.doc();
        let Some(info) = self.state_mut().scoring.as_mut() else {
            panic!("score() requires set_fulltext_selection() first");
        };
        if let Some(score) = info.cache.get(&doc) {
            return Ok(*score);
        }
        let scorer = info.scorer.clone();
        let score = self.compute_score(scorer.as_ref(), doc)?;
        if let Some(info) = self.state_mut().scoring.as_mut() {
            info.cache.put(doc, score);
        }
        Ok(score)
    }

    /// Enumerates all matches of a fresh clone; for diagnostics only.
    pub fn dump(&self) -> Result<Vec<Hit>> {
        let mut probe = self.clone_fresh();
        let mut hits = Vec::new();
        while probe.next_match()? {
            let hit = probe.hit();
            tracing::debug!(doc = hit.doc, posting = hit.posting, match_end = hit.match_end, depth = hit.depth, "match");
            hits.push(hit);
        }
        tracing::debug!(tree = ?self, matches = hits.len(), "dumped iterator");
        Ok(hits)
    }
}

impl fmt::Debug for PostingIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |subs: &[PostingIterator]| subs.iter().map(|s| format!("{s:?}")).join(", ");
        match self {
            PostingIterator::Term(t) => write!(f, "term({:?})", t.matcher()),
            PostingIterator::Nodes(n) => write!(f, "nodes({:?})", n.test()),
            PostingIterator::Scope(s) => write!(f, "scope({:?})", s.test()),
            PostingIterator::All(a) => {
                let kind = if a.is_ordered() { "ordered" } else { "all" };
                if a.constraints().is_unconstrained() {
                    write!(f, "{kind}({})", list(a.subs()))
                } else {
                    write!(f, "{kind}({}; {:?})", list(a.subs()), a.constraints())
                }
            }
            PostingIterator::Any(a) => write!(f, "any({})", list(a.subs())),
            PostingIterator::Containment(c) => write!(f, "contains({:?}, {:?})", c.containing(), c.contained()),
            PostingIterator::Exclusion(e) => write!(f, "not_in({:?}, {:?})", e.what(), e.enclosing()),
            PostingIterator::Count(c) => {
                let (min, max) = c.range();
                match max {
                    Some(max) => write!(f, "count({:?}, {min}..={max})", c.counted()),
                    None => write!(f, "count({:?}, {min}..)", c.counted()),
                }
            }
        }
    }
}
