//! Node-id leaves: structural steps and full-text scopes.

use core::fmt;
use std::sync::Arc;

use string_cache::DefaultAtom;

use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::model::{Corpus, DocId, DocumentModel, MAX_DOC, NodeId, NodeKind, Posting};
use crate::scoring::Scorer;
use crate::tokens::TokenStream;

/// Kind and local-name test applied to each node.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct NodeTest {
    pub kind: Option<NodeKind>,
    pub name: Option<DefaultAtom>,
}

impl NodeTest {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn kind(kind: NodeKind) -> Self {
        Self { kind: Some(kind), name: None }
    }

    pub fn element(name: &str) -> Self {
        Self { kind: Some(NodeKind::Element), name: Some(DefaultAtom::from(name)) }
    }

    pub fn attribute(name: &str) -> Self {
        Self { kind: Some(NodeKind::Attribute), name: Some(DefaultAtom::from(name)) }
    }

    pub fn matches(&self, model: &dyn DocumentModel, node: NodeId) -> Result<bool> {
        if let Some(kind) = self.kind
            && model.kind(node)? != kind
        {
            return Ok(false);
        }
        match &self.name {
            Some(name) => Ok(model.name(node)?.as_ref() == Some(name)),
            None => Ok(true),
        }
    }
}

impl fmt::Debug for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            None => "node",
            Some(NodeKind::Document) => "document",
            Some(NodeKind::Element) => "element",
            Some(NodeKind::Attribute) => "attribute",
            Some(NodeKind::Text) => "text",
            Some(NodeKind::Comment) => "comment",
            Some(NodeKind::ProcessingInstruction) => "processing-instruction",
            Some(NodeKind::Namespace) => "namespace",
        };
        match &self.name {
            Some(name) => write!(f, "{kind}({name})"),
            None => write!(f, "{kind}()"),
        }
    }
}

/// Node ids of the corpus documents that pass a [`NodeTest`]; a hit covers
/// the node's subtree.
pub struct NodeSource {
    corpus: Arc<dyn Corpus>,
    test: NodeTest,
    model: Option<Arc<dyn DocumentModel>>,
    state: CursorState,
}

fn first_node(test: &NodeTest, model: &dyn DocumentModel, from: Posting, limit: Posting) -> Result<Option<NodeId>> {
    for node in from.max(0)..limit.min(model.node_count()) {
        if test.matches(model, node)? {
            return Ok(Some(node));
        }
    }
    Ok(None)
}

impl NodeSource {
    pub(crate) fn new(corpus: Arc<dyn Corpus>, test: NodeTest) -> Self {
        Self { corpus, test, model: None, state: CursorState::new() }
    }

    pub fn test(&self) -> &NodeTest {
        &self.test
    }

    pub fn corpus(&self) -> &Arc<dyn Corpus> {
        &self.corpus
    }
}

impl PostingCursor for NodeSource {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        let mut from = doc;
        while let Some(candidate) = self.corpus.next_document(from) {
            let model = self.corpus.document(candidate)?;
            if first_node(&self.test, model.as_ref(), 0, model.node_count())?.is_some() {
                self.model = Some(model);
                self.state.enter_doc(candidate);
                return Ok(true);
            }
            if candidate == MAX_DOC {
                break;
            }
            from = candidate + 1;
        }
        Ok(false)
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        let Some(model) = &self.model else {
            return Ok(false);
        };
        let Some(node) = first_node(&self.test, model.as_ref(), posting, limit)? else {
            return Ok(false);
        };
        let (span, depth) = (model.span(node)?, model.depth(node)?);
        self.state.set_hit(node, node + span, depth);
        Ok(true)
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        self.state.rewind(posting);
        Ok(())
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.state.confined = Some(bounds);
        self.skip_to_node(bounds.start, bounds.end)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        self.next_node(end)
    }

    fn clone_fresh(&self) -> Self {
        Self { corpus: self.corpus.clone(), test: self.test.clone(), model: None, state: self.state.fresh() }
    }

    fn compute_weighting(&mut self, _scorer: &dyn Scorer) -> f32 {
        self.state.weight_norm = 1.0;
        self.state.weight
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc {
            return Ok(0.0);
        }
        let doc_len = self.model.as_ref().map_or(0, |m| usize::try_from(m.node_count()).unwrap_or(0));
        let occurrences = super::term::count_occurrences(self, doc)?;
        Ok(scorer.score_term(occurrences, doc_len) * self.state.weight * self.state.weight_norm)
    }
}

/// Node hits that confine word-level predicates to the words of their subtree.
pub struct ScopeSource {
    nodes: NodeSource,
    tokens: Option<Arc<TokenStream>>,
}

impl ScopeSource {
    pub(crate) fn new(corpus: Arc<dyn Corpus>, test: NodeTest) -> Self {
        Self { nodes: NodeSource::new(corpus, test), tokens: None }
    }

    pub fn test(&self) -> &NodeTest {
        self.nodes.test()
    }
}

impl PostingCursor for ScopeSource {
    fn state(&self) -> &CursorState {
        self.nodes.state()
    }

    fn state_mut(&mut self) -> &mut CursorState {
        self.nodes.state_mut()
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        if !self.nodes.basic_skip_to_doc(doc)? {
            return Ok(false);
        }
        self.tokens = Some(self.nodes.corpus().tokens(self.nodes.doc())?);
        Ok(true)
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        self.nodes.basic_skip_to_node(posting, limit)
    }

    fn reset_to(&mut self, posting: Posting) -> Result<()> {
        self.nodes.reset_to(posting)
    }

    fn in_bounds(&mut self, bounds: Bounds) -> Result<bool> {
        self.nodes.in_bounds(bounds)
    }

    fn next_before(&mut self, end: Posting) -> Result<bool> {
        self.nodes.next_before(end)
    }

    fn clone_fresh(&self) -> Self {
        Self { nodes: self.nodes.clone_fresh(), tokens: None }
    }

    fn compute_weighting(&mut self, scorer: &dyn Scorer) -> f32 {
        self.nodes.compute_weighting(scorer)
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        self.nodes.compute_score(scorer, doc)
    }

    /// Word positions `[first, end)` produced by the text below the current node.
    fn inner_range(&self) -> (Posting, Posting) {
        match &self.tokens {
            Some(tokens) if self.state().on_hit => tokens.word_range(self.posting(), self.match_end()),
            _ => (self.posting(), self.match_end()),
        }
    }
}
