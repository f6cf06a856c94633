//! Simple in-memory document model and corpus used in tests and quick prototypes.
//!
//! Focus:
//! - Ergonomic builder for quick test tree creation
//! - Pre-order node ids with subtree spans, as the posting iterators expect
//! - Thread-safe (immutable arena behind `Arc`) for clone-per-thread evaluation
//!
//! Example:
//! ```
//! use platynui_postings::simple_doc::{doc, elem, text, attr};
//! use platynui_postings::{DocumentModel, NodeKind};
//!
//! // <root id="r"><child>Hello</child><child/></root>
//! let document = doc()
//!     .child(
//!         elem("root")
//!             .attr(attr("id", "r"))
//!             .child(elem("child").child(text("Hello")))
//!             .child(elem("child")),
//!     )
//!     .build();
//!
//! assert_eq!(document.node_count(), 6);
//! assert_eq!(document.kind(2).unwrap(), NodeKind::Attribute);
//! assert_eq!(document.span(1).unwrap(), 5); // root, @id, child, text, child
//! assert_eq!(document.depth(4).unwrap(), 2);
//! ```
use std::collections::BTreeMap;
use std::sync::Arc;

use string_cache::DefaultAtom;

use crate::error::{Error, Result};
use crate::model::{BEFORE_FIRST, Corpus, DocId, DocumentModel, NodeId, NodeKind, Posting};
use crate::tokens::{TokenStream, Tokenizer};

#[derive(Debug, Clone)]
struct NodeRecord {
    kind: NodeKind,
    name: Option<DefaultAtom>,
    value: Option<String>,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    next_sibling: Option<NodeId>,
    span: Posting,
    depth: i32,
}

/// Pre-order arena of nodes.
#[derive(Debug, Clone)]
pub struct SimpleDocument {
    id: DocId,
    nodes: Vec<NodeRecord>,
}

impl SimpleDocument {
    fn record(&self, node: NodeId) -> Result<&NodeRecord> {
        usize::try_from(node)
            .ok()
            .and_then(|n| self.nodes.get(n))
            .ok_or(Error::NodeNotFound { doc: self.id, node })
    }

    /// Id assigned by the corpus, or [`BEFORE_FIRST`] for a standalone document.
    pub fn id(&self) -> DocId {
        self.id
    }

    /// Ids of all nodes with the given kind and local name, in document order.
    pub fn find(&self, kind: NodeKind, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == kind && n.name.as_deref() == Some(name))
            .filter_map(|(i, _)| NodeId::try_from(i).ok())
            .collect()
    }
}

impl DocumentModel for SimpleDocument {
    fn node_count(&self) -> NodeId {
        NodeId::try_from(self.nodes.len()).unwrap_or(NodeId::MAX)
    }
    fn kind(&self, node: NodeId) -> Result<NodeKind> {
        Ok(self.record(node)?.kind)
    }
    fn name(&self, node: NodeId) -> Result<Option<DefaultAtom>> {
        Ok(self.record(node)?.name.clone())
    }
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.record(node)?.parent)
    }
    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.record(node)?.next_sibling)
    }
    fn first_child(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.record(node)?.first_child)
    }
    fn span(&self, node: NodeId) -> Result<Posting> {
        Ok(self.record(node)?.span)
    }
    fn depth(&self, node: NodeId) -> Result<i32> {
        Ok(self.record(node)?.depth)
    }
    fn text(&self, node: NodeId) -> Result<Option<&str>> {
        Ok(self.record(node)?.value.as_deref())
    }
}

pub struct SimpleDocumentBuilder {
    kind: NodeKind,
    name: Option<DefaultAtom>,
    value: Option<String>,
    attributes: Vec<SimpleDocumentBuilder>,
    children: Vec<SimpleDocumentBuilder>,
}

impl SimpleDocumentBuilder {
    fn new(kind: NodeKind, name: Option<&str>, value: Option<&str>) -> Self {
        Self {
            kind,
            name: name.map(DefaultAtom::from),
            value: value.map(str::to_string),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: SimpleDocumentBuilder) -> Self {
        debug_assert!(child.kind != NodeKind::Attribute, "use attr() for attributes");
        self.children.push(child);
        self
    }

    pub fn children<I: IntoIterator<Item = SimpleDocumentBuilder>>(mut self, it: I) -> Self {
        for c in it {
            self = self.child(c);
        }
        self
    }

    pub fn attr(mut self, attr: SimpleDocumentBuilder) -> Self {
        debug_assert!(attr.kind == NodeKind::Attribute);
        self.attributes.push(attr);
        self
    }

    /// Finalizes the tree. A builder rooted at anything but a document node is
    /// wrapped into one, so the root element always has depth 0.
    pub fn build(self) -> SimpleDocument {
        let root = if self.kind == NodeKind::Document { self } else { doc().child(self) };
        let mut nodes = Vec::new();
        flatten(root, None, -1, &mut nodes);
        SimpleDocument { id: BEFORE_FIRST, nodes }
    }
}

fn flatten(b: SimpleDocumentBuilder, parent: Option<NodeId>, depth: i32, out: &mut Vec<NodeRecord>) -> NodeId {
    let id = NodeId::try_from(out.len()).unwrap_or(NodeId::MAX);
    out.push(NodeRecord {
        kind: b.kind,
        name: b.name,
        value: b.value,
        parent,
        first_child: None,
        next_sibling: None,
        span: 1,
        depth,
    });
    for a in b.attributes {
        flatten(a, Some(id), depth + 1, out);
    }
    let mut previous: Option<NodeId> = None;
    for c in b.children {
        let child = flatten(c, Some(id), depth + 1, out);
        match previous {
            None => out[id as usize].first_child = Some(child),
            Some(p) => out[p as usize].next_sibling = Some(child),
        }
        previous = Some(child);
    }
    out[id as usize].span = NodeId::try_from(out.len()).unwrap_or(NodeId::MAX) - id;
    id
}

// Convenience helper functions for concise test code
pub fn doc() -> SimpleDocumentBuilder {
    SimpleDocumentBuilder::new(NodeKind::Document, None, None)
}
pub fn elem(name: &str) -> SimpleDocumentBuilder {
    SimpleDocumentBuilder::new(NodeKind::Element, Some(name), None)
}
pub fn text(v: &str) -> SimpleDocumentBuilder {
    SimpleDocumentBuilder::new(NodeKind::Text, None, Some(v))
}
pub fn attr(name: &str, v: &str) -> SimpleDocumentBuilder {
    SimpleDocumentBuilder::new(NodeKind::Attribute, Some(name), Some(v))
}
pub fn comment(v: &str) -> SimpleDocumentBuilder {
    SimpleDocumentBuilder::new(NodeKind::Comment, None, Some(v))
}

struct CorpusEntry {
    document: Arc<SimpleDocument>,
    tokens: Arc<TokenStream>,
    available: bool,
}

/// Documents addressed by id, tokenized when inserted.
#[derive(Default)]
pub struct SimpleCorpus {
    entries: BTreeMap<DocId, CorpusEntry>,
    tokenizer: Tokenizer,
}

impl SimpleCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Adds a document under the next free id.
    pub fn insert(&mut self, document: SimpleDocument) -> Result<DocId> {
        let id = self.entries.keys().next_back().map_or(0, |last| last + 1);
        self.insert_at(id, document)?;
        Ok(id)
    }

    /// Adds (or replaces) the document stored under `id`.
    pub fn insert_at(&mut self, id: DocId, mut document: SimpleDocument) -> Result<()> {
        document.id = id;
        let tokens = self.tokenizer.tokenize_document(&document)?;
        self.entries.insert(
            id,
            CorpusEntry { document: Arc::new(document), tokens: Arc::new(tokens), available: true },
        );
        Ok(())
    }

    /// Adds a document holding a single text node.
    pub fn insert_text(&mut self, content: &str) -> Result<DocId> {
        self.insert(doc().child(text(content)).build())
    }

    /// Keeps `doc` listed but makes every access to it fail, like a stale index
    /// entry pointing at a removed document.
    pub fn set_unavailable(&mut self, doc: DocId) {
        if let Some(entry) = self.entries.get_mut(&doc) {
            entry.available = false;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, doc: DocId) -> Result<&CorpusEntry> {
        self.entries.get(&doc).filter(|e| e.available).ok_or(Error::DocumentUnavailable(doc))
    }
}

impl Corpus for SimpleCorpus {
    fn next_document(&self, from: DocId) -> Option<DocId> {
        self.entries.range(from.max(0)..).next().map(|(id, _)| *id)
    }

    fn document(&self, doc: DocId) -> Result<Arc<dyn DocumentModel>> {
        Ok(self.entry(doc)?.document.clone())
    }

    fn tokens(&self, doc: DocId) -> Result<Arc<TokenStream>> {
        Ok(self.entry(doc)?.tokens.clone())
    }
}
