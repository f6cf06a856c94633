//! Boundary contracts towards the document store and the tokenizer.

use std::sync::Arc;

use string_cache::DefaultAtom;

use crate::error::Result;
use crate::tokens::TokenStream;

/// Position of a hit: a node id in pre-order, or a word index in a token stream.
pub type Posting = i32;
/// Document identifier; postings only compare within one document.
pub type DocId = i32;
/// Node identifier, equal to the node's pre-order posting.
pub type NodeId = Posting;

pub const MAX_DOC: DocId = i32::MAX;
pub const MAX_POSTING: Posting = i32::MAX;
/// Position of a cursor that has not been moved yet.
pub const BEFORE_FIRST: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
    Namespace,
}

/// Read-only navigation over one document.
///
/// Node ids are pre-order positions: a node `n` with span `s` covers the ids
/// `[n, n + s)`, i.e. itself and all of its descendants. The document node has
/// id 0 and depth -1, its root element depth 0.
pub trait DocumentModel: Send + Sync {
    fn node_count(&self) -> NodeId;
    fn kind(&self, node: NodeId) -> Result<NodeKind>;
    fn name(&self, node: NodeId) -> Result<Option<DefaultAtom>>;
    fn parent(&self, node: NodeId) -> Result<Option<NodeId>>;
    fn next_sibling(&self, node: NodeId) -> Result<Option<NodeId>>;
    fn first_child(&self, node: NodeId) -> Result<Option<NodeId>>;
    /// Size of the subtree rooted at `node`, in posting units.
    fn span(&self, node: NodeId) -> Result<Posting>;
    fn depth(&self, node: NodeId) -> Result<i32>;
    /// Character content of text, attribute, comment and PI nodes.
    fn text(&self, node: NodeId) -> Result<Option<&str>>;
}

/// A set of documents addressed by id, with their tokenized text.
pub trait Corpus: Send + Sync {
    /// First known document id `>= from`.
    fn next_document(&self, from: DocId) -> Option<DocId>;
    fn document(&self, doc: DocId) -> Result<Arc<dyn DocumentModel>>;
    fn tokens(&self, doc: DocId) -> Result<Arc<TokenStream>>;
}
