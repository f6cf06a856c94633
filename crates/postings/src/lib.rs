//! Posting-iterator algebra for structural and full-text XML queries.
//!
//! A query fragment is compiled into a tree of [`PostingIterator`]s. The tree is
//! driven either in *free* mode (`skip_to_doc` / `skip_to_node` / `next_match`) or,
//! below a containment or count iterator, in *confined* mode (`in_range` /
//! `next_before` / `reset_to`) over a range supplied by the parent.
//!
//! ```
//! use std::sync::Arc;
//! use platynui_postings::simple_doc::{doc, elem, text};
//! use platynui_postings::{
//!     MatchOptions, NodeTest, PostingCursor, PostingIterator, SimpleCorpus, WordMatcher,
//! };
//!
//! // <book><p>quick brown fox</p><p>lazy dog</p></book>
//! let mut corpus = SimpleCorpus::new();
//! corpus.insert(
//!     doc()
//!         .child(
//!             elem("book")
//!                 .child(elem("p").child(text("quick brown fox")))
//!                 .child(elem("p").child(text("lazy dog"))),
//!         )
//!         .build(),
//! ).unwrap();
//! let corpus = Arc::new(corpus);
//! let options = MatchOptions::default();
//!
//! // //p[. ftcontains "brown fox"]
//! let phrase = PostingIterator::phrase(vec![
//!     PostingIterator::term(corpus.clone(), WordMatcher::exact("brown", &options)),
//!     PostingIterator::term(corpus.clone(), WordMatcher::exact("fox", &options)),
//! ]);
//! let mut query = PostingIterator::contains(
//!     PostingIterator::scope(corpus.clone(), NodeTest::element("p")),
//!     phrase,
//! );
//! assert!(query.next_match().unwrap());
//! assert_eq!(query.posting(), 2);
//! assert!(!query.next_match().unwrap());
//! ```

pub mod constraints;
pub mod cursor;
pub mod error;
pub mod filters;
pub mod iterators;
pub mod matcher;
pub mod model;
pub mod options;
pub mod scoring;
pub mod simple_doc;
pub mod tokens;

pub use constraints::{Constraints, ContentConstraint};
pub use cursor::{Bounds, CursorState, DepthTest, Filter, Hit, PostingCursor};
pub use error::{Error, Result};
pub use filters::ParentNameFilter;
pub use iterators::{
    AllIterator, AnyIterator, ContainmentIterator, CountIterator, ExclusionIterator, NodeSource,
    NodeTest, PostingIterator, ScopeSource, TermSource, check_boundary, check_word_distance,
};
pub use matcher::WordMatcher;
pub use model::{BEFORE_FIRST, Corpus, DocId, DocumentModel, MAX_DOC, MAX_POSTING, NodeId, NodeKind, Posting};
pub use options::{CaseMode, DiacriticsMode, MatchOptions, StemLanguage};
pub use scoring::{DefaultScorer, Scorer};
pub use simple_doc::{SimpleCorpus, SimpleDocument, SimpleDocumentBuilder};
pub use tokens::{Token, TokenStream, Tokenizer};
