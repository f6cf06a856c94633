//! Filters that need access to the document.

use std::sync::Arc;

use string_cache::DefaultAtom;

use crate::cursor::{Filter, Hit};
use crate::error::Result;
use crate::model::Corpus;

/// Accepts node hits whose parent element has the given local name.
pub struct ParentNameFilter {
    corpus: Arc<dyn Corpus>,
    name: DefaultAtom,
}

impl ParentNameFilter {
    pub fn new(corpus: Arc<dyn Corpus>, name: &str) -> Self {
        Self { corpus, name: DefaultAtom::from(name) }
    }
}

impl Filter for ParentNameFilter {
    fn accept(&self, hit: &Hit) -> Result<bool> {
        let model = self.corpus.document(hit.doc)?;
        let Some(parent) = model.parent(hit.posting)? else {
            return Ok(false);
        };
        Ok(model.name(parent)?.as_deref() == Some(&*self.name))
    }
}
