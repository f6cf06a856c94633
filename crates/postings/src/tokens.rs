//! Word tokens of a document as consumed by brute-force full-text scanning.

use compact_str::CompactString;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::model::{DocumentModel, NodeId, NodeKind, Posting};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: CompactString,
    /// Text (or attribute) node the word was read from.
    pub node: NodeId,
    /// Character offset inside the node's text.
    pub offset: u32,
    /// Length in characters.
    pub length: u32,
}

/// Tokens in document order; the word position of a token is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(tokens.windows(2).all(|w| w[0].node <= w[1].node), "tokens must follow document order");
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Number of word positions, as a posting bound.
    pub fn end(&self) -> Posting {
        Posting::try_from(self.tokens.len()).unwrap_or(Posting::MAX)
    }

    pub fn get(&self, position: Posting) -> Option<&Token> {
        usize::try_from(position).ok().and_then(|p| self.tokens.get(p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.word.as_str())
    }

    /// Word positions `[first, end)` of the tokens read from nodes in
    /// `[start_node, end_node)`.
    pub fn word_range(&self, start_node: NodeId, end_node: NodeId) -> (Posting, Posting) {
        let first = self.tokens.partition_point(|t| t.node < start_node);
        let end = first + self.tokens[first..].partition_point(|t| t.node < end_node);
        let clamp = |v: usize| Posting::try_from(v).unwrap_or(Posting::MAX);
        (clamp(first), clamp(end))
    }
}

/// Unicode word segmentation (UAX #29) over text nodes.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    attributes: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also index attribute values.
    pub fn with_attributes(mut self, attributes: bool) -> Self {
        self.attributes = attributes;
        self
    }

    /// Tokenizes a standalone string; all tokens originate from node 0.
    pub fn tokenize_str(&self, text: &str) -> TokenStream {
        let mut tokens = Vec::new();
        push_words(&mut tokens, 0, text);
        TokenStream::new(tokens)
    }

    /// Tokenizes every text node of `model` in document order.
    pub fn tokenize_document(&self, model: &dyn DocumentModel) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        if model.node_count() == 0 {
            return Ok(TokenStream::default());
        }
        let mut stack: Vec<NodeId> = vec![0];
        while let Some(node) = stack.pop() {
            match model.kind(node)? {
                NodeKind::Text => {
                    if let Some(text) = model.text(node)? {
                        push_words(&mut tokens, node, text);
                    }
                }
                NodeKind::Element | NodeKind::Document => {
                    if self.attributes {
                        self.push_attributes(model, node, &mut tokens)?;
                    }
                    // children are pushed in reverse so that the first child pops first
                    let mut children = Vec::new();
                    let mut child = model.first_child(node)?;
                    while let Some(c) = child {
                        children.push(c);
                        child = model.next_sibling(c)?;
                    }
                    stack.extend(children.into_iter().rev());
                }
                _ => {}
            }
        }
        Ok(TokenStream::new(tokens))
    }

    fn push_attributes(&self, model: &dyn DocumentModel, element: NodeId, tokens: &mut Vec<Token>) -> Result<()> {
        let mut id = element + 1;
        while id < model.node_count() && model.kind(id)? == NodeKind::Attribute {
            if let Some(value) = model.text(id)? {
                push_words(tokens, id, value);
            }
            id += 1;
        }
        Ok(())
    }
}

fn push_words(tokens: &mut Vec<Token>, node: NodeId, text: &str) {
    let mut last_byte = 0usize;
    let mut last_char = 0usize;
    for (byte, word) in text.unicode_word_indices() {
        last_char += text[last_byte..byte].chars().count();
        last_byte = byte;
        tokens.push(Token {
            word: CompactString::new(word),
            node,
            offset: u32::try_from(last_char).unwrap_or(u32::MAX),
            length: u32::try_from(word.chars().count()).unwrap_or(u32::MAX),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn splits_words_with_char_offsets() {
        let stream = Tokenizer::new().tokenize_str("Grüße, liebe Welt!");
        let words: Vec<_> = stream.words().collect();
        assert_eq!(words, ["Grüße", "liebe", "Welt"]);
        let welt = stream.get(2).unwrap();
        assert_eq!((welt.offset, welt.length), (13, 4));
    }

    #[rstest]
    fn word_range_selects_tokens_by_node() {
        let stream = TokenStream::new(
            [(1, "a"), (1, "b"), (4, "c"), (6, "d")]
                .into_iter()
                .map(|(node, w)| Token { word: w.into(), node, offset: 0, length: 1 })
                .collect(),
        );
        assert_eq!(stream.word_range(0, 2), (0, 2));
        assert_eq!(stream.word_range(2, 5), (2, 3));
        assert_eq!(stream.word_range(5, 6), (3, 3));
        assert_eq!(stream.word_range(0, 100), (0, 4));
    }
}
