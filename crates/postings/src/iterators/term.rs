//! Word-position leaves scanning token streams.

use std::sync::Arc;

use crate::cursor::{Bounds, CursorState, PostingCursor};
use crate::error::Result;
use crate::matcher::WordMatcher;
use crate::model::{Corpus, DocId, MAX_DOC, MAX_POSTING, Posting};
use crate::scoring::Scorer;
use crate::tokens::TokenStream;

/// True iff `|p2 - p1| + offset` lies in `[min, max]`; a negative `max` is unbounded.
pub fn check_word_distance(p1: Posting, p2: Posting, offset: i32, min: i32, max: i32) -> bool {
    let distance = (p2 as i64 - p1 as i64).abs() + offset as i64;
    distance >= min as i64 && (max < 0 || distance <= max as i64)
}

/// True iff `posting` is the first (`is_start`) or the last word of the unit
/// whose start, respectively exclusive end, is `boundary`.
pub fn check_boundary(posting: Posting, boundary: Posting, is_start: bool) -> bool {
    if is_start { posting == boundary } else { posting == boundary.saturating_sub(1) }
}

#[derive(Clone)]
pub(crate) enum TextSource {
    /// One in-memory stream, exposed as document 0.
    Single(Arc<TokenStream>),
    Corpus(Arc<dyn Corpus>),
}

/// Word positions whose token satisfies a [`WordMatcher`]; each hit covers
/// one word, `[position, position + 1)`.
pub struct TermSource {
    text: TextSource,
    matcher: Arc<WordMatcher>,
    tokens: Option<Arc<TokenStream>>,
    state: CursorState,
}

fn first_match(matcher: &WordMatcher, tokens: &TokenStream, from: Posting, end: Posting) -> Result<Option<Posting>> {
    for position in from.max(0)..end.min(tokens.end()) {
        if let Some(token) = tokens.get(position)
            && matcher.matches(&token.word)?
        {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

impl TermSource {
    pub(crate) fn new(text: TextSource, matcher: Arc<WordMatcher>) -> Self {
        Self { text, matcher, tokens: None, state: CursorState::new() }
    }

    pub fn matcher(&self) -> &WordMatcher {
        &self.matcher
    }

    /// Tokens of the current document.
    pub fn tokens(&self) -> Option<&Arc<TokenStream>> {
        self.tokens.as_ref()
    }

    fn enter(&mut self, doc: DocId, tokens: Arc<TokenStream>) {
        self.tokens = Some(tokens);
        self.state.enter_doc(doc);
    }
}

impl PostingCursor for TermSource {
    fn state(&self) -> &CursorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CursorState {
        &mut self.state
    }

    fn basic_skip_to_doc(&mut self, doc: DocId) -> Result<bool> {
        match self.text.clone() {
            TextSource::Single(tokens) => {
                if doc > 0 || first_match(&self.matcher, &tokens, 0, MAX_POSTING)?.is_none() {
                    return Ok(false);
                }
                self.enter(0, tokens);
                Ok(true)
            }
            TextSource::Corpus(corpus) => {
                let mut from = doc;
                while let Some(candidate) = corpus.next_document(from) {
                    let tokens = corpus.tokens(candidate)?;
                    if first_match(&self.matcher, &tokens, 0, MAX_POSTING)?.is_some() {
                        self.enter(candidate, tokens);
                        return Ok(true);
                    }
                    if candidate == MAX_DOC {
                        break;
                    }
                    from = candidate + 1;
                }
                Ok(false)
            }
        }
    }

    fn basic_skip_to_node(&mut self, posting: Posting, limit: Posting) -> Result<bool> {
        let Some(tokens) = &self.tokens else {
            return Ok(false);
        };
        match first_match(&self.matcher, tokens, posting, limit)? {
            Some(position) => {
                self.state.set_hit(position, position + 1, 0);
                Ok(true)
            }
            None => Ok(false),
        }
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
        Self { text: self.text.clone(), matcher: self.matcher.clone(), tokens: None, state: self.state.fresh() }
    }

    fn compute_weighting(&mut self, _scorer: &dyn Scorer) -> f32 {
        self.state.weight_norm = 1.0;
        self.state.weight
    }

    fn compute_score(&mut self, scorer: &dyn Scorer, doc: DocId) -> Result<f32> {
        if self.state.doc != doc {
            return Ok(0.0);
        }
        let doc_len = self.tokens.as_ref().map_or(0, |t| t.len());
        let occurrences = count_occurrences(self, doc)?;
        Ok(scorer.score_term(occurrences, doc_len) * self.state.weight * self.state.weight_norm)
    }
}

/// Accepted hits of `cursor` in `doc`, counted on a born-again copy.
pub(crate) fn count_occurrences<C: PostingCursor>(cursor: &C, doc: DocId) -> Result<u32> {
    let mut probe = cursor.clone_fresh();
    let mut occurrences = 0;
    if probe.skip_to_doc(doc)? && probe.doc() == doc {
        while probe.next_node(MAX_POSTING)? {
            occurrences += 1;
        }
    }
    Ok(occurrences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MatchOptions;
    use crate::tokens::Tokenizer;
    use rstest::rstest;

    fn source(text: &str, word: &str) -> TermSource {
        let tokens = Arc::new(Tokenizer::new().tokenize_str(text));
        TermSource::new(TextSource::Single(tokens), WordMatcher::exact(word, &MatchOptions::default()))
    }

    #[rstest]
    #[case(1, 5, 1, 0, 5, true)]
    #[case(1, 5, 1, 0, 4, false)]
    #[case(5, 1, 1, 0, 5, true)]
    #[case(2, 3, -1, 0, 0, true)]
    #[case(2, 4, -1, 0, 0, false)]
    #[case(2, 9, -1, 1, -1, true)]
    #[case(2, 3, -1, 1, -1, false)]
    fn word_distance(
        #[case] p1: Posting,
        #[case] p2: Posting,
        #[case] offset: i32,
        #[case] min: i32,
        #[case] max: i32,
        #[case] expected: bool,
    ) {
        assert_eq!(check_word_distance(p1, p2, offset, min, max), expected);
    }

    #[rstest]
    fn boundaries() {
        assert!(check_boundary(4, 4, true));
        assert!(!check_boundary(5, 4, true));
        assert!(check_boundary(9, 10, false));
        assert!(!check_boundary(10, 10, false));
    }

    #[rstest]
    fn scans_word_positions() {
        let mut term = source("the cat and the hat", "the");
        assert!(term.skip_to_doc(0).unwrap());
        assert!(term.next_node(MAX_POSTING).unwrap());
        assert_eq!((term.posting(), term.match_end(), term.span()), (0, 1, 1));
        assert!(term.next_node(MAX_POSTING).unwrap());
        assert_eq!(term.posting(), 3);
        assert!(!term.next_node(MAX_POSTING).unwrap());
        assert_eq!(term.posting(), MAX_POSTING);
        assert!(!term.skip_to_node(0, MAX_POSTING).unwrap());
    }

    #[rstest]
    fn confined_scan_and_reset() {
        let mut term = source("a b a b a", "a");
        assert!(term.skip_to_doc(0).unwrap());
        assert!(term.in_range(1, 4).unwrap());
        assert_eq!(term.posting(), 2);
        assert!(!term.next_before(4).unwrap());
        assert_eq!(term.posting(), 4);
        term.reset_to(0).unwrap();
        assert!(term.in_range(0, 5).unwrap());
        assert_eq!(term.posting(), 0);
    }

    #[rstest]
    fn single_stream_without_match_has_no_document() {
        let mut term = source("nothing here", "cat");
        assert!(!term.skip_to_doc(0).unwrap());
        assert_eq!(term.doc(), MAX_DOC);
        assert!(!term.skip_to_doc(0).unwrap());
    }
}
