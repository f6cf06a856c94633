use std::sync::Arc;

use platynui_postings::{
    DocId, MatchOptions, Posting, PostingCursor, PostingIterator, SimpleCorpus, StemLanguage, WordMatcher,
};
use rstest::{fixture, rstest};

#[fixture]
fn corpus() -> Arc<SimpleCorpus> {
    let mut corpus = SimpleCorpus::new();
    corpus.insert_text("apple pie").unwrap();
    corpus.insert_text("banana split").unwrap();
    corpus.insert_text("apple banana").unwrap();
    Arc::new(corpus)
}

fn word(corpus: &Arc<SimpleCorpus>, w: &str) -> PostingIterator {
    PostingIterator::term(corpus.clone(), WordMatcher::exact(w, &MatchOptions::default()))
}

fn hits(it: &mut PostingIterator) -> Vec<(DocId, Posting)> {
    let mut out = Vec::new();
    while it.next_match().unwrap() {
        out.push((it.doc(), it.posting()));
    }
    out
}

#[rstest]
fn merges_documents_and_positions(corpus: Arc<SimpleCorpus>) {
    let mut any = PostingIterator::any(vec![word(&corpus, "apple"), word(&corpus, "banana")]);
    assert_eq!(hits(&mut any), vec![(0, 0), (1, 0), (2, 0), (2, 1)]);
}

#[rstest]
fn ties_yield_one_free_match_per_posting(corpus: Arc<SimpleCorpus>) {
    let starts_with_a = WordMatcher::pattern("a.*", &MatchOptions::default()).unwrap();
    let mut any =
        PostingIterator::any(vec![word(&corpus, "apple"), PostingIterator::term(corpus.clone(), starts_with_a)]);
    assert_eq!(hits(&mut any), vec![(0, 0), (2, 0)]);
}

#[rstest]
fn confined_enumeration_visits_every_operand(corpus: Arc<SimpleCorpus>) {
    let starts_with_a = WordMatcher::pattern("a.*", &MatchOptions::default()).unwrap();
    let mut any =
        PostingIterator::any(vec![word(&corpus, "apple"), PostingIterator::term(corpus.clone(), starts_with_a)]);
    assert!(any.skip_to_doc(2).unwrap());
    assert!(any.in_range(0, 2).unwrap());
    let mut seen = vec![any.posting()];
    while any.next_before(2).unwrap() {
        seen.push(any.posting());
    }
    assert_eq!(seen, vec![0, 0]);
}

#[rstest]
fn disjunction_inside_a_phrase(corpus: Arc<SimpleCorpus>) {
    let fruit = PostingIterator::any(vec![word(&corpus, "apple"), word(&corpus, "banana")]);
    let mut phrase = PostingIterator::phrase(vec![fruit, word(&corpus, "split")]);
    assert!(phrase.next_match().unwrap());
    assert_eq!((phrase.doc(), phrase.posting(), phrase.match_end()), (1, 0, 2));
    assert!(!phrase.next_match().unwrap());
}

#[rstest]
#[should_panic(expected = "disjunction needs at least one operand")]
fn empty_disjunction_is_a_contract_violation() {
    let _ = PostingIterator::any(Vec::new());
}

#[rstest]
fn stemmed_terms_match_inflections() {
    let mut corpus = SimpleCorpus::new();
    corpus.insert_text("he runs and ran while running").unwrap();
    let corpus = Arc::new(corpus);
    let options = MatchOptions::default().with_stemming(StemLanguage::English);
    let mut run = PostingIterator::term(corpus.clone(), WordMatcher::exact("run", &options));
    assert_eq!(hits(&mut run), vec![(0, 1), (0, 5)]);
}

#[rstest]
fn diacritics_are_folded_by_default() {
    let mut corpus = SimpleCorpus::new();
    corpus.insert_text("Café crème, cafe noir").unwrap();
    let corpus = Arc::new(corpus);
    let mut cafe = PostingIterator::term(corpus.clone(), WordMatcher::exact("CAFE", &MatchOptions::default()));
    assert_eq!(hits(&mut cafe), vec![(0, 0), (0, 2)]);
}
