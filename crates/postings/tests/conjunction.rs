use std::sync::Arc;

use platynui_postings::{
    Constraints, ContentConstraint, Hit, MatchOptions, Posting, PostingCursor, PostingIterator, TokenStream, Tokenizer,
    WordMatcher,
};
use rstest::rstest;

fn stream(text: &str) -> Arc<TokenStream> {
    Arc::new(Tokenizer::new().tokenize_str(text))
}

fn word(tokens: &Arc<TokenStream>, w: &str) -> PostingIterator {
    PostingIterator::term_single(tokens.clone(), WordMatcher::exact(w, &MatchOptions::default()))
}

fn pattern(tokens: &Arc<TokenStream>, p: &str) -> PostingIterator {
    PostingIterator::term_single(tokens.clone(), WordMatcher::pattern(p, &MatchOptions::default()).unwrap())
}

fn matches(it: &mut PostingIterator) -> Vec<(Posting, Posting)> {
    let mut out = Vec::new();
    while it.next_match().unwrap() {
        out.push((it.posting(), it.match_end()));
    }
    out
}

/// All combinations inside `[start, end)`, in enumeration order.
fn combinations(it: &mut PostingIterator, start: Posting, end: Posting) -> Vec<(Posting, Posting)> {
    let mut out = Vec::new();
    assert!(it.skip_to_doc(0).unwrap());
    let mut found = it.in_range(start, end).unwrap();
    while found {
        out.push((it.posting(), it.match_end()));
        found = it.next_before(end).unwrap();
    }
    out
}

// "a.?" hits 1 and 5, ".?b" hits 5 and 9
const SHARED: &str = "z a z z z ab z z z b";

#[rstest]
fn ordered_window_yields_the_single_close_pair() {
    let tokens = stream(SHARED);
    let mut and = PostingIterator::with_constraints(
        vec![pattern(&tokens, "a.?"), pattern(&tokens, ".?b")],
        true,
        Constraints::default().with_window(2),
    );
    assert_eq!(matches(&mut and), vec![(5, 6)]);
}

#[rstest]
fn unordered_without_constraints_visits_every_combination() {
    let tokens = stream(SHARED);
    let mut and = PostingIterator::all(vec![pattern(&tokens, "a.?"), pattern(&tokens, ".?b")]);
    assert_eq!(combinations(&mut and, 0, 10), vec![(1, 6), (1, 10), (5, 6), (5, 10)]);
}

#[rstest]
fn free_enumeration_reports_increasing_postings() {
    let tokens = stream(SHARED);
    let mut and = PostingIterator::all(vec![pattern(&tokens, "a.?"), pattern(&tokens, ".?b")]);
    let postings: Vec<_> = matches(&mut and).into_iter().map(|(p, _)| p).collect();
    assert_eq!(postings, vec![1, 5]);
}

#[rstest]
fn ordered_conjunction_keeps_sub_order() {
    let tokens = stream("b a b");
    let mut and = PostingIterator::all_ordered(vec![word(&tokens, "a"), word(&tokens, "b")]);
    assert_eq!(matches(&mut and), vec![(1, 3)]);
}

#[rstest]
#[case::window("x x x quick brown fox", Some(3), vec![(3, 6)])]
#[case::phrase("x x x quick brown fox", None, vec![(3, 6)])]
#[case::window_gap("x x x quick brown x x fox", Some(3), vec![])]
#[case::phrase_gap("x x x quick brown x x fox", None, vec![])]
#[case::phrase_twice("quick brown fox quick brown fox", None, vec![(0, 3), (3, 6)])]
fn phrase_exactness(#[case] text: &str, #[case] window: Option<i32>, #[case] expected: Vec<(Posting, Posting)>) {
    let tokens = stream(text);
    let subs = vec![word(&tokens, "quick"), word(&tokens, "brown"), word(&tokens, "fox")];
    let mut phrase = match window {
        Some(w) => PostingIterator::with_constraints(subs, true, Constraints::default().with_window(w)),
        None => PostingIterator::phrase(subs),
    };
    assert_eq!(matches(&mut phrase), expected);
}

#[rstest]
fn phrase_span_counts_its_words() {
    let tokens = stream("x x x quick brown fox");
    let subs = vec![word(&tokens, "quick"), word(&tokens, "brown"), word(&tokens, "fox")];
    let mut phrase = PostingIterator::with_constraints(subs, true, Constraints::default().with_window(3));
    assert!(phrase.next_match().unwrap());
    assert_eq!((phrase.posting(), phrase.span()), (3, 3));
}

#[rstest]
fn phrase_rejects_swapped_words() {
    let tokens = stream("brown quick fox");
    let mut phrase = PostingIterator::phrase(vec![word(&tokens, "quick"), word(&tokens, "brown")]);
    assert!(matches(&mut phrase).is_empty());
}

#[rstest]
fn distance_bounds_roll_back_to_earlier_operands() {
    // one: 0, 3; two: 1, 6
    let tokens = stream("one two three one x x two");
    let mut and = PostingIterator::with_constraints(
        vec![word(&tokens, "one"), word(&tokens, "two")],
        true,
        Constraints::default().with_distance(1, 3),
    );
    assert_eq!(matches(&mut and), vec![(3, 7)]);
}

#[rstest]
fn open_ended_distance() {
    let tokens = stream("one two x x x x x x two");
    let mut and = PostingIterator::with_constraints(
        vec![word(&tokens, "one"), word(&tokens, "two")],
        true,
        Constraints::default().with_distance(5, -1),
    );
    assert!(and.skip_to_doc(0).unwrap());
    assert!(and.in_range(0, 9).unwrap());
    assert_eq!((and.posting(), and.match_end()), (0, 9));
}

#[rstest]
#[case::at_start(&["alpha", "beta"], ContentConstraint::AtStart, 0, 3, true)]
#[case::at_start_moved(&["alpha", "beta"], ContentConstraint::AtStart, 1, 3, false)]
#[case::at_end(&["beta", "gamma"], ContentConstraint::AtEnd, 0, 3, true)]
#[case::at_end_short(&["alpha", "beta"], ContentConstraint::AtEnd, 0, 3, false)]
#[case::entire(&["alpha", "beta", "gamma"], ContentConstraint::EntireContent, 0, 3, true)]
#[case::entire_with_gap(&["alpha", "gamma"], ContentConstraint::EntireContent, 0, 3, false)]
fn content_constraints(
    #[case] words: &[&str],
    #[case] content: ContentConstraint,
    #[case] start: Posting,
    #[case] end: Posting,
    #[case] expected: bool,
) {
    let tokens = stream("alpha beta gamma");
    let subs = words.iter().map(|w| word(&tokens, w)).collect();
    let mut and = PostingIterator::with_constraints(subs, true, Constraints::default().with_content(content));
    assert!(and.skip_to_doc(0).unwrap());
    assert_eq!(and.in_range(start, end).unwrap(), expected);
}

#[rstest]
fn entire_content_sees_through_nested_phrases() {
    let tokens = stream("alpha beta gamma");
    let inner = PostingIterator::phrase(vec![word(&tokens, "alpha"), word(&tokens, "beta")]);
    let mut and = PostingIterator::with_constraints(
        vec![inner, word(&tokens, "gamma")],
        false,
        Constraints::default().with_content(ContentConstraint::EntireContent),
    );
    assert!(and.skip_to_doc(0).unwrap());
    assert!(and.in_range(0, 3).unwrap());
    assert!(and.is_contiguous());
}

#[rstest]
fn filters_on_the_conjunction_reject_combinations() {
    let tokens = stream(SHARED);
    let mut and = PostingIterator::all(vec![pattern(&tokens, "a.?"), pattern(&tokens, ".?b")])
        .with_filter(|hit: &Hit| hit.match_end - hit.posting > 5);
    assert_eq!(combinations(&mut and, 0, 10), vec![(1, 10)]);
}

// a: 2, 5; b: 0, 6. The first combination tried, (a2, b0), is rejected while a
// later one, (a5, b0), starts earlier than the first accepted (a2, b6).
#[rstest]
#[case::min_distance(Constraints::default().with_distance(3, -1), None)]
#[case::filter(Constraints::default(), Some(4))]
fn free_unordered_conjunction_reports_the_earliest_start(
    #[case] constraints: Constraints,
    #[case] min_span: Option<Posting>,
) {
    let tokens = stream("b x a x x a b");
    let mut and = PostingIterator::with_constraints(vec![word(&tokens, "a"), word(&tokens, "b")], false, constraints);
    if let Some(min_span) = min_span {
        and = and.with_filter(move |hit: &Hit| hit.match_end - hit.posting >= min_span);
    }
    assert_eq!(matches(&mut and), vec![(0, 6), (2, 7)]);
}

#[rstest]
#[should_panic(expected = "conjunction needs at least one operand")]
fn empty_conjunction_is_a_contract_violation() {
    let _ = PostingIterator::all(Vec::new());
}
