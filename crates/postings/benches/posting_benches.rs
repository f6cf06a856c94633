use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use platynui_postings::simple_doc::{doc, elem, text};
use platynui_postings::{MatchOptions, NodeTest, PostingCursor, PostingIterator, SimpleCorpus, WordMatcher};

const VOCABULARY: [&str; 8] = ["quick", "brown", "fox", "lazy", "dog", "jumps", "over", "the"];

fn paragraph(seed: usize, len: usize) -> String {
    (0..len).map(|i| VOCABULARY[(seed * 7 + i * 3 + i / 5) % VOCABULARY.len()]).collect::<Vec<_>>().join(" ")
}

fn build_corpus(docs: usize, paragraphs: usize) -> Arc<SimpleCorpus> {
    let mut corpus = SimpleCorpus::new();
    for d in 0..docs {
        let article = elem("article").children((0..paragraphs).map(|p| elem("p").child(text(&paragraph(d + p, 24)))));
        corpus.insert(doc().child(article).build()).expect("insert");
    }
    Arc::new(corpus)
}

fn word(corpus: &Arc<SimpleCorpus>, w: &str) -> PostingIterator {
    PostingIterator::term(corpus.clone(), WordMatcher::exact(w, &MatchOptions::default()))
}

fn drain(mut it: PostingIterator) -> usize {
    let mut n = 0;
    while it.next_match().expect("evaluation") {
        n += 1;
    }
    n
}

fn benchmark_phrase(c: &mut Criterion) {
    let mut group = c.benchmark_group("phrase");
    for docs in [10usize, 100] {
        let corpus = build_corpus(docs, 8);
        group.bench_with_input(BenchmarkId::new("brown_fox", docs), &corpus, |b, corpus| {
            b.iter(|| {
                let phrase = PostingIterator::phrase(vec![word(corpus, "brown"), word(corpus, "fox")]);
                black_box(drain(phrase))
            })
        });
    }
    group.finish();
}

fn benchmark_containment(c: &mut Criterion) {
    let mut group = c.benchmark_group("containment");
    for docs in [10usize, 100] {
        let corpus = build_corpus(docs, 8);
        group.bench_with_input(BenchmarkId::new("p_ftcontains_all", docs), &corpus, |b, corpus| {
            b.iter(|| {
                let both = PostingIterator::all(vec![word(corpus, "lazy"), word(corpus, "dog")]);
                let query =
                    PostingIterator::contains(PostingIterator::scope(corpus.clone(), NodeTest::element("p")), both);
                black_box(drain(query))
            })
        });
        group.bench_with_input(BenchmarkId::new("article_with_p", docs), &corpus, |b, corpus| {
            b.iter(|| {
                let query = PostingIterator::contains(
                    PostingIterator::nodes(corpus.clone(), NodeTest::element("article")),
                    PostingIterator::nodes(corpus.clone(), NodeTest::element("p")).with_depth_test(1),
                );
                black_box(drain(query))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_phrase, benchmark_containment);
criterion_main!(benches);
