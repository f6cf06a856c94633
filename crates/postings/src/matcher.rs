//! Word matchers used by term sources: exact words and wildcard patterns.

use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use fancy_regex::Regex;
use rust_stemmers::Stemmer;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::canonical_combining_class as ccc;

use crate::error::{Error, Result};
use crate::options::{CaseMode, DiacriticsMode, MatchOptions};

/// Case/diacritics folding plus optional stemming, applied to both sides.
struct Normalizer {
    options: MatchOptions,
    stemmer: Option<Stemmer>,
}

impl Normalizer {
    fn new(options: &MatchOptions) -> Self {
        Self { options: *options, stemmer: options.stemming().map(|l| Stemmer::create(l.algorithm())) }
    }

    fn fold_diacritics<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self.options.diacritics() {
            DiacriticsMode::Insensitive => Cow::Owned(s.nfd().filter(|&ch| ccc(ch) == 0).collect()),
            DiacriticsMode::Sensitive if s.is_ascii() => Cow::Borrowed(s),
            DiacriticsMode::Sensitive => Cow::Owned(s.nfc().collect()),
        }
    }

    fn token_key(&self, token: &str) -> String {
        let folded = self.fold_diacritics(token);
        let cased = match self.options.case() {
            CaseMode::Insensitive => folded.to_lowercase(),
            CaseMode::Sensitive | CaseMode::Lowercase | CaseMode::Uppercase => folded.into_owned(),
        };
        self.stem(cased)
    }

    fn query_key(&self, word: &str) -> String {
        let folded = self.fold_diacritics(word);
        let cased = match self.options.case() {
            CaseMode::Insensitive | CaseMode::Lowercase => folded.to_lowercase(),
            CaseMode::Uppercase => folded.to_uppercase(),
            CaseMode::Sensitive => folded.into_owned(),
        };
        self.stem(cased)
    }

    /// Query-side folding without stemming, for pattern literals.
    fn literal_key(&self, s: &str) -> String {
        let folded = self.fold_diacritics(s);
        match self.options.case() {
            CaseMode::Insensitive | CaseMode::Lowercase => folded.to_lowercase(),
            CaseMode::Uppercase => folded.to_uppercase(),
            CaseMode::Sensitive => folded.into_owned(),
        }
    }

    fn unstemmed_token_key(&self, token: &str) -> String {
        let folded = self.fold_diacritics(token);
        match self.options.case() {
            CaseMode::Insensitive => folded.to_lowercase(),
            _ => folded.into_owned(),
        }
    }

    fn stem(&self, s: String) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(&s).into_owned(),
            None => s,
        }
    }
}

pub struct ExactMatcher {
    word: String,
    key: String,
    normalizer: Normalizer,
}

pub struct PatternMatcher {
    expr: String,
    regex: Regex,
    normalizer: Normalizer,
}

/// Decides whether a document token matches one query word.
pub enum WordMatcher {
    Exact(ExactMatcher),
    Pattern(PatternMatcher),
}

impl WordMatcher {
    pub fn exact(word: &str, options: &MatchOptions) -> Arc<Self> {
        let normalizer = Normalizer::new(options);
        let key = normalizer.query_key(word);
        Arc::new(WordMatcher::Exact(ExactMatcher { word: word.to_string(), key, normalizer }))
    }

    /// Compiles a wildcard expression: `.` matches one character and may be
    /// followed by `?`, `*`, `+` or `{n,m}`; `\` escapes the next character;
    /// everything else is literal.
    pub fn pattern(expr: &str, options: &MatchOptions) -> Result<Arc<Self>> {
        let normalizer = Normalizer::new(options);
        let source = wildcard_to_regex(expr, &normalizer)?;
        let regex = Regex::new(&source).map_err(|e| Error::InvalidPattern {
            pattern: expr.to_string(),
            message: e.to_string(),
            source: Some(Arc::new(e)),
        })?;
        Ok(Arc::new(WordMatcher::Pattern(PatternMatcher { expr: expr.to_string(), regex, normalizer })))
    }

    pub fn matches(&self, token: &str) -> Result<bool> {
        match self {
            WordMatcher::Exact(m) => {
                let key = m.normalizer.token_key(token);
                Ok(key.chars().count() == m.key.chars().count() && key.chars().eq(m.key.chars()))
            }
            WordMatcher::Pattern(m) => {
                let key = m.normalizer.unstemmed_token_key(token);
                m.regex.is_match(&key).map_err(|e| {
                    tracing::warn!(pattern = %m.expr, token, "wildcard pattern match aborted");
                    Error::PatternMatch { pattern: m.expr.clone(), token: token.to_string(), source: Arc::new(e) }
                })
            }
        }
    }

    /// The query word or wildcard expression as written.
    pub fn source(&self) -> &str {
        match self {
            WordMatcher::Exact(m) => &m.word,
            WordMatcher::Pattern(m) => &m.expr,
        }
    }
}

impl fmt::Debug for WordMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordMatcher::Exact(m) => f.debug_tuple("Exact").field(&m.word).finish(),
            WordMatcher::Pattern(m) => f.debug_tuple("Pattern").field(&m.expr).finish(),
        }
    }
}

fn push_literal(out: &mut String, s: &str) {
    for ch in s.chars() {
        if matches!(ch, '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn wildcard_to_regex(expr: &str, normalizer: &Normalizer) -> Result<String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::from("^(?:");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let Some(&escaped) = chars.get(i + 1) else {
                    return Err(Error::invalid_pattern(expr, "dangling escape at end of pattern"));
                };
                push_literal(&mut out, &normalizer.literal_key(&escaped.to_string()));
                i += 2;
            }
            '.' => {
                out.push('.');
                i += 1;
                match chars.get(i) {
                    Some(q @ ('?' | '*' | '+')) => {
                        out.push(*q);
                        i += 1;
                    }
                    Some('{') => {
                        let close = chars[i..]
                            .iter()
                            .position(|&c| c == '}')
                            .ok_or_else(|| Error::invalid_pattern(expr, "unterminated repetition"))?;
                        let body: String = chars[i + 1..i + close].iter().collect();
                        let (lo, hi) = body.split_once(',').unwrap_or((body.as_str(), body.as_str()));
                        let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
                        if !digits(lo) || !digits(hi) {
                            return Err(Error::invalid_pattern(expr, format!("bad repetition {{{body}}}")));
                        }
                        out.push_str(&format!("{{{lo},{hi}}}"));
                        i += close + 1;
                    }
                    _ => {}
                }
            }
            ch => {
                push_literal(&mut out, &normalizer.literal_key(&ch.to_string()));
                i += 1;
            }
        }
    }
    out.push_str(")$");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::StemLanguage;
    use rstest::rstest;

    #[rstest]
    #[case("Apple", "apple", true)]
    #[case("APPLE", "apple", true)]
    #[case("apples", "apple", false)]
    #[case("äpple", "apple", true)]
    fn exact_defaults_fold_case_and_diacritics(#[case] token: &str, #[case] word: &str, #[case] expected: bool) {
        let m = WordMatcher::exact(word, &MatchOptions::default());
        assert_eq!(m.matches(token).unwrap(), expected);
    }

    #[rstest]
    fn case_modes() {
        let sensitive = MatchOptions::default().with_case(CaseMode::Sensitive);
        assert!(!WordMatcher::exact("apple", &sensitive).matches("Apple").unwrap());
        let lower = MatchOptions::default().with_case(CaseMode::Lowercase);
        assert!(WordMatcher::exact("Apple", &lower).matches("apple").unwrap());
        assert!(!WordMatcher::exact("Apple", &lower).matches("Apple").unwrap());
        let upper = MatchOptions::default().with_case(CaseMode::Uppercase);
        assert!(WordMatcher::exact("nato", &upper).matches("NATO").unwrap());
    }

    #[rstest]
    fn diacritics_sensitive_keeps_marks() {
        let options = MatchOptions::default().with_diacritics(DiacriticsMode::Sensitive);
        assert!(!WordMatcher::exact("resume", &options).matches("résumé").unwrap());
        assert!(WordMatcher::exact("résumé", &options).matches("Résumé").unwrap());
    }

    #[rstest]
    fn stemming_matches_inflections() {
        let options = MatchOptions::default().with_stemming(StemLanguage::English);
        let m = WordMatcher::exact("running", &options);
        assert!(m.matches("runs").unwrap());
        assert!(m.matches("run").unwrap());
        assert!(!m.matches("ran").unwrap());
    }

    #[rstest]
    #[case(".*ing", "walking", true)]
    #[case(".*ing", "wing", true)]
    #[case("wal.", "walk", true)]
    #[case("wal.", "walks", false)]
    #[case("wal.?", "wal", true)]
    #[case("b.{1,2}t", "boot", true)]
    #[case("b.{1,2}t", "bt", false)]
    #[case("c\\.d", "c.d", true)]
    #[case("c\\.d", "cxd", false)]
    #[case("Data.+", "database", true)]
    fn wildcard_patterns(#[case] pattern: &str, #[case] token: &str, #[case] expected: bool) {
        let m = WordMatcher::pattern(pattern, &MatchOptions::default()).unwrap();
        assert_eq!(m.matches(token).unwrap(), expected, "{pattern} vs {token}");
    }

    #[rstest]
    #[case("abc\\")]
    #[case("a.{2")]
    #[case("a.{x,3}")]
    fn invalid_patterns_are_reported(#[case] pattern: &str) {
        let err = WordMatcher::pattern(pattern, &MatchOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
