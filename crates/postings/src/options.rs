//! Match options for full-text term sources.

use rust_stemmers::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseMode {
    /// Compare lower-cased forms of query and token.
    #[default]
    Insensitive,
    Sensitive,
    /// The token must equal the lower-cased query word.
    Lowercase,
    /// The token must equal the upper-cased query word.
    Uppercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiacriticsMode {
    #[default]
    Insensitive,
    Sensitive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemLanguage {
    English,
    French,
    German,
    Italian,
    Dutch,
    Portuguese,
    Spanish,
    Swedish,
}

impl StemLanguage {
    pub(crate) fn algorithm(self) -> Algorithm {
        match self {
            StemLanguage::English => Algorithm::English,
            StemLanguage::French => Algorithm::French,
            StemLanguage::German => Algorithm::German,
            StemLanguage::Italian => Algorithm::Italian,
            StemLanguage::Dutch => Algorithm::Dutch,
            StemLanguage::Portuguese => Algorithm::Portuguese,
            StemLanguage::Spanish => Algorithm::Spanish,
            StemLanguage::Swedish => Algorithm::Swedish,
        }
    }
}

/// How a query word is compared with document tokens.
///
/// ```
/// use platynui_postings::{CaseMode, MatchOptions, StemLanguage};
/// let options = MatchOptions::default()
///     .with_case(CaseMode::Sensitive)
///     .with_stemming(StemLanguage::English);
/// assert_eq!(options.case(), CaseMode::Sensitive);
/// assert!(options.stemming().is_some());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    case: CaseMode,
    diacritics: DiacriticsMode,
    stemming: Option<StemLanguage>,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case(mut self, case: CaseMode) -> Self {
        self.case = case;
        self
    }

    pub fn with_diacritics(mut self, diacritics: DiacriticsMode) -> Self {
        self.diacritics = diacritics;
        self
    }

    pub fn with_stemming(mut self, language: StemLanguage) -> Self {
        self.stemming = Some(language);
        self
    }

    pub fn without_stemming(mut self) -> Self {
        self.stemming = None;
        self
    }

    pub fn case(&self) -> CaseMode {
        self.case
    }

    pub fn diacritics(&self) -> DiacriticsMode {
        self.diacritics
    }

    pub fn stemming(&self) -> Option<StemLanguage> {
        self.stemming
    }
}
