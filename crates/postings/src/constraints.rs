//! Positional constraints attached to a conjunction.

/// Where a composite match has to sit inside the confining range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentConstraint {
    #[default]
    Any,
    /// First word at the first position of the range.
    AtStart,
    /// Last word at the last position of the range.
    AtEnd,
    /// Covers the whole range without gaps.
    EntireContent,
}

/// Window, distance and content constraints, in word units.
///
/// ```
/// use platynui_postings::{Constraints, ContentConstraint};
/// let c = Constraints::default().with_distance(0, 2).with_content(ContentConstraint::AtStart);
/// assert_eq!(c.distance(), Some((0, 2)));
/// assert_eq!(c.window(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Constraints {
    window: Option<i32>,
    distance: Option<(i32, i32)>,
    content: ContentConstraint,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// At most `words` positions from the first to the last word, both included.
    pub fn with_window(mut self, words: i32) -> Self {
        self.window = Some(words);
        self
    }

    /// Between `min` and `max` words between adjacent parts; a negative `max`
    /// leaves the upper end open.
    pub fn with_distance(mut self, min: i32, max: i32) -> Self {
        self.distance = Some((min, max));
        self
    }

    pub fn with_content(mut self, content: ContentConstraint) -> Self {
        self.content = content;
        self
    }

    pub fn window(&self) -> Option<i32> {
        self.window
    }

    pub fn distance(&self) -> Option<(i32, i32)> {
        self.distance
    }

    pub fn content(&self) -> ContentConstraint {
        self.content
    }

    pub fn is_unconstrained(&self) -> bool {
        self.window.is_none() && self.distance.is_none() && self.content == ContentConstraint::Any
    }

    /// Adjacent parts must follow each other without any word in between.
    pub fn is_zero_distance(&self) -> bool {
        self.distance == Some((0, 0))
    }
}
