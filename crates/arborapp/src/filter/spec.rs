use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::model::{Color, RowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstimateBucket {
    /// Under 20 minutes
    Short,
    /// 20 to 60 minutes, both ends included
    Medium,
    /// Over 60 minutes
    Long,
}

impl EstimateBucket {
    pub fn contains(&self, minutes: u32) -> bool {
        match self {
            EstimateBucket::Short => minutes < 20,
            EstimateBucket::Medium => (20..=60).contains(&minutes),
            EstimateBucket::Long => minutes > 60,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateBucket::Short => "<20",
            EstimateBucket::Medium => "20-60",
            EstimateBucket::Long => ">60",
        }
    }
}

impl fmt::Display for EstimateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimateBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<20" | "short" => Ok(EstimateBucket::Short),
            "20-60" | "=20-60" | "medium" => Ok(EstimateBucket::Medium),
            ">60" | "long" => Ok(EstimateBucket::Long),
            other => Err(format!("unknown estimate bucket '{other}'")),
        }
    }
}

/// The active view restriction. `None` and `false` mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub tag: Option<String>,
    pub color: Option<Color>,
    pub date_until: Option<NaiveDate>,
    pub estimate: Option<EstimateBucket>,
    /// Free-text query, split into terms on whitespace.
    pub text: String,
    pub hide_tagged: bool,
    pub hide_future: bool,
    pub only_dated: bool,
    pub kind: Option<RowKind>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_date_until(mut self, date: NaiveDate) -> Self {
        self.date_until = Some(date);
        self
    }

    pub fn with_estimate(mut self, bucket: EstimateBucket) -> Self {
        self.estimate = Some(bucket);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_kind(mut self, kind: RowKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn hiding_tagged(mut self) -> Self {
        self.hide_tagged = true;
        self
    }

    pub fn hiding_future(mut self) -> Self {
        self.hide_future = true;
        self
    }

    /// True if any dimension restricts the view.
    pub fn is_active(&self) -> bool {
        self.has_terms() || self.without_text() != Self::default()
    }

    fn has_terms(&self) -> bool {
        self.text.split_whitespace().next().is_some()
    }

    /// Case-folded search terms.
    pub fn terms(&self) -> Vec<String> {
        self.text.split_whitespace().map(fold_case).collect()
    }

    /// Whether matching needs more than the row's own attributes.
    pub fn depends_on_structure(&self) -> bool {
        self.kind == Some(RowKind::Todo)
    }

    /// True if every row matching `self` also matches `previous`: the only
    /// difference is text that extends the previous query.
    pub fn narrows(&self, previous: &FilterSpec) -> bool {
        self.without_text() == previous.without_text()
            && fold_case(&self.text).starts_with(&fold_case(&previous.text))
    }

    fn without_text(&self) -> FilterSpec {
        FilterSpec {
            text: String::new(),
            ..self.clone()
        }
    }
}

/// Per-character lowercase. Unlike `str::to_lowercase` it has no context
/// rules, so folding a longer query never breaks a prefix relation.
pub(crate) fn fold_case(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_have_inclusive_middle() {
        assert!(EstimateBucket::Short.contains(19));
        assert!(!EstimateBucket::Short.contains(20));
        assert!(EstimateBucket::Medium.contains(20));
        assert!(EstimateBucket::Medium.contains(60));
        assert!(!EstimateBucket::Long.contains(60));
        assert!(EstimateBucket::Long.contains(61));
    }

    #[test]
    fn default_spec_is_inactive() {
        assert!(!FilterSpec::new().is_active());
        assert!(!FilterSpec::new().with_text("   ").is_active());
        assert!(FilterSpec::new().with_text("a").is_active());
        assert!(FilterSpec::new().hiding_tagged().is_active());
    }

    #[test]
    fn appending_text_narrows() {
        let base = FilterSpec::new().with_color(Color::Red).with_text("Buy");
        assert!(base.clone().with_text("buy m").narrows(&base));
        assert!(base.clone().with_text("Buy milk").narrows(&base));
        assert!(!base.clone().with_text("bu").narrows(&base));
        assert!(!base
            .clone()
            .with_color(Color::Blue)
            .with_text("buy milk")
            .narrows(&base));
    }

    #[test]
    fn terms_are_case_folded() {
        let spec = FilterSpec::new().with_text("  Milk  EGGS ");
        assert_eq!(spec.terms(), vec!["milk", "eggs"]);
    }
}
