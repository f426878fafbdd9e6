//! # Filtering
//!
//! A filter narrows what is shown without touching the outline. The pieces:
//!
//! - [`FilterSpec`]: immutable description of the active restriction
//! - [`Predicate`]: the per-row test compiled from a spec
//! - [`Projection`]: the rows to show, matches plus their ancestors
//! - [`FilterEngine`]: owns the active spec and keeps the projection current
//! - [`BackgroundMatcher`]: evaluates specs on a worker thread, newest wins
//!
//! ## Dimensions
//!
//! Every active dimension must pass (AND). Unset dimensions always pass.
//!
//! | Dimension | Passes when |
//! |-----------|-------------|
//! | tag | the row's effective tags contain it |
//! | hide tagged | the row has no tag at all |
//! | color | the row has exactly that colour |
//! | date until | no start date, or start date on or before the cutoff |
//! | hide future | no start date, or start date on or before today |
//! | only dated | the row has a start date |
//! | estimate bucket | an estimate exists and falls in `<20`, `20-60` or `>60` |
//! | kind | the row has that type; `todo` also requires the task be available |
//! | text | every whitespace-separated term is a case-insensitive substring of the text |
//!
//! ## Visibility Closure
//!
//! The visible set is the matched rows plus all their ancestors. Descendants of
//! a match are not pulled in: a child shows only if it matches or leads to a
//! match. The synthetic root is never part of either set.
//!
//! ## Query Language
//!
//! [`FilterSpec::parse_query`] reads the search-bar syntax:
//!
//! ```text
//! c=r          colour by code (g y b r o v e n)
//! t=t          type by code (n note, t available todo, d done)
//! date<2w      start date within N days/weeks/months/years from today
//! e<20 e=20-60 e>60
//! has_tag      hide rows carrying a tag
//! hide_future_date
//! only_date
//! :work        tag
//! anything else is free text
//! ```

mod background;
mod engine;
mod predicate;
mod projection;
mod query;
mod spec;

pub use background::{BackgroundMatcher, MatchResult};
pub use engine::FilterEngine;
pub use predicate::Predicate;
pub use projection::Projection;
pub use spec::{EstimateBucket, FilterSpec};
