//! Tag support.
//!
//! Tags categorize rows for filtering. A row's tags come from two places:
//!
//! - **Explicit**: the `tags` attribute, edited directly
//! - **Markup**: words in the row text starting with the `:` delimiter
//!   (`call bob :phone`)
//!
//! Filtering always looks at the union, see
//! [`crate::model::NodeAttrs::effective_tags`].
//!
//! ## Markup Rules
//!
//! - A markup tag is a whitespace-separated word starting with `:`
//! - Surrounding delimiters and trailing punctuation are stripped (`:work,` is `work`)
//! - Emoticons such as `:)` or `:/` are not tags: what remains must pass
//!   [`validate_tag_name`]

pub mod validation;

use std::collections::BTreeSet;

pub use validation::{validate_tag_name, TagValidationError};

pub const TAG_DELIMITER: char = ':';

/// Extracts the markup tags from row text.
pub fn extract_tags(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .filter_map(|word| word.strip_prefix(TAG_DELIMITER))
        .map(|word| {
            word.trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | '!' | '?'))
                .trim_matches(TAG_DELIMITER)
        })
        .filter(|tag| validate_tag_name(tag).is_ok())
        .map(str::to_string)
        .collect()
}
