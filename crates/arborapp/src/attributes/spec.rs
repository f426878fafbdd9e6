//! Attribute specifications and registry.
//!
//! This module defines the schema for attributes: their names and whether
//! they take part in filtering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every attribute a row carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrField {
    Text,
    Kind,
    Color,
    Estimate,
    StartDate,
    Tags,
    Repeat,
    Link,
    Collapsed,
    Planned,
}

impl AttrField {
    pub fn spec(&self) -> &'static AttributeSpec {
        ATTRIBUTES
            .iter()
            .find(|spec| spec.field == *self)
            .unwrap_or(&ATTRIBUTES[0])
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }
}

impl fmt::Display for AttrField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttrField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        get_spec(s)
            .map(|spec| spec.field)
            .ok_or_else(|| format!("unknown attribute '{s}'"))
    }
}

/// Specification for a single attribute.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    pub field: AttrField,

    /// The attribute name used in documents and commands (e.g. "start_date")
    pub name: &'static str,

    /// Accepted alternative names on input
    pub aliases: &'static [&'static str],

    /// Whether a change to this attribute can change what a filter matches
    pub filterable: bool,

    /// View state only: not part of the outline's meaning
    pub view_state: bool,
}

impl AttributeSpec {
    const fn new(field: AttrField, name: &'static str) -> Self {
        Self {
            field,
            name,
            aliases: &[],
            filterable: false,
            view_state: false,
        }
    }

    const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    const fn view_state(mut self) -> Self {
        self.view_state = true;
        self
    }
}

/// Registry of all row attributes.
///
/// Adding an attribute means adding an [`AttrField`] variant and an entry here.
pub const ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new(AttrField::Text, "text").filterable(),
    AttributeSpec::new(AttrField::Kind, "type")
        .aliases(&["kind"])
        .filterable(),
    AttributeSpec::new(AttrField::Color, "color")
        .aliases(&["colour"])
        .filterable(),
    AttributeSpec::new(AttrField::Estimate, "estimate_minutes")
        .aliases(&["estimate"])
        .filterable(),
    AttributeSpec::new(AttrField::StartDate, "start_date")
        .aliases(&["date", "start"])
        .filterable(),
    AttributeSpec::new(AttrField::Tags, "tags")
        .aliases(&["tag"])
        .filterable(),
    AttributeSpec::new(AttrField::Repeat, "repeat"),
    AttributeSpec::new(AttrField::Link, "link"),
    AttributeSpec::new(AttrField::Collapsed, "collapsed").view_state(),
    AttributeSpec::new(AttrField::Planned, "planned").aliases(&["plan"]),
];

/// Look up an attribute spec by name or alias.
pub fn get_spec(name: &str) -> Option<&'static AttributeSpec> {
    let needle = name.trim().to_lowercase();
    ATTRIBUTES
        .iter()
        .find(|spec| spec.name == needle || spec.aliases.contains(&needle.as_str()))
}

/// Get all filterable attribute names.
pub fn filterable_attrs() -> impl Iterator<Item = &'static str> {
    ATTRIBUTES
        .iter()
        .filter(|spec| spec.filterable)
        .map(|spec| spec.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_spec() {
        for spec in ATTRIBUTES {
            assert_eq!(spec.field.spec().name, spec.name);
        }
        assert_eq!(ATTRIBUTES.len(), 10);
    }

    #[test]
    fn lookup_by_alias() {
        assert_eq!(get_spec("estimate").unwrap().field, AttrField::Estimate);
        assert_eq!(get_spec("Date").unwrap().field, AttrField::StartDate);
        assert_eq!("kind".parse::<AttrField>().unwrap(), AttrField::Kind);
        assert_eq!("plan".parse::<AttrField>().unwrap(), AttrField::Planned);
        assert!(get_spec("nonexistent").is_none());
    }

    #[test]
    fn collapsed_is_view_state_and_not_filterable() {
        let spec = get_spec("collapsed").unwrap();
        assert!(spec.view_state);
        assert!(!spec.filterable);
    }

    #[test]
    fn filterable_attrs_returns_expected() {
        let filterable: Vec<_> = filterable_attrs().collect();
        assert!(filterable.contains(&"text"));
        assert!(filterable.contains(&"color"));
        assert!(filterable.contains(&"tags"));
        assert!(!filterable.contains(&"link"));
        assert!(!filterable.contains(&"repeat"));
        assert!(!filterable.contains(&"collapsed"));
    }
}
