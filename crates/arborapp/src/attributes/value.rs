//! Attribute value types.
//!
//! This module defines the runtime representation of attribute values and the
//! conversion from user-entered strings.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

use super::AttrField;
use crate::error::{ArborError, Result};
use crate::model::{Color, Link, PlanSlot, RepeatRule, RowKind, MAX_ESTIMATE_MINUTES, MAX_PLAN_LEVEL};
use crate::tags::validate_tag_name;

/// Runtime representation of an attribute value, one variant per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Kind(RowKind),
    Color(Color),
    /// Minutes
    Estimate(Option<u32>),
    StartDate(Option<NaiveDate>),
    Tags(BTreeSet<String>),
    Repeat(Option<RepeatRule>),
    Link(Option<Link>),
    Collapsed(bool),
    Planned(Option<PlanSlot>),
}

impl AttrValue {
    pub fn field(&self) -> AttrField {
        match self {
            AttrValue::Text(_) => AttrField::Text,
            AttrValue::Kind(_) => AttrField::Kind,
            AttrValue::Color(_) => AttrField::Color,
            AttrValue::Estimate(_) => AttrField::Estimate,
            AttrValue::StartDate(_) => AttrField::StartDate,
            AttrValue::Tags(_) => AttrField::Tags,
            AttrValue::Repeat(_) => AttrField::Repeat,
            AttrValue::Link(_) => AttrField::Link,
            AttrValue::Collapsed(_) => AttrField::Collapsed,
            AttrValue::Planned(_) => AttrField::Planned,
        }
    }

    /// Build an estimate from a signed number of minutes, rejecting negatives.
    pub fn estimate(minutes: i64) -> Result<Self> {
        if minutes < 0 {
            return Err(ArborError::invalid(
                AttrField::Estimate,
                format!("{minutes} is negative"),
            ));
        }
        let minutes = u32::try_from(minutes)
            .ok()
            .filter(|m| *m <= MAX_ESTIMATE_MINUTES)
            .ok_or_else(|| {
                ArborError::invalid(
                    AttrField::Estimate,
                    format!("{minutes} exceeds {MAX_ESTIMATE_MINUTES} minutes"),
                )
            })?;
        Ok(AttrValue::Estimate(Some(minutes)))
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttrValue::Tags(tags.into_iter().map(Into::into).collect())
    }

    /// Parse a user-entered string for `field`.
    ///
    /// An empty string (or `none`) clears optional attributes.
    pub fn parse(field: AttrField, raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let cleared = trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none");

        let value = match field {
            AttrField::Text => AttrValue::Text(raw.to_string()),
            AttrField::Kind => AttrValue::Kind(trimmed.parse()?),
            AttrField::Color => AttrValue::Color(trimmed.parse()?),
            AttrField::Estimate if cleared => AttrValue::Estimate(None),
            AttrField::Estimate => {
                let minutes = trimmed.parse::<i64>().map_err(|_| {
                    ArborError::invalid(field, format!("'{trimmed}' is not a whole number"))
                })?;
                AttrValue::estimate(minutes)?
            }
            AttrField::StartDate if cleared => AttrValue::StartDate(None),
            AttrField::StartDate => AttrValue::StartDate(Some(parse_date(trimmed)?)),
            AttrField::Tags => AttrValue::tags(
                trimmed
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .map(|t| t.trim_start_matches(crate::tags::TAG_DELIMITER))
                    .filter(|t| !t.is_empty()),
            ),
            AttrField::Repeat if cleared => AttrValue::Repeat(None),
            AttrField::Repeat => AttrValue::Repeat(Some(trimmed.parse()?)),
            AttrField::Link if cleared => AttrValue::Link(None),
            AttrField::Link => AttrValue::Link(Some(trimmed.parse()?)),
            AttrField::Collapsed => AttrValue::Collapsed(parse_bool(trimmed).ok_or_else(|| {
                ArborError::invalid(field, format!("'{trimmed}' is not true or false"))
            })?),
            AttrField::Planned if cleared || trimmed == "0" => AttrValue::Planned(None),
            AttrField::Planned => AttrValue::Planned(Some(trimmed.parse()?)),
        };
        value.validate()?;
        Ok(value)
    }

    /// Field-level constraints that the type alone cannot express.
    pub fn validate(&self) -> Result<()> {
        match self {
            AttrValue::Estimate(Some(minutes)) if *minutes > MAX_ESTIMATE_MINUTES => {
                Err(ArborError::invalid(
                    AttrField::Estimate,
                    format!("{minutes} exceeds {MAX_ESTIMATE_MINUTES} minutes"),
                ))
            }
            AttrValue::Tags(tags) => tags.iter().try_for_each(|tag| {
                validate_tag_name(tag)
                    .map_err(|e| ArborError::invalid(AttrField::Tags, format!("'{tag}': {e}")))
            }),
            AttrValue::Repeat(Some(rule)) if rule.count == 0 => Err(ArborError::invalid(
                AttrField::Repeat,
                "count must be at least 1",
            )),
            AttrValue::Link(Some(Link::External(target))) if target.trim().is_empty() => {
                Err(ArborError::invalid(AttrField::Link, "link target is empty"))
            }
            AttrValue::Planned(Some(slot)) if !(1..=MAX_PLAN_LEVEL).contains(&slot.level) => {
                Err(ArborError::invalid(
                    AttrField::Planned,
                    format!("level {} is not between 1 and {MAX_PLAN_LEVEL}", slot.level),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(f: &mut fmt::Formatter<'_>, v: &Option<T>) -> fmt::Result {
            match v {
                Some(v) => v.fmt(f),
                None => f.write_str("none"),
            }
        }
        match self {
            AttrValue::Text(v) => f.write_str(v),
            AttrValue::Kind(v) => v.fmt(f),
            AttrValue::Color(v) => v.fmt(f),
            AttrValue::Estimate(v) => opt(f, v),
            AttrValue::StartDate(v) => opt(f, v),
            AttrValue::Tags(v) => {
                f.write_str(&v.iter().cloned().collect::<Vec<_>>().join(","))
            }
            AttrValue::Repeat(v) => opt(f, v),
            AttrValue::Link(v) => opt(f, v),
            AttrValue::Collapsed(v) => v.fmt(f),
            AttrValue::Planned(v) => opt(f, v),
        }
    }
}

/// ISO dates, plus the `dd.MM.yy` form older documents used.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d.%m.%y"))
        .map_err(|_| ArborError::invalid(AttrField::StartDate, format!("'{raw}' is not a date")))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepeatUnit;

    #[test]
    fn field_matches_variant() {
        assert_eq!(AttrValue::Collapsed(true).field(), AttrField::Collapsed);
        assert_eq!(AttrValue::Estimate(None).field(), AttrField::Estimate);
    }

    #[test]
    fn negative_estimate_is_rejected() {
        let err = AttrValue::estimate(-5).unwrap_err();
        assert!(matches!(
            err,
            ArborError::InvalidValue {
                field: AttrField::Estimate,
                ..
            }
        ));
        assert!(AttrValue::parse(AttrField::Estimate, "-1").is_err());
    }

    #[test]
    fn estimate_upper_bound() {
        assert!(AttrValue::estimate(i64::from(MAX_ESTIMATE_MINUTES)).is_ok());
        assert!(AttrValue::estimate(i64::from(MAX_ESTIMATE_MINUTES) + 1).is_err());
        assert!(AttrValue::Estimate(Some(MAX_ESTIMATE_MINUTES + 1))
            .validate()
            .is_err());
    }

    #[test]
    fn parse_clears_optional_fields() {
        assert_eq!(
            AttrValue::parse(AttrField::Estimate, "").unwrap(),
            AttrValue::Estimate(None)
        );
        assert_eq!(
            AttrValue::parse(AttrField::StartDate, "none").unwrap(),
            AttrValue::StartDate(None)
        );
        assert_eq!(
            AttrValue::parse(AttrField::Link, " ").unwrap(),
            AttrValue::Link(None)
        );
    }

    #[test]
    fn parse_dates_in_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 3, 14);
        assert_eq!(
            AttrValue::parse(AttrField::StartDate, "2017-03-14").unwrap(),
            AttrValue::StartDate(expected)
        );
        assert_eq!(
            AttrValue::parse(AttrField::StartDate, "14.03.17").unwrap(),
            AttrValue::StartDate(expected)
        );
        assert!(AttrValue::parse(AttrField::StartDate, "tomorrow").is_err());
    }

    #[test]
    fn parse_tags_strips_delimiter_and_validates() {
        let value = AttrValue::parse(AttrField::Tags, ":work, home").unwrap();
        assert_eq!(value, AttrValue::tags(["home", "work"]));
        assert!(AttrValue::parse(AttrField::Tags, "ok -bad").is_err());
    }

    #[test]
    fn parse_repeat_and_collapsed() {
        assert_eq!(
            AttrValue::parse(AttrField::Repeat, "every 1 week").unwrap(),
            AttrValue::Repeat(Some(RepeatRule::new(1, RepeatUnit::Week)))
        );
        assert_eq!(
            AttrValue::parse(AttrField::Collapsed, "yes").unwrap(),
            AttrValue::Collapsed(true)
        );
        assert!(AttrValue::parse(AttrField::Collapsed, "maybe").is_err());
    }

    #[test]
    fn parse_plan_levels() {
        assert_eq!(
            AttrValue::parse(AttrField::Planned, "3").unwrap(),
            AttrValue::Planned(Some(PlanSlot::new(3, 0)))
        );
        assert_eq!(
            AttrValue::parse(AttrField::Planned, "2.5").unwrap(),
            AttrValue::Planned(Some(PlanSlot::new(2, 5)))
        );
        assert_eq!(
            AttrValue::parse(AttrField::Planned, "0").unwrap(),
            AttrValue::Planned(None)
        );
        assert!(AttrValue::parse(AttrField::Planned, "8").is_err());
        assert!(AttrValue::parse(AttrField::Planned, "soon").is_err());
    }

    #[test]
    fn display_is_user_readable() {
        assert_eq!(AttrValue::Estimate(None).to_string(), "none");
        assert_eq!(AttrValue::tags(["b", "a"]).to_string(), "a,b");
        assert_eq!(AttrValue::Kind(RowKind::Done).to_string(), "done");
        assert_eq!(AttrValue::Planned(Some(PlanSlot::new(1, 2))).to_string(), "1.2");
    }
}
