//! # Domain Model: Rows and Their Attributes
//!
//! This module defines the value types an outline row carries: [`NodeId`],
//! [`RowKind`], [`Color`], [`RepeatRule`], [`Link`] and the attribute bundle
//! [`NodeAttrs`]. Structure (parent, children, ordering) is not stored here; it
//! belongs to [`crate::store::OutlineStore`], which keeps rows in an arena keyed
//! by id.
//!
//! ## Row Kinds
//!
//! | Kind | Serialized | Meaning |
//! |------|------------|---------|
//! | `Note` | `note` | Plain text row |
//! | `Todo` | `todo` | Open task |
//! | `Done` | `done` | Completed task |
//! | `SequentialProject` | `sequential-project` | Children are worked in order |
//! | `ParallelProject` | `parallel-project` | Children are worked in any order |
//! | `PausedProject` | `paused-project` | No child task is available |
//!
//! ## Colours
//!
//! A fixed palette, each colour with the one-letter code used by the search
//! bar (`c=r` selects red rows):
//!
//! | Colour | Code | Hex |
//! |--------|------|-----|
//! | green | `g` | `#85E326` |
//! | yellow | `y` | `#EEEF22` |
//! | blue | `b` | `#8A9ADD` |
//! | red | `r` | `#FF2F00` |
//! | orange | `o` | `#FF9500` |
//! | violet | `v` | `#FF40FF` |
//! | grey | `e` | `#808080` |
//! | no color | `n` | - |
//!
//! ## Repeat Rules
//!
//! A repeating todo does not become done when toggled: its start date moves
//! forward by the rule instead. Rules are written compactly (`1w`, `3d`, `2m`,
//! `1y`); the longer `every 2 weeks` form is accepted on input.
//!
//! ## Links
//!
//! A row may point somewhere else. A value that parses as a node id is an
//! internal link; anything else is treated as an external URL or path. Links
//! are resolved on demand and are not kept consistent with deletions.
//!
//! ## Planning
//!
//! Any row can be put in the plan at a level from 1 to [`MAX_PLAN_LEVEL`]
//! with an order inside that level ([`PlanSlot`]). The plan view lists planned
//! rows by level, then order, regardless of where they sit in the tree.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::attributes::{AttrField, AttrValue};
use crate::error::{ArborError, Result};
use crate::tags::extract_tags;

/// Largest estimate accepted, in minutes (one year).
pub const MAX_ESTIMATE_MINUTES: u32 = 525_600;

/// Stable identity of a row. Assigned once at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowKind {
    #[default]
    Note,
    Todo,
    Done,
    SequentialProject,
    ParallelProject,
    PausedProject,
}

impl RowKind {
    pub const ALL: [RowKind; 6] = [
        RowKind::Note,
        RowKind::Todo,
        RowKind::Done,
        RowKind::SequentialProject,
        RowKind::ParallelProject,
        RowKind::PausedProject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Note => "note",
            RowKind::Todo => "todo",
            RowKind::Done => "done",
            RowKind::SequentialProject => "sequential-project",
            RowKind::ParallelProject => "parallel-project",
            RowKind::PausedProject => "paused-project",
        }
    }

    /// Search-bar code (`t=n`, `t=t`, `t=d`). Projects have none.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'n' => Some(RowKind::Note),
            't' => Some(RowKind::Todo),
            'd' => Some(RowKind::Done),
            _ => None,
        }
    }

    pub fn is_project(&self) -> bool {
        matches!(
            self,
            RowKind::SequentialProject | RowKind::ParallelProject | RowKind::PausedProject
        )
    }

    pub fn is_task(&self) -> bool {
        matches!(self, RowKind::Todo | RowKind::Done)
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowKind {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        RowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .or_else(|| match needle.as_str() {
                "sequential" => Some(RowKind::SequentialProject),
                "parallel" => Some(RowKind::ParallelProject),
                "paused" => Some(RowKind::PausedProject),
                _ => None,
            })
            .ok_or_else(|| ArborError::invalid(AttrField::Kind, format!("unknown row type '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Green,
    Yellow,
    Blue,
    Red,
    Orange,
    Violet,
    Grey,
    #[default]
    NoColor,
}

impl Color {
    pub const PALETTE: [Color; 8] = [
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Red,
        Color::Orange,
        Color::Violet,
        Color::Grey,
        Color::NoColor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Blue => "blue",
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Violet => "violet",
            Color::Grey => "grey",
            Color::NoColor => "no_color",
        }
    }

    pub fn code(&self) -> char {
        match self {
            Color::Green => 'g',
            Color::Yellow => 'y',
            Color::Blue => 'b',
            Color::Red => 'r',
            Color::Orange => 'o',
            Color::Violet => 'v',
            Color::Grey => 'e',
            Color::NoColor => 'n',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Color::PALETTE.into_iter().find(|c| c.code() == code)
    }

    pub fn hex(&self) -> Option<&'static str> {
        match self {
            Color::Green => Some("#85E326"),
            Color::Yellow => Some("#EEEF22"),
            Color::Blue => Some("#8A9ADD"),
            Color::Red => Some("#FF2F00"),
            Color::Orange => Some("#FF9500"),
            Color::Violet => Some("#FF40FF"),
            Color::Grey => Some("#808080"),
            Color::NoColor => None,
        }
    }

    /// Maps a hex value from the palette back to its colour.
    pub fn from_hex(hex: &str) -> Option<Self> {
        Color::PALETTE
            .into_iter()
            .find(|c| c.hex().is_some_and(|h| h.eq_ignore_ascii_case(hex.trim())))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        let by_name = Color::PALETTE.into_iter().find(|c| c.as_str() == needle);
        let by_alias = match needle.as_str() {
            "none" | "no color" | "no-color" => Some(Color::NoColor),
            "gray" => Some(Color::Grey),
            _ => None,
        };
        let mut chars = needle.chars();
        let by_code = match (chars.next(), chars.next()) {
            (Some(c), None) => Color::from_code(c),
            _ => None,
        };
        by_name
            .or(by_alias)
            .or(by_code)
            .or_else(|| Color::from_hex(&needle))
            .ok_or_else(|| {
                ArborError::invalid(AttrField::Color, format!("'{s}' is not in the palette"))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatUnit {
    Day,
    Week,
    Month,
    Year,
}

impl RepeatUnit {
    fn code(&self) -> char {
        match self {
            RepeatUnit::Day => 'd',
            RepeatUnit::Week => 'w',
            RepeatUnit::Month => 'm',
            RepeatUnit::Year => 'y',
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.trim_end_matches('s') {
            "d" | "day" => Some(RepeatUnit::Day),
            "w" | "week" => Some(RepeatUnit::Week),
            "m" | "month" => Some(RepeatUnit::Month),
            "y" | "year" => Some(RepeatUnit::Year),
            _ => None,
        }
    }
}

/// Recurrence of a todo, e.g. every 1 week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepeatRule {
    pub count: u32,
    pub unit: RepeatUnit,
}

impl RepeatRule {
    pub fn new(count: u32, unit: RepeatUnit) -> Self {
        Self { count, unit }
    }

    /// Moves `date` forward by one recurrence.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.unit {
            RepeatUnit::Day => date.checked_add_days(Days::new(u64::from(self.count))),
            RepeatUnit::Week => date.checked_add_days(Days::new(7 * u64::from(self.count))),
            RepeatUnit::Month => date.checked_add_months(Months::new(self.count)),
            RepeatUnit::Year => date.checked_add_months(Months::new(self.count.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for RepeatRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.code())
    }
}

impl FromStr for RepeatRule {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ArborError::invalid(AttrField::Repeat, format!("cannot parse '{s}'"));
        let lowered = s.trim().to_lowercase();
        let body = lowered.strip_prefix("every").unwrap_or(&lowered).trim();

        let split_at = body
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, unit) = body.split_at(split_at);
        let count = if digits.is_empty() {
            1
        } else {
            digits.parse::<u32>().map_err(|_| invalid())?
        };
        let unit = RepeatUnit::from_word(unit.trim()).ok_or_else(invalid)?;
        if count == 0 {
            return Err(ArborError::invalid(
                AttrField::Repeat,
                "count must be at least 1",
            ));
        }
        Ok(RepeatRule { count, unit })
    }
}

impl TryFrom<String> for RepeatRule {
    type Error = ArborError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RepeatRule> for String {
    fn from(rule: RepeatRule) -> Self {
        rule.to_string()
    }
}

/// Where a row points: another row, or something outside the outline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Link {
    Internal(NodeId),
    External(String),
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Internal(id) => id.fmt(f),
            Link::External(target) => f.write_str(target),
        }
    }
}

impl FromStr for Link {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ArborError::invalid(AttrField::Link, "link target is empty"));
        }
        Ok(match trimmed.parse::<NodeId>() {
            Ok(id) => Link::Internal(id),
            Err(_) => Link::External(trimmed.to_string()),
        })
    }
}

impl TryFrom<String> for Link {
    type Error = ArborError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Link> for String {
    fn from(link: Link) -> Self {
        link.to_string()
    }
}

/// Highest planning level. Level 1 is "now"; 0 means unplanned and is
/// stored as no slot at all.
pub const MAX_PLAN_LEVEL: u8 = 7;

/// A row's place in the plan: a level, then its order within that level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanSlot {
    pub level: u8,
    pub order: u32,
}

impl PlanSlot {
    pub fn new(level: u8, order: u32) -> Self {
        Self { level, order }
    }

    /// Short description of the level, for plan views.
    pub fn level_name(&self) -> &'static str {
        match self.level {
            1 => "now",
            2 => "later",
            3 => "tomorrow",
            4 => "urgent, important",
            5 => "urgent, unimportant",
            6 => "not urgent, important",
            7 => "not urgent, unimportant",
            _ => "unplanned",
        }
    }
}

impl fmt::Display for PlanSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.level, self.order)
    }
}

/// `3` or `3.2` (level, then order within the level).
impl FromStr for PlanSlot {
    type Err = ArborError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ArborError::invalid(AttrField::Planned, format!("cannot parse '{s}'"));
        let (level, order) = match s.trim().split_once('.') {
            Some((level, order)) => (level, order.parse::<u32>().map_err(|_| invalid())?),
            None => (s.trim(), 0),
        };
        let level = level.parse::<u8>().map_err(|_| invalid())?;
        Ok(PlanSlot { level, order })
    }
}

/// All attributes of a row. Structure lives in the store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeAttrs {
    pub text: String,
    pub kind: RowKind,
    pub color: Color,
    pub estimate: Option<u32>,
    pub start_date: Option<NaiveDate>,
    /// Explicit tags. Tags written in the text are added by [`Self::effective_tags`].
    pub tags: BTreeSet<String>,
    pub repeat: Option<RepeatRule>,
    pub link: Option<Link>,
    pub collapsed: bool,
    pub planned: Option<PlanSlot>,
}

impl NodeAttrs {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_kind(mut self, kind: RowKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_estimate(mut self, minutes: u32) -> Self {
        self.estimate = Some(minutes);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_repeat(mut self, rule: RepeatRule) -> Self {
        self.repeat = Some(rule);
        self
    }

    pub fn with_link(mut self, link: Link) -> Self {
        self.link = Some(link);
        self
    }

    pub fn with_plan(mut self, slot: PlanSlot) -> Self {
        self.planned = Some(slot);
        self
    }

    /// Explicit tags plus the `:tag` words found in the text.
    pub fn effective_tags(&self) -> BTreeSet<String> {
        let mut tags = self.tags.clone();
        tags.extend(extract_tags(&self.text));
        tags
    }

    pub fn has_any_tag(&self) -> bool {
        !self.tags.is_empty() || !extract_tags(&self.text).is_empty()
    }

    /// Checks every field, as [`AttrValue::validate`] does for a single one.
    pub fn validate(&self) -> Result<()> {
        crate::attributes::ATTRIBUTES
            .iter()
            .try_for_each(|spec| self.get(spec.field).validate())
    }

    /// Get an attribute value by field.
    pub fn get(&self, field: AttrField) -> AttrValue {
        match field {
            AttrField::Text => AttrValue::Text(self.text.clone()),
            AttrField::Kind => AttrValue::Kind(self.kind),
            AttrField::Color => AttrValue::Color(self.color),
            AttrField::Estimate => AttrValue::Estimate(self.estimate),
            AttrField::StartDate => AttrValue::StartDate(self.start_date),
            AttrField::Tags => AttrValue::Tags(self.tags.clone()),
            AttrField::Repeat => AttrValue::Repeat(self.repeat),
            AttrField::Link => AttrValue::Link(self.link.clone()),
            AttrField::Collapsed => AttrValue::Collapsed(self.collapsed),
            AttrField::Planned => AttrValue::Planned(self.planned),
        }
    }

    /// Replace one attribute, returning the previous value.
    ///
    /// The value is assumed validated; see [`AttrValue::validate`].
    pub fn set(&mut self, value: AttrValue) -> AttrValue {
        let previous = self.get(value.field());
        match value {
            AttrValue::Text(v) => self.text = v,
            AttrValue::Kind(v) => self.kind = v,
            AttrValue::Color(v) => self.color = v,
            AttrValue::Estimate(v) => self.estimate = v,
            AttrValue::StartDate(v) => self.start_date = v,
            AttrValue::Tags(v) => self.tags = v,
            AttrValue::Repeat(v) => self.repeat = v,
            AttrValue::Link(v) => self.link = v,
            AttrValue::Collapsed(v) => self.collapsed = v,
            AttrValue::Planned(v) => self.planned = v,
        }
        previous
    }
}
