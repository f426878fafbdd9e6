//! Search-bar syntax for [`FilterSpec`].

use chrono::{Days, Months, NaiveDate};
use std::fmt;

use super::spec::{EstimateBucket, FilterSpec};
use crate::model::{Color, RowKind};
use crate::tags::{validate_tag_name, TAG_DELIMITER};

const HIDE_TAGGED: &str = "has_tag";
const HIDE_FUTURE: &str = "hide_future_date";
const ONLY_DATED: &str = "only_date";

impl FilterSpec {
    /// Reads a search-bar string. Tokens that are not recognised filters,
    /// including malformed ones, become free-text terms.
    pub fn parse_query(query: &str, today: NaiveDate) -> FilterSpec {
        let mut spec = FilterSpec::new();
        let mut terms = Vec::new();
        for token in query.split_whitespace() {
            if !apply_token(&mut spec, token, today) {
                terms.push(token);
            }
        }
        spec.text = terms.join(" ");
        spec
    }
}

fn apply_token(spec: &mut FilterSpec, token: &str, today: NaiveDate) -> bool {
    if token == HIDE_TAGGED {
        spec.hide_tagged = true;
    } else if token == HIDE_FUTURE {
        spec.hide_future = true;
    } else if token == ONLY_DATED {
        spec.only_dated = true;
    } else if let Some(code) = token.strip_prefix("c=").and_then(single_char) {
        match Color::from_code(code) {
            Some(color) => spec.color = Some(color),
            None => return false,
        }
    } else if let Some(code) = token.strip_prefix("t=").and_then(single_char) {
        match RowKind::from_code(code) {
            Some(kind) => spec.kind = Some(kind),
            None => return false,
        }
    } else if let Some(name) = token.strip_prefix("type=") {
        match name.parse::<RowKind>() {
            Ok(kind) => spec.kind = Some(kind),
            Err(_) => return false,
        }
    } else if let Some(bucket) = token
        .strip_prefix('e')
        .filter(|b| b.starts_with(['<', '=', '>']))
        .and_then(|b| b.parse::<EstimateBucket>().ok())
    {
        spec.estimate = Some(bucket);
    } else if let Some(until) = token.strip_prefix("date<") {
        match parse_cutoff(until, today) {
            Some(date) => spec.date_until = Some(date),
            None => return false,
        }
    } else if let Some(tag) = token.strip_prefix(TAG_DELIMITER) {
        if spec.tag.is_some() || validate_tag_name(tag).is_err() {
            return false;
        }
        spec.tag = Some(tag.to_string());
    } else {
        return false;
    }
    true
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// `3d`, `2w`, `1m`, `1y` from today, or an ISO date.
fn parse_cutoff(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    let unit = raw.chars().last()?;
    let count: u32 = raw[..raw.len() - unit.len_utf8()].parse().ok()?;
    match unit {
        'd' => today.checked_add_days(Days::new(u64::from(count))),
        'w' => today.checked_add_days(Days::new(7 * u64::from(count))),
        'm' => today.checked_add_months(Months::new(count)),
        'y' => today.checked_add_months(Months::new(count.checked_mul(12)?)),
        _ => None,
    }
}

/// Writes the spec back in search-bar syntax.
impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tokens: Vec<String> = Vec::new();
        if let Some(tag) = &self.tag {
            tokens.push(format!("{TAG_DELIMITER}{tag}"));
        }
        if let Some(color) = self.color {
            tokens.push(format!("c={}", color.code()));
        }
        if let Some(kind) = self.kind {
            match kind {
                RowKind::Note => tokens.push("t=n".into()),
                RowKind::Todo => tokens.push("t=t".into()),
                RowKind::Done => tokens.push("t=d".into()),
                project => tokens.push(format!("type={project}")),
            }
        }
        if let Some(date) = self.date_until {
            tokens.push(format!("date<{date}"));
        }
        if let Some(bucket) = self.estimate {
            tokens.push(match bucket {
                EstimateBucket::Medium => "e=20-60".to_string(),
                other => format!("e{other}"),
            });
        }
        if self.hide_tagged {
            tokens.push(HIDE_TAGGED.into());
        }
        if self.hide_future {
            tokens.push(HIDE_FUTURE.into());
        }
        if self.only_dated {
            tokens.push(ONLY_DATED.into());
        }
        if !self.text.trim().is_empty() {
            tokens.push(self.text.trim().to_string());
        }
        f.write_str(&tokens.join(" "))
    }
}
