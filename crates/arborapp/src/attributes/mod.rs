//! # Attribute System
//!
//! Rows carry a fixed set of typed attributes. Instead of treating them as
//! loosely typed fields checked at render time, the attribute system gives:
//!
//! - **A closed field set**: [`AttrField`] names every attribute a row has
//! - **Typed values**: [`AttrValue`] holds one variant per field
//! - **Specifications**: [`ATTRIBUTES`] records which fields affect filtering
//!   and which are view state only
//! - **One validation point**: [`AttrValue::parse`] and [`AttrValue::validate`]
//!   run at the `set_attribute` boundary, so a stored value is always valid
//!
//! ## Fields
//!
//! | Field | Value | Filterable |
//! |-------|-------|------------|
//! | `text` | string | yes (free text, text tags) |
//! | `type` | [`crate::model::RowKind`] | yes |
//! | `color` | [`crate::model::Color`] | yes |
//! | `estimate` | minutes or none | yes |
//! | `start_date` | ISO date or none | yes |
//! | `tags` | tag set | yes |
//! | `repeat` | [`crate::model::RepeatRule`] or none | no |
//! | `link` | [`crate::model::Link`] or none | no |
//! | `collapsed` | bool | no (view state) |
//!
//! ## Usage
//!
//! ```ignore
//! let value = AttrValue::parse(AttrField::Estimate, "45")?;
//! session.set_attribute(id, value)?;
//! ```

mod spec;
mod value;

pub use spec::{filterable_attrs, get_spec, AttrField, AttributeSpec, ATTRIBUTES};
pub use value::AttrValue;
