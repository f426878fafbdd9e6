//! Output formatting for the CLI.
//!
//! Every function here returns a `String`; `commands.rs` decides where it
//! goes. One outline row becomes one line:
//!
//! ```text
//! 2.1. ☐ buy milk …  :home  30m  2024-05-01  ↻1w
//! ```
//!
//! path, kind marker, text, a fold marker if children are hidden, then the
//! row's metadata. With a terminal width known, the text is shortened so the
//! line fits.

use arborapp::index::{format_path, path_of, DisplayRow};
use arborapp::model::{Link, NodeAttrs, NodeId, PlanSlot, RowKind};
use arborapp::registry::RefEntry;
use arborapp::store::OutlineStore;
use std::collections::BTreeSet;
use unicode_width::UnicodeWidthStr;

use super::styles::{row_color, STYLES};

const INDENT: &str = "  ";
const FOLDED: &str = "…";
const ELLIPSIS: char = '…';
const ID_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Print the id prefix in front of every row.
    pub ids: bool,
    /// Terminal width, if stdout is a terminal.
    pub width: Option<usize>,
}

pub fn kind_marker(kind: RowKind) -> &'static str {
    match kind {
        RowKind::Note => "•",
        RowKind::Todo => "☐",
        RowKind::Done => "☑",
        RowKind::SequentialProject => "⇣",
        RowKind::ParallelProject => "⇉",
        RowKind::PausedProject => "‖",
    }
}

/// `90` → `1h30m`.
pub fn format_estimate(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

fn metadata(store: &OutlineStore, attrs: &NodeAttrs) -> Vec<String> {
    let mut meta = Vec::new();
    if !attrs.tags.is_empty() {
        let tags: Vec<String> = attrs.tags.iter().map(|t| format!(":{t}")).collect();
        meta.push(tags.join(" "));
    }
    if let Some(minutes) = attrs.estimate {
        meta.push(format_estimate(minutes));
    }
    if let Some(date) = attrs.start_date {
        meta.push(date.to_string());
    }
    if let Some(rule) = attrs.repeat {
        meta.push(format!("↻{rule}"));
    }
    if let Some(slot) = attrs.planned {
        meta.push(format!("plan {}", slot.level));
    }
    match &attrs.link {
        Some(Link::Internal(target)) => {
            let target = path_of(store, *target)
                .map(|p| format_path(&p))
                .unwrap_or_else(|_| "missing".to_string());
            meta.push(format!("→ {target}"));
        }
        Some(Link::External(url)) => meta.push(format!("→ {url}")),
        None => {}
    }
    meta
}

/// Shortens `text` to at most `max` columns, ending in `…` when cut.
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    if max > 0 {
        out.push(ELLIPSIS);
    }
    out
}

fn render_row(store: &OutlineStore, row: &DisplayRow, options: RenderOptions) -> String {
    let Ok(attrs) = store.get(row.id) else {
        return String::new();
    };
    let s = &*STYLES;

    let id = if options.ids {
        let full = row.id.to_string();
        format!("{} ", &full[..ID_PREFIX_LEN.min(full.len())])
    } else {
        String::new()
    };
    let indent = INDENT.repeat(row.depth);
    let path = format!("{}.", format_path(&row.path));
    let marker = kind_marker(attrs.kind);
    let fold = if row.folded { format!(" {FOLDED}") } else { String::new() };
    let meta = metadata(store, attrs).join("  ");
    let meta = if meta.is_empty() { meta } else { format!("  {meta}") };

    let fixed = id.width() + indent.width() + path.width() + marker.width() + 2 + fold.width() + meta.width();
    let text = match options.width {
        Some(width) => truncate_to_width(&attrs.text, width.saturating_sub(fixed).max(8)),
        None => attrs.text.clone(),
    };

    let text = if !row.matched {
        s.context.apply_to(text).to_string()
    } else if attrs.kind == RowKind::Done {
        s.done.apply_to(text).to_string()
    } else if attrs.kind.is_project() {
        s.project.apply_to(text).to_string()
    } else {
        text
    };
    let marker = match row_color(attrs.color) {
        Some(style) => style.apply_to(marker).to_string(),
        None => marker.to_string(),
    };

    format!(
        "{}{}{} {} {}{}{}",
        s.id.apply_to(id),
        indent,
        s.path.apply_to(path),
        marker,
        text,
        s.muted.apply_to(fold),
        s.muted.apply_to(meta),
    )
}

/// The rows of an outline view, one per line. `header` is the focused row,
/// printed above its subtree.
pub fn render_outline(
    store: &OutlineStore,
    header: Option<&DisplayRow>,
    rows: &[DisplayRow],
    options: RenderOptions,
) -> String {
    let mut out = String::new();
    if let Some(header) = header {
        out.push_str(&render_row(store, header, options));
        out.push('\n');
    }
    for row in rows {
        let mut row = row.clone();
        if header.is_some() {
            row.depth += 1;
        }
        out.push_str(&render_row(store, &row, options));
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str(&format!("{}\n", STYLES.muted.apply_to("Nothing to show.")));
    }
    out
}

/// The plan, one block per level:
///
/// ```text
/// 1 now
///   2.1. ☐ buy milk
/// ```
pub fn render_plan(store: &OutlineStore, rows: &[(NodeId, PlanSlot)]) -> String {
    if rows.is_empty() {
        return format!("{}\n", STYLES.muted.apply_to("Nothing planned."));
    }
    let mut out = String::new();
    let mut level = None;
    for (id, slot) in rows {
        let (Ok(path), Ok(attrs)) = (path_of(store, *id), store.get(*id)) else {
            continue;
        };
        if level != Some(slot.level) {
            level = Some(slot.level);
            out.push_str(&format!(
                "{}\n",
                STYLES.path.apply_to(format!("{} {}", slot.level, slot.level_name()))
            ));
        }
        out.push_str(&format!(
            "{INDENT}{} {} {}\n",
            STYLES.path.apply_to(format!("{}.", format_path(&path))),
            kind_marker(attrs.kind),
            attrs.text
        ));
    }
    out
}

/// A numbered list of bookmarks or quick links.
pub fn render_references(title: &str, entries: &[RefEntry], store: &OutlineStore) -> String {
    if entries.is_empty() {
        return format!("{}\n", STYLES.muted.apply_to(format!("No {title}.")));
    }
    let mut out = String::new();
    for (i, entry) in entries.iter().enumerate() {
        let target = match (path_of(store, entry.target_id), store.get(entry.target_id)) {
            (Ok(path), Ok(attrs)) => format!("{}. {}", format_path(&path), attrs.text),
            _ => "missing".to_string(),
        };
        out.push_str(&format!(
            "{} {} {}\n",
            STYLES.path.apply_to(format!("{:2}.", i + 1)),
            entry.label,
            STYLES.muted.apply_to(format!("→ {target}")),
        ));
    }
    out
}

pub fn render_tags(tags: &BTreeSet<String>) -> String {
    if tags.is_empty() {
        return format!("{}\n", STYLES.muted.apply_to("No tags."));
    }
    tags.iter()
        .map(|t| format!("{}\n", STYLES.tag.apply_to(format!(":{t}"))))
        .collect()
}

pub fn render_success(message: &str) -> String {
    format!("{}\n", STYLES.success.apply_to(message))
}

pub fn render_warning(message: &str) -> String {
    format!("{}\n", STYLES.warning.apply_to(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arborapp::index::{index_rows, IndexOptions};
    use arborapp::model::{Color, RepeatRule};
    use arborapp::registry::RefEntry;

    fn plain() {
        console::set_colors_enabled(false);
    }

    fn sample() -> OutlineStore {
        let mut store = OutlineStore::new();
        let root = store.root();
        let home = store
            .append(root, NodeAttrs::new("home").with_kind(RowKind::ParallelProject))
            .unwrap();
        store
            .append(
                home,
                NodeAttrs::new("buy milk")
                    .with_kind(RowKind::Todo)
                    .with_tag("errand")
                    .with_estimate(90)
                    .with_color(Color::Red)
                    .with_repeat("1w".parse::<RepeatRule>().unwrap()),
            )
            .unwrap();
        store
    }

    #[test]
    fn renders_one_line_per_row() {
        plain();
        let store = sample();
        let rows = index_rows(&store, store.root(), None, IndexOptions::default()).unwrap();
        let out = render_outline(&store, None, &rows, RenderOptions::default());
        assert_eq!(out, "1. ⇉ home\n  1.1. ☐ buy milk  :errand  1h30m  ↻1w\n");
    }

    #[test]
    fn empty_outline_says_so() {
        plain();
        let store = OutlineStore::new();
        let out = render_outline(&store, None, &[], RenderOptions::default());
        assert_eq!(out, "Nothing to show.\n");
    }

    #[test]
    fn estimates_read_as_hours_and_minutes() {
        assert_eq!(format_estimate(15), "15m");
        assert_eq!(format_estimate(60), "1h");
        assert_eq!(format_estimate(135), "2h15m");
    }

    #[test]
    fn truncation_respects_wide_characters() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }

    #[test]
    fn plan_groups_rows_by_level() {
        plain();
        let mut store = sample();
        let home = store.children_of(store.root()).unwrap()[0];
        let milk = store.children_of(home).unwrap()[0];
        let rows = vec![(milk, PlanSlot::new(1, 0)), (home, PlanSlot::new(3, 0))];
        store
            .set_attribute(milk, arborapp::attributes::AttrValue::Planned(Some(rows[0].1)))
            .unwrap();
        assert_eq!(
            render_plan(&store, &rows),
            "1 now\n  1.1. ☐ buy milk\n3 tomorrow\n  1. ⇉ home\n"
        );
        assert_eq!(render_plan(&store, &[]), "Nothing planned.\n");
        let listed = index_rows(&store, store.root(), None, IndexOptions::default()).unwrap();
        assert!(render_outline(&store, None, &listed, RenderOptions::default())
            .contains("↻1w  plan 1"));
    }

    #[test]
    fn references_point_at_paths() {
        plain();
        let store = sample();
        let home = store.children_of(store.root()).unwrap()[0];
        let entries = vec![RefEntry {
            label: "house".into(),
            target_id: home,
        }];
        assert_eq!(
            render_references("bookmarks", &entries, &store),
            " 1. house → 1. home\n"
        );
        assert_eq!(render_references("bookmarks", &[], &store), "No bookmarks.\n");
    }
}
