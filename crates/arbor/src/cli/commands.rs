//! # CLI Layer
//!
//! This module is **one possible UI client** for arbor, not the application itself.
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a `tracing` subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Resolve the data directory, load config, open the outline
//! 3. **Dispatch**: Run one command against the session
//! 4. **Persistence**: Save if anything changed, then back up if one is due
//! 5. **Output Formatting**: Hand results to `render`

use arborapp::attributes::{AttrField, AttrValue};
use arborapp::config::{ArborConfig, CONFIG_FILE_NAME};
use arborapp::error::{ArborError, Result};
use arborapp::filter::FilterSpec;
use arborapp::index::{format_path, path_of, DisplayRow, IndexOptions};
use arborapp::init::{initialize, load_config, resolve_data_dir, ArborContext};
use arborapp::model::{NodeAttrs, NodeId};
use arborapp::registry::RefKind;
use arborapp::session::Session;
use arborapp::tasks::TaskToggle;
use chrono::Local;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::render::{self, RenderOptions};
use super::setup::{
    AddArgs, Cli, Commands, CoreCommands, DataCommands, MiscCommands, PlanArgs, ReferenceAction,
    ReferenceCommands, ShowArgs, StructureCommands,
};

const LOG_ENV: &str = "ARBOR_LOG";

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;

    // Config is handled before the outline is opened, so a broken document
    // can still be reconfigured.
    if let Some(Commands::Misc(MiscCommands::Config { key, value })) = &cli.command {
        let data_dir = resolve_data_dir(cli.data.clone())?;
        let output = handle_config(&data_dir, &cwd, key.as_deref(), value.as_deref())?;
        print!("{output}");
        return Ok(());
    }

    let mut ctx = initialize(&cwd, cli.data.clone())?;
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Core(CoreCommands::Show(ShowArgs::default())));
    let output = dispatch(&mut ctx, command)?;

    if ctx.api.save_if_dirty()? {
        debug!(location = %ctx.api.location().display(), "outline saved");
        run_due_backup(&mut ctx)?;
    }
    print!("{output}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "arborapp=debug,arbor=debug,info"
        } else {
            "warn"
        })
    });
    // Logs go to stderr so command output stays pipeable.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// The process is about to exit, so a started backup is waited for.
fn run_due_backup(ctx: &mut ArborContext) -> Result<()> {
    let Some(rx) = ctx.api.backup_if_due()? else {
        return Ok(());
    };
    match rx.recv() {
        Ok(Ok(path)) => debug!(path = %path.display(), "backup written"),
        Ok(Err(e)) => eprint!("{}", render::render_warning(&format!("Backup failed: {e}"))),
        Err(_) => warn!("backup worker exited without reporting"),
    }
    Ok(())
}

fn dispatch(ctx: &mut ArborContext, command: Commands) -> Result<String> {
    match command {
        Commands::Core(cmd) => handle_core(ctx, cmd),
        Commands::Structure(cmd) => handle_structure(ctx.api.session_mut(), cmd),
        Commands::References(cmd) => handle_references(ctx.api.session_mut(), cmd),
        Commands::Data(cmd) => handle_data(ctx, cmd),
        Commands::Misc(MiscCommands::Config { .. }) => Ok(String::new()),
    }
}

fn handle_core(ctx: &mut ArborContext, command: CoreCommands) -> Result<String> {
    let session = ctx.api.session_mut();
    match command {
        CoreCommands::Show(args) => handle_show(session, &args),
        CoreCommands::Add(args) => handle_add(session, args),
        CoreCommands::Set { row, field, value } => {
            let id = session.resolve(&row)?;
            let changed = session.set_field(id, field, &value)?;
            let shown = session.store().get(id)?.get(field);
            Ok(if changed {
                render::render_success(&format!("{} {field} = {shown}", row_label(session, id)))
            } else {
                format!("{} {field} already {shown}\n", row_label(session, id))
            })
        }
        CoreCommands::Toggle { row } => {
            let id = session.resolve(&row)?;
            let message = match session.toggle_task(id)? {
                TaskToggle::Kind(kind) => format!("{} is now {kind}", row_label(session, id)),
                TaskToggle::Rescheduled(date) => {
                    format!("{} repeats on {date}", row_label(session, id))
                }
            };
            Ok(render::render_success(&message))
        }
        CoreCommands::Project { row } => {
            let id = session.resolve(&row)?;
            let kind = session.toggle_project(id)?;
            Ok(render::render_success(&format!(
                "{} is now {kind}",
                row_label(session, id)
            )))
        }
        CoreCommands::Plan(args) => handle_plan(session, args),
        CoreCommands::Delete { rows } => {
            let ids = rows
                .iter()
                .map(|r| session.resolve(r))
                .collect::<Result<Vec<_>>>()?;
            let removed = session.delete_many(&ids)?;
            Ok(render::render_success(&format!(
                "Deleted {} row{}",
                removed.len(),
                if removed.len() == 1 { "" } else { "s" }
            )))
        }
    }
}

/// Builds the filter from the query and the per-dimension flags, flags last.
fn filter_from_args(args: &ShowArgs) -> FilterSpec {
    let today = Local::now().date_naive();
    let mut spec = args
        .query
        .as_deref()
        .map(|q| FilterSpec::parse_query(q, today))
        .unwrap_or_default();
    if let Some(tag) = &args.tag {
        spec.tag = Some(tag.trim_start_matches(arborapp::tags::TAG_DELIMITER).to_string());
    }
    if let Some(color) = args.color {
        spec.color = Some(color);
    }
    if let Some(kind) = args.kind {
        spec.kind = Some(kind);
    }
    if let Some(until) = args.until {
        spec.date_until = Some(until);
    }
    if let Some(bucket) = args.estimate {
        spec.estimate = Some(bucket);
    }
    spec.hide_tagged |= args.hide_tagged;
    spec.hide_future |= args.hide_future;
    spec.only_dated |= args.only_dated;
    spec
}

fn handle_show(session: &mut Session, args: &ShowArgs) -> Result<String> {
    let top = match &args.row {
        Some(row) => session.resolve(row)?,
        None => session.root(),
    };
    session.set_filter(filter_from_args(args));
    debug!(filter = %session.filter(), "showing outline");

    let options = IndexOptions {
        expand_all: args.all,
    };
    let rows = session.visible_rows(top, options)?;
    let header = if top == session.root() {
        None
    } else {
        Some(DisplayRow {
            id: top,
            path: path_of(session.store(), top)?,
            depth: 0,
            matched: true,
            folded: false,
        })
    };
    let render_options = RenderOptions {
        ids: args.ids,
        width: console::Term::stdout()
            .size_checked()
            .map(|(_, cols)| usize::from(cols)),
    };
    Ok(render::render_outline(
        session.store(),
        header.as_ref(),
        &rows,
        render_options,
    ))
}

fn handle_plan(session: &mut Session, args: PlanArgs) -> Result<String> {
    let Some(row) = args.row else {
        if let Some(query) = &args.query {
            session.set_query(query);
        }
        let rows = session.plan_view();
        return Ok(render::render_plan(session.store(), &rows));
    };
    let id = session.resolve(&row)?;
    if args.up || args.down {
        let moved = session.move_in_plan(id, args.up)?;
        return Ok(if moved {
            render::render_success(&format!("Moved {} in the plan", row_label(session, id)))
        } else {
            format!("{} did not move\n", row_label(session, id))
        });
    }
    let slot = match args.level {
        Some(level) => session.plan(id, Some(level))?,
        None => session.store().get(id)?.planned,
    };
    let message = match slot {
        Some(slot) => format!(
            "{} planned for {} ({})",
            row_label(session, id),
            slot.level,
            slot.level_name()
        ),
        None => format!("{} is not planned", row_label(session, id)),
    };
    Ok(render::render_success(&message))
}

fn add_attrs(args: &AddArgs) -> Result<NodeAttrs> {
    let mut attrs = NodeAttrs::new(args.text.join(" "));
    let fields = [
        (AttrField::Kind, args.kind.as_deref()),
        (AttrField::Color, args.color.as_deref()),
        (AttrField::Estimate, args.estimate.as_deref()),
        (AttrField::StartDate, args.date.as_deref()),
        (AttrField::Repeat, args.repeat.as_deref()),
    ];
    for (field, raw) in fields {
        if let Some(raw) = raw {
            attrs.set(AttrValue::parse(field, raw)?);
        }
    }
    if !args.tags.is_empty() {
        attrs.set(AttrValue::parse(AttrField::Tags, &args.tags.join(","))?);
    }
    Ok(attrs)
}

fn handle_add(session: &mut Session, args: AddArgs) -> Result<String> {
    let parent = match &args.under {
        Some(row) => session.resolve(row)?,
        None => session.root(),
    };
    let attrs = add_attrs(&args)?;
    let id = match args.at {
        Some(at) => session.insert(parent, one_based(at)?, attrs)?,
        None => session.append(parent, attrs)?,
    };
    Ok(render::render_success(&format!("Added {}", row_label(session, id))))
}

fn handle_structure(session: &mut Session, command: StructureCommands) -> Result<String> {
    let (row, moved) = match command {
        StructureCommands::Move { row, under, at } => {
            let id = session.resolve(&row)?;
            let parent = match under {
                Some(target) => session.resolve(&target)?,
                None => session.root(),
            };
            let position = match at {
                Some(at) => one_based(at)?,
                None => {
                    let len = session.store().children_of(parent)?.len();
                    if session.store().parent_of(id)? == Some(parent) {
                        len - 1
                    } else {
                        len
                    }
                }
            };
            session.move_node(id, parent, position)?;
            (id, true)
        }
        StructureCommands::Up { row, steps } => {
            let id = session.resolve(&row)?;
            (id, session.reorder(id, -signed(steps))?)
        }
        StructureCommands::Down { row, steps } => {
            let id = session.resolve(&row)?;
            (id, session.reorder(id, signed(steps))?)
        }
        StructureCommands::Indent { row } => {
            let id = session.resolve(&row)?;
            (id, session.indent(id)?)
        }
        StructureCommands::Outdent { row } => {
            let id = session.resolve(&row)?;
            (id, session.outdent(id)?)
        }
    };
    Ok(if moved {
        render::render_success(&format!("Moved to {}", row_label(session, row)))
    } else {
        format!("{} did not move\n", row_label(session, row))
    })
}

fn handle_references(session: &mut Session, command: ReferenceCommands) -> Result<String> {
    let (kind, title, action) = match command {
        ReferenceCommands::Bookmark { action } => (RefKind::Bookmark, "bookmarks", action),
        ReferenceCommands::Quicklink { action } => (RefKind::QuickLink, "quick links", action),
    };
    match action.unwrap_or(ReferenceAction::List) {
        ReferenceAction::List => Ok(render::render_references(
            title,
            session.references(kind),
            session.store(),
        )),
        ReferenceAction::Add { row, label } => {
            let id = session.resolve(&row)?;
            let label = match label {
                Some(label) => label,
                None => session.store().get(id)?.text.clone(),
            };
            let position = session.add_reference(kind, label, id)?;
            Ok(render::render_success(&format!("Added {kind} {}", position + 1)))
        }
        ReferenceAction::Rename { number, label } => {
            session.rename_reference(kind, one_based(number)?, label)?;
            Ok(render::render_success(&format!("Renamed {kind} {number}")))
        }
        ReferenceAction::Remove { number } => {
            let entry = session.remove_reference(kind, one_based(number)?)?;
            Ok(render::render_success(&format!("Removed {kind} '{}'", entry.label)))
        }
        ReferenceAction::Move { from, to } => {
            session.reorder_reference(kind, one_based(from)?, one_based(to)?)?;
            Ok(render::render_success(&format!("Moved {kind} {from} to {to}")))
        }
        ReferenceAction::Go { number } => {
            let id = session.resolve_reference(kind, one_based(number)?)?;
            let rows = session.visible_rows(id, IndexOptions::default())?;
            let header = DisplayRow {
                id,
                path: path_of(session.store(), id)?,
                depth: 0,
                matched: true,
                folded: false,
            };
            Ok(render::render_outline(
                session.store(),
                Some(&header),
                &rows,
                RenderOptions::default(),
            ))
        }
    }
}

fn handle_data(ctx: &mut ArborContext, command: DataCommands) -> Result<String> {
    match command {
        DataCommands::Export { output } => {
            let json = ctx.api.export_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    Ok(render::render_success(&format!(
                        "Exported to {}",
                        path.display()
                    )))
                }
                None => Ok(json),
            }
        }
        DataCommands::Import { path } => {
            let text = std::fs::read_to_string(&path)?;
            ctx.api.import_json(&text)?;
            let rows = ctx.api.session().store().len();
            Ok(render::render_success(&format!(
                "Imported {rows} rows from {}",
                path.display()
            )))
        }
        DataCommands::Backup => {
            let path = ctx.api.backup_now()?;
            Ok(render::render_success(&format!(
                "Backup written to {}",
                path.display()
            )))
        }
        DataCommands::Tags => Ok(render::render_tags(&ctx.api.session().store().all_tags())),
    }
}

/// `arbor config [key [value]]`: list, read or write `arbor.toml` in the
/// data directory.
fn handle_config(
    data_dir: &Path,
    cwd: &Path,
    key: Option<&str>,
    value: Option<&str>,
) -> Result<String> {
    let config = load_config(data_dir, cwd).unwrap_or_default();
    let table = config_table(&config)?;
    match (key, value) {
        (None, _) => Ok(table
            .iter()
            .map(|(k, v)| format!("{k} = {}\n", format_toml_value(v)))
            .collect()),
        (Some(key), None) => match table.get(key) {
            Some(v) => Ok(format!("{}\n", format_toml_value(v))),
            None if is_config_key(key) => Ok("(not set)\n".to_string()),
            None => Err(ArborError::Config(format!("unknown key '{key}'"))),
        },
        (Some(key), Some(value)) => {
            if !is_config_key(key) {
                return Err(ArborError::Config(format!("unknown key '{key}'")));
            }
            set_config_value(data_dir, cwd, key, value)?;
            Ok(render::render_success(&format!("{key} = {value}")))
        }
    }
}

fn config_table(config: &ArborConfig) -> Result<toml::Table> {
    match toml::Value::try_from(config) {
        Ok(toml::Value::Table(table)) => Ok(table),
        Ok(_) => Ok(toml::Table::new()),
        Err(e) => Err(ArborError::Config(e.to_string())),
    }
}

fn is_config_key(key: &str) -> bool {
    config_table(&ArborConfig {
        backup_folder: Some(PathBuf::new()),
        ..Default::default()
    })
    .is_ok_and(|t| t.contains_key(key))
}

/// Writes one key into the data directory's `arbor.toml`, keeping the old
/// file if the result does not load.
fn set_config_value(data_dir: &Path, cwd: &Path, key: &str, raw: &str) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE_NAME);
    let previous = match std::fs::read_to_string(&path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    let mut table: toml::Table = match &previous {
        Some(text) => text
            .parse()
            .map_err(|e: toml::de::Error| ArborError::Config(e.to_string()))?,
        None => toml::Table::new(),
    };
    let value = raw
        .parse::<i64>()
        .map(toml::Value::Integer)
        .unwrap_or_else(|_| toml::Value::String(raw.to_string()));
    table.insert(key.to_string(), value);

    std::fs::create_dir_all(data_dir)?;
    let text = toml::to_string(&table).map_err(|e| ArborError::Config(e.to_string()))?;
    std::fs::write(&path, text)?;
    if let Err(e) = load_config(data_dir, cwd) {
        match previous {
            Some(text) => std::fs::write(&path, text)?,
            None => std::fs::remove_file(&path)?,
        }
        return Err(e);
    }
    Ok(())
}

/// Format a TOML value for display.
fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

fn one_based(n: usize) -> Result<usize> {
    n.checked_sub(1)
        .ok_or_else(|| ArborError::ReferenceNotFound("positions start at 1".into()))
}

fn signed(steps: usize) -> isize {
    isize::try_from(steps).unwrap_or(isize::MAX)
}

/// `2.1 "buy milk"`, for messages.
fn row_label(session: &Session, id: NodeId) -> String {
    let path = path_of(session.store(), id)
        .map(|p| format_path(&p))
        .unwrap_or_default();
    let text = session
        .store()
        .get(id)
        .map(|a| a.text.as_str())
        .unwrap_or_default();
    format!("{path} \"{text}\"")
}
