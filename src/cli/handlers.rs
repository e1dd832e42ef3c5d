use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::process::Stdio;

use regex::Regex;

use crate::cli::commands::*;
use crate::export::{
    Driver, ExportError, ExportFilters, ExportOptions, ExternalExporter, Format, TextExporter,
};
use crate::io::config_io;
use crate::io::hooks::{self, HookPhase, HookSettings};
use crate::io::lock::BaseLock;
use crate::io::prompt;
use crate::io::state;
use crate::io::store::Store;
use crate::message;
use crate::model::config::Config;
use crate::model::path;
use crate::model::session::Session;
use crate::ops::workflow::{HaltOptions, WorkonOptions};
use crate::ops::{select, task_ops, workflow};
use crate::util::time;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.verbose {
        message::set_verbose(true);
    }

    let store = Store::discover(cli.directory.as_deref().map(Path::new))?;
    let config = config_io::load_config(&store)?;
    let editor = prompt::system_editor(config.editor.as_deref());
    let editor = editor.as_deref();

    let hook_settings = HookSettings {
        enabled: config.hooks && !cli.no_hooks,
        check: config.check_hooks || cli.check_hooks,
    };

    let name = command_name(&cli.command);
    let readonly = matches!(
        cli.command,
        Commands::Status(_) | Commands::List(_) | Commands::Export(_)
    );

    hooks::run_hook(&store, hook_settings, HookPhase::Before, name)?;
    let phase = if readonly {
        HookPhase::BeforeRead
    } else {
        HookPhase::BeforeWrite
    };
    hooks::run_hook(&store, hook_settings, phase, name)?;

    // Write commands hold the base lock for their whole run.
    let _lock = if readonly {
        None
    } else {
        Some(BaseLock::acquire_default(store.base())?)
    };

    let mut session = state::load_session(&store)?;

    match cli.command {
        Commands::New(args) => {
            task_ops::create(
                &store,
                &mut session,
                editor,
                &args.name,
                args.title.as_deref(),
                args.fetch,
            )?;
        }
        Commands::Workon(args) => {
            let opts = WorkonOptions {
                at: parse_at(args.at.as_deref())?,
                new_task: args.new,
                title: args.title.as_deref(),
                fetch: args.fetch,
            };
            workflow::workon(&store, &mut session, editor, &args.selection, &opts)?;
        }
        Commands::Halt(args) => {
            let opts = HaltOptions {
                selection: args.selection.as_deref(),
                at: parse_at(args.at.as_deref())?,
                ..HaltOptions::default()
            };
            workflow::halt(&store, &mut session, &opts)?;
        }
        Commands::Append(args) => {
            workflow::append(&store, &mut session, args.selection.as_deref())?;
        }
        Commands::Cancel(args) => {
            workflow::cancel(&store, &mut session, args.selection.as_deref())?;
        }
        Commands::Resume => {
            workflow::resume(&store, &mut session)?;
        }
        Commands::Switchto(args) => {
            let opts = WorkonOptions {
                at: parse_at(args.at.as_deref())?,
                new_task: args.new,
                title: args.title.as_deref(),
                fetch: args.fetch,
            };
            workflow::switchto(&store, &mut session, editor, &args.selection, &opts)?;
        }
        Commands::Switchback(args) => {
            workflow::switchback(&store, &mut session, parse_at(args.at.as_deref())?)?;
        }
        Commands::Conclude(args) => {
            workflow::conclude(
                &store,
                &mut session,
                args.selection.as_deref(),
                parse_at(args.at.as_deref())?,
            )?;
        }
        Commands::Status(args) => cmd_status(&store, &session, &args)?,
        Commands::List(args) => cmd_list(&store, &session, &args)?,
        Commands::Export(args) => cmd_export(&store, &session, &config, &args)?,
        Commands::Note(args) => {
            task_ops::note(
                &store,
                &session,
                editor,
                args.task.as_deref(),
                args.text.as_deref(),
            )?;
        }
        Commands::Set(args) => {
            task_ops::set_property(
                &store,
                &session,
                editor,
                args.task.as_deref(),
                args.name.as_deref(),
                args.value.as_deref(),
            )?;
        }
        Commands::Move(args) => {
            task_ops::move_task(&store, &mut session, &args.from, &args.to, args.fetch)?;
        }
        Commands::Edit(args) => {
            task_ops::edit(&store, &session, editor, args.selection.as_deref())?;
        }
        Commands::Fetch(args) => {
            task_ops::fetch(&store, &session, args.selection.as_deref())?;
        }
        Commands::RebuildIndex => {
            task_ops::rebuild(&store, &mut session)?;
        }
    }

    if !readonly {
        state::save_session(&store, &session)?;
    }

    let phase = if readonly {
        HookPhase::AfterRead
    } else {
        HookPhase::AfterWrite
    };
    hooks::run_hook(&store, hook_settings, phase, name)?;
    hooks::run_hook(&store, hook_settings, HookPhase::After, name)?;

    Ok(())
}

/// Resolved command name, as passed to hook scripts.
fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::New(_) => "new",
        Commands::Workon(_) => "workon",
        Commands::Halt(_) => "halt",
        Commands::Append(_) => "append",
        Commands::Cancel(_) => "cancel",
        Commands::Resume => "resume",
        Commands::Switchto(_) => "switchto",
        Commands::Switchback(_) => "switchback",
        Commands::Conclude(_) => "conclude",
        Commands::Status(_) => "status",
        Commands::List(_) => "list",
        Commands::Export(_) => "export",
        Commands::Note(_) => "note",
        Commands::Set(_) => "set",
        Commands::Move(_) => "move",
        Commands::Edit(_) => "edit",
        Commands::Fetch(_) => "fetch",
        Commands::RebuildIndex => "rebuild-index",
    }
}

// ---------------------------------------------------------------------------
// Listing commands
// ---------------------------------------------------------------------------

fn cmd_status(
    store: &Store,
    session: &Session,
    args: &StatusArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let filters = build_filters(args.from.as_deref(), args.to.as_deref(), &args.r#where)?;
    let options = ExportOptions {
        verbose: args.verbose,
        sum: args.sum,
        status: true,
        compact: true,
        color: std::io::stdout().is_terminal(),
        ..ExportOptions::default()
    };
    let limit = args.limit.map_or(0, |n| n.max(1));
    let mut exporter = TextExporter::new(std::io::stdout(), options);
    Driver::new(store, session, &filters).export_status(&mut exporter, limit)?;
    Ok(())
}

fn cmd_list(
    store: &Store,
    session: &Session,
    args: &ListArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let scope = select::resolve_forward(session, args.selection.as_deref())?;
    message::verbose(&format!("Selected: {}", scope_display(&scope)));
    let filters = build_filters(args.from.as_deref(), args.to.as_deref(), &args.r#where)?;
    let options = ExportOptions {
        verbose: args.verbose,
        sum: args.sum,
        concluded: args.concluded || scope.task.is_some(),
        compact: args.compact,
        color: std::io::stdout().is_terminal(),
        ..ExportOptions::default()
    };
    let mut exporter = TextExporter::new(std::io::stdout(), options);
    Driver::new(store, session, &filters).export_scope(&mut exporter, &scope, args.all)?;
    Ok(())
}

fn cmd_export(
    store: &Store,
    session: &Session,
    config: &Config,
    args: &ExportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let scope = select::resolve_forward(session, args.selection.as_deref())?;
    message::verbose(&format!("Selected: {}", scope_display(&scope)));
    let filters = build_filters(args.from.as_deref(), args.to.as_deref(), &args.r#where)?;

    let output = args.output.as_deref().filter(|o| *o != "stdout");
    let format_name = args
        .format
        .clone()
        .or_else(|| output.and_then(file_extension))
        .unwrap_or_else(|| config.default_format.clone());

    let options = ExportOptions {
        verbose: args.verbose,
        sum: args.sum,
        concluded: args.concluded || scope.task.is_some(),
        compact: args.compact,
        color: output.is_none() && std::io::stdout().is_terminal(),
        ..ExportOptions::default()
    };

    let driver = Driver::new(store, session, &filters);
    match Format::from_name(&format_name) {
        Some(format) => {
            let out: Box<dyn Write> = match output {
                Some(file) => Box::new(File::create(file)?),
                None => Box::new(std::io::stdout()),
            };
            let mut exporter = format.exporter(out, options);
            driver.export_scope(exporter.as_mut(), &scope, args.all)?;
        }
        None => {
            let script = store.exporter_path(&format_name);
            if !script.is_file() {
                return Err(ExportError::UnknownFormat(format_name).into());
            }
            let stdout = match output {
                Some(file) => Stdio::from(File::create(file)?),
                None => Stdio::inherit(),
            };
            let mut exporter = ExternalExporter::spawn(&script, store.base(), stdout)?;
            driver.export_scope(&mut exporter, &scope, args.all)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_at(
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDateTime>, time::DateParseError> {
    value.map(time::parse_datetime).transpose()
}

fn scope_display(scope: &crate::model::Scope) -> String {
    path::display_triple(
        scope.group.as_deref(),
        scope.subgroup.as_deref(),
        scope.task.as_deref(),
    )
}

fn build_filters(
    from: Option<&str>,
    to: Option<&str>,
    where_args: &[String],
) -> Result<ExportFilters, Box<dyn std::error::Error>> {
    let mut filters = ExportFilters {
        from: parse_at(from)?,
        to: parse_at(to)?,
        where_prop: None,
    };
    // Repeated --where flags accumulate; the last pair wins.
    if let Some([name, pattern]) = where_args.chunks(2).last() {
        let regex =
            Regex::new(pattern).map_err(|e| format!("bad regular expression: {}", e))?;
        filters.where_prop = Some((name.clone(), regex));
    }
    Ok(filters)
}

fn file_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
}
