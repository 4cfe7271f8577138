//! CLI command handlers for edit, preview, validate, batch and scopes.
//!
//! Handlers return the process exit code. Engine failures are reported
//! here (JSON result or miette diagnostic) and mapped through
//! `EditError::exit_code`; only setup failures (config, unreadable ops
//! file) bubble up as `anyhow` errors.

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Style};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use crate::cli::{AppContext, BatchArgs, EditArgs, ScopesArgs};
use crate::core::disambiguate::DisambiguationSuggestion;
use crate::core::edit::{EditEngine, EditOperation, EditResult, MultiEditResult};
use crate::core::errors::EditError;
use crate::core::syntax::Language;
use crate::core::validate::EditValidation;
use crate::infra::config::Config;
use crate::infra::io::read_file_smart;

/// Exit code for success
pub const EXIT_OK: i32 = 0;

fn paint(
    ctx: &AppContext,
    text: &str,
    style: Style,
) -> String
{
    if ctx.no_color
    {
        text.to_string()
    }
    else
    {
        text.style(style)
            .to_string()
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()>
{
    println!("{}", serde_json::to_string_pretty(value).context("serialize result")?);
    Ok(())
}

fn open_engine(
    file: &std::path::Path,
    language: Option<Language>,
    cfg: &Config,
) -> Result<EditEngine, EditError>
{
    let language = language.or_else(|| Language::from_path(file));
    Ok(EditEngine::open_with_language(file, language)?.with_config(cfg))
}

/// Resolve `--old`/`--old-file` and `--new`/`--new-file`.
fn edit_texts(args: &EditArgs) -> Result<(String, String)>
{
    let read = |inline: &Option<String>, file: &Option<std::path::PathBuf>, flag: &str| -> Result<String> {
        match (inline, file)
        {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => read_file_smart(path),
            (None, None) => anyhow::bail!("missing --{flag} or --{flag}-file"),
        }
    };
    Ok((
        read(&args.old_string, &args.old_file, "old")?,
        read(&args.new_string, &args.new_file, "new")?,
    ))
}

/// Report an engine failure and return its exit code.
fn report_error(
    err: EditError,
    ctx: &AppContext,
) -> Result<i32>
{
    let code = err.exit_code();
    if ctx.json
    {
        print_json(&EditResult::from(err))?;
    }
    else
    {
        let suggestions = err
            .suggestions()
            .to_vec();
        eprintln!("{:?}", miette::Report::new(err));
        print_suggestions(&suggestions, ctx);
    }
    Ok(code)
}

fn print_suggestions(
    suggestions: &[DisambiguationSuggestion],
    ctx: &AppContext,
)
{
    if suggestions.is_empty()
    {
        return;
    }

    eprintln!("{}", paint(ctx, "Suggestions:", Style::new().bold()));
    for (i, s) in suggestions
        .iter()
        .enumerate()
    {
        eprintln!(
            "  {}. [{:.0}%] {} (line {})",
            i + 1,
            s.confidence * 100.0,
            s.description,
            s.line
        );
        if let Some(scope) = s
            .context
            .as_ref()
            .and_then(|c| c.describe())
        {
            eprintln!("     retry with the edit restricted to {}", paint(ctx, &scope, Style::new().cyan()));
        }
        else
        {
            for line in s
                .old_string
                .lines()
            {
                eprintln!("     {}", paint(ctx, line, Style::new().dimmed()));
            }
        }
    }
}

fn print_warnings(
    warnings: &[String],
    ctx: &AppContext,
)
{
    for w in warnings
    {
        eprintln!("{} {}", paint(ctx, "warning:", Style::new().yellow().bold()), w);
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn edit(
    args: EditArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<i32>
{
    let (old, new) = edit_texts(&args)?;
    let context = args
        .scope
        .to_context();

    let result = open_engine(&args.file, args.language, cfg).and_then(|mut engine| engine.edit(&old, &new, &context));

    match result
    {
        Ok(res) if ctx.json => print_json(&res).map(|_| EXIT_OK),
        Ok(res) =>
        {
            print_warnings(&res.warnings, ctx);
            if !ctx.quiet
            {
                println!(
                    "{} {} ({} line(s) changed)",
                    paint(ctx, "Applied", Style::new().green().bold()),
                    res.message
                        .as_deref()
                        .unwrap_or_default(),
                    res.lines_changed
                        .unwrap_or_default()
                );
            }
            Ok(EXIT_OK)
        }
        Err(e) => report_error(e, ctx),
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn preview(
    args: EditArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<i32>
{
    let (old, new) = edit_texts(&args)?;
    let context = args
        .scope
        .to_context();

    let result = open_engine(&args.file, args.language, cfg).and_then(|engine| engine.preview(&old, &new, &context));

    match result
    {
        Ok(res) if ctx.json => print_json(&res).map(|_| EXIT_OK),
        Ok(res) =>
        {
            print_warnings(&res.warnings, ctx);
            for line in res
                .preview
                .as_deref()
                .unwrap_or_default()
                .lines()
            {
                let style = if line.starts_with("+++") || line.starts_with("---")
                {
                    Style::new().bold()
                }
                else if line.starts_with('+')
                {
                    Style::new().green()
                }
                else if line.starts_with('-')
                {
                    Style::new().red()
                }
                else if line.starts_with("@@")
                {
                    Style::new().cyan()
                }
                else
                {
                    Style::new()
                };
                println!("{}", paint(ctx, line, style));
            }
            Ok(EXIT_OK)
        }
        Err(e) => report_error(e, ctx),
    }
}

/// Exit code for a validation report: 0 safe, 2 ambiguous, 4 not found, 5 unsafe.
fn validation_exit_code(v: &EditValidation) -> i32
{
    // Nothing to edit is never safe, even when multiple matches are allowed
    if v.occurrence_count() == 0
    {
        4
    }
    else if v.is_safe()
    {
        EXIT_OK
    }
    else if !v.is_unique()
    {
        2
    }
    else
    {
        5
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn validate(
    args: EditArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<i32>
{
    let (old, new) = edit_texts(&args)?;
    let context = args
        .scope
        .to_context();

    let result = open_engine(&args.file, args.language, cfg).and_then(|engine| {
        let validation = engine.validate(&old, &new, &context)?;
        Ok((engine, validation))
    });

    let (engine, validation) = match result
    {
        Ok(pair) => pair,
        Err(e) => return report_error(e, ctx),
    };
    let code = validation_exit_code(&validation);

    if ctx.json
    {
        print_json(&json!({
            "validation": validation,
            "occurrences": validation.occurrences(),
        }))?;
        return Ok(code);
    }

    let verdict = if validation.is_safe()
    {
        paint(ctx, "safe", Style::new().green().bold())
    }
    else
    {
        paint(ctx, "unsafe", Style::new().red().bold())
    };
    println!("{}: {} occurrence(s), {}", engine.path().map_or_else(String::new, |p| p.display().to_string()), validation.occurrence_count(), verdict);

    for occ in validation.occurrences()
    {
        let scope = occ
            .enclosing_scope
            .as_deref()
            .unwrap_or("<top level>");
        println!("  line {}:{} in {}: {}", occ.line, occ.column, paint(ctx, scope, Style::new().cyan()), occ.line_text.trim());
    }
    if validation.ambiguous_context()
    {
        print_warnings(&["scope filters match more than one scope".to_string()], ctx);
    }
    print_warnings(validation.indentation_issues(), ctx);
    print_warnings(validation.syntax_warnings(), ctx);
    print_suggestions(validation.suggestions(), ctx);

    Ok(code)
}

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn batch(
    args: BatchArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<i32>
{
    let raw = read_file_smart(&args.ops)?;
    let ops: Vec<EditOperation> =
        serde_json::from_str(&raw).with_context(|| format!("Failed to parse operations in {}", args.ops.display()))?;

    let result = open_engine(&args.file, args.language, cfg).and_then(|mut engine| engine.multi_edit(&ops));

    match result
    {
        Ok(res) if ctx.json => print_json(&res).map(|_| EXIT_OK),
        Ok(res) =>
        {
            print_warnings(&res.warnings, ctx);
            if !ctx.quiet
            {
                println!(
                    "{} {} edit(s), {} line(s) changed",
                    paint(ctx, "Applied", Style::new().green().bold()),
                    res.edits_applied,
                    res.lines_changed
                );
            }
            Ok(EXIT_OK)
        }
        Err(e) if ctx.json =>
        {
            let code = e.exit_code();
            print_json(&MultiEditResult::from(e))?;
            Ok(code)
        }
        Err(e) => report_error(e, ctx),
    }
}

#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn scopes(
    args: ScopesArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<i32>
{
    let engine = match open_engine(&args.file, args.language, cfg)
    {
        Ok(engine) => engine,
        Err(e) => return report_error(e, ctx),
    };
    let table = engine.scopes();

    if ctx.json
    {
        let rows: Vec<_> = table
            .iter()
            .map(|(id, node)| {
                json!({
                    "qualifiedName": table.qualified_name(id),
                    "scope": node,
                })
            })
            .collect();
        print_json(&rows)?;
        return Ok(EXIT_OK);
    }

    if table.is_empty() && !ctx.quiet
    {
        let lang = engine
            .language()
            .map_or("unknown", Language::name);
        println!("no scopes found (language: {lang})");
    }
    for (id, node) in table.iter()
    {
        println!(
            "{:>5}-{:<5} {:<9} {}",
            node.start_line,
            node.end_line,
            paint(ctx, node.kind.label(), Style::new().cyan()),
            table.qualified_name(id)
        );
    }
    Ok(EXIT_OK)
}
