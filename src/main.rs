use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use scopedit::cli::{AppContext, Cli, Commands};
use scopedit::cli_ext::edit_cmd;
use scopedit::core::EditError;
use tracing_subscriber::EnvFilter;

/// Exit code for failures outside the engine (config, unreadable inputs)
const EXIT_INTERNAL: u8 = 7;

fn init_tracing() {
    // warn+ to stderr unless SCOPEDIT_LOG / RUST_LOG override
    let env_filter = EnvFilter::try_from_env("SCOPEDIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, ctx: &AppContext) -> Result<i32> {
    // Only edit commands read the config file
    let load = scopedit::load_config;

    match cli.command {
        Commands::Edit(args) => edit_cmd::edit(args, &load()?, ctx),
        Commands::Preview(args) => edit_cmd::preview(args, &load()?, ctx),
        Commands::Validate(args) => edit_cmd::validate(args, &load()?, ctx),
        Commands::Batch(args) => edit_cmd::batch(args, &load()?, ctx),
        Commands::Scopes(args) => edit_cmd::scopes(args, &load()?, ctx),
        Commands::Init(args) => scopedit::infra::config::init(args, ctx).map(|_| 0),
        Commands::Completions(args) => scopedit::completion::run(args, ctx).map(|_| 0),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        json: cli.json,
    };

    if ctx.no_color {
        let _ = miette::set_hook(Box::new(|_| Box::new(miette::MietteHandlerOpts::new().color(false).build())));
    }

    match run(cli, &ctx) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(EXIT_INTERNAL)),
        Err(err) => {
            let code = err
                .downcast_ref::<EditError>()
                .and_then(|e| u8::try_from(e.exit_code()).ok())
                .unwrap_or(EXIT_INTERNAL);
            eprintln!("Error: {err:#}");
            ExitCode::from(code)
        }
    }
}
