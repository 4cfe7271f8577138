use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::validate::EditContext;
use crate::core::syntax::Language;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub json: bool,     // global --json
}

#[derive(Parser)]
#[command(name = "scopedit")]
#[command(about = "Context-aware find/replace that refuses ambiguous or unsafe source edits")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Emit JSON results instead of human text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replace one occurrence of a snippet, refusing ambiguous or unsafe edits
    Edit(EditArgs),

    /// Show the diff an edit would produce without writing
    Preview(EditArgs),

    /// Report occurrences, safety checks and suggestions for an edit
    Validate(EditArgs),

    /// Apply a JSON list of edits as one all-or-nothing transaction
    Batch(BatchArgs),

    /// List the scopes recognised in a file
    Scopes(ScopesArgs),

    /// Initialize a scopedit.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Scope filters shared by every edit command
#[derive(Debug, Clone, Default, Args)]
pub struct ScopeArgs {
    /// Only match inside this free function
    #[arg(long, value_name = "NAME")]
    pub within_function: Option<String>,

    /// Only match inside this class (struct/impl/type in some languages)
    #[arg(long, value_name = "NAME")]
    pub within_class: Option<String>,

    /// Only match inside this method
    #[arg(long, value_name = "NAME")]
    pub within_method: Option<String>,

    /// Only match inside this interface or trait
    #[arg(long, value_name = "NAME")]
    pub within_interface: Option<String>,

    /// Only match inside this namespace or module
    #[arg(long, value_name = "NAME")]
    pub within_namespace: Option<String>,

    /// Replace the first match when the snippet is not unique
    #[arg(long)]
    pub allow_multiple: bool,

    /// Accept indentation changes (reported as warnings)
    #[arg(long = "allow-indent-change")]
    pub allow_indentation_changes: bool,
}

impl ScopeArgs {
    pub fn to_context(&self) -> EditContext {
        EditContext {
            within_function: self.within_function.clone(),
            within_class: self.within_class.clone(),
            within_method: self.within_method.clone(),
            within_interface: self.within_interface.clone(),
            within_namespace: self.within_namespace.clone(),
            require_unique: !self.allow_multiple,
            allow_indentation_changes: self.allow_indentation_changes,
        }
    }
}

#[derive(Debug, Parser)]
pub struct EditArgs {
    /// File to edit
    pub file: PathBuf,

    /// Exact text to find
    #[arg(long = "old", value_name = "TEXT", required_unless_present = "old_file")]
    pub old_string: Option<String>,

    /// Read the text to find from a file
    #[arg(long, value_name = "PATH", conflicts_with = "old_string")]
    pub old_file: Option<PathBuf>,

    /// Replacement text
    #[arg(long = "new", value_name = "TEXT", required_unless_present = "new_file")]
    pub new_string: Option<String>,

    /// Read the replacement text from a file
    #[arg(long, value_name = "PATH", conflicts_with = "new_string")]
    pub new_file: Option<PathBuf>,

    /// Override language detection (rust, python, javascript, typescript, tsx, go, cpp)
    #[arg(long = "lang", value_name = "LANG")]
    pub language: Option<Language>,

    #[command(flatten)]
    pub scope: ScopeArgs,
}

#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// File to edit
    pub file: PathBuf,

    /// JSON file holding an array of {oldString, newString, context?}
    #[arg(long, value_name = "FILE")]
    pub ops: PathBuf,

    /// Override language detection
    #[arg(long = "lang", value_name = "LANG")]
    pub language: Option<Language>,
}

#[derive(Debug, Parser)]
pub struct ScopesArgs {
    /// File to inspect
    pub file: PathBuf,

    /// Override language detection
    #[arg(long = "lang", value_name = "LANG")]
    pub language: Option<Language>,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scope_flags_map_onto_context() {
        let cli = Cli::try_parse_from([
            "scopedit",
            "edit",
            "a.py",
            "--old",
            "x",
            "--new",
            "y",
            "--within-class",
            "C",
            "--within-method",
            "m",
            "--allow-multiple",
        ])
        .unwrap();
        let Commands::Edit(args) = cli.command else {
            panic!("expected edit");
        };
        let ctx = args.scope.to_context();
        assert_eq!(ctx.within_class.as_deref(), Some("C"));
        assert_eq!(ctx.within_method.as_deref(), Some("m"));
        assert!(!ctx.require_unique);
        assert!(!ctx.allow_indentation_changes);
    }
}
