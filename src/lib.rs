//! **scopedit** - Context-aware find/replace for source files
//!
//! Edits are resolved against the file's syntactic scopes (functions,
//! methods, classes, interfaces, namespaces), refused when ambiguous or
//! unsafe, and applied atomically. Ambiguous requests come back with
//! ranked, unique replacements the caller can retry with.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Core engine - scopes, occurrences, validation, disambiguation, apply
pub mod core {
    /// Error taxonomy and exit-code mapping
    pub mod errors;
    pub use errors::{EditError, InputError, PositionError};

    /// Immutable text snapshot with line/column/offset translation
    pub mod source;
    pub use source::SourceText;

    /// Tree-sitter front end producing a language-neutral syntax tree
    pub mod syntax;
    pub use syntax::{Language, SyntaxNode, SyntaxTree};

    /// Scope table built from the syntax tree, plus filter resolution
    pub mod scope;
    pub use scope::{ScopeId, ScopeKind, ScopeNode, ScopeTable};

    /// Exact-match search with line/column/scope annotation
    pub mod occurrence;
    pub use occurrence::{Occurrence, OccurrenceFinder};

    /// Edit contexts, validation reports and safety checks
    pub mod validate;
    pub use validate::{EditContext, EditValidation, EditValidator, SyntaxChecker};

    /// Ranked unique-replacement suggestions for ambiguous edits
    pub mod disambiguate;
    pub use disambiguate::{DisambiguationSuggestion, Disambiguator, Strategy};

    /// Unified diff rendering and changed-line counting
    pub mod diff;

    /// Snapshot/rollback bookkeeping for batches
    pub mod transaction;
    pub use transaction::Transaction;

    /// The edit engine: preview, single edits and transactional batches
    pub mod edit;
    pub use edit::{EditEngine, EditOperation, EditResult, EditState, MultiEditResult};
}

/// Language grammars - per-language scope classification over tree-sitter
pub mod parsers {
    /// Rust scopes (functions, impl/trait methods, impls, traits, modules)
    pub mod rust_parser;
    pub use rust_parser::RustGrammar;

    /// Python scopes (functions, methods, classes)
    pub mod python_parser;
    pub use python_parser::PythonGrammar;

    /// JavaScript/TypeScript/TSX scopes
    pub mod ecmascript_parser;
    pub use ecmascript_parser::EcmaScriptGrammar;

    /// Go scopes (functions, methods, struct and interface types)
    pub mod go_parser;
    pub use go_parser::GoGrammar;

    /// C++ scopes (functions, methods, classes, namespaces)
    pub mod cpp_parser;
    pub use cpp_parser::CppGrammar;

    /// Parser-backed snippet checker
    #[cfg(feature = "syntax-check")]
    pub mod checker;
    #[cfg(feature = "syntax-check")]
    pub use checker::TreeSitterChecker;

    // Re-export common grammar interface
    pub use crate::core::syntax::{ScopeGrammar, get_grammar};
}

/// Infrastructure - Configuration, I/O, and utilities
pub mod infra {
    /// Configuration management with TOML support and env overrides
    pub mod config;
    pub use config::{Config, EngineConfig, PreviewConfig, init as config_init, load_config};

    /// Memory-mapped reads and atomic writes
    pub mod io;
    pub use io::{read_file_smart, write_atomic};

    /// CRLF/LF-robust line indexing for O(1) line→byte mapping
    pub mod line_index;
    pub use line_index::NewlineIndex;

    /// Tree-sitter node helpers shared by the grammars
    pub mod utils;
}

/// Command handlers
pub mod cli_ext {
    /// edit / preview / validate / batch / scopes
    pub mod edit_cmd;
}

// Strategic re-exports for clean CLI interface
pub use crate::cli::{AppContext, Cli, Commands};
pub use crate::infra::{Config, load_config};

// Core types for external consumers
pub use crate::core::{
    DisambiguationSuggestion, EditContext, EditEngine, EditError, EditOperation, EditResult, EditValidation, Language,
    MultiEditResult, Occurrence, ScopeKind, ScopeNode,
};
