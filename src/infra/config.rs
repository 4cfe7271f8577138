use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};

/// Config file names probed in priority order
const CONFIG_PATHS: [&str; 4] = ["scopedit.toml", "scopedit.yaml", "scopedit.json", ".scopedit.toml"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Edit engine settings
    pub engine: EngineConfig,

    /// Diff preview settings
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig
{
    /// Lines kept on each side of a match (surroundingContext, widening)
    pub context_lines: usize,

    /// Max distance from a match to an anchoring comment
    pub comment_radius: usize,

    /// Consult the parser-backed checker when compiled in
    pub syntax_checker: bool,

    /// Refuse to write when the file changed on disk since it was loaded
    pub detect_external_changes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig
{
    /// Unchanged lines around each hunk
    pub context_lines: usize,
}

impl Default for EngineConfig
{
    fn default() -> Self
    {
        Self {
            context_lines: 3,
            comment_radius: 2,
            syntax_checker: true,
            detect_external_changes: true,
        }
    }
}

impl Default for PreviewConfig
{
    fn default() -> Self
    {
        Self { context_lines: 3 }
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load the first config file found in `dir`, then overlay `SCOPEDIT__*`
/// environment variables (e.g. `SCOPEDIT__ENGINE__CONTEXT_LINES=5`).
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_PATHS
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SCOPEDIT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("scopedit.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
