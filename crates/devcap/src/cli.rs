//! Clap derive structures for the `devcap` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs` for man pages, so it depends on clap only.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// devcap -- classify identification strings and resolve device capabilities
#[derive(Debug, Parser)]
#[command(
    name = "devcap",
    version,
    about = "Classify user agents and resolve device capabilities",
    long_about = "Classifies HTTP identification strings against a device repository\n\
        and answers capability questions about the matched device.\n\n\
        The repository is a JSON file of devices linked by fall-back; see\n\
        `devcap config init` for a starting configuration.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "DEVCAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device repository file (overrides repository.path)
    #[arg(long, short = 'r', global = true)]
    pub repository: Option<PathBuf>,

    /// Matching mode (overrides match_mode)
    #[arg(long, short = 'm', global = true)]
    pub mode: Option<ModeArg>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Run the full family chain for every string
    Accuracy,
    /// Short-circuit desktop browsers and smart TVs to generic ids
    Performance,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify an identification string to a device id
    #[command(alias = "c")]
    Classify(ClassifyArgs),

    /// Show a device's capabilities or fall-back path
    #[command(alias = "dev", alias = "d")]
    Device(DeviceArgs),

    /// Resolve virtual capabilities for a request
    #[command(alias = "v")]
    Virtual(VirtualArgs),

    /// Build or inspect the classifier indices
    Index(IndexArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Request Arguments ────────────────────────────────────────────────

/// Identification string plus optional raw headers.
#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Identification string (User-Agent)
    pub user_agent: String,

    /// Extra request header, e.g. -H 'X-Wap-Profile: http://...' (repeatable)
    #[arg(long = "header", short = 'H', value_name = "NAME: VALUE")]
    pub headers: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Device id
    pub id: String,

    /// Only show capabilities of this group
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Show the fall-back path instead of capabilities
    #[arg(long, short = 'f', conflicts_with = "group")]
    pub fallback: bool,
}

#[derive(Debug, Args)]
pub struct VirtualArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Only resolve this virtual capability
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

// ── Index ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Debug, Subcommand)]
pub enum IndexCommand {
    /// Rebuild every family index from the repository and persist it
    Build,

    /// Show per-family index sizes
    Stats,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration
    Show,

    /// Print the configuration file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
