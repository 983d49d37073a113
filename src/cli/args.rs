//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};

/// Terminal admin client for rules-engine management services
#[derive(Parser, Debug)]
#[command(name = "rulesdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d, -dd, -ddd)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Engine to operate on (overrides configured engine)
    #[arg(short, long, global = true)]
    pub engine: Option<String>,

    /// Management service URL (overrides configured api_url)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Directory holding a local .rulesdesk.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage engines
    Engine {
        #[command(subcommand)]
        command: EngineCommands,
    },

    /// Manage facts of the selected engine
    Fact {
        #[command(subcommand)]
        command: FactCommands,
    },

    /// Manage rules of the selected engine
    Rule {
        #[command(subcommand)]
        command: RuleCommands,
    },

    /// Run the selected engine against runtime facts
    Run(RunArgs),

    /// Check or build condition documents offline
    Conditions {
        #[command(subcommand)]
        command: ConditionCommands,
    },

    /// Show settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum EngineCommands {
    /// List engines
    List,
    /// Create an engine
    Create { name: String },
    /// Delete an engine
    Delete { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FactKindArg {
    Constant,
    Function,
}

#[derive(Subcommand, Debug)]
pub enum FactCommands {
    /// List facts registered on the engine
    List,
    /// Register a fact
    Add {
        /// Fact id
        id: String,
        /// Constant value or function fact
        #[arg(long, value_enum, default_value_t = FactKindArg::Constant)]
        kind: FactKindArg,
        /// Value of a constant fact (true/false and numbers are typed)
        #[arg(long)]
        value: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Disable caching of the fact value
        #[arg(long)]
        no_cache: bool,
    },
    /// Remove a fact
    Delete { id: String },
    /// List facts suggested by the service
    Predefined,
}

#[derive(Subcommand, Debug)]
pub enum RuleCommands {
    /// List rules
    List,
    /// Show a rule
    Show {
        name: String,
        /// Render conditions as a tree
        #[arg(long)]
        tree: bool,
    },
    /// Delete a rule
    Delete { name: String },
    /// Add a rule
    Add(AddRuleArgs),
}

#[derive(Args, Debug)]
pub struct AddRuleArgs {
    /// Rule name
    pub name: String,

    /// Type of the event fired when the rule matches
    #[arg(long)]
    pub event_type: String,

    /// Rule priority
    #[arg(long)]
    pub priority: Option<i64>,

    /// Event params as a JSON object
    #[arg(long)]
    pub params: Option<String>,

    /// Conditions document (JSON file)
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "build", required_unless_present = "build")]
    pub conditions: Option<PathBuf>,

    /// Build conditions interactively
    #[arg(long)]
    pub build: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Runtime facts as a JSON file
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "facts_json")]
    pub facts: Option<PathBuf>,

    /// Runtime facts as inline JSON
    #[arg(long)]
    pub facts_json: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConditionCommands {
    /// Validate a conditions document, render it and print its canonical form
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Build a conditions document in the interactive builder shell
    Build {
        /// Start from an existing document
        #[arg(long, value_hint = ValueHint::FilePath)]
        from: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print effective settings
    Show,
    /// Print config file locations
    Path,
}
