//! Command dispatch
//!
//! Engine-scoped commands check the engine selection up front; backend calls
//! go through [`report`], which shows a notification for the outcome.

use std::io::{self, IsTerminal};
use std::path::Path;

use clap::{Command, CommandFactory};
use clap_complete::{generate, Generator};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::application::session::parse_params;
use crate::application::{ApplicationError, ApplicationResult, EditorSession, Outcome};
use crate::cli::args::{
    AddRuleArgs, Cli, Commands, ConditionCommands, ConfigCommands, EngineCommands,
    FactCommands, FactKindArg, RuleCommands, RunArgs,
};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::shell::BuilderShell;
use crate::config::{self, Settings};
use crate::domain::{codec, FactKind, NewFact, TreeNodeConvert};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            Ok(())
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            eprintln!("Generating completion file for {shell:?}...");
            print_completions(*shell, &mut cmd);
            Ok(())
        }
        Some(Commands::Conditions { command }) => _conditions(command),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(command) => {
            let settings = load_settings(cli)?;
            let container = ServiceContainer::new(settings)?;
            execute_with(&container, command)
        }
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Settings from config files and environment, with command line overrides on top.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(|e| InfraError::io("current directory", e))?,
    };
    let mut settings = Settings::load(Some(dir.as_path()))?;
    if let Some(url) = &cli.api_url {
        settings.api_url = url.trim_end_matches('/').to_string();
    }
    if let Some(engine) = &cli.engine {
        settings.engine = Some(engine.clone());
    }
    debug!("effective settings: {:?}", settings);
    Ok(settings)
}

/// Run a backend-bound command against an already wired container.
#[instrument(level = "debug", skip(container))]
pub fn execute_with(container: &ServiceContainer, command: &Commands) -> CliResult<()> {
    let mut session = EditorSession::with_engine(container.settings.engine.clone());
    match command {
        Commands::Engine { command } => _engine(container, &mut session, command),
        Commands::Fact { command } => _fact(container, &mut session, command),
        Commands::Rule { command } => _rule(container, &mut session, command),
        Commands::Run(args) => _run(container, &session, args),
        Commands::Conditions { command } => _conditions(command),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not talk to the management service".into(),
        )),
    }
}

/// Show the outcome of a service call and hand back its value.
///
/// Failures keep the exit code their error maps to.
fn report<T>(
    action: &str,
    result: ApplicationResult<T>,
    on_success: impl FnOnce(&T) -> Option<String>,
) -> CliResult<T> {
    let (result, code) = match result {
        Ok(value) => (Ok(value), exitcode::OK),
        Err(e) => {
            let cause = match &e {
                ApplicationError::Backend { source, .. } => source.to_string(),
                other => other.to_string(),
            };
            (Err(cause), CliError::from(e).exit_code())
        }
    };
    let outcome = Outcome::from_result(action, result, on_success);
    if let Some(note) = &outcome.notification {
        output::notify(note);
    }
    match outcome.value {
        Some(value) => Ok(value),
        None => Err(CliError::Reported {
            message: outcome
                .notification
                .map(|n| n.message)
                .unwrap_or_else(|| format!("Error {}", action)),
            code,
        }),
    }
}

fn print_json(settings: &Settings, value: &Value) {
    if settings.pretty {
        output::info(&codec::to_json_text(value));
    } else {
        output::info(value);
    }
}

fn _engine(
    container: &ServiceContainer,
    session: &mut EditorSession,
    command: &EngineCommands,
) -> CliResult<()> {
    match command {
        EngineCommands::List => {
            let engines = report("fetching engines", container.catalog.list_engines(), |_| None)?;
            if engines.is_empty() {
                output::info("no engines");
            }
            for engine in engines {
                let marker = if session.engine() == Some(engine.as_str()) { "*" } else { " " };
                output::info(&format!("{} {}", marker, engine));
            }
        }
        EngineCommands::Create { name } => {
            report("creating engine", container.catalog.create_engine(name), |_| {
                Some(format!("Engine \"{}\" created", name.trim()))
            })?;
        }
        EngineCommands::Delete { name } => {
            report(
                "deleting engine",
                container.catalog.delete_engine(session, name),
                |_| Some(format!("Engine \"{}\" deleted", name)),
            )?;
        }
    }
    Ok(())
}

fn _fact(
    container: &ServiceContainer,
    session: &mut EditorSession,
    command: &FactCommands,
) -> CliResult<()> {
    if let FactCommands::Predefined = command {
        let facts = report(
            "fetching predefined facts",
            container.catalog.predefined_facts(),
            |_| None,
        )?;
        for fact in facts {
            output::info(&format!("{}: {}", fact.id, fact.description));
            if let Some(usage) = fact.usage {
                output::detail(&usage);
            }
        }
        return Ok(());
    }

    session.require_engine()?;
    match command {
        FactCommands::List => {
            let facts = report("fetching facts", container.catalog.refresh_facts(session), |_| None)?;
            if facts.is_empty() {
                output::info("no facts");
            }
            for fact in facts {
                let kind = if fact.is_constant { "constant" } else { "function" };
                let cache = if fact.cache { "cached" } else { "uncached" };
                match fact.description {
                    Some(description) => output::info(&format!(
                        "{} ({}, {}): {}",
                        fact.id, kind, cache, description
                    )),
                    None => output::info(&format!("{} ({}, {})", fact.id, kind, cache)),
                }
            }
        }
        FactCommands::Add {
            id,
            kind,
            value,
            description,
            no_cache,
        } => {
            let kind = match kind {
                FactKindArg::Constant => FactKind::Constant,
                FactKindArg::Function => FactKind::Function,
            };
            if kind == FactKind::Function && value.is_some() {
                output::warning("function facts ignore --value");
            }
            let fact = NewFact::from_input(
                id,
                kind,
                value.as_deref(),
                description.as_deref(),
                !no_cache,
            )?;
            report("adding fact", container.catalog.add_fact(session, &fact), |_| {
                Some(format!("Fact \"{}\" added", fact.id))
            })?;
        }
        FactCommands::Delete { id } => {
            report("deleting fact", container.catalog.delete_fact(session, id), |_| {
                Some(format!("Fact \"{}\" deleted", id))
            })?;
        }
        FactCommands::Predefined => {}
    }
    Ok(())
}

fn _rule(
    container: &ServiceContainer,
    session: &mut EditorSession,
    command: &RuleCommands,
) -> CliResult<()> {
    session.require_engine()?;
    match command {
        RuleCommands::List => {
            let rules = report("fetching rules", container.rules.list(session), |_| None)?;
            if rules.is_empty() {
                output::info("no rules");
            }
            for rule in rules {
                output::info(&format!(
                    "{} (priority {}) -> {}",
                    rule.name, rule.priority, rule.event.event_type
                ));
            }
        }
        RuleCommands::Show { name, tree } => {
            let rule = report("fetching rule", container.rules.get(session, name), |_| None)?;
            if *tree {
                session.load_conditions(&rule.conditions)?;
                output::header(&format!(
                    "{} (priority {}) -> {}",
                    rule.name, rule.priority, rule.event.event_type
                ));
                output::info(&session.tree().to_tree_string());
            } else {
                let value = serde_json::to_value(&rule)
                    .map_err(|e| ApplicationError::invalid_json(&e))?;
                print_json(&container.settings, &value);
            }
        }
        RuleCommands::Delete { name } => {
            report("deleting rule", container.rules.delete(session, name), |_| {
                Some(format!("Rule \"{}\" deleted", name))
            })?;
        }
        RuleCommands::Add(args) => _add_rule(container, session, args)?,
    }
    Ok(())
}

fn _add_rule(
    container: &ServiceContainer,
    session: &mut EditorSession,
    args: &AddRuleArgs,
) -> CliResult<()> {
    let params = parse_params(args.params.as_deref().unwrap_or(""))?;

    match &args.conditions {
        Some(path) => {
            let document = read_json_file(path)?;
            session.load_conditions(&document)?;
        }
        None => {
            // Fact ids only feed warnings in the builder.
            if let Err(e) = container.catalog.refresh_facts(session) {
                output::warning(&format!("fact list unavailable: {}", e));
            }
            if run_builder(session)?.is_none() {
                return Err(CliError::Usage("rule not added, builder abandoned".into()));
            }
        }
    }

    let name = args.name.trim().to_string();
    report(
        "adding rule",
        container
            .rules
            .submit(session, &args.name, args.priority, &args.event_type, params),
        |_| Some(format!("Rule \"{}\" added successfully", name)),
    )?;
    Ok(())
}

fn _run(container: &ServiceContainer, session: &EditorSession, args: &RunArgs) -> CliResult<()> {
    session.require_engine()?;
    let facts = match (&args.facts, &args.facts_json) {
        (Some(path), _) => read_json_file(path)?,
        (None, Some(text)) => {
            codec::parse_json_text(text).map_err(|e| ApplicationError::invalid_json(&e))?
        }
        (None, None) => Value::Object(Map::new()),
    };
    let Value::Object(facts) = facts else {
        return Err(CliError::InvalidArgs("runtime facts must be a JSON object".into()));
    };

    let outcome = report("running engine", container.rules.run(session, &facts), |_| None)?;
    output::header("Rule results");
    for result in &outcome.rule_results {
        if result.success {
            output::success(&result.name);
        } else {
            output::failure(&result.name);
        }
    }
    output::header("Events");
    if outcome.events.is_empty() {
        output::detail("none");
    }
    for event in &outcome.events {
        let params = serde_json::to_string(&event.params)
            .map_err(|e| ApplicationError::invalid_json(&e))?;
        output::detail(&format!("{} {}", event.event_type, params));
    }
    Ok(())
}

fn _conditions(command: &ConditionCommands) -> CliResult<()> {
    match command {
        ConditionCommands::Check { file } => {
            let document = read_json_file(file)?;
            let tree = codec::deserialize(&document)?;
            output::info(&tree.to_tree_string());
            output::info(&codec::to_json_text(&codec::serialize(&tree)));
        }
        ConditionCommands::Build { from } => {
            let mut session = EditorSession::new();
            if let Some(path) = from {
                session.load_conditions(&read_json_file(path)?)?;
            }
            match run_builder(&mut session)? {
                Some(document) => output::info(&codec::to_json_text(&document)),
                None => return Err(CliError::Usage("builder abandoned".into())),
            }
        }
    }
    Ok(())
}

fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match config::global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::info("global: <no home directory>"),
            }
            let dir = match &cli.config_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir()
                    .map_err(|e| InfraError::io("current directory", e))?,
            };
            output::info(&format!("local:  {}", config::local_config_path(&dir).display()));
        }
    }
    Ok(())
}

fn run_builder(session: &mut EditorSession) -> CliResult<Option<Value>> {
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    BuilderShell::new(session, stdin.lock(), io::stdout())
        .with_prompt(interactive)
        .run()
}

fn read_json_file(path: &Path) -> CliResult<Value> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read {}", path.display()), e))?;
    Ok(codec::parse_json_text(&text).map_err(|e| ApplicationError::invalid_json(&e))?)
}
