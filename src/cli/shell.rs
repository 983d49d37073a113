//! Line-oriented condition builder
//!
//! Drives an [`EditorSession`] from text commands. Input and output are
//! generic so the shell can run against stdin/stdout or in-memory buffers.

use std::io::{BufRead, Write};

use tracing::{debug, instrument};

use crate::application::session::SyncDirection;
use crate::application::{EditorMode, EditorSession, Notification};
use crate::cli::error::{CliError, CliResult};
use crate::domain::{
    codec, Combinator, DomainError, LeafData, NodeId, NodePath, Scalar, TreeNodeConvert,
};
use crate::infrastructure::InfraError;

const HELP: &str = "\
commands:
  show                                   current tree (visual) or buffer (json)
  json                                   conditions document that would be submitted
  leaf [GROUP]                           append an unset condition to GROUP (default /)
  group AFTER [all|any]                  insert an empty group right after AFTER
  nest [GROUP] [all|any]                 append an empty group to GROUP (default /)
  set LEAF FACT OPERATOR [VALUE...]      fill a condition
  fact LEAF ID | op LEAF OPERATOR | value LEAF [TEXT...]
  combinator GROUP all|any               change how a group combines its children
  rm PATH                                remove a node and everything below it
  mode visual|json                       switch view, synchronizing into it
  edit                                   replace the JSON buffer, end with a line '.'
  reset                                  start over
  facts                                  known fact ids
  done                                   accept the conditions
  quit                                   abandon
paths: '/' is the root group, children are dotted indices such as 0 or 1.0";

/// What the shell does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Done,
    Quit,
}

pub struct BuilderShell<'a, R, W> {
    session: &'a mut EditorSession,
    input: R,
    output: W,
    prompt: bool,
}

impl<'a, R: BufRead, W: Write> BuilderShell<'a, R, W> {
    pub fn new(session: &'a mut EditorSession, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
            prompt: false,
        }
    }

    /// Print a prompt before each command (interactive use).
    pub fn with_prompt(mut self, prompt: bool) -> Self {
        self.prompt = prompt;
        self
    }

    /// Read commands until `done`, `quit` or end of input.
    ///
    /// Returns the accepted conditions document, or `None` when abandoned.
    #[instrument(level = "debug", skip(self))]
    pub fn run(&mut self) -> CliResult<Option<serde_json::Value>> {
        self.write_line("condition builder, 'help' lists commands")?;
        loop {
            if self.prompt {
                write!(self.output, "{}> ", self.session.mode()).map_err(output_err)?;
                self.output.flush().map_err(output_err)?;
            }
            let Some(line) = self.read_line()? else {
                debug!("end of input");
                return Ok(None);
            };
            match self.execute(&line) {
                Ok(Step::Continue) => {}
                Ok(Step::Quit) => return Ok(None),
                Ok(Step::Done) => match self.session.conditions() {
                    Ok(document) => return Ok(Some(document)),
                    Err(e) => self.report(&Notification::error(e.to_string()))?,
                },
                Err(CliError::Infra(InfraError::Io { context, source })) => {
                    return Err(InfraError::Io { context, source }.into())
                }
                Err(e) => self.report(&Notification::error(e.to_string()))?,
            }
        }
    }

    /// Execute a single command line.
    pub fn execute(&mut self, line: &str) -> CliResult<Step> {
        let (command, rest) = split_first_word(line.trim());
        let args: Vec<&str> = rest.split_whitespace().collect();
        debug!("command '{}' args {:?}", command, args);

        match command {
            "" => {}
            "help" | "?" => self.write_line(HELP)?,
            "show" => self.show()?,
            "json" => {
                let document = self.session.conditions()?;
                self.write_line(&codec::to_json_text(&document))?;
            }
            "leaf" => {
                self.require_visual()?;
                let group = self.resolve(args.first().copied())?;
                let id = self.session.tree_mut().add_leaf(group)?;
                self.report_added(id)?;
            }
            "group" => {
                self.require_visual()?;
                let after = self.resolve(Some(required(&args, 0, "path")?))?;
                let combinator = parse_combinator(args.get(1).copied())?;
                let id = self.session.tree_mut().add_nested_group(after, combinator)?;
                self.report_added(id)?;
            }
            "nest" => {
                self.require_visual()?;
                let (path, combinator) = match args.as_slice() {
                    [] => (None, Combinator::All),
                    [one] => match one.parse::<Combinator>() {
                        Ok(c) => (None, c),
                        Err(_) => (Some(*one), Combinator::All),
                    },
                    [path, combinator, ..] => (Some(*path), combinator.parse()?),
                };
                let group = self.resolve(path)?;
                let id = self.session.tree_mut().add_group(group, combinator)?;
                self.report_added(id)?;
            }
            "set" => {
                self.require_visual()?;
                let leaf = self.resolve(Some(required(&args, 0, "path")?))?;
                let fact = required(&args, 1, "fact")?;
                let operator = required(&args, 2, "operator")?;
                let value = rest_after(rest, 3);
                self.warn_unknown_fact(fact)?;
                self.session.tree_mut().set_leaf(
                    leaf,
                    LeafData {
                        fact: fact.to_string(),
                        operator: operator.to_string(),
                        value: Scalar::text(value),
                    },
                )?;
            }
            "fact" => {
                self.require_visual()?;
                let leaf = self.resolve(Some(required(&args, 0, "path")?))?;
                let fact = required(&args, 1, "fact")?;
                self.warn_unknown_fact(fact)?;
                self.session.tree_mut().set_fact(leaf, fact)?;
            }
            "op" | "operator" => {
                self.require_visual()?;
                let leaf = self.resolve(Some(required(&args, 0, "path")?))?;
                let operator = required(&args, 1, "operator")?;
                self.session.tree_mut().set_operator(leaf, operator)?;
            }
            "value" => {
                self.require_visual()?;
                let leaf = self.resolve(Some(required(&args, 0, "path")?))?;
                self.session.tree_mut().set_value(leaf, rest_after(rest, 1))?;
            }
            "combinator" => {
                self.require_visual()?;
                let group = self.resolve(Some(required(&args, 0, "path")?))?;
                let combinator = required(&args, 1, "all|any")?.parse()?;
                self.session.tree_mut().set_combinator(group, combinator)?;
            }
            "rm" => {
                self.require_visual()?;
                let node = self.resolve(Some(required(&args, 0, "path")?))?;
                self.session.tree_mut().remove_node(node)?;
            }
            "mode" => {
                let mode = match required(&args, 0, "visual|json")? {
                    "visual" => EditorMode::Visual,
                    "json" => EditorMode::Json,
                    other => {
                        return Err(CliError::InvalidArgs(format!(
                            "unknown mode '{}' (expected visual or json)",
                            other
                        )))
                    }
                };
                self.session.switch_mode(mode)?;
                self.write_line(&format!("mode: {}", self.session.mode()))?;
            }
            "sync" => {
                let direction = match self.session.mode() {
                    EditorMode::Visual => SyncDirection::VisualToJson,
                    EditorMode::Json => SyncDirection::JsonToVisual,
                };
                self.session.synchronize(direction)?;
            }
            "edit" => {
                if self.session.mode() != EditorMode::Json {
                    return Err(CliError::Usage("'edit' needs json mode ('mode json')".into()));
                }
                let text = self.read_block()?;
                self.session.set_json_buffer(text);
            }
            "reset" => {
                self.session.reset();
                self.write_line("conditions cleared")?;
            }
            "facts" => {
                let options = self.session.fact_options().join(", ");
                if options.is_empty() {
                    self.write_line("no facts known for this engine")?;
                } else {
                    self.write_line(&options)?;
                }
            }
            "done" => return Ok(Step::Done),
            "quit" | "exit" => return Ok(Step::Quit),
            other => {
                return Err(CliError::Usage(format!(
                    "unknown command '{}', try 'help'",
                    other
                )))
            }
        }
        Ok(Step::Continue)
    }

    fn show(&mut self) -> CliResult<()> {
        match self.session.mode() {
            EditorMode::Visual => {
                let rendered = self.session.tree().to_tree_string().to_string();
                self.write_line(rendered.trim_end())
            }
            EditorMode::Json => {
                let buffer = self.session.json_buffer().to_string();
                self.write_line(&buffer)
            }
        }
    }

    fn resolve(&self, path: Option<&str>) -> CliResult<NodeId> {
        let path: NodePath = path.unwrap_or("/").parse()?;
        Ok(self.session.tree().resolve(&path)?)
    }

    fn require_visual(&self) -> CliResult<()> {
        if self.session.mode() == EditorMode::Visual {
            Ok(())
        } else {
            Err(CliError::Usage(
                "tree edits need visual mode ('mode visual')".into(),
            ))
        }
    }

    fn warn_unknown_fact(&mut self, fact: &str) -> CliResult<()> {
        if !self.session.facts().is_empty() && !self.session.is_known_fact(fact) {
            self.report(&Notification::warning(format!(
                "fact '{}' is not registered on this engine",
                fact
            )))?;
        }
        Ok(())
    }

    fn report_added(&mut self, id: NodeId) -> CliResult<()> {
        let path = self.session.tree().path_of(id)?;
        self.write_line(&format!("added [{}]", path))
    }

    fn report(&mut self, note: &Notification) -> CliResult<()> {
        let line = match note.level {
            crate::application::Level::Error => format!("error: {}", note),
            crate::application::Level::Warning => format!("warning: {}", note),
            _ => note.to_string(),
        };
        self.write_line(&line)
    }

    fn read_line(&mut self) -> CliResult<Option<String>> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| InfraError::io("read command", e))?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Lines up to a line holding only `.`.
    fn read_block(&mut self) -> CliResult<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line()? {
            if line.trim() == "." {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    fn write_line(&mut self, text: &str) -> CliResult<()> {
        writeln!(self.output, "{}", text).map_err(output_err)
    }
}

fn output_err(e: std::io::Error) -> CliError {
    InfraError::io("write output", e).into()
}

fn required<'s>(args: &[&'s str], index: usize, what: &str) -> CliResult<&'s str> {
    args.get(index)
        .copied()
        .ok_or_else(|| CliError::InvalidArgs(format!("missing {}", what)))
}

fn parse_combinator(arg: Option<&str>) -> Result<Combinator, DomainError> {
    arg.map_or(Ok(Combinator::All), str::parse)
}

/// Split off the first whitespace-delimited word.
pub fn split_first_word(line: &str) -> (&str, &str) {
    match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], line[i..].trim_start()),
        None => (line, ""),
    }
}

/// Remainder of `text` after skipping `n` words, inner spacing preserved.
fn rest_after(text: &str, n: usize) -> &str {
    let mut rest = text.trim_start();
    for _ in 0..n {
        rest = split_first_word(rest).1;
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn run_script(session: &mut EditorSession, script: &str) -> (Option<serde_json::Value>, String) {
        let mut out = Vec::new();
        let result = BuilderShell::new(session, script.as_bytes(), &mut out)
            .run()
            .unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[rstest]
    #[case("leaf 0", ("leaf", "0"))]
    #[case("value 0   hello  world", ("value", "0   hello  world"))]
    #[case("done", ("done", ""))]
    #[case("", ("", ""))]
    fn test_split_first_word(#[case] line: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_first_word(line), expected);
    }

    #[test]
    fn test_rest_after_keeps_inner_spacing() {
        assert_eq!(rest_after("0 name  New   York", 2), "New   York");
        assert_eq!(rest_after("0 name", 2), "");
    }

    #[test]
    fn test_build_scenario() {
        let mut session = EditorSession::new();
        let (document, _) = run_script(
            &mut session,
            "leaf\nset 0 age greaterThanInclusive 18\ngroup 0 any\nleaf 1\nset 1.0 score lessThan 50\ndone\n",
        );
        assert_eq!(
            document,
            Some(json!({"all": [
                {"fact": "age", "operator": "greaterThanInclusive", "value": 18},
                {"any": [{"fact": "score", "operator": "lessThan", "value": 50}]}
            ]}))
        );
    }

    #[test]
    fn test_errors_are_reported_and_shell_continues() {
        let mut session = EditorSession::new();
        let (document, out) = run_script(&mut session, "rm /\nbogus\nleaf 7\nquit\n");
        assert_eq!(document, None);
        assert_eq!(out.matches("error:").count(), 3);
    }

    #[test]
    fn test_edit_requires_json_mode_and_bad_json_keeps_tree() {
        let mut session = EditorSession::new();
        let (_, out) = run_script(
            &mut session,
            "leaf\nset 0 age equal 1\nedit\nmode json\nedit\n{not json\n.\nmode visual\nquit\n",
        );
        assert!(out.contains("needs json mode"));
        assert_eq!(session.mode(), EditorMode::Json);
        assert_eq!(session.tree().len(), 2);
    }

    #[test]
    fn test_json_mode_edit_is_submitted() {
        let mut session = EditorSession::new();
        let (document, _) = run_script(
            &mut session,
            "mode json\nedit\n{\"any\": [{\"fact\": \"vip\", \"operator\": \"equal\", \"value\": \"true\"}]}\n.\ndone\n",
        );
        assert_eq!(
            document,
            Some(json!({"any": [{"fact": "vip", "operator": "equal", "value": true}]}))
        );
    }

    #[test]
    fn test_end_of_input_abandons() {
        let mut session = EditorSession::new();
        let (document, _) = run_script(&mut session, "leaf\n");
        assert_eq!(document, None);
    }
}
