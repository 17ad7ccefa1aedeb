//! Mutation scripts: a line-oriented text form of tree mutations.
//!
//! ```text
//! root /            # optional, before any mutation
//! add etc /         # add <node> <parent>
//! move passwd etc / # move <node> <from> <to>
//! remove passwd /   # remove <node> <parent>
//! ```

use regex::Regex;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Mutation;

/// One mutation together with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// 1-based source line
    pub line: usize,
    pub mutation: Mutation<String>,
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    /// Root declared by a `root` directive, if any
    pub root: Option<String>,
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Root identity to start from, falling back to `default`.
    pub fn root_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.root.as_deref().unwrap_or(default)
    }

    pub fn mutations(&self) -> impl Iterator<Item = &Mutation<String>> {
        self.steps.iter().map(|step| &step.mutation)
    }
}

/// Directive grammar: the verb set and the argument count of each verb.
const DIRECTIVE_PATTERN: &str = r"(?x)
    ^(?:
        root   \s+ (?P<root>\S+)
      | add    \s+ (?P<add_node>\S+) \s+ (?P<add_parent>\S+)
      | remove \s+ (?P<remove_node>\S+) \s+ (?P<remove_parent>\S+)
      | move   \s+ (?P<move_node>\S+) \s+ (?P<move_from>\S+) \s+ (?P<move_to>\S+)
    )$";

/// Parses script text into a [`Script`].
pub struct ScriptParser {
    directive_regex: Regex,
}

impl Default for ScriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptParser {
    pub fn new() -> Self {
        Self {
            directive_regex: Regex::new(DIRECTIVE_PATTERN)
                .expect("directive pattern must compile"),
        }
    }

    #[instrument(level = "debug", skip_all)]
    pub fn parse(&self, source: &str) -> ApplicationResult<Script> {
        let mut script = Script::default();

        for (offset, raw) in source.lines().enumerate() {
            let line = offset + 1;
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            let caps = self
                .directive_regex
                .captures(text)
                .ok_or_else(|| diagnose(line, text))?;
            let arg = |name: &str| caps[name].to_string();

            let mutation = if caps.name("root").is_some() {
                if script.root.is_some() {
                    return Err(parse_err(line, "root declared twice".into()));
                }
                if !script.steps.is_empty() {
                    return Err(parse_err(line, "root must precede all mutations".into()));
                }
                script.root = Some(arg("root"));
                continue;
            } else if caps.name("add_node").is_some() {
                Mutation::Add {
                    node: arg("add_node"),
                    parent: arg("add_parent"),
                }
            } else if caps.name("remove_node").is_some() {
                Mutation::Remove {
                    node: arg("remove_node"),
                    parent: arg("remove_parent"),
                }
            } else {
                Mutation::Move {
                    node: arg("move_node"),
                    from: arg("move_from"),
                    to: arg("move_to"),
                }
            };
            script.steps.push(ScriptStep { line, mutation });
        }

        debug!(steps = script.steps.len(), root = ?script.root, "parsed script");
        Ok(script)
    }
}

/// Explains why `text` is not a directive.
fn diagnose(line: usize, text: &str) -> ApplicationError {
    let mut tokens = text.split_whitespace();
    let verb = tokens.next().unwrap_or_default();
    let found = tokens.count();
    let expected = match verb {
        "root" => 1,
        "add" | "remove" => 2,
        "move" => 3,
        other => return parse_err(line, format!("unknown directive '{other}'")),
    };
    parse_err(
        line,
        format!("'{verb}' takes {expected} argument(s), found {found}"),
    )
}

fn parse_err(line: usize, message: String) -> ApplicationError {
    ApplicationError::Parse { line, message }
}
