//! Scripted command runner for exercising steps without touching the host.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

use crate::process::Cmd;
use crate::runner::CommandRunner;

enum Response {
    /// Exit codes handed out in order; the last one repeats.
    Codes(VecDeque<i32>),
    Hook(Box<dyn FnMut(&Cmd) -> i32>),
    SpawnError,
}

struct Rule {
    prefix: String,
    response: Response,
}

/// Records every invocation and answers from a list of prefix rules.
///
/// A rule matches when the command's display form (`KEY=v program args..`
/// with env stripped) starts with its prefix. Unmatched commands exit 0.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    tools: BTreeSet<String>,
    /// Every command seen, as `program arg arg..`.
    pub calls: Vec<String>,
    pub sleeps: Vec<Duration>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer matching commands with `codes` in order, repeating the last.
    pub fn respond<I>(mut self, prefix: &str, codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        let codes: VecDeque<i32> = codes.into_iter().collect();
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            response: Response::Codes(if codes.is_empty() {
                VecDeque::from([0])
            } else {
                codes
            }),
        });
        self
    }

    /// Answer matching commands by calling `hook`.
    pub fn on<F>(mut self, prefix: &str, hook: F) -> Self
    where
        F: FnMut(&Cmd) -> i32 + 'static,
    {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            response: Response::Hook(Box::new(hook)),
        });
        self
    }

    /// Make matching commands fail to spawn.
    pub fn missing(mut self, prefix: &str) -> Self {
        self.rules.push(Rule {
            prefix: prefix.to_string(),
            response: Response::SpawnError,
        });
        self
    }

    /// Report `program` as present on PATH.
    pub fn with_tool(mut self, program: &str) -> Self {
        self.tools.insert(program.to_string());
        self
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Position of the first recorded call starting with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls.iter().position(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn status(&mut self, cmd: &Cmd) -> Result<i32> {
        let line = cmd.argv().join(" ");
        self.calls.push(line.clone());

        let Some(rule) = self.rules.iter_mut().find(|r| line.starts_with(&r.prefix)) else {
            return Ok(0);
        };
        match &mut rule.response {
            Response::Codes(codes) => {
                let code = if codes.len() > 1 {
                    codes.pop_front().unwrap_or(0)
                } else {
                    codes.front().copied().unwrap_or(0)
                };
                Ok(code)
            }
            Response::Hook(hook) => Ok(hook(cmd)),
            Response::SpawnError => bail!("Failed to execute '{}'. Is it installed?", cmd.program()),
        }
    }

    fn sleep(&mut self, delay: Duration) {
        self.sleeps.push(delay);
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.tools
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}
