//! Scripted doubles for the `yc` CLI, shared by unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use crate::command::{CommandError, CommandOutput, CommandRunner};

/// Runner answering each call with the next queued output and recording
/// every invocation.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }

    /// Queues a successful `yc compute instance get` answer.
    pub fn push_instance(&self, interfaces: &[(&str, &str)]) {
        self.push_output(Some(0), json_instance(interfaces), "");
    }

    /// Queues a failing call with the given exit code and stderr.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) {
        self.push_output(Some(code), "", stderr);
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Produces a minimal JSON payload matching `yc compute instance get --format json`
/// for an instance with the given `(subnet_id, address)` interfaces.
#[must_use]
pub fn json_instance(interfaces: &[(&str, &str)]) -> String {
    let items = interfaces
        .iter()
        .enumerate()
        .map(|(index, (subnet_id, address))| {
            format!(
                "{{\"index\":\"{index}\",\"subnet_id\":\"{subnet_id}\",\
                 \"primary_v4_address\":{{\"address\":\"{address}\"}}}}"
            )
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("{{\"id\":\"fhm-test\",\"status\":\"RUNNING\",\"network_interfaces\":[{items}]}}")
}
