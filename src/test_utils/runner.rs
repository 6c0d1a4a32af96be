use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use crate::process::{ProcessOutput, ProcessRunner};

enum Reply {
    Output(ProcessOutput),
    Missing,
}

/// [`ProcessRunner`] answering from a script keyed by the space-joined command line.
///
/// Unscripted command lines behave like a missing executable
/// (`io::ErrorKind::NotFound`). Every invocation is recorded.
#[derive(Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, Reply>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRunner {
    /// Runner with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command_line` with exit code 0 and `stdout`.
    #[must_use]
    pub fn ok(self, command_line: &str, stdout: &str) -> Self {
        self.reply(command_line, ProcessOutput::ok(stdout))
    }

    /// Answer `command_line` with exit code `code` and `stderr`.
    #[must_use]
    pub fn fail(self, command_line: &str, code: i32, stderr: &str) -> Self {
        self.reply(command_line, ProcessOutput::failed(code, stderr))
    }

    /// Answer `command_line` with an arbitrary output.
    #[must_use]
    pub fn reply(mut self, command_line: &str, output: ProcessOutput) -> Self {
        self.replies.insert(command_line.to_string(), Reply::Output(output));
        self
    }

    /// Make `command_line` fail to spawn.
    #[must_use]
    pub fn missing(mut self, command_line: &str) -> Self {
        self.replies.insert(command_line.to_string(), Reply::Missing);
        self
    }

    /// Command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, argv: &[String]) -> io::Result<ProcessOutput> {
        let line = argv.join(" ");
        self.calls.borrow_mut().push(line.clone());
        match self.replies.get(&line) {
            Some(Reply::Output(output)) => Ok(output.clone()),
            Some(Reply::Missing) | None => {
                Err(io::Error::new(io::ErrorKind::NotFound, format!("{line}: not scripted")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replies() {
        let runner = ScriptedRunner::new().ok("a b", "out").fail("c", 2, "err").missing("d");
        let argv = |s: &str| s.split(' ').map(ToString::to_string).collect::<Vec<_>>();

        assert_eq!(runner.run(&argv("a b")).unwrap().stdout, "out");
        assert_eq!(runner.run(&argv("c")).unwrap().status, Some(2));
        assert_eq!(runner.run(&argv("d")).unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(runner.run(&argv("e")).is_err());
        assert_eq!(runner.calls(), vec!["a b", "c", "d", "e"]);
    }
}
