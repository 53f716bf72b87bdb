//! Script execution
//!
//! A script is a plain list of command lines. Every non-blank line is split on
//! whitespace into a program and its arguments (no quoting, no comments, no
//! shell) and run inside the job workspace. Lines run strictly in file order
//! and every line produces exactly one outcome, whatever happened before it.

use runhook_core::domain::outcome::CommandOutcome;
use std::ffi::OsString;
use std::io::{self, PipeReader, Read};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::deadline::Deadline;

/// Errors loading a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Reads the command lines of a script, skipping blank lines
///
/// Lines are raw bytes; a script does not have to be valid UTF-8.
pub async fn read_commands(path: &Path) -> Result<Vec<Vec<u8>>, ScriptError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(parse_commands(&content))
}

fn parse_commands(content: &[u8]) -> Vec<Vec<u8>> {
    content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.iter().all(u8::is_ascii_whitespace))
        .map(<[u8]>::to_vec)
        .collect()
}

/// Splits a command line into program and arguments on ASCII whitespace
fn split_words(line: &[u8]) -> Vec<OsString> {
    line.split(u8::is_ascii_whitespace)
        .filter(|word| !word.is_empty())
        .map(os_word)
        .collect()
}

#[cfg(unix)]
fn os_word(word: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    std::ffi::OsStr::from_bytes(word).to_os_string()
}

#[cfg(not(unix))]
fn os_word(word: &[u8]) -> OsString {
    String::from_utf8_lossy(word).into_owned().into()
}

/// Runs script lines inside a workspace
#[derive(Debug, Clone, Default)]
pub struct ScriptExecutor {}

impl ScriptExecutor {
    pub fn new() -> Self {
        Self {}
    }

    /// Reads `script` and runs every command in `workspace`
    pub async fn run_script(
        &self,
        script: &Path,
        workspace: &Path,
        deadline: &Deadline,
    ) -> Result<Vec<CommandOutcome>, ScriptError> {
        let commands = read_commands(script).await?;
        info!(
            "Running {} command(s) from {}",
            commands.len(),
            script.display()
        );

        Ok(self.run_commands(&commands, workspace, deadline).await)
    }

    /// Runs each command in order, one outcome per command
    pub async fn run_commands<C: AsRef<[u8]>>(
        &self,
        commands: &[C],
        workspace: &Path,
        deadline: &Deadline,
    ) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());

        for (ordinal, command) in commands.iter().enumerate() {
            let outcome = self
                .run_command(ordinal, command.as_ref(), workspace, deadline)
                .await;
            debug!(
                "Command {}/{} finished with {}",
                ordinal + 1,
                commands.len(),
                outcome.severity
            );
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn run_command(
        &self,
        ordinal: usize,
        raw: &[u8],
        workspace: &Path,
        deadline: &Deadline,
    ) -> CommandOutcome {
        let line = String::from_utf8_lossy(raw);
        let mut words = split_words(raw).into_iter();
        let Some(program) = words.next() else {
            return CommandOutcome::launch_failed(ordinal, "empty command");
        };

        if deadline.is_expired() {
            warn!("Skipping command '{}': job deadline passed", line);
            return CommandOutcome::timed_out(ordinal, &line);
        }

        debug!("Executing command: {}", line);

        let (child, reader) = match spawn_with_combined_output(program, words, workspace) {
            Ok(spawned) => spawned,
            Err(e) => {
                warn!("Error executing command '{}': {}", line, e);
                return CommandOutcome::launch_failed(ordinal, e);
            }
        };

        match deadline.run(wait_with_combined_output(child, reader)).await {
            Ok(captured) => captured.into_outcome(ordinal, &line),
            Err(_) => {
                warn!("Command '{}' killed: job deadline passed", line);
                CommandOutcome::timed_out(ordinal, &line)
            }
        }
    }
}

/// Starts `program` with stdout and stderr sharing one pipe, so the output
/// keeps the order the process wrote it in
fn spawn_with_combined_output(
    program: OsString,
    args: impl Iterator<Item = OsString>,
    workspace: &Path,
) -> io::Result<(Child, PipeReader)> {
    let (reader, writer) = io::pipe()?;
    let writer_for_stderr = writer.try_clone()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(workspace)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(writer_for_stderr)
        .kill_on_drop(true);

    let child = command.spawn();
    // our copies of the write end must be closed or the reader never sees EOF
    drop(command);

    Ok((child?, reader))
}

/// Output of a process that was started
#[derive(Debug)]
struct Captured {
    output: Vec<u8>,
    result: io::Result<ExitStatus>,
}

impl Captured {
    fn into_outcome(self, ordinal: usize, line: &str) -> CommandOutcome {
        let output = String::from_utf8_lossy(&self.output).into_owned();

        match self.result {
            Ok(status) => {
                if !status.success() {
                    debug!("Command '{}' exited with {}", line, status);
                }
                CommandOutcome::completed(ordinal, line, status.code(), output)
            }
            Err(e) => {
                warn!("Lost output of command '{}': {}", line, e);
                CommandOutcome::output_failed(ordinal, line, e, output)
            }
        }
    }
}

/// Reads the shared pipe to EOF, then waits for `child`
async fn wait_with_combined_output(mut child: Child, reader: PipeReader) -> Captured {
    let (output, read_error) = match tokio::task::spawn_blocking(move || read_all(reader)).await
    {
        Ok(read) => read,
        Err(e) => (Vec::new(), Some(io::Error::other(e))),
    };

    if let Some(e) = read_error {
        // nobody drains the pipe any more
        if let Err(kill_error) = child.start_kill() {
            debug!("Failed to kill command after read error: {}", kill_error);
        }
        let _ = child.wait().await;
        return Captured {
            output,
            result: Err(e),
        };
    }

    Captured {
        output,
        result: child.wait().await,
    }
}

fn read_all(mut reader: PipeReader) -> (Vec<u8>, Option<io::Error>) {
    let mut output = Vec::new();
    match reader.read_to_end(&mut output) {
        Ok(_) => (output, None),
        Err(e) => (output, Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runhook_core::domain::outcome::Severity;
    use std::time::Duration;

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    fn commands(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_parse_commands_skips_blank_lines() {
        let parsed = parse_commands(b"echo one\n\n   \r\n# not a comment\r\necho two");
        assert_eq!(
            parsed,
            vec![
                b"echo one".to_vec(),
                b"# not a comment".to_vec(),
                b"echo two".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn test_read_commands_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_commands(&dir.path().join("missing.sh")).await.unwrap_err();
        assert!(matches!(err, ScriptError::Read { .. }));
    }

    #[tokio::test]
    async fn test_successful_command() {
        let workspace = tempfile::tempdir().unwrap();
        let outcomes = ScriptExecutor::new()
            .run_commands(&commands(&["echo hello"]), workspace.path(), &deadline())
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, "COMMAND-0");
        assert_eq!(outcomes[0].description, "Command: echo hello");
        assert_eq!(outcomes[0].severity, Severity::Info);
        assert_eq!(outcomes[0].body.as_deref(), Some("hello\n"));
    }

    #[tokio::test]
    async fn test_runs_in_workspace() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::write(workspace.path().join("marker.txt"), "inside\n").unwrap();

        let outcomes = ScriptExecutor::new()
            .run_commands(&commands(&["cat marker.txt"]), workspace.path(), &deadline())
            .await;

        assert_eq!(outcomes[0].body.as_deref(), Some("inside\n"));
    }

    #[tokio::test]
    async fn test_no_shell_quoting() {
        let workspace = tempfile::tempdir().unwrap();
        let outcomes = ScriptExecutor::new()
            .run_commands(&commands(&["echo 'a   b'"]), workspace.path(), &deadline())
            .await;

        assert_eq!(outcomes[0].body.as_deref(), Some("'a b'\n"));
    }

    #[tokio::test]
    async fn test_captures_stderr_with_stdout() {
        let workspace = tempfile::tempdir().unwrap();
        let outcomes = ScriptExecutor::new()
            .run_commands(
                &commands(&["ls definitely-missing-file"]),
                workspace.path(),
                &deadline(),
            )
            .await;

        assert_eq!(outcomes[0].severity, Severity::Warning);
        assert!(
            outcomes[0]
                .body
                .as_deref()
                .unwrap()
                .contains("definitely-missing-file")
        );
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_execution() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::write(workspace.path().join("selfkill.sh"), "kill -KILL $$\n").unwrap();

        let outcomes = ScriptExecutor::new()
            .run_commands(
                &commands(&[
                    "false",
                    "runhook-no-such-program --flag",
                    "sh selfkill.sh",
                    "echo done",
                ]),
                workspace.path(),
                &deadline(),
            )
            .await;

        let severities: Vec<Severity> = outcomes.iter().map(|o| o.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Warning,
                Severity::Error,
                Severity::Error,
                Severity::Info
            ]
        );

        let ids: Vec<&str> = outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["COMMAND-0", "COMMAND-1", "COMMAND-2", "COMMAND-3"]);

        assert!(outcomes[1].description.starts_with("Error executing command:"));
        assert!(outcomes[1].body.is_none());
        assert_eq!(outcomes[2].description, "Command: sh selfkill.sh");
        assert_eq!(outcomes[3].body.as_deref(), Some("done\n"));
    }

    #[tokio::test]
    async fn test_deadline_kills_command_and_marks_rest() {
        let workspace = tempfile::tempdir().unwrap();
        let deadline = Deadline::after(Duration::from_millis(200));

        let outcomes = ScriptExecutor::new()
            .run_commands(
                &commands(&["sleep 10", "echo never"]),
                workspace.path(),
                &deadline,
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert!(
            outcomes
                .iter()
                .all(|o| o.severity == Severity::Error && o.description.starts_with("Command timed out"))
        );
    }

    #[tokio::test]
    async fn test_run_script_preserves_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("check.sh");
        std::fs::write(&script, "echo first\n\necho second\necho third\n").unwrap();

        let outcomes = ScriptExecutor::new()
            .run_script(&script, dir.path(), &deadline())
            .await
            .unwrap();

        let bodies: Vec<&str> = outcomes
            .iter()
            .map(|o| o.body.as_deref().unwrap())
            .collect();
        assert_eq!(bodies, vec!["first\n", "second\n", "third\n"]);
    }

    #[tokio::test]
    async fn test_empty_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("empty.sh");
        std::fs::write(&script, "\n\n").unwrap();

        let outcomes = ScriptExecutor::new()
            .run_script(&script, dir.path(), &deadline())
            .await
            .unwrap();

        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_combined_output_keeps_write_order() {
        let workspace = tempfile::tempdir().unwrap();
        std::fs::write(
            workspace.path().join("both.sh"),
            "printf out\nprintf err 1>&2\nprintf more\n",
        )
        .unwrap();

        let lines = vec!["sh both.sh"; 50];
        let outcomes = ScriptExecutor::new()
            .run_commands(&lines, workspace.path(), &deadline())
            .await;

        assert_eq!(outcomes.len(), 50);
        for outcome in outcomes {
            assert_eq!(outcome.body.as_deref(), Some("outerrmore"));
        }
    }

    #[tokio::test]
    async fn test_non_utf8_script_still_runs() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("latin1.sh");
        std::fs::write(&script, b"echo caf\xe9\r\necho ok\n").unwrap();

        let outcomes = ScriptExecutor::new()
            .run_script(&script, dir.path(), &deadline())
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].severity, Severity::Info);
        assert_eq!(outcomes[0].description, "Command: echo caf\u{FFFD}");
        assert_eq!(outcomes[0].body.as_deref(), Some("caf\u{FFFD}\n"));
        assert_eq!(outcomes[1].body.as_deref(), Some("ok\n"));
    }

    #[test]
    fn test_read_failure_after_start_keeps_output() {
        let captured = Captured {
            output: b"partial".to_vec(),
            result: Err(io::Error::other("broken pipe")),
        };

        let outcome = captured.into_outcome(2, "make check");

        assert_eq!(outcome.id, "COMMAND-2");
        assert_eq!(outcome.severity, Severity::Error);
        assert_eq!(
            outcome.description,
            "Error reading output of make check: broken pipe"
        );
        assert_eq!(outcome.body.as_deref(), Some("partial"));
    }
}
