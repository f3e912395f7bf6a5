//! Process runner and observer traits
//!
//! These traits keep the engine free of terminal and process details:
//! the CLI plugs in its own reporter, tests plug in scripted runners.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::env::EnvStore;
use crate::error::Error;
use crate::manifest::{ConfigItem, ConfigManifest};
use crate::resource::CommandLine;
use crate::types::{CommandOutput, RunOptions, Step, TerminalStatus};

/// Launches child processes
///
/// Implementations must block until the process has finished.
pub trait CommandRunner {
    /// Run `cmd` in `dir` with exactly the bindings in `env` as its environment
    ///
    /// An `Err` means the process could not be started at all.
    fn run(&self, cmd: CommandLine<'_>, dir: &Path, env: &EnvStore) -> io::Result<CommandOutput>;
}

/// Runs real processes, capturing stdout and stderr through one pipe
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: CommandLine<'_>, dir: &Path, env: &EnvStore) -> io::Result<CommandOutput> {
        let (mut reader, writer) = io::pipe()?;

        let mut command = Command::new(resolve_program(cmd.program, dir));
        command
            .args(cmd.args)
            .current_dir(dir)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let mut child = command.spawn()?;
        // The command still holds our copies of the write end.
        drop(command);

        let mut buf = Vec::new();
        let read = reader.read_to_end(&mut buf);
        let status = child.wait()?;
        read?;

        Ok(CommandOutput {
            text: String::from_utf8_lossy(&buf).into_owned(),
            code: status.code(),
            success: status.success(),
        })
    }
}

/// Relative programs with a directory part are relative to `dir`
fn resolve_program(program: &str, dir: &Path) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        dir.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Receives progress and diagnostics during a run
///
/// Every method defaults to doing nothing.
pub trait RunObserver {
    fn on_run_start(&mut self, _manifest: &ConfigManifest, _opts: RunOptions) {}

    fn on_gatherer_start(&mut self, _name: &str) {}

    fn on_item_start(&mut self, _index: usize, _item: &ConfigItem) {}

    /// Mandatory resource properties the item does not set; the item still runs
    fn on_missing_properties(&mut self, _item: &str, _missing: &[&str]) {}

    fn on_step_start(&mut self, _resource: &str, _step: Step) {}

    /// A `##SPANRMSG[...]##` marker was printed
    fn on_message(&mut self, _message: &str) {}

    /// A `##SPANR[KEY=VALUE]##` marker was applied
    fn on_var_published(&mut self, _key: &str, _value: &str) {}

    /// An error was folded into [`TerminalStatus::Error`]
    fn on_failure(&mut self, _subject: &str, _error: &Error) {}

    /// `item.state` holds the final status
    fn on_item_complete(&mut self, _item: &ConfigItem) {}

    fn on_run_complete(&mut self, _status: TerminalStatus) {}
}

/// No-op observer
pub struct NoObserver;

impl RunObserver for NoObserver {}
