//! Resource invocation
//!
//! Runs one command of a resource: binds the item's options for the
//! duration of the call, runs the command in the resource's install
//! directory, and turns the output into a status. A process that cannot
//! start or exits non-zero is an error regardless of what it printed.

use std::collections::BTreeMap;
use std::path::Path;

use crate::context::{CommandRunner, RunObserver};
use crate::env::EnvStore;
use crate::error::{Error, Result};
use crate::protocol::ParsedOutput;
use crate::resource::{CommandLine, ResourceDescriptor, ResourceRegistry};
use crate::types::{Step, TerminalStatus};

/// Runs resource and gatherer commands, reporting to an observer
pub struct Invoker<'a> {
    runner: &'a dyn CommandRunner,
    observer: &'a mut dyn RunObserver,
}

impl<'a> Invoker<'a> {
    pub fn new(runner: &'a dyn CommandRunner, observer: &'a mut dyn RunObserver) -> Self {
        Self { runner, observer }
    }

    pub fn observer(&mut self) -> &mut dyn RunObserver {
        &mut *self.observer
    }

    /// Resolve `name` in the registry, then [`invoke`](Self::invoke) it
    pub fn invoke_by_name(
        &mut self,
        registry: &ResourceRegistry,
        name: &str,
        step: Step,
        options: &BTreeMap<String, String>,
        env: &mut EnvStore,
    ) -> Result<TerminalStatus> {
        let resource = registry.find(name)?;
        self.invoke(resource, step, options, env)
    }

    /// Run the command for `step` and return the status its output reports
    ///
    /// Options are `$VAR`-expanded, bound while the command runs and unbound
    /// afterwards on every path. Variables the command publishes are applied
    /// after that, so they persist even when they reuse an option's name.
    pub fn invoke(
        &mut self,
        resource: &ResourceDescriptor,
        step: Step,
        options: &BTreeMap<String, String>,
        env: &mut EnvStore,
    ) -> Result<TerminalStatus> {
        let bindings: Vec<(String, String)> = options
            .iter()
            .map(|(key, value)| (key.clone(), env.expand(value)))
            .collect();

        self.observer.on_step_start(&resource.name, step);

        let parsed = {
            let scope = env.scoped(bindings);
            self.capture(resource.command(step), &resource.install_dir, &scope)?
        };

        self.publish(&parsed, env);

        let status = parsed.marker.ok_or_else(|| Error::MarkerAbsent {
            resource: resource.name.clone(),
            step,
        })?;
        log::debug!("{} {step}: {status}", resource.name);
        Ok(status)
    }

    /// Run a command and parse its output, failing on launch errors and
    /// non-zero exits without looking at the output
    pub(crate) fn capture(
        &mut self,
        cmd: CommandLine<'_>,
        dir: &Path,
        env: &EnvStore,
    ) -> Result<ParsedOutput> {
        log::debug!("Running `{}` in {}", cmd.display(), dir.display());

        let output = self
            .runner
            .run(cmd, dir, env)
            .map_err(|source| Error::LaunchFailure {
                program: cmd.program.to_string(),
                dir: dir.to_path_buf(),
                source,
            })?;

        if !output.success {
            log::debug!("Output of failed `{}`:\n{}", cmd.display(), output.text);
            return Err(Error::NonZeroExit {
                program: cmd.program.to_string(),
                code: output.code,
                output: output.text,
            });
        }

        let parsed = ParsedOutput::parse(&output.text);
        for message in &parsed.messages {
            self.observer.on_message(message);
        }
        Ok(parsed)
    }

    pub(crate) fn publish(&mut self, parsed: &ParsedOutput, env: &mut EnvStore) {
        for (key, value) in &parsed.vars {
            self.observer.on_var_published(key, value);
        }
        parsed.publish(env);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::context::NoObserver;
    use crate::types::CommandOutput;
    use std::io;
    use std::path::PathBuf;

    fn options(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_marker_status_returned() {
        let runner = ScriptedRunner::new().reply("file-test", "checking\n##NOTCONFIGURED##\n");
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        let status = invoker
            .invoke(&resource("file"), Step::Test, &BTreeMap::new(), &mut env)
            .unwrap();
        assert_eq!(status, TerminalStatus::NotConfigured);
        assert_eq!(runner.calls.borrow()[0].dir, PathBuf::from("/resources/file"));
    }

    #[test]
    fn test_non_zero_exit_overrides_marker() {
        let runner = ScriptedRunner::new().reply_with(
            "file-test",
            Ok(CommandOutput::exited(2, "##CONFIGURED##\n##SPANR[LEAK=1]##")),
        );
        let mut observer = RecordingObserver::default();
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        let err = invoker
            .invoke(&resource("file"), Step::Test, &BTreeMap::new(), &mut env)
            .unwrap_err();
        assert!(matches!(err, Error::NonZeroExit { code: Some(2), .. }));
        // Output of a failed process is never parsed.
        assert_eq!(env.get("LEAK"), None);
        assert!(observer.vars.is_empty());
    }

    #[test]
    fn test_launch_failure() {
        let runner = ScriptedRunner::new().reply_with(
            "file-test",
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        );
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        let err = invoker
            .invoke(&resource("file"), Step::Test, &BTreeMap::new(), &mut env)
            .unwrap_err();
        assert!(matches!(err, Error::LaunchFailure { .. }));
    }

    #[test]
    fn test_missing_marker_is_error() {
        let runner = ScriptedRunner::new().reply("file-apply", "##SPANR[DONE=yes]##\nok\n");
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        let err = invoker
            .invoke(&resource("file"), Step::Apply, &BTreeMap::new(), &mut env)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MarkerAbsent {
                step: Step::Apply,
                ..
            }
        ));
        // Variables are still published by a zero-exit process.
        assert_eq!(env.get("DONE"), Some("yes"));
    }

    #[test]
    fn test_options_scoped_to_invocation() {
        let runner = ScriptedRunner::new().reply("file-test", "##CONFIGURED##");
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();
        env.set("MODE", "global");

        invoker
            .invoke(
                &resource("file"),
                Step::Test,
                &options(&[("path", "/etc/motd"), ("MODE", "0644")]),
                &mut env,
            )
            .unwrap();

        let seen = &runner.calls.borrow()[0].env;
        assert_eq!(seen.get("path"), Some("/etc/motd"));
        assert_eq!(seen.get("MODE"), Some("0644"));

        assert_eq!(env.get("path"), None);
        assert_eq!(env.get("MODE"), Some("global"));
    }

    #[test]
    fn test_options_unbound_after_failure() {
        let runner = ScriptedRunner::new()
            .reply_with("file-test", Ok(CommandOutput::exited(1, "boom")));
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        let result = invoker.invoke(
            &resource("file"),
            Step::Test,
            &options(&[("path", "/tmp/x")]),
            &mut env,
        );
        assert!(result.is_err());
        assert_eq!(env.get("path"), None);
    }

    #[test]
    fn test_republished_option_survives() {
        let runner =
            ScriptedRunner::new().reply("file-test", "##SPANR[path=/srv/motd]##\n##CONFIGURED##");
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        invoker
            .invoke(
                &resource("file"),
                Step::Test,
                &options(&[("path", "/etc/motd")]),
                &mut env,
            )
            .unwrap();
        assert_eq!(env.get("path"), Some("/srv/motd"));
    }

    #[test]
    fn test_option_values_expanded() {
        let runner = ScriptedRunner::new().reply("file-test", "##CONFIGURED##");
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();
        env.set("ROLE", "web");

        invoker
            .invoke(
                &resource("file"),
                Step::Test,
                &options(&[("target", "/etc/${ROLE}.conf")]),
                &mut env,
            )
            .unwrap();
        assert_eq!(
            runner.calls.borrow()[0].env.get("target"),
            Some("/etc/web.conf")
        );
    }

    #[test]
    fn test_messages_reported() {
        let runner = ScriptedRunner::new()
            .reply("file-test", "##SPANRMSG[motd missing]##\n##NOTCONFIGURED##");
        let mut observer = RecordingObserver::default();
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();

        invoker
            .invoke(&resource("file"), Step::Test, &BTreeMap::new(), &mut env)
            .unwrap();
        assert_eq!(observer.messages, vec!["motd missing"]);
    }

    #[test]
    fn test_invoke_by_name_unknown_resource() {
        let runner = ScriptedRunner::new();
        let mut observer = NoObserver;
        let mut invoker = Invoker::new(&runner, &mut observer);
        let mut env = EnvStore::new();
        let registry = ResourceRegistry::new();

        let err = invoker
            .invoke_by_name(&registry, "nope", Step::Test, &BTreeMap::new(), &mut env)
            .unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
        assert!(runner.calls.borrow().is_empty());
    }
}
