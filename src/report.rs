//! Terminal reporting for runs

use colored::Colorize;
use convergence::{
    ConfigItem, ConfigManifest, Error, RunObserver, RunOptions, Step, TerminalStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui;

/// Prints item results and script messages, with a spinner for the running step
pub struct TerminalReporter {
    pb: ProgressBar,
    quiet: bool,
    verbose: bool,
    total: usize,
    current: String,
}

impl TerminalReporter {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let pb = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb
        };

        Self {
            pb,
            quiet,
            verbose,
            total: 0,
            current: String::new(),
        }
    }

    fn print(&self, line: String) {
        if !self.quiet {
            self.pb.suspend(|| println!("{line}"));
        }
    }
}

impl RunObserver for TerminalReporter {
    fn on_run_start(&mut self, manifest: &ConfigManifest, opts: RunOptions) {
        self.total = manifest.items.len();
        if self.quiet {
            return;
        }

        let mode = if opts.test_mode { "test" } else { "apply" };
        ui::header(&format!("{} ({mode})", manifest.name));
        if !manifest.description.is_empty() {
            ui::dim(&manifest.description);
        }
        self.pb.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_gatherer_start(&mut self, name: &str) {
        self.pb.set_message(format!("Gathering {name}..."));
    }

    fn on_item_start(&mut self, index: usize, item: &ConfigItem) {
        self.current = format!("{} {}", ui::step_counter(index + 1, self.total), item.name);
    }

    fn on_step_start(&mut self, resource: &str, step: Step) {
        self.pb
            .set_message(format!("{} {}", self.current, format!("{resource} {step}").dimmed()));
    }

    fn on_message(&mut self, message: &str) {
        self.print(format!("    {} {message}", "│".dimmed()));
    }

    fn on_var_published(&mut self, key: &str, value: &str) {
        if self.verbose {
            self.print(format!("    {} {key}={value}", "↳".dimmed()));
        }
    }

    fn on_missing_properties(&mut self, item: &str, missing: &[&str]) {
        self.print(format!(
            "{} {item}: mandatory options not set: {}",
            "⚠".yellow(),
            missing.join(", ")
        ));
    }

    fn on_failure(&mut self, subject: &str, error: &Error) {
        let mut lines = vec![format!("{} {}: {error}", "✗".red(), subject.bold())];
        if let Some(output) = failed_output(error) {
            lines.extend(
                output
                    .lines()
                    .map(|line| format!("    {}", line.dimmed())),
            );
        }
        self.pb.suspend(|| {
            for line in &lines {
                eprintln!("{line}");
            }
        });
    }

    fn on_item_complete(&mut self, item: &ConfigItem) {
        self.print(format!(
            "{} {} {} {}",
            ui::status_glyph(item.state),
            self.current,
            "→".dimmed(),
            ui::status_label(item.state)
        ));
    }

    fn on_run_complete(&mut self, _status: TerminalStatus) {
        self.pb.finish_and_clear();
    }
}

/// Output of the script behind a non-zero exit, if any
fn failed_output(error: &Error) -> Option<&str> {
    match error {
        Error::NonZeroExit { output, .. } if !output.trim().is_empty() => {
            Some(output.as_str())
        }
        Error::GathererFailed { source, .. } => failed_output(source),
        _ => None,
    }
}
