//! `spanr run` - converge (or test) a configuration project

use anyhow::{Context as AnyhowContext, Result};
use convergence::{
    Catalog, ConfigManifest, EnvStore, RunOptions, RunOutcome, SystemRunner, TerminalStatus,
    execute,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::RunArgs;
use crate::project::{Project, expand_path, load_properties};
use crate::report::TerminalReporter;
use crate::ui;

/// Exit code for a run that needs a reboot
pub const EXIT_REBOOT: i32 = 3010;
/// Exit code for every other unsuccessful run
pub const EXIT_FAILURE: i32 = 5;

/// Everything a run needs, loaded from disk
struct Prepared {
    catalog: Catalog,
    manifest: ConfigManifest,
    env: EnvStore,
}

/// Run a project and return its overall status
///
/// Load failures are reported and become [`TerminalStatus::Error`] so the
/// caller can map every outcome to an exit code.
pub fn run(ctx: &Context, args: RunArgs) -> Result<TerminalStatus> {
    let opts = RunOptions {
        test_mode: args.test,
    };

    let Prepared {
        catalog,
        manifest,
        mut env,
    } = match prepare(&args) {
        Ok(prepared) => prepared,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            println!("Overall State: {}", TerminalStatus::Error);
            return Ok(TerminalStatus::Error);
        }
    };

    if opts.test_mode && !ctx.quiet {
        ui::info("Test mode: only running tests, nothing will be changed");
    }

    let mut reporter = TerminalReporter::new(ctx.quiet, ctx.verbose > 0);
    let outcome = execute(manifest, &catalog, &mut env, &SystemRunner, &mut reporter, opts);

    if let Some(output) = &args.output {
        let output = expand_path(output);
        match save_outcome(&outcome, &output) {
            Ok(()) => log::info!("Wrote run result to {}", output.display()),
            Err(e) => ui::warn(&format!("Could not save run result: {e:#}")),
        }
    }

    if !ctx.quiet {
        print_summary(&outcome);
    }
    println!("Overall State: {}", ui::status_label(outcome.status));

    Ok(outcome.status)
}

/// Process exit code for an overall status
pub fn exit_code(status: TerminalStatus) -> i32 {
    match status {
        TerminalStatus::Configured => 0,
        TerminalStatus::RebootRequired => EXIT_REBOOT,
        _ => EXIT_FAILURE,
    }
}

fn prepare(args: &RunArgs) -> Result<Prepared> {
    let project = Project::open(&args.path, args.config.as_deref())?;
    let mut env = EnvStore::inherit();

    let runtimes_dir = project.runtimes_dir();
    let runtimes = project.load_runtimes()?;
    let dirs: Vec<PathBuf> = runtimes
        .iter()
        .flat_map(|runtime| runtime.dirs(&runtimes_dir))
        .collect();
    for runtime in &runtimes {
        log::debug!("Adding runtime {} to PATH", runtime.name);
    }
    env.prepend_path(dirs).context("Invalid runtime path")?;

    if let Some(properties) = &args.properties {
        let properties = expand_path(properties);
        let props = load_properties(&properties)?;
        log::info!("Loaded {} properties from {}", props.len(), properties.display());
        env.extend(props);
    }

    let catalog = project.load_catalog()?;
    let manifest = project.load_manifest()?;
    log::info!(
        "Loaded {} resources, {} gatherers, {} items",
        catalog.resources.len(),
        catalog.gatherers.len(),
        manifest.items.len()
    );

    Ok(Prepared {
        catalog,
        manifest,
        env,
    })
}

/// Write the outcome as JSON for `*.json`, YAML otherwise
fn save_outcome(outcome: &RunOutcome, path: &Path) -> Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let content = if is_json {
        serde_json::to_string_pretty(outcome)?
    } else {
        serde_yaml::to_string(outcome)?
    };

    fs::write(path, content).with_context(|| format!("Could not write {}", path.display()))
}

fn print_summary(outcome: &RunOutcome) {
    let count = |status: TerminalStatus| {
        outcome
            .manifest
            .items
            .iter()
            .filter(|item| item.state == status)
            .count()
    };

    ui::section("Summary");
    for status in [
        TerminalStatus::Configured,
        TerminalStatus::NotConfigured,
        TerminalStatus::SkippedOnCondition,
        TerminalStatus::RebootRequired,
        TerminalStatus::Error,
        TerminalStatus::NotRun,
    ] {
        let n = count(status);
        if n > 0 {
            ui::kv(status.label(), &n.to_string());
        }
    }
    let elapsed = outcome.finished_at - outcome.started_at;
    ui::dim(&format!("took {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(TerminalStatus::Configured), 0);
        assert_eq!(exit_code(TerminalStatus::RebootRequired), 3010);
        assert_eq!(exit_code(TerminalStatus::Error), 5);
        assert_eq!(exit_code(TerminalStatus::NotConfigured), 5);
        assert_eq!(exit_code(TerminalStatus::SkippedOnCondition), 5);
        assert_eq!(exit_code(TerminalStatus::NotRun), 5);
    }

    fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    fn args(path: &Path) -> RunArgs {
        RunArgs {
            path: path.to_path_buf(),
            properties: None,
            test: false,
            config: None,
            output: None,
        }
    }

    #[test]
    fn test_missing_project_is_error() {
        let tmp = TempDir::new().unwrap();
        let status = run(&quiet(), args(&tmp.path().join("missing"))).unwrap();
        assert_eq!(status, TerminalStatus::Error);
    }

    #[test]
    fn test_save_outcome_format_by_extension() {
        let now = chrono::Utc::now();
        let outcome = RunOutcome {
            status: TerminalStatus::Configured,
            test_mode: false,
            started_at: now,
            finished_at: now,
            manifest: ConfigManifest::new("m"),
        };
        let tmp = TempDir::new().unwrap();

        let json = tmp.path().join("out.json");
        save_outcome(&outcome, &json).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["status"], "Configured");
        assert_eq!(value["manifest"]["name"], "m");

        let yaml = tmp.path().join("out.yaml");
        save_outcome(&outcome, &yaml).unwrap();
        let back: RunOutcome = serde_yaml::from_str(&fs::read_to_string(&yaml).unwrap()).unwrap();
        assert_eq!(back.status, TerminalStatus::Configured);
    }

    #[cfg(unix)]
    mod unix {
        use super::*;

        fn write(root: &Path, rel: &str, content: &str) {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        /// A `touch` resource, a gatherer publishing the target dir, and a
        /// runtime providing a helper script
        fn project(root: &Path) {
            write(
                root,
                "resources/touch/resource.yaml",
                r"
- name: touch
  test_command: sh
  test_arguments: [test.sh]
  apply_command: sh
  apply_arguments: [apply.sh]
  properties:
    file: true
",
            );
            write(
                root,
                "resources/touch/test.sh",
                concat!(
                    "if [ -f \"$file\" ]; then echo '##CONFIGURED##';\n",
                    "else echo '##NOTCONFIGURED##'; fi\n",
                ),
            );
            write(
                root,
                "resources/touch/apply.sh",
                "mark \"$file\"\necho \"##SPANRMSG[created $file]##\"\necho '##CONFIGURED##'\n",
            );
            write(
                root,
                "gathers/dirs/gather.yaml",
                "name: dirs\ncommand: sh\narguments: [gather.sh]\n",
            );
            write(
                root,
                "gathers/dirs/gather.sh",
                "echo \"##SPANR[TARGET_DIR=$OUT_DIR]##\"\n",
            );
            write(root, "runtimes.yaml", "- name: tools\n  path: [tools/bin]\n");
            write(root, "runtimes/tools/bin/mark", "#!/bin/sh\ntouch \"$1\"\n");

            use std::os::unix::fs::PermissionsExt;
            let mark = root.join("runtimes/tools/bin/mark");
            fs::set_permissions(&mark, fs::Permissions::from_mode(0o755)).unwrap();

            write(
                root,
                "config.yaml",
                r#"
name: demo
items:
  - name: first
    resource: touch
    options:
      file: "${TARGET_DIR}/first"
  - name: skipped
    resource: touch
    condition: "NOT_DEFINED_ANYWHERE_XYZ"
    options:
      file: "${TARGET_DIR}/skipped"
"#,
            );
        }

        #[test]
        fn test_run_project_end_to_end() {
            let tmp = TempDir::new().unwrap();
            let out_dir = tmp.path().join("out");
            fs::create_dir_all(&out_dir).unwrap();
            let root = tmp.path().join("project");
            project(&root);
            write(
                &root,
                "properties.yaml",
                &format!("OUT_DIR: '{}'\n", out_dir.display()),
            );

            let mut run_args = args(&root);
            run_args.properties = Some(root.join("properties.yaml"));
            run_args.output = Some(tmp.path().join("result.json"));

            let status = run(&quiet(), run_args).unwrap();
            assert_eq!(status, TerminalStatus::Configured);
            assert!(out_dir.join("first").exists());
            assert!(!out_dir.join("skipped").exists());

            let saved: RunOutcome =
                serde_json::from_str(&fs::read_to_string(tmp.path().join("result.json")).unwrap())
                    .unwrap();
            let states: Vec<TerminalStatus> =
                saved.manifest.items.iter().map(|i| i.state).collect();
            assert_eq!(
                states,
                vec![TerminalStatus::Configured, TerminalStatus::SkippedOnCondition]
            );
        }

        #[test]
        fn test_test_mode_changes_nothing() {
            let tmp = TempDir::new().unwrap();
            let out_dir = tmp.path().join("out");
            fs::create_dir_all(&out_dir).unwrap();
            let root = tmp.path().join("project");
            project(&root);
            write(
                &root,
                "properties.yaml",
                &format!("OUT_DIR: '{}'\n", out_dir.display()),
            );

            let mut run_args = args(&root);
            run_args.properties = Some(root.join("properties.yaml"));
            run_args.test = true;
            run_args.output = Some(tmp.path().join("result.yaml"));

            let status = run(&quiet(), run_args).unwrap();
            assert_eq!(status, TerminalStatus::Configured);
            assert!(!out_dir.join("first").exists());

            let saved: RunOutcome =
                serde_yaml::from_str(&fs::read_to_string(tmp.path().join("result.yaml")).unwrap())
                    .unwrap();
            assert!(saved.test_mode);
            assert_eq!(saved.manifest.items[0].state, TerminalStatus::NotConfigured);
        }

        #[test]
        fn test_failing_script_stops_run() {
            let tmp = TempDir::new().unwrap();
            let root = tmp.path().join("project");
            project(&root);
            write(&root, "resources/touch/test.sh", "echo broken; exit 1\n");

            let mut run_args = args(&root);
            run_args.output = Some(tmp.path().join("result.yaml"));

            let status = run(&quiet(), run_args).unwrap();
            assert_eq!(status, TerminalStatus::Error);

            let saved: RunOutcome =
                serde_yaml::from_str(&fs::read_to_string(tmp.path().join("result.yaml")).unwrap())
                    .unwrap();
            assert_eq!(saved.manifest.items[0].state, TerminalStatus::Error);
            assert_eq!(saved.manifest.items[1].state, TerminalStatus::NotRun);
        }
    }
}
