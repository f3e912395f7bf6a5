//! Run orchestration - gatherers, then every item in manifest order

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::{CommandRunner, NoObserver, RunObserver, SystemRunner};
use crate::env::EnvStore;
use crate::gather::run_gatherers;
use crate::invoke::Invoker;
use crate::machine::converge_item;
use crate::manifest::ConfigManifest;
use crate::resource::Catalog;
use crate::types::{RunOptions, TerminalStatus};

/// Result of a whole run: the overall status and the annotated manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: TerminalStatus,
    pub test_mode: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Every visited item carries its final state
    pub manifest: ConfigManifest,
}

/// Execute a manifest against a catalog
///
/// # Arguments
/// * `manifest` - Items to converge, in order; returned annotated
/// * `catalog` - Resources to resolve items against, gatherers to run first
/// * `env` - Variable bus every child process sees
/// * `runner` - Launches child processes
/// * `observer` - Progress and diagnostics
/// * `opts` - Test mode or not
///
/// # Returns
/// A non-test run stops at the first item ending in `Error` or
/// `RebootRequired` and reports that status; otherwise it reports
/// `Configured`, including when items ended `NotConfigured` or skipped.
/// A test-mode run visits every item and reports `Configured`.
pub fn execute(
    mut manifest: ConfigManifest,
    catalog: &Catalog,
    env: &mut EnvStore,
    runner: &dyn CommandRunner,
    observer: &mut dyn RunObserver,
    opts: RunOptions,
) -> RunOutcome {
    let started_at = Utc::now();
    observer.on_run_start(&manifest, opts);

    let mut invoker = Invoker::new(runner, observer);
    let status = converge_manifest(&mut manifest, catalog, env, &mut invoker, opts);
    invoker.observer().on_run_complete(status);

    RunOutcome {
        status,
        test_mode: opts.test_mode,
        started_at,
        finished_at: Utc::now(),
        manifest,
    }
}

fn converge_manifest(
    manifest: &mut ConfigManifest,
    catalog: &Catalog,
    env: &mut EnvStore,
    invoker: &mut Invoker<'_>,
    opts: RunOptions,
) -> TerminalStatus {
    if let Err(err) = run_gatherers(invoker, &catalog.gatherers, env) {
        log::error!("{err}");
        invoker.observer().on_failure(&manifest.name, &err);
        return TerminalStatus::Error;
    }

    for (index, item) in manifest.items.iter_mut().enumerate() {
        invoker.observer().on_item_start(index, item);

        let state = converge_item(invoker, &catalog.resources, item, env, opts.test_mode);
        item.state = state;
        invoker.observer().on_item_complete(item);

        if !opts.test_mode && state.halts_run() {
            log::warn!("{} ended {state}, stopping run", item.name);
            return state;
        }
    }

    TerminalStatus::Configured
}

/// Execute with real processes and no progress reporting
pub fn execute_simple(
    manifest: ConfigManifest,
    catalog: &Catalog,
    env: &mut EnvStore,
    opts: RunOptions,
) -> RunOutcome {
    execute(manifest, catalog, env, &SystemRunner, &mut NoObserver, opts)
}
