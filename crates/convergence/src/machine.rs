//! Per-item convergence: test, apply, verify
//!
//! ```text
//! condition? ──no──▶ SkippedOnCondition
//!     │yes
//! test ──Configured/Error/Reboot──▶ done (test mode: always done here)
//!     │NotConfigured
//! apply ──NotConfigured/Error/Reboot──▶ done
//!     │Configured
//! verify ──NotConfigured──▶ Error
//!     └──────other───────▶ done
//! ```

use crate::env::EnvStore;
use crate::error::{Error, Result};
use crate::invoke::Invoker;
use crate::manifest::ConfigItem;
use crate::resource::ResourceRegistry;
use crate::types::{Step, TerminalStatus};

/// Drive one item to a terminal status
///
/// Errors never escape: they are logged, reported to the observer and
/// become [`TerminalStatus::Error`].
pub fn converge_item(
    invoker: &mut Invoker<'_>,
    registry: &ResourceRegistry,
    item: &ConfigItem,
    env: &mut EnvStore,
    test_mode: bool,
) -> TerminalStatus {
    match converge(invoker, registry, item, env, test_mode) {
        Ok(status) => status,
        Err(err) => {
            log::error!("{}: {err}", item.name);
            invoker.observer().on_failure(&item.name, &err);
            TerminalStatus::Error
        }
    }
}

fn converge(
    invoker: &mut Invoker<'_>,
    registry: &ResourceRegistry,
    item: &ConfigItem,
    env: &mut EnvStore,
    test_mode: bool,
) -> Result<TerminalStatus> {
    let resource = registry.find(&item.resource)?;

    // Test mode checks every item, guarded or not.
    if !test_mode && !item.guard().holds(env) {
        log::info!("{}: condition '{}' not met, skipping", item.name, item.condition);
        return Ok(TerminalStatus::SkippedOnCondition);
    }

    let missing = resource.missing_properties(&item.options);
    if !missing.is_empty() {
        log::warn!(
            "{}: mandatory properties of {} not set: {}",
            item.name,
            resource.name,
            missing.join(", ")
        );
        invoker.observer().on_missing_properties(&item.name, &missing);
    }

    let tested = invoker.invoke(resource, Step::Test, &item.options, env)?;
    if test_mode
        || matches!(
            tested,
            TerminalStatus::Configured
                | TerminalStatus::Error
                | TerminalStatus::RebootRequired
                | TerminalStatus::NotRun
        )
    {
        return Ok(tested);
    }

    let applied = invoker.invoke(resource, Step::Apply, &item.options, env)?;
    if matches!(
        applied,
        TerminalStatus::NotRun
            | TerminalStatus::RebootRequired
            | TerminalStatus::Error
            | TerminalStatus::NotConfigured
    ) {
        return Ok(applied);
    }

    let verified = invoker.invoke(resource, Step::Verify, &item.options, env)?;
    if verified == TerminalStatus::NotConfigured {
        return Err(Error::VerificationMismatch {
            resource: resource.name.clone(),
        });
    }
    Ok(verified)
}
