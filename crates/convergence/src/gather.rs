//! Gatherers
//!
//! Run once per run, before any item, purely to publish variables. Status
//! markers in their output are ignored.

use crate::env::EnvStore;
use crate::error::{Error, Result};
use crate::invoke::Invoker;
use crate::resource::GathererDescriptor;

/// Run every gatherer in order, stopping at the first one that fails
pub fn run_gatherers(
    invoker: &mut Invoker<'_>,
    gatherers: &[GathererDescriptor],
    env: &mut EnvStore,
) -> Result<()> {
    for gatherer in gatherers {
        run_gatherer(invoker, gatherer, env)?;
    }
    Ok(())
}

/// Run one gatherer and publish what it reports
pub fn run_gatherer(
    invoker: &mut Invoker<'_>,
    gatherer: &GathererDescriptor,
    env: &mut EnvStore,
) -> Result<()> {
    log::info!("Running gatherer {}", gatherer.name);
    invoker.observer().on_gatherer_start(&gatherer.name);

    let parsed = invoker
        .capture(gatherer.command_line(), &gatherer.install_dir, env)
        .map_err(|source| Error::GathererFailed {
            name: gatherer.name.clone(),
            source: Box::new(source),
        })?;

    for (key, value) in &parsed.vars {
        log::debug!("Gatherer {} found {key} = {value}", gatherer.name);
    }
    invoker.publish(&parsed, env);
    Ok(())
}
