//! # Convergence
//!
//! Engine for script-backed configuration resources.
//!
//! A resource is a pair of commands: a side-effect-free *test* and a
//! mutating *apply*. A manifest lists config items, each binding a resource
//! to options and an optional condition. The engine drives every item
//! through test → apply → verify until the system matches the declared
//! state, and never trusts apply's own report without re-testing.
//!
//! ## Core Concepts
//!
//! - **Protocol**: scripts report through markers in their output
//!   (`##CONFIGURED##`, `##SPANR[KEY=VALUE]##`, ...), see [`protocol`]
//! - **EnvStore**: the variable bus between gatherers, properties, options
//!   and published variables; materialised as each child's environment
//! - **Invoker**: runs one command with scoped options and parses its output
//! - **converge_item**: the per-item state machine
//! - **execute**: gatherers, then every item in manifest order
//!
//! ## Example
//!
//! ```no_run
//! use convergence::{
//!     Catalog, ConfigItem, ConfigManifest, EnvStore, ResourceDescriptor, RunOptions,
//!     execute_simple,
//! };
//!
//! let catalog = Catalog {
//!     resources: [ResourceDescriptor {
//!         name: "file".into(),
//!         test_command: "./test.sh".into(),
//!         apply_command: "./apply.sh".into(),
//!         install_dir: "/srv/config/resources/file".into(),
//!         ..Default::default()
//!     }]
//!     .into_iter()
//!     .collect(),
//!     gatherers: Vec::new(),
//! };
//!
//! let manifest = ConfigManifest::new("web")
//!     .with_item(ConfigItem::new("motd", "file").with_option("path", "/etc/motd"));
//!
//! let mut env = EnvStore::inherit();
//! let outcome = execute_simple(manifest, &catalog, &mut env, RunOptions::default());
//! println!("Overall state: {}", outcome.status);
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandRunner`]: launches child processes ([`SystemRunner`] for real ones)
//! - [`RunObserver`]: receives progress, messages and diagnostics

pub mod context;
pub mod env;
pub mod error;
pub mod executor;
pub mod gather;
pub mod invoke;
pub mod machine;
pub mod manifest;
pub mod protocol;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{CommandRunner, NoObserver, RunObserver, SystemRunner};
pub use env::{EnvStore, ScopedBindings};
pub use error::{Error, Result};
pub use executor::{RunOutcome, execute, execute_simple};
pub use gather::{run_gatherer, run_gatherers};
pub use invoke::Invoker;
pub use machine::converge_item;
pub use manifest::{Condition, ConfigItem, ConfigManifest};
pub use protocol::ParsedOutput;
pub use resource::{
    Catalog, CommandLine, GathererDescriptor, ResourceDescriptor, ResourceRegistry,
};
pub use types::{CommandOutput, RunOptions, Step, TerminalStatus};
