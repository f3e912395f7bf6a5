//! Project layout loading
//!
//! ```text
//! <root>/
//!   config.yaml                      manifest
//!   properties.yaml                  optional, passed with --properties
//!   runtimes.yaml                    optional
//!   runtimes/                        runtime binaries
//!   resources/<dir>/resource.yaml    list of resources, run in <dir>
//!   gathers/<dir>/gather.yaml        one gatherer, run in <dir>
//! ```

use anyhow::{Context, Result, bail};
use convergence::manifest::deserialize_scalar_map;
use convergence::{
    Catalog, ConfigManifest, GathererDescriptor, ResourceDescriptor, ResourceRegistry,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "config.yaml";
pub const PROPERTIES_FILE: &str = "properties.yaml";
pub const RUNTIMES_FILE: &str = "runtimes.yaml";
pub const RUNTIMES_DIR: &str = "runtimes";
pub const RESOURCES_DIR: &str = "resources";
pub const RESOURCE_FILE: &str = "resource.yaml";
pub const GATHERS_DIR: &str = "gathers";
pub const GATHER_FILE: &str = "gather.yaml";

/// A runtime whose directories are put on PATH for every script
#[derive(Debug, Clone, Deserialize)]
pub struct Runtime {
    pub name: String,
    #[serde(default)]
    pub path: Vec<String>,
}

impl Runtime {
    /// Absolute directories, relative entries resolved against `runtimes_dir`
    pub fn dirs<'a>(&'a self, runtimes_dir: &'a Path) -> impl Iterator<Item = PathBuf> + 'a {
        self.path.iter().map(move |p| runtimes_dir.join(p))
    }
}

#[derive(Deserialize)]
struct Properties(#[serde(deserialize_with = "deserialize_scalar_map")] BTreeMap<String, String>);

/// A configuration project on disk
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
}

impl Project {
    /// Open the project at `path`, optionally with an alternative manifest
    pub fn open(path: &Path, config: Option<&Path>) -> Result<Self> {
        let root = expand_path(path);
        let root = fs::canonicalize(&root)
            .with_context(|| format!("Project directory not found: {}", root.display()))?;
        if !root.is_dir() {
            bail!("Not a directory: {}", root.display());
        }

        let manifest_path = match config {
            Some(config) => expand_path(config),
            None => root.join(MANIFEST_FILE),
        };

        Ok(Self {
            root,
            manifest_path,
        })
    }

    pub fn runtimes_dir(&self) -> PathBuf {
        self.root.join(RUNTIMES_DIR)
    }

    pub fn load_manifest(&self) -> Result<ConfigManifest> {
        read_yaml(&self.manifest_path)
    }

    /// Load every `resources/<dir>/resource.yaml`, in directory name order
    pub fn load_resources(&self) -> Result<ResourceRegistry> {
        let mut registry = ResourceRegistry::new();
        for dir in subdirs(&self.root.join(RESOURCES_DIR))? {
            let mut resources: Vec<ResourceDescriptor> = read_yaml(&dir.join(RESOURCE_FILE))?;
            for resource in &mut resources {
                resource.install_dir = dir.clone();
            }
            log::debug!("Loaded {} resource(s) from {}", resources.len(), dir.display());
            registry.extend(resources);
        }
        Ok(registry)
    }

    /// Load every `gathers/<dir>/gather.yaml`; no `gathers/` means none
    pub fn load_gatherers(&self) -> Result<Vec<GathererDescriptor>> {
        let gathers = self.root.join(GATHERS_DIR);
        if !gathers.is_dir() {
            log::info!("No gathers directory, skipping gatherers");
            return Ok(Vec::new());
        }

        subdirs(&gathers)?
            .into_iter()
            .map(|dir| {
                let mut gatherer: GathererDescriptor = read_yaml(&dir.join(GATHER_FILE))?;
                gatherer.install_dir = dir;
                Ok(gatherer)
            })
            .collect()
    }

    /// Load `runtimes.yaml`; a missing file means no runtimes
    pub fn load_runtimes(&self) -> Result<Vec<Runtime>> {
        let path = self.root.join(RUNTIMES_FILE);
        if !path.exists() {
            log::info!("No {RUNTIMES_FILE}, skipping runtimes");
            return Ok(Vec::new());
        }
        // The scaffolded file is all comments, which parses as null.
        let runtimes: Option<Vec<Runtime>> = read_yaml(&path)?;
        Ok(runtimes.unwrap_or_default())
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Ok(Catalog {
            resources: self.load_resources()?,
            gatherers: self.load_gatherers()?,
        })
    }
}

/// Load a flat properties map
pub fn load_properties(path: &Path) -> Result<BTreeMap<String, String>> {
    let props: Option<Properties> = read_yaml(path)?;
    Ok(props.map(|p| p.0).unwrap_or_default())
}

/// Expand a leading `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Invalid YAML in {}", path.display()))
}

/// Immediate subdirectories, sorted by name
fn subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Could not open {}", dir.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Could not list {}", dir.display()))?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
