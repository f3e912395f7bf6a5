//! Resource and gatherer descriptors
//!
//! A resource is a named pair of test/apply commands living in its own
//! install directory. Descriptors are loaded elsewhere and are immutable
//! here; lookup is by exact name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Step;

/// A program and its argument list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub program: &'a str,
    pub args: &'a [String],
}

impl CommandLine<'_> {
    /// `program arg1 arg2`, for logs
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.to_string()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// One idempotent configuration capability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDescriptor {
    /// Unique name items refer to
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    /// Side-effect-free check command
    #[serde(alias = "testcommand")]
    pub test_command: String,
    #[serde(alias = "testarguments")]
    pub test_arguments: Vec<String>,
    /// Mutating command
    #[serde(alias = "applycommand")]
    pub apply_command: String,
    #[serde(alias = "applyarguments")]
    pub apply_arguments: Vec<String>,
    /// Supported option names; `true` marks an option as mandatory
    pub properties: BTreeMap<String, bool>,
    /// Directory the commands run in, set by the loader
    #[serde(skip)]
    pub install_dir: PathBuf,
}

impl ResourceDescriptor {
    /// Command run for a protocol step; verify reuses the test command
    pub fn command(&self, step: Step) -> CommandLine<'_> {
        match step {
            Step::Test | Step::Verify => CommandLine {
                program: &self.test_command,
                args: &self.test_arguments,
            },
            Step::Apply => CommandLine {
                program: &self.apply_command,
                args: &self.apply_arguments,
            },
        }
    }

    /// Mandatory properties absent from `options`
    pub fn missing_properties<'a>(&'a self, options: &BTreeMap<String, String>) -> Vec<&'a str> {
        self.properties
            .iter()
            .filter(|(name, mandatory)| **mandatory && !options.contains_key(*name))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// A script run once per run, before any item, to publish variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GathererDescriptor {
    pub name: String,
    pub description: String,
    pub author: String,
    pub version: String,
    pub command: String,
    pub arguments: Vec<String>,
    /// Directory the command runs in, set by the loader
    #[serde(skip)]
    pub install_dir: PathBuf,
}

impl GathererDescriptor {
    pub fn command_line(&self) -> CommandLine<'_> {
        CommandLine {
            program: &self.command,
            args: &self.arguments,
        }
    }
}

/// Loaded resources, in load order
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: Vec<ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: ResourceDescriptor) {
        self.resources.push(resource);
    }

    /// Find a resource by exact name; the first one loaded wins
    pub fn find(&self, name: &str) -> Result<&ResourceDescriptor> {
        self.resources
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::ResourceNotFound(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<ResourceDescriptor> for ResourceRegistry {
    fn from_iter<I: IntoIterator<Item = ResourceDescriptor>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

impl Extend<ResourceDescriptor> for ResourceRegistry {
    fn extend<I: IntoIterator<Item = ResourceDescriptor>>(&mut self, iter: I) {
        self.resources.extend(iter);
    }
}

/// Descriptors a run draws on besides the manifest
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub resources: ResourceRegistry,
    /// Run once each, in this order, before any item
    pub gatherers: Vec<GathererDescriptor>,
}
