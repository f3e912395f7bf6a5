//! `spanr init` - scaffold an empty configuration project

use anyhow::{Context as AnyhowContext, Result};
use dialoguer::Confirm;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::Context;
use crate::cli::InitArgs;
use crate::project::{
    GATHERS_DIR, MANIFEST_FILE, PROPERTIES_FILE, RESOURCES_DIR, RUNTIMES_DIR, RUNTIMES_FILE,
    expand_path,
};
use crate::ui;

const RUNTIMES_TEMPLATE: &str = "\
# Runtimes put on PATH for every resource and gatherer.
# Add them as a list, e.g.:
#
# - name: python
#   path: ['python/bin', 'python/lib']
# - name: foo
#   path: ['foo']
#
# Paths are relative to the runtimes directory.
";

const MANIFEST_TEMPLATE: &str = r#"# Metadata
name: "Name of config here"
author: "Your name here"
description: "Your config description here"
version: "0.1.0"
# Informational only; item conditions decide what runs
condition: ""

items:
  # Items run in the order listed
  - name: MyConfig            # Unique item name
    resource: MyResource      # Resource this item uses
    condition: "!VarName1"    # Variable that must be set (! in front for unset)
    options:                  # Exported to the resource's scripts
      Op1: "5"                # Options may reference variables as
      Op2: "${MyProperty}"    # $VARNAME or ${VARNAME}
"#;

const PROPERTIES_TEMPLATE: &str = "\
# Key/value pairs passed to a run with --properties.
# They end up as environment variables for every script.
MyProperty: 'MyValue'
MyOtherProperty: 'MyOtherValue'
";

const TEMPLATES: [(&str, &str); 3] = [
    (RUNTIMES_FILE, RUNTIMES_TEMPLATE),
    (MANIFEST_FILE, MANIFEST_TEMPLATE),
    (PROPERTIES_FILE, PROPERTIES_TEMPLATE),
];

pub fn run(ctx: &Context, args: InitArgs) -> Result<()> {
    let root = match args.path {
        Some(path) => expand_path(&path),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };

    let interactive = std::io::stdin().is_terminal();
    let written = scaffold(&root, args.force, |path| {
        if !interactive {
            ui::warn(&format!("{} exists, skipping", path.display()));
            return Ok(false);
        }
        let overwrite = Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        Ok(overwrite)
    })?;

    if !ctx.quiet {
        for path in &written {
            ui::dim(&path.display().to_string());
        }
    }
    ui::success(&format!(
        "Created empty configuration layout in {}",
        root.display()
    ));
    Ok(())
}

/// Create the project directories and template files under `root`
///
/// Existing files are only replaced when `force` is set or `overwrite`
/// agrees. Returns the files written.
pub fn scaffold<F>(root: &Path, force: bool, mut overwrite: F) -> Result<Vec<PathBuf>>
where
    F: FnMut(&Path) -> Result<bool>,
{
    for dir in [RESOURCES_DIR, GATHERS_DIR, RUNTIMES_DIR] {
        let path = root.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Unable to create {}", path.display()))?;
    }

    let mut written = Vec::new();
    for (name, content) in TEMPLATES {
        let path = root.join(name);
        if path.exists() && !force && !overwrite(&path)? {
            log::info!("Keeping existing {}", path.display());
            continue;
        }
        fs::write(&path, content)
            .with_context(|| format!("Unable to write {}", path.display()))?;
        written.push(path);
    }

    Ok(written)
}
