//! `spanr ls` - show what a project contains

use anyhow::Result;
use colored::Colorize;

use crate::Context;
use crate::cli::ListArgs;
use crate::project::Project;
use crate::ui;

pub fn run(_ctx: &Context, args: ListArgs) -> Result<()> {
    let project = Project::open(&args.path, args.config.as_deref())?;
    let catalog = project.load_catalog()?;
    let manifest = project.load_manifest()?;

    ui::header(&format!("Project {}", project.root.display()));

    ui::section(&format!("Gatherers ({})", catalog.gatherers.len()));
    if catalog.gatherers.is_empty() {
        ui::dim("none");
    }
    for gatherer in &catalog.gatherers {
        println!("  {} {}", gatherer.name.bold(), gatherer.description.dimmed());
    }

    ui::section(&format!("Resources ({})", catalog.resources.len()));
    for resource in catalog.resources.iter() {
        println!(
            "  {} {} {}",
            resource.name.bold(),
            resource.version.dimmed(),
            resource.description.dimmed()
        );
        let props: Vec<String> = resource
            .properties
            .iter()
            .map(|(name, &mandatory)| {
                if mandatory {
                    format!("{name}*")
                } else {
                    name.clone()
                }
            })
            .collect();
        if !props.is_empty() {
            ui::dim(&format!("  options: {}", props.join(", ")));
        }
    }

    ui::section(&format!("Config {}", manifest.name));
    if !manifest.version.is_empty() {
        ui::kv("version", &manifest.version);
    }
    if !manifest.author.is_empty() {
        ui::kv("author", &manifest.author);
    }
    if !manifest.condition.is_empty() {
        ui::kv("condition", &manifest.condition);
    }
    for (index, item) in manifest.items.iter().enumerate() {
        let known = catalog.resources.find(&item.resource).is_ok();
        let resource = if known {
            item.resource.normal()
        } else {
            format!("{} (unknown)", item.resource).red()
        };
        println!(
            "  {} {} {} {}",
            ui::step_counter(index + 1, manifest.items.len()),
            item.name.bold(),
            "→".dimmed(),
            resource
        );
        if !item.condition.is_empty() {
            ui::dim(&format!("  when {}", item.condition));
        }
    }

    Ok(())
}
