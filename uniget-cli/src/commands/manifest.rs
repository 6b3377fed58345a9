//! `manifest` command.

use std::path::PathBuf;

use clap::Args;
use uniget::package::Project;

use crate::error::CliError;

/// Arguments for `uniget manifest`.
#[derive(Debug, Args)]
pub struct ManifestArgs {
    /// Manifest file (`<id>.unitypackage.json`)
    pub file: PathBuf,
}

/// Resolve a manifest's `#base` chain and print its classification map.
pub fn run(args: ManifestArgs) -> Result<(), CliError> {
    let project = Project::load(&args.file)?;

    println!(
        "{} {}",
        project.id.as_deref().unwrap_or("(no id)"),
        project.version.as_deref().unwrap_or("")
    );
    if !project.dependencies.is_empty() {
        println!("Dependencies:");
        for (name, dependency) in &project.dependencies {
            println!(
                "  {} {}",
                name,
                dependency.version.as_deref().unwrap_or("*")
            );
        }
    }

    let classification = project.classification_map();
    println!("Files ({}):", classification.len());
    for (target, flags) in classification.iter() {
        let mut tags = Vec::new();
        if flags.extra {
            tags.push("extra");
        }
        if flags.merged {
            tags.push("merged");
        }
        if tags.is_empty() {
            println!("  {}", target);
        } else {
            println!("  {} [{}]", target, tags.join(", "));
        }
    }
    Ok(())
}
