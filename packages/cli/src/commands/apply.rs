use super::{load_config, read_document};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};
use weft_editor::Mutation;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document to edit
    pub input: PathBuf,

    /// JSON array of mutations; ids come from `weft parse` on the same file
    #[arg(short, long)]
    pub mutations: PathBuf,

    /// Write the result back to the document instead of stdout
    #[arg(short, long)]
    pub write: bool,
}

pub fn apply(args: ApplyArgs, cwd: &Path) -> Result<()> {
    let batch = read_document(&args.mutations)?;
    let mutations: Vec<Mutation> = serde_json::from_str(&batch)
        .with_context(|| format!("Invalid mutation batch in {}", args.mutations.display()))?;

    let output = apply_file(&args.input, &mutations, cwd)?;

    if args.write {
        std::fs::write(&args.input, &output)
            .with_context(|| format!("Failed to write {}", args.input.display()))?;
        println!(
            "{} Applied {} mutations to {}",
            "✓".green(),
            mutations.len(),
            args.input.display()
        );
    } else {
        print!("{}", output);
    }
    Ok(())
}

pub(crate) fn apply_file(input: &Path, mutations: &[Mutation], cwd: &Path) -> Result<String> {
    let source = read_document(input)?;
    let config = load_config(cwd, input)?;

    let snapshot = config.parser().parse(&source);
    if snapshot.is_fatal() {
        return Err(anyhow!("{} could not be parsed", input.display()));
    }

    tracing::debug!("[Apply] {} mutations against {}", mutations.len(), input.display());
    let output = config.applicator().apply(&source, &snapshot, mutations)?;
    Ok(output)
}
