use super::{load_config, read_document};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use weft_parser::{format_errors, NodeKind, NodeRef, ParseResult, Tree};

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Document to parse
    pub input: PathBuf,

    /// Print the full parse result as JSON
    #[arg(long)]
    pub json: bool,

    /// Hide text and expression nodes
    #[arg(long)]
    pub elements_only: bool,
}

pub fn parse(args: ParseArgs, cwd: &Path) -> Result<()> {
    let result = parse_file(&args.input, cwd)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        if let Some(tree) = result.tree() {
            print!("{}", outline(&result, tree, args.elements_only));
        }
        if !result.diagnostics.is_empty() {
            let filename = args.input.to_string_lossy();
            eprint!(
                "{}",
                format_errors(result.source(), &filename, &result.diagnostics)
            );
        }
    }

    if result.is_fatal() {
        return Err(anyhow!("{} could not be parsed", args.input.display()));
    }

    if !args.json {
        println!(
            "{} {} ({} diagnostics)",
            "✓".green(),
            args.input.display(),
            result.diagnostics.len()
        );
    }
    Ok(())
}

pub(crate) fn parse_file(input: &Path, cwd: &Path) -> Result<ParseResult> {
    let source = read_document(input)?;
    let config = load_config(cwd, input)?;
    Ok(config.parser().parse(&source))
}

/// One line per node: `kind <tag> id [start..end]`, indented by depth
fn outline(result: &ParseResult, tree: &Tree, elements_only: bool) -> String {
    let mut out = String::new();
    let mut stack: Vec<(NodeRef, usize)> = vec![(tree.root(), 0)];

    while let Some((node, depth)) = stack.pop() {
        let n = tree.get(node);
        for &child in tree.children(node).iter().rev() {
            stack.push((child, depth + 1));
        }

        let label = match n.kind {
            NodeKind::Fragment => "fragment".to_string(),
            NodeKind::Element => format!("<{}>", n.tag.as_deref().unwrap_or("?"))
                .bright_blue()
                .to_string(),
            NodeKind::Text if elements_only => continue,
            NodeKind::Text => format!("{:?}", preview(result.slice(node).unwrap_or(""))),
            NodeKind::Expression if elements_only => continue,
            NodeKind::Expression => preview(result.slice(node).unwrap_or(""))
                .yellow()
                .to_string(),
        };

        let _ = writeln!(
            out,
            "{}{} {} [{}..{}]",
            "  ".repeat(depth),
            label,
            n.id.dimmed(),
            n.span.start,
            n.span.end
        );
    }
    out
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 32;
    match text.char_indices().nth(LIMIT) {
        Some((at, _)) => format!("{}…", &text[..at]),
        None => text.to_string(),
    }
}
