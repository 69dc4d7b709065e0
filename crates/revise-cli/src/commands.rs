use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use revise_sdk::{
    Decision, DiffInfo, DiffKind, DiffSummary, Document, Engine, EngineConfig, ResolutionReport,
    TracingObserver,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Diff(args) => cmd_diff(config, args, &cli.format),
        Command::Normalize(args) => cmd_normalize(config, args),
        Command::List(args) => cmd_list(config, args, &cli.format),
        Command::Accept(args) => cmd_resolve(config, args, Decision::Accept),
        Command::Reject(args) => cmd_resolve(config, args, Decision::Reject),
        Command::Export(args) => cmd_export(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn engine(config: EngineConfig) -> Engine {
    Engine::with_observer(config, Arc::new(TracingObserver))
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_diff(config: EngineConfig, args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let engine = engine(config);
    let before = read_input(&args.before)?;
    let after = read_input(&args.after)?;
    let output = engine
        .compute_diff_text(&before, &after)
        .context("diff inputs must be plain documents")?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => {
            println!("{}", output.markup);
            if args.summary {
                eprintln!("{}", summary_line(&output.summary));
            }
        }
    }
    Ok(())
}

fn summary_line(summary: &DiffSummary) -> String {
    if summary.is_empty() {
        return format!("{} No changes.", "✓".green());
    }
    format!(
        "{} insertions, {} deletions, {} updates",
        format!("+{}", summary.insertions).green(),
        format!("-{}", summary.deletions).red(),
        format!("~{}", summary.updates).yellow()
    )
}

fn cmd_normalize(config: EngineConfig, args: FileArgs) -> anyhow::Result<()> {
    let text = read_input(&args.file)?;
    println!("{}", engine(config).normalize(&text));
    Ok(())
}

fn cmd_list(config: EngineConfig, args: FileArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let engine = engine(config);
    let doc = engine.import_diff_markup(&read_input(&args.file)?);
    let diffs = engine.diffs(&doc);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diffs)?),
        OutputFormat::Text => {
            if diffs.is_empty() {
                println!("No diffs.");
            }
            for info in &diffs {
                println!("{}", list_line(&doc, info));
            }
        }
    }
    Ok(())
}

fn list_line(doc: &Document, info: &DiffInfo) -> String {
    let kind = match info.kind {
        DiffKind::Insert => "insert".green(),
        DiffKind::Delete => "delete".red(),
        DiffKind::Update => "update".yellow(),
    };
    format!(
        "{:<6} {:<7} {:<7} {}",
        info.id.to_string().bold(),
        kind,
        info.placement.to_string().dimmed(),
        preview(&doc.text_content(info.id))
    )
}

/// First line of a diff's text, shortened for listing.
fn preview(text: &str) -> String {
    const MAX: usize = 48;
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if line.chars().count() > MAX {
        let cut: String = line.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

fn cmd_resolve(config: EngineConfig, args: ResolveArgs, decision: Decision) -> anyhow::Result<()> {
    if !args.all && args.ids.is_empty() {
        bail!("pass --id <ID> or --all");
    }
    let engine = engine(config);
    let mut doc = engine.import_diff_markup(&read_input(&args.file)?);
    tracing::debug!(%decision, all = args.all, ids = args.ids.len(), "resolving diffs");

    if args.all {
        let report = match decision {
            Decision::Accept => engine.accept_all(&mut doc),
            Decision::Reject => engine.reject_all(&mut doc),
        };
        report_bulk(&report, decision);
    } else {
        for id in &args.ids {
            let result = match decision {
                Decision::Accept => engine.accept(&mut doc, *id),
                Decision::Reject => engine.reject(&mut doc, *id),
            };
            result.with_context(|| format!("cannot {decision} {id}"))?;
        }
        eprintln!(
            "{} {} {} diff(s)",
            "✓".green().bold(),
            past_tense(decision),
            args.ids.len()
        );
    }
    println!("{}", engine.export_diff_markup(&doc));
    Ok(())
}

fn report_bulk(report: &ResolutionReport, decision: Decision) {
    eprintln!(
        "{} {} {} diff(s)",
        "✓".green().bold(),
        past_tense(decision),
        report.resolved.len()
    );
    if !report.skipped.is_empty() {
        eprintln!(
            "  {} {} inside discarded content",
            "skipped:".dimmed(),
            report.skipped.len()
        );
    }
    for id in &report.failed {
        eprintln!("  {} {id} is malformed and was left in place", "warning:".yellow());
    }
}

fn past_tense(decision: Decision) -> &'static str {
    match decision {
        Decision::Accept => "Accepted",
        Decision::Reject => "Rejected",
    }
}

fn cmd_export(mut config: EngineConfig, args: ExportArgs) -> anyhow::Result<()> {
    config.export.collapse_spans |= args.collapse;
    let engine = engine(config);
    let doc = engine.import_diff_markup(&read_input(&args.file)?);
    println!("{}", engine.export_diff_markup(&doc));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn preview_takes_the_first_line() {
        assert_eq!(preview("\nfirst\nsecond"), "first");
        let long = "x".repeat(60);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(48)));
    }

    #[test]
    fn config_defaults_without_a_path() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn config_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[import]\nmax_promotion_rounds = 0").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("loading config"));
    }

    #[test]
    fn resolve_requires_a_target() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = ResolveArgs {
            file: file.path().to_path_buf(),
            ids: Vec::new(),
            all: false,
        };
        assert!(cmd_resolve(EngineConfig::default(), args, Decision::Accept).is_err());
    }
}
