use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use slrgen::grammar::RuleDef;
use std::{
    fs,
    io::{self, Read as _, Write as _},
    path::{Path, PathBuf},
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Write the result to the specified file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report every overwritten cell of the parse table.
    #[arg(long)]
    report_conflicts: bool,

    /// The path of the JSON rule list, or `-' to read from stdin.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// The states, transitions and tables as JSON.
    Json,
    /// The human-readable dump of every computed set.
    Text,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let source = read_input(&args.input)?;
    let rules: Vec<RuleDef> = serde_json::from_str(&source)
        .with_context(|| format!("failed to parse the rule list in {}", args.input.display()))?;

    let tables = slrgen::compute(&rules).context("invalid grammar")?;

    let unresolved: Vec<_> = tables
        .grammar
        .unresolved_nonterminals()
        .into_iter()
        .map(|n| tables.grammar.nonterminal_name(n))
        .collect();
    if !unresolved.is_empty() {
        eprintln!(
            "[warning] The following nonterminals have no associated production rule: {:?}",
            unresolved
        );
    }

    if args.report_conflicts {
        let conflicts = &tables.table.conflicts;
        if !conflicts.is_empty() {
            let suffix = if conflicts.len() == 1 { "" } else { "s" };
            eprintln!(
                "[warning] The parse table has {} conflict{}:",
                conflicts.len(),
                suffix
            );
            for conflict in conflicts {
                eprintln!("  {}", conflict.display(&tables.grammar));
            }
        }
    }

    let rendered = match args.format {
        Format::Json => serde_json::to_string_pretty(&tables.to_output())
            .context("failed to serialize the tables")?,
        Format::Text => tables.display().to_string(),
    };

    match &args.output {
        Some(path) => fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write the result to {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", rendered).context("failed to write to stdout")?;
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .context("failed to read the rule list from stdin")?;
        return Ok(source);
    }
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
