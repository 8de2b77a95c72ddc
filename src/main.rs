use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use linden::{
    codec::{
        KeyPosition, RowOptions, TableOptions, DEFAULT_LEVEL_LABEL, DEFAULT_PRIMKEY_LABEL,
    },
    hierarchy::Hierarchy,
    value::Cell,
};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One row per root-to-leaf path.
    Lists,
    /// One row per node: key, depth, parent.
    Nodes,
    /// A labeled table with level columns.
    Table,
}

#[derive(Parser, Debug)]
#[command(
    name = "linden",
    about = "Flatten a parent/child edge list into one row per root-to-leaf path."
)]
struct Cli {
    /// JSON file holding an array of [parent, child] pairs, or - for stdin.
    edges: PathBuf,
    /// Output encoding.
    #[arg(long, value_enum, default_value_t = Format::Lists)]
    format: Format,
    /// Padding for levels below the end of a path (integers are kept as integers).
    #[arg(long, value_name = "V")]
    empty_value: Option<String>,
    /// Leave out the primary key.
    #[arg(long)]
    no_primkey: bool,
    /// Prefix of the level columns in table output.
    #[arg(long, value_name = "L")]
    level_label: Option<String>,
    /// Name of the primary key column in table output.
    #[arg(long, value_name = "P")]
    primkey_label: Option<String>,
    /// Print the forest as a tree to stderr.
    #[arg(long)]
    draw: bool,
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let input = read_input(&cli.edges)?;
    let records: Vec<Vec<Cell>> = serde_json::from_str(&input)
        .with_context(|| format!("{} is not a JSON array of pairs", cli.edges.display()))?;

    let mut hierarchy = Hierarchy::from_records(&records)
        .with_context(|| format!("invalid edges in {}", cli.edges.display()))?
        .with_labels(
            cli.level_label.as_deref().unwrap_or(DEFAULT_LEVEL_LABEL),
            cli.primkey_label.as_deref().unwrap_or(DEFAULT_PRIMKEY_LABEL),
        );
    let forest = hierarchy
        .create_hierarchy()
        .context("failed to build the hierarchy")?;
    if cli.draw {
        eprint!("{forest}");
    }

    let empty_value = cli.empty_value.map(parse_cell).unwrap_or_default();
    let output = match cli.format {
        Format::Lists | Format::Nodes => {
            let mut options = RowOptions::default().empty_value(empty_value);
            if cli.format == Format::Nodes {
                options = options.nodes();
            }
            if cli.no_primkey {
                options = options.without_primkey();
            }
            serde_json::to_string_pretty(&hierarchy.to_lists(&options)?)?
        }
        Format::Table => {
            let options = TableOptions::default()
                .empty_value(empty_value)
                .primkey((!cli.no_primkey).then_some(KeyPosition::Trailing));
            serde_json::to_string_pretty(&hierarchy.to_table(&options)?)?
        }
    };
    println!("{output}");
    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read stdin")?;
        Ok(input)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}

fn parse_cell(value: String) -> Cell {
    match value.parse::<i64>() {
        Ok(n) => Cell::Int(n),
        Err(_) => Cell::Text(value),
    }
}
