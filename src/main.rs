use std::path::PathBuf;
use std::time::Instant;

use anyhow::anyhow;
use clap::Parser as ClapParser;
use clap::Subcommand;
use nb2er::diagram::build_graph;
use nb2er::notebook::Notebook;

#[derive(clap::Parser)]
#[command(name = "nb2er")]
#[command(about = "Notebook join-statement parser and ER diagram generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an ER diagram from the join statements of a notebook.
    Diagram(DiagramCommand),
}

#[derive(clap::Args)]
struct DiagramCommand {
    /// Path to the input notebook.
    #[arg(value_name = "NOTEBOOK")]
    notebook: PathBuf,
    /// Path of the DOT file to write. Defaults to the notebook path with a
    /// `.gv` extension.
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Also render the DOT file to a PNG with Graphviz.
    #[arg(long)]
    render: bool,
    /// Graphviz executable used with --render.
    #[arg(long, default_value = "dot")]
    dot_bin: PathBuf,
    /// Print the accumulated nodes and edges as JSON instead of writing DOT.
    #[arg(long)]
    emit_json: bool,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn run_diagram(command: &DiagramCommand) -> anyhow::Result<()> {
    let notebook = Notebook::from_path(&command.notebook)?;
    let graph = build_graph(&notebook)?;
    log::info!(
        "Accumulated {} nodes and {} edges from {}",
        graph.node_count(),
        graph.edge_count(),
        command.notebook.display()
    );

    if command.emit_json {
        let dump = graph.dump();
        let out_str = if command.pretty {
            serde_json::to_string_pretty(&dump)?
        } else {
            serde_json::to_string(&dump)?
        };
        println!("{}", out_str);
        return Ok(());
    }

    let out_path = command
        .out
        .clone()
        .unwrap_or_else(|| command.notebook.with_extension("gv"));
    graph.write_dot(&out_path)?;
    println!("{}", out_path.display());

    if command.render {
        let status = std::process::Command::new(&command.dot_bin)
            .arg("-Tpng")
            .arg("-O")
            .arg(&out_path)
            .status()
            .map_err(|err| {
                anyhow!(
                    "Failed to run Graphviz executable {}: {}",
                    command.dot_bin.display(),
                    err
                )
            })?;
        if !status.success() {
            return Err(anyhow!(
                "Graphviz exited with status {} while rendering {}",
                status,
                out_path.display()
            ));
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let now = Instant::now();

    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Diagram(command) => run_diagram(command)?,
    }

    let elapsed = now.elapsed();
    log::info!("Elapsed: {:.2?}", elapsed);

    Ok(())
}
