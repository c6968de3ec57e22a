//! CLI entry point for gridgraph.
//!
//! Usage:
//!   gridgraph route <problem.json> [--min-run N] [--max-run N]
//!   gridgraph longest <maze.json> [--wall C]
//!   gridgraph <command> --stdin ...
//!
//! `route` reads `{"grid": ["2413", ...], "start": [r, c], "goal": [r, c]}`
//! where every character is a digit cost. `start` defaults to the top-left
//! cell and `goal` to the bottom-right one.
//!
//! `longest` reads `{"grid": ["#.###", ...], "start": [r, c], "goal": [r, c]}`.
//! `start` defaults to the first open cell of the top row and `goal` to the
//! first open cell of the bottom row.
//!
//! Both print a JSON result on stdout and exit with 1 when no route exists.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

use gridgraph::{cheapest_route, longest_path, Cell, Grid, RunRules, WeightedGraph};

#[derive(Parser)]
#[command(name = "gridgraph")]
#[command(about = "Shortest and longest paths on grids")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cheapest route through a grid of digit costs under run-length rules
    Route {
        /// Path to problem JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read problem from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Moves required in one heading before turning or stopping
        #[arg(long, default_value = "1")]
        min_run: u32,

        /// Moves allowed in one heading before a turn is forced
        #[arg(long, default_value = "3")]
        max_run: u32,
    },
    /// Longest simple path through a maze, after contracting corridors
    Longest {
        /// Path to maze JSON file (use --stdin to read from stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Read maze from stdin instead of file
        #[arg(long)]
        stdin: bool,

        /// Character marking blocked cells
        #[arg(long, default_value = "#")]
        wall: char,
    },
}

/// Problem description shared by both commands
#[derive(Debug, Deserialize)]
struct ProblemInput {
    grid: Vec<String>,
    #[serde(default)]
    start: Option<(usize, usize)>,
    #[serde(default)]
    goal: Option<(usize, usize)>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteOutput {
    cost: u64,
    steps: usize,
    path: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LongestOutput {
    length: u64,
    nodes_before: usize,
    nodes_after: usize,
    path: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Commands::Route {
            file,
            stdin,
            min_run,
            max_run,
        } => route(file, stdin, RunRules::new(min_run, max_run)),
        Commands::Longest { file, stdin, wall } => longest(file, stdin, wall),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_problem(file: Option<PathBuf>, stdin: bool) -> Result<ProblemInput> {
    let json_content = if stdin {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read from stdin")?;
        buffer
    } else if let Some(path) = file {
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        bail!("must provide either a file path or --stdin");
    };

    serde_json::from_str(&json_content).context("failed to parse problem JSON")
}

fn checked_cell<T>(grid: &Grid<T>, cell: Cell, what: &str) -> Result<Cell> {
    if !grid.contains(cell) {
        bail!("{} {} is outside the {}x{} grid", what, cell, grid.rows(), grid.cols());
    }
    Ok(cell)
}

fn open_cell(grid: &Grid<char>, cell: Cell, wall: char, what: &str) -> Result<Cell> {
    let cell = checked_cell(grid, cell, what)?;
    if grid.get(cell) == Some(&wall) {
        bail!("{} {} is a wall", what, cell);
    }
    Ok(cell)
}

fn route(file: Option<PathBuf>, stdin: bool, rules: RunRules) -> Result<bool> {
    let problem = read_problem(file, stdin)?;
    let grid = Grid::<u32>::parse_digits(&problem.grid.join("\n")).context("invalid grid")?;
    if grid.is_empty() {
        bail!("grid is empty");
    }

    let start = problem.start.map_or(Cell::new(0, 0), Cell::from);
    let goal = problem
        .goal
        .map_or(Cell::new(grid.rows() - 1, grid.cols() - 1), Cell::from);
    let start = checked_cell(&grid, start, "start")?;
    let goal = checked_cell(&grid, goal, "goal")?;
    tracing::info!(%start, %goal, ?rules, rows = grid.rows(), cols = grid.cols(), "route");

    let Some(found) = cheapest_route(&grid, start, goal, &rules)? else {
        tracing::warn!(%goal, "goal unreachable");
        return Ok(false);
    };

    let output = RouteOutput {
        cost: found.cost,
        steps: found.steps(),
        path: found.path.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(true)
}

fn longest(file: Option<PathBuf>, stdin: bool, wall: char) -> Result<bool> {
    let problem = read_problem(file, stdin)?;
    let grid = Grid::<char>::parse_chars(&problem.grid.join("\n")).context("invalid grid")?;
    let open = |_: Cell, v: &char| *v != wall;

    let first_open = |row: usize| {
        (0..grid.cols())
            .map(|col| Cell::new(row, col))
            .find(|&cell| grid.get(cell).is_some_and(|v| *v != wall))
    };
    let start = match problem.start {
        Some(cell) => Cell::from(cell),
        None => first_open(0).context("no open cell in the top row")?,
    };
    let goal = match problem.goal {
        Some(cell) => Cell::from(cell),
        None => first_open(grid.rows().saturating_sub(1))
            .context("no open cell in the bottom row")?,
    };
    let start = open_cell(&grid, start, wall, "start")?;
    let goal = open_cell(&grid, goal, wall, "goal")?;

    let mut graph = WeightedGraph::from_grid(&grid, open);
    let nodes_before = graph.node_count();
    graph.contract_preserving(&[start, goal]);
    let nodes_after = graph.node_count();
    tracing::info!(%start, %goal, nodes_before, nodes_after, "longest");

    let Some((length, path)) = longest_path(&graph, &start, &goal) else {
        tracing::warn!(%goal, "goal unreachable");
        return Ok(false);
    };

    let output = LongestOutput {
        length,
        nodes_before,
        nodes_after,
        path: path.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(true)
}
