// GridCalc CLI - headless canvas operations

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use gridcalc_engine::formula::eval::Value;
use gridcalc_engine::grid::Grid;
use gridcalc_engine::name::CellName;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;

#[derive(Parser)]
#[command(name = "gcalc")]
#[command(about = "Reactive canvas calculator (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate cell definitions and print the resulting values
    #[command(after_help = "\
Definitions are NAME=CONTENT; formulas carry their own leading '=':
  gcalc eval A1=5 'B1==A1*2'
  echo 'A1=5' | gcalc eval
  gcalc eval --json A1=5 'B1==SQRT(A1)'")]
    Eval {
        /// Definitions NAME=CONTENT (read from stdin, one per line, if omitted)
        defs: Vec<String>,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load a document (.json or legacy .xml canvas) and print every cell
    Run {
        /// Input file
        file: PathBuf,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a cell's dependencies and dependents
    Deps {
        /// Input file
        file: PathBuf,

        /// Cell name
        cell: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval { defs, json } => cmd_eval(defs, json),
        Commands::Run { file, json } => cmd_run(&file, json),
        Commands::Deps { file, cell } => cmd_deps(&file, &cell),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn cmd_eval(defs: Vec<String>, json: bool) -> Result<(), String> {
    let defs = if defs.is_empty() { read_stdin_defs()? } else { defs };

    let mut grid = Grid::new();
    for def in &defs {
        let (name, content) = parse_definition(def)?;
        grid.define(name, &content);
    }

    print_cells(&grid, json)
}

fn cmd_run(file: &Path, json: bool) -> Result<(), String> {
    let doc = gridcalc_io::load_file(file)?;

    let mut grid = Grid::new();
    let report = doc.apply(&mut grid)?;
    if !json {
        eprintln!("{}", report.log_line());
    }

    print_cells(&grid, json)
}

fn cmd_deps(file: &Path, cell: &str) -> Result<(), String> {
    let doc = gridcalc_io::load_file(file)?;

    let mut grid = Grid::new();
    doc.apply(&mut grid)?;

    let name: CellName = cell.parse().map_err(|e| format!("bad cell name {:?}: {}", cell, e))?;
    if !grid.contains(&name) {
        return Err(format!("no cell named {}", name));
    }

    println!("dependencies:");
    for dep in grid.dependencies(&name) {
        println!("  {}", dep);
    }
    println!("dependents:");
    for reader in grid.dependents(&name) {
        println!("  {}", reader);
    }
    Ok(())
}

/// Split `NAME=CONTENT`. A formula keeps its own marker: `B1==A1*2`.
fn parse_definition(def: &str) -> Result<(CellName, String), String> {
    let (name, content) = def
        .split_once('=')
        .ok_or_else(|| format!("bad definition {:?}: expected NAME=CONTENT", def))?;
    let name: CellName = name
        .trim()
        .parse()
        .map_err(|e| format!("bad cell name in {:?}: {}", def, e))?;
    Ok((name, content.trim().to_string()))
}

fn read_stdin_defs() -> Result<Vec<String>, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| e.to_string())?;
    Ok(input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

#[derive(Serialize)]
struct CellRow {
    name: String,
    content: String,
    value: Value,
}

fn cell_rows(grid: &Grid) -> Vec<CellRow> {
    grid.names()
        .into_iter()
        .map(|name| {
            let cell = grid.cell(&name).expect("names() only lists existing cells");
            CellRow {
                name: name.as_str().to_string(),
                content: cell.content.raw_display(),
                value: cell.value,
            }
        })
        .collect()
}

fn print_cells(grid: &Grid, json: bool) -> Result<(), String> {
    let rows = cell_rows(grid);

    if json {
        let out = serde_json::to_string_pretty(&rows).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(4).max(4);
    let content_width = rows
        .iter()
        .map(|r| r.content.len())
        .max()
        .unwrap_or(7)
        .max(7);

    println!(
        "{:<nw$}  {:<cw$}  {}",
        "CELL",
        "CONTENT",
        "VALUE",
        nw = name_width,
        cw = content_width
    );
    for row in rows {
        println!(
            "{:<nw$}  {:<cw$}  {}",
            row.name,
            row.content,
            row.value,
            nw = name_width,
            cw = content_width
        );
    }
    Ok(())
}
