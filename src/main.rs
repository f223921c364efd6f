// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! sqrt-pager - Main Entry Point
//!
//! Sets up the demand-paged table and exercises it. Exits 0 on success
//! and 1 on any failure.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sqrt_pager::config::{parse_u64, TableArgs, DEFAULT_ITERATIONS, DEFAULT_SEED};
use sqrt_pager::debug::{self, LogLevel};
use sqrt_pager::vm::page_size;
use sqrt_pager::{log_info, validate, Result, SqrtTable};

/// Demand-paged square root table backed by one page at a time
#[derive(Debug, Parser)]
#[command(name = "sqrt-pager", version, about)]
struct Cli {
    #[command(flatten)]
    table: TableArgs,

    /// More log output (-v debug, -vv every fault)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a seeded random walk of reads against the reference values
    Validate {
        /// Number of reads
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,

        /// Walk seed (decimal or 0x-prefixed hex)
        #[arg(long, default_value_t = DEFAULT_SEED, value_parser = parse_u64)]
        seed: u64,
    },

    /// Print the entries at the given indices
    Read {
        /// Indices to read
        #[arg(required = true)]
        indices: Vec<usize>,
    },

    /// Touch distinct pages and check only one is ever mapped
    Residency {
        /// Number of distinct pages to touch
        #[arg(long, default_value_t = 64)]
        pages: usize,
    },

    /// Check that backing the whole table eagerly is refused
    ProbeCeiling,
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.table.to_config();
    log_info!("page_size is {}", page_size());

    let table = SqrtTable::open(&config)?;

    match cli.command.unwrap_or(Command::Validate {
        iterations: DEFAULT_ITERATIONS,
        seed: DEFAULT_SEED,
    }) {
        Command::Validate { iterations, seed } => {
            let report = validate::random_walk(&table, iterations, seed)?;
            println!("All tests passed! ({} reads, {} faults)", report.reads, report.faults);
        }
        Command::Read { indices } => {
            for index in indices {
                let value = validate::check(&table, index)?;
                println!("table[{index}] = {value}");
            }
        }
        Command::Residency { pages } => {
            let report = validate::residency_walk(&table, pages)?;
            println!(
                "resident pages: {} ({} pages touched, {} faults)",
                report.max_accessible / table.layout().page_size,
                report.pages,
                report.faults
            );
        }
        Command::ProbeCeiling => {
            let refused = validate::probe_ceiling(&table)?;
            let value = validate::check(&table, table.len() - 1)?;
            println!("ceiling enforced: eager mapping of {refused:#x} bytes refused");
            println!("table[{}] = {value}", table.len() - 1);
        }
    }

    let stats = table.stats();
    log_info!(
        "{} faults, {} evictions, {} failed releases",
        stats.faults,
        stats.evictions,
        stats.failed_releases
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    debug::init(LogLevel::from_verbosity(cli.verbose, cli.quiet));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("sqrt-pager: {err}");
            ExitCode::FAILURE
        }
    }
}
