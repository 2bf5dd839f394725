/**
 * CoSim
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::env;
use std::error::Error;

use getopts::Options;
use tracing::{info, Level};

use cosim::io;
use cosim::stats::DataStatistics;
use cosim::types::Event;
use cosim::Config;

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The input consists of ratings of \
        items by users. The input file must contain a user, item and rating per line, separated \
        by commas. Further columns are ignored.", "PATH");
    opts.optopt("m", "mode", "What to compute: 'rank' for per-user neighbor lists, 'cluster' for \
        co-visitation clusters, 'friends' for the most similar user per user (optional, defaults \
        to 'rank').", "MODE");
    opts.optopt("o", "outputfile", "Output file name for the accuracy record (optional, output \
        will be written to stdout by default).", "PATH");
    opts.optopt("c", "config", "JSON file with tuning constants (optional).", "PATH");
    opts.optopt("k", "top-k", "Number of neighbors per user to evaluate (optional, overrides \
        the configuration).", "NUMBER");
    opts.optopt("s", "seed", "Seed for a reproducible train/test split (optional).", "NUMBER");
    opts.optopt("t", "threads", "Number of worker threads (optional, defaults to the number of \
        CPUs).", "NUMBER");
    opts.optopt("n", "neighbors-file", "Write the top-k neighbors of every user to this file \
        (optional, rank mode only).", "PATH");
    opts.optopt("", "clusters-file", "Write the connected components of the admitted pairs to \
        this file (optional, cluster mode only).", "PATH");
    opts.optopt("l", "log-level", "One of trace, debug, info, warn, error (optional, defaults \
        to info).", "LEVEL");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let interactions_path = match matches.opt_str("i") {
        Some(path) => path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        ),
    };

    let mode = matches.opt_str("m").unwrap_or_else(|| "rank".to_string());
    if mode != "rank" && mode != "cluster" && mode != "friends" {
        let hint = format!("Unknown mode '{}', use rank, cluster or friends.", mode);
        return print_usage_and_exit(&program, opts, Some(&hint));
    }

    let max_level = match matches.opt_str("l") {
        Some(level) => match parse_log_level(&level) {
            Some(max_level) => max_level,
            None => {
                let hint = format!(
                    "Unknown log level '{}', use trace, debug, info, warn or error.", level);
                return print_usage_and_exit(&program, opts, Some(&hint))
            },
        },
        None => Level::INFO,
    };

    init_logging(max_level);

    let mut config = match matches.opt_str("c") {
        Some(path) => match Config::from_json_file(&path) {
            Ok(config) => config,
            Err(failure) => {
                let hint = format!("Problem with configuration file {}: {}", path, failure);
                return print_usage_and_exit(&program, opts, Some(&hint))
            },
        },
        None => Config::default(),
    };

    match matches.opt_get::<usize>("k") {
        Ok(Some(k)) => config.top_k = k,
        Ok(None) => {},
        Err(failure) => {
            let hint = format!("Problem with option 'k': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    }

    match matches.opt_get::<u64>("s") {
        Ok(Some(seed)) => config.seed = Some(seed),
        Ok(None) => {},
        Err(failure) => {
            let hint = format!("Problem with option 's': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    }

    match matches.opt_get::<usize>("t") {
        Ok(Some(num_threads)) => config.num_threads = num_threads,
        Ok(None) => {},
        Err(failure) => {
            let hint = format!("Problem with option 't': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    }

    let outputs = Outputs {
        accuracy_path: matches.opt_str("o"),
        neighbors_path: matches.opt_str("n"),
        clusters_path: matches.opt_str("clusters-file"),
    };

    if let Err(failure) = run(&mode, &interactions_path, &config, &outputs) {
        eprintln!("{}", failure);
        std::process::exit(1);
    }
}

struct Outputs {
    accuracy_path: Option<String>,
    neighbors_path: Option<String>,
    clusters_path: Option<String>,
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn init_logging(max_level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn run(
    mode: &str,
    interactions_path: &str,
    config: &Config,
    outputs: &Outputs,
) -> Result<(), Box<dyn Error>> {

    config.validate()?;

    info!("Reading {} to compute data statistics (pass 1/2)", interactions_path);

    let events = read_events(interactions_path)?;
    let stats = DataStatistics::from(events.iter());

    info!(
        "Found {} ratings by {} users for {} items.",
        stats.num_events(),
        stats.num_users(),
        stats.num_items()
    );

    info!("Computing {} over {} ratings (pass 2/2)", mode, stats.num_events());

    match mode {
        "cluster" => {
            let outcome = cosim::cluster(events, config)?;

            if let Some(path) = outputs.clusters_path.as_ref() {
                info!("Writing clusters to {}", path);
                io::write_clusters(&outcome.admitted.components(), Some(path.as_str()))?;
            }

            io::write_accuracy(&outcome.accuracy, mode, outputs.accuracy_path.as_deref())?;
        },
        "friends" => {
            let most_similar = cosim::most_similar_users(events, config)?;
            io::write_most_similar(&most_similar, outputs.accuracy_path.as_deref())?;
        },
        _ => {
            let outcome = cosim::rank(events, config)?;

            if let Some(path) = outputs.neighbors_path.as_ref() {
                info!("Writing top-{} neighbors to {}", config.top_k, path);
                io::write_neighbors(&outcome.neighbor_lists, config.top_k, Some(path.as_str()))?;
            }

            io::write_accuracy(&outcome.accuracy, mode, outputs.accuracy_path.as_deref())?;
        },
    }

    Ok(())
}

fn read_events(interactions_path: &str) -> Result<Vec<Event>, Box<dyn Error>> {
    let mut reader = io::csv_reader(interactions_path)?;
    Ok(io::events_from_csv(&mut reader).collect())
}
