use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runtime settings shared by the session and the recompute worker
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Quiet period before a simulation is recomputed
    pub debounce_ms: u64,
    /// Pause between replayed events; 0 replays as fast as possible
    pub ingest_rate_ms: u64,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            ingest_rate_ms: 0,
            verbose: false,
        }
    }
}

/// Treatment cost simulator for dental clinic billing
#[derive(Parser, Debug)]
#[command(name = "dentalsim", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable detailed event logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debounce delay for recomputation, in milliseconds
    #[arg(long, default_value_t = 300, global = true)]
    pub debounce_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate the cost of a set of treatments
    Simulate {
        /// Catalog JSON with treatments, insurance_plans and financing_options
        #[arg(long)]
        catalog: PathBuf,
        /// Treatment to include, as ID or ID:QUANTITY (repeatable)
        #[arg(short, long = "treatment", required = true)]
        treatments: Vec<String>,
        /// Insurance plan ID
        #[arg(long)]
        plan: Option<String>,
        /// Percentage discount (0-100)
        #[arg(long, default_value = "0")]
        discount: String,
        /// Fixed discount amount
        #[arg(long, default_value = "0")]
        fixed_discount: String,
        /// Financing option ID
        #[arg(long)]
        financing: Option<String>,
        /// Financing term in months
        #[arg(long)]
        term: Option<u32>,
    },
    /// Print totals for an invoice or quote JSON document
    Invoice {
        path: PathBuf,
    },
    /// Replay a JSONL script of form edits through the debounced simulator
    Replay {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        events: PathBuf,
        /// Pause between events, in milliseconds
        #[arg(long, default_value_t = 0)]
        ingest_rate_ms: u64,
    },
    /// Write a fake catalog and event script
    Generate {
        #[arg(long, default_value = "fake_catalog.json")]
        catalog: PathBuf,
        #[arg(long, default_value = "fake_events.jsonl")]
        events: PathBuf,
        /// Number of treatments in the catalog
        #[arg(long, default_value_t = 12)]
        treatments: usize,
        /// Number of events in the script
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
}

impl Cli {
    pub fn config(&self) -> Config {
        let ingest_rate_ms = match &self.command {
            Command::Replay { ingest_rate_ms, .. } => *ingest_rate_ms,
            _ => 0,
        };
        Config {
            debounce_ms: self.debounce_ms,
            ingest_rate_ms,
            verbose: self.verbose,
        }
    }
}

/// Parse `ID` or `ID:QUANTITY`. A missing or malformed quantity counts as 1.
pub fn parse_treatment_arg(arg: &str) -> (String, u32) {
    match arg.split_once(':') {
        Some((id, qty)) => (id.trim().to_string(), qty.trim().parse().unwrap_or(1).max(1)),
        None => (arg.trim().to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_shape() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::parse_from([
            "dentalsim",
            "simulate",
            "--catalog",
            "catalog.json",
            "-t",
            "t1",
            "-t",
            "t2:2",
            "--discount",
            "10",
            "--plan",
            "p1",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config().debounce_ms, 300);
        match cli.command {
            Command::Simulate {
                treatments,
                plan,
                discount,
                term,
                ..
            } => {
                assert_eq!(treatments, vec!["t1", "t2:2"]);
                assert_eq!(plan.as_deref(), Some("p1"));
                assert_eq!(discount, "10");
                assert_eq!(term, None);
            }
            other => panic!("Expected simulate, got {:?}", other),
        }
    }

    #[test]
    fn test_replay_config() {
        let cli = Cli::parse_from([
            "dentalsim",
            "replay",
            "--catalog",
            "c.json",
            "--events",
            "e.jsonl",
            "--ingest-rate-ms",
            "50",
            "--debounce-ms",
            "20",
        ]);
        assert_eq!(
            cli.config(),
            Config {
                debounce_ms: 20,
                ingest_rate_ms: 50,
                verbose: false,
            }
        );
    }

    #[test]
    fn test_parse_treatment_arg() {
        assert_eq!(parse_treatment_arg("t1"), ("t1".to_string(), 1));
        assert_eq!(parse_treatment_arg("t1:3"), ("t1".to_string(), 3));
        assert_eq!(parse_treatment_arg("t1:x"), ("t1".to_string(), 1));
        assert_eq!(parse_treatment_arg("t1:0"), ("t1".to_string(), 1));
    }
}
