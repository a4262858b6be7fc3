//! circulation-engine CLI
//!
//! Run cycle flow decomposition from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Decompose transfers from a JSON file
//! circulation-engine report --input transfers.json
//!
//! # Output as JSON, with custom thresholds
//! circulation-engine report --input transfers.json --format json --thresholds 2,3,4,5,6
//!
//! # Show circulating components
//! circulation-engine components --input transfers.json
//!
//! # Generate a random network for testing
//! circulation-engine generate --accounts 10 --transfers 30
//! ```

use circulation_engine::core::account::AccountId;
use circulation_engine::core::transfer::{Transfer, TransferSet};
use circulation_engine::engine::decomposition::CirculationEngine;
use circulation_engine::graph::flow_graph::FlowGraph;
use circulation_engine::graph::scc::{circulating_capacity, find_components};
use circulation_engine::simulation::random_network::{generate_random_network, NetworkConfig};
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"circulation-engine — cycle flow decomposition for community currencies

USAGE:
    circulation-engine <COMMAND> [OPTIONS]

COMMANDS:
    report      Compute the circularity report for a transfer set
    components  Show circulating components of the transfer graph
    generate    Generate a random transfer network (for testing)
    help        Show this message

OPTIONS (report, components):
    --input <FILE>       Path to JSON transfers file
    --format <FORMAT>    Output format: text (default) or json
    --thresholds <LIST>  Comma-separated minimum cycle lengths (default: 2,3,4,5)

OPTIONS (generate):
    --accounts <N>      Number of accounts (default: 10)
    --transfers <N>     Number of transfers (default: 30)
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    circulation-engine report --input transfers.json
    circulation-engine report --input transfers.json --format json
    circulation-engine components --input transfers.json
    circulation-engine generate --accounts 20 --transfers 60 --output test.json"#
    );
}

/// JSON schema for input transfers.
#[derive(serde::Deserialize)]
struct TransferInput {
    from: String,
    to: String,
    amount: String,
    #[serde(default)]
    reference: Option<String>,
}

#[derive(serde::Deserialize)]
struct TransfersFile {
    transfers: Vec<TransferInput>,
}

/// JSON output schema for circularity reports.
#[derive(serde::Serialize)]
struct ReportOutput {
    total_flow: String,
    circular_flow_total: String,
    acyclic_flow: String,
    cycles_peeled: usize,
    index: f64,
    valid: bool,
    thresholds: Vec<ThresholdOutput>,
}

#[derive(serde::Serialize)]
struct ThresholdOutput {
    min_cycle_length: u32,
    circular_flow: String,
    ratio: f64,
}

#[derive(serde::Serialize)]
struct ComponentOutput {
    accounts: Vec<String>,
    circulating: bool,
}

fn load_transfers(path: &str) -> TransferSet {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });

    let file: TransfersFile = serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "transfers": [
    {{ "from": "0x3f2a-bakery", "to": "0x91cc-school", "amount": "250" }}
  ]
}}"#
        );
        process::exit(1);
    });

    let mut set = TransferSet::new();
    for t in file.transfers {
        let amount: Decimal = t.amount.parse().unwrap_or_else(|e| {
            eprintln!("Invalid amount '{}': {}", t.amount, e);
            process::exit(1);
        });
        let mut transfer = Transfer::new(AccountId::new(&t.from), AccountId::new(&t.to), amount);
        if let Some(reference) = t.reference {
            transfer = transfer.with_reference(reference);
        }
        set.add(transfer);
    }
    set
}

fn parse_thresholds(list: &str) -> Vec<u32> {
    list.split(',')
        .map(|s| {
            s.trim().parse::<u32>().unwrap_or_else(|_| {
                eprintln!("Invalid threshold '{}': expected a positive integer", s);
                process::exit(1);
            })
        })
        .collect()
}

fn cmd_report(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut thresholds: Vec<u32> = CirculationEngine::DEFAULT_THRESHOLDS.to_vec();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            "--thresholds" => {
                i += 1;
                let list = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--thresholds requires a comma-separated list");
                    process::exit(1);
                });
                thresholds = parse_thresholds(&list);
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let set = load_transfers(&path);
    let report = CirculationEngine::decompose_transfers(&set, &thresholds).unwrap_or_else(|e| {
        eprintln!("Decomposition failed: {}", e);
        process::exit(1);
    });

    if format == "json" {
        let output = ReportOutput {
            total_flow: report.total_flow().to_string(),
            circular_flow_total: report.peeled_total().to_string(),
            acyclic_flow: report.acyclic_flow().to_string(),
            cycles_peeled: report.cycles_peeled(),
            index: report.index(),
            valid: report.is_valid(),
            thresholds: report
                .circular_flow()
                .iter()
                .map(|(&k, flow)| ThresholdOutput {
                    min_cycle_length: k,
                    circular_flow: flow.to_string(),
                    ratio: report.ratio_at(k),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        println!("{}", report);
    }
}

fn cmd_components(args: &[String]) {
    let mut input_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--input requires a file path");
                    process::exit(1);
                }));
            }
            "--format" => {
                i += 1;
                format = args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--format requires 'text' or 'json'");
                    process::exit(1);
                });
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let set = load_transfers(&path);
    let graph = FlowGraph::from_transfers(&set);
    let components = find_components(&graph);

    if format == "json" {
        let output: Vec<ComponentOutput> = components
            .iter()
            .map(|c| ComponentOutput {
                accounts: c.accounts.iter().map(|a| a.to_string()).collect(),
                circulating: c.is_circulating(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output).unwrap());
    } else {
        let circulating: Vec<_> = components.iter().filter(|c| c.is_circulating()).collect();
        if circulating.is_empty() {
            println!("No circulating components — all flow is acyclic.");
        } else {
            for (i, component) in circulating.iter().enumerate() {
                let accounts: Vec<String> =
                    component.accounts.iter().map(|a| a.to_string()).collect();
                println!(
                    "Component {} ({} accounts): {}",
                    i,
                    component.len(),
                    accounts.join(", ")
                );
            }
            println!(
                "\nCirculating capacity: {} of {} total flow",
                circulating_capacity(&graph),
                graph.total_flow()
            );
        }
    }
}

fn cmd_generate(args: &[String]) {
    let mut accounts = 10usize;
    let mut transfer_count = 30usize;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--accounts" => {
                i += 1;
                accounts = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--accounts requires a number");
                    process::exit(1);
                });
            }
            "--transfers" => {
                i += 1;
                transfer_count = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--transfers requires a number");
                    process::exit(1);
                });
            }
            "--output" => {
                i += 1;
                output_path = Some(args.get(i).cloned().unwrap_or_else(|| {
                    eprintln!("--output requires a file path");
                    process::exit(1);
                }));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = NetworkConfig {
        account_count: accounts,
        avg_transfers_per_account: transfer_count / accounts.max(1),
        ..Default::default()
    };

    let set = generate_random_network(&config);

    #[derive(serde::Serialize)]
    struct OutputTransfer {
        from: String,
        to: String,
        amount: String,
    }

    #[derive(serde::Serialize)]
    struct OutputFile {
        transfers: Vec<OutputTransfer>,
    }

    let output = OutputFile {
        transfers: set
            .transfers()
            .iter()
            .map(|t| OutputTransfer {
                from: t.payer().to_string(),
                to: t.payee().to_string(),
                amount: t.amount().to_string(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&output).unwrap();

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!(
            "Generated {} transfers across {} accounts → {}",
            set.len(),
            accounts,
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "report" => cmd_report(rest),
        "components" => cmd_components(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
