//! # Bytebox Host Daemon
//!
//! Main entry point for the bytebox host runtime.

use byteboxd::{Daemon, DaemonConfig, DaemonMode};
use std::env;
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    let mut daemon = Daemon::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    if let Err(e) = daemon.run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<DaemonConfig, String> {
    let mut config = DaemonConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--worker" => {
                config.mode = DaemonMode::Worker;
            }
            "--source" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --source".to_string());
                }
                config.source = Some(args[i].clone().into());
            }
            "--input" | "-i" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --input".to_string());
                }
                config.input = Some(args[i].clone());
            }
            "--input-file" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --input-file".to_string());
                }
                config.input_file = Some(args[i].clone().into());
            }
            "--timeout-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --timeout-ms".to_string());
                }
                config.timeout_ms = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("Invalid timeout value: {}", args[i]))?,
                );
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --source <FILE>      Source file to translate and run");
    eprintln!("  -i, --input <TEXT>       Input buffer as inline text");
    eprintln!("      --input-file <FILE>  Input buffer read from a file");
    eprintln!("      --timeout-ms <N>     Kill the execution context after N milliseconds");
    eprintln!("      --worker             Internal: serve one execution request on stdin/stdout");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --source echo.bx --input abc", program);
    eprintln!("  {} --source spin.bx --timeout-ms 2000", program);
}
