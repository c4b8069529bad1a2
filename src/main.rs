//! nodectl CLI - Cluster Board Node Control
//!
//! Power, console and PCIe discovery commands for four-slot cluster boards.

use clap::Parser;
use nodectl::config::{CliArgs, Commands, NodeSelection, NodectlConfig, OutputFormat};
use nodectl::error::{IoResultExt, NodectlError, Result};
use nodectl::node::{validate_node_number, Node, PowerOperation};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_logging(args.verbose);

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: CliArgs) -> Result<()> {
    let config = NodectlConfig::from_cli(&args)?;

    match &args.command {
        Commands::List { active_only } => cmd_list(&config, *active_only, args.output_format),
        Commands::PowerOn { selection } => cmd_power(&config, selection, PowerOperation::PowerOn),
        Commands::PowerOff { selection } => cmd_power(&config, selection, PowerOperation::PowerOff),
        Commands::Reboot { selection } => cmd_power(&config, selection, PowerOperation::Reboot),
        Commands::Flash { selection, file } => cmd_flash(selection, file),
        Commands::Console { node } => cmd_console(&config, *node),
        Commands::Rescan => cmd_rescan(&config),
        Commands::Status { selection } => cmd_status(&config, selection, args.output_format),
    }
}

fn cmd_list(config: &NodectlConfig, active_only: bool, format: OutputFormat) -> Result<()> {
    let entries = config
        .pcie_enumerator()
        .list(active_only)
        .map_err(|e| e.with_context("failed to list system PCIe devices"))?;

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = entries
                .iter()
                .map(|entry| {
                    serde_json::json!({
                        "address": entry.address,
                        "description": entry.description(),
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", entry);
            }
            if entries.is_empty() {
                println!("No devices found. Run the rescan command then try again.");
            }
        }
    }

    Ok(())
}

/// Build every node, then apply `operation` to the selected ones in order
fn cmd_power(config: &NodectlConfig, selection: &NodeSelection, operation: PowerOperation) -> Result<()> {
    // Selection is validated before any GPIO line is touched
    let numbers = selection.resolve()?;
    let nodes = config
        .registry()
        .get_nodes()
        .map_err(|e| e.with_context("failed to get all nodes"))?;

    for number in numbers {
        let node = find_node(&nodes, number)?;
        match operation {
            PowerOperation::PowerOn => node.power_on()?,
            PowerOperation::PowerOff => node.power_off()?,
            PowerOperation::Reboot => node.reboot()?,
        }
    }

    Ok(())
}

fn cmd_flash(selection: &NodeSelection, file: &Path) -> Result<()> {
    selection.resolve()?;

    let metadata = std::fs::metadata(file)
        .with_path(file)
        .map_err(|e| e.with_context("failed to get filesystem info for image file"))?;
    if !metadata.is_file() {
        return Err(NodectlError::bad_parameter(
            "the image file path must point to a regular file",
        ));
    }

    Err(NodectlError::Unsupported(
        "this subcommand is not currently supported".to_string(),
    ))
}

fn cmd_console(config: &NodectlConfig, number: u8) -> Result<()> {
    validate_node_number(number)?;
    let node = config.registry().get_node(number)?;
    let command = node.console_command();

    tracing::info!(
        "Opening console on node {} ({} at {} baud)",
        number,
        node.tty_device_path().display(),
        node.baud_rate()
    );

    // exec only returns on failure
    match command.exec() {
        Ok(never) => match never {},
        Err(e) => Err(e.with_context(format!("failed to open console on node {}", number))),
    }
}

fn cmd_rescan(config: &NodectlConfig) -> Result<()> {
    config
        .pcie_enumerator()
        .rescan_all()
        .map_err(|e| e.with_context("failed to rescan all PCIe nodes"))
}

fn cmd_status(config: &NodectlConfig, selection: &NodeSelection, format: OutputFormat) -> Result<()> {
    let numbers = selection.resolve()?;
    let nodes = config
        .registry()
        .get_nodes()
        .map_err(|e| e.with_context("failed to get all nodes"))?;

    let mut rows = Vec::with_capacity(numbers.len());
    for number in numbers {
        let node = find_node(&nodes, number)?;
        let level = node
            .status()
            .map_err(|e| e.with_context(format!("failed to read status of node {}", number)))?;
        rows.push((node, level));
    }

    match format {
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = rows
                .iter()
                .map(|(node, level)| {
                    serde_json::json!({
                        "node": node.number(),
                        "pin": node.input_pin().number(),
                        "level": level,
                    })
                })
                .collect();
            print_json(&rows)?;
        }
        OutputFormat::Text => {
            for (node, level) in rows {
                println!(
                    "Node {}: status pin {} is {}",
                    node.number(),
                    node.input_pin().number(),
                    level
                );
            }
        }
    }

    Ok(())
}

fn find_node(nodes: &[Node], number: u8) -> Result<&Node> {
    nodes
        .iter()
        .find(|node| node.number() == number)
        .ok_or_else(|| NodectlError::bad_parameter(format!("node {} is not configured", number)))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| NodectlError::config(format!("failed to encode output: {}", e)))?;
    println!("{}", text);
    Ok(())
}
