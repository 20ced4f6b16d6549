//! Sweeper CLI - attendee lists from Squarespace order exports
//!
//! # Main Commands
//!
//! ```bash
//! sweeper process orders.csv -o out/   # Write per-category + merged CSV files
//! sweeper preview orders.csv           # Show counts and refunded records
//! sweeper serve                        # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! sweeper parse orders.csv             # Just parse CSV to JSON
//! sweeper rules                        # Show classification rules
//! ```

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use sweeper::{
    check_path, export_bundle, parse_csv_file, process_file, rules_description, write_bundle,
    ParseOptions, ServerConfig,
};

#[derive(Parser)]
#[command(name = "sweeper")]
#[command(about = "Split, categorize and redact Squarespace order exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Categorize a CSV export and write the attendee files
    Process {
        /// Input CSV file
        input: PathBuf,

        /// Directory for the exported files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Skip all_attendees_merged.csv
        #[arg(long)]
        no_merged: bool,

        /// Also dump the full result (with discount codes and refund flags) as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Show per-category counts and refunded records without writing files
    Preview {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Parse a CSV file and output its rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the classification rules
    Rules,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: SWEEPER_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            input,
            output_dir,
            delimiter,
            no_merged,
            json,
        } => cmd_process(&input, &output_dir, delimiter, !no_merged, json.as_deref()),

        Commands::Preview { input, delimiter } => cmd_preview(&input, delimiter),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Rules => cmd_rules(),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_process(
    input: &Path,
    output_dir: &Path,
    delimiter: Option<char>,
    include_merged: bool,
    json_output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = ParseOptions { delimiter };
    let output = process_file(input, &options)?;

    eprintln!("\n{}", output.summary);

    let files = export_bundle(&output.result, include_merged)?;
    if files.is_empty() {
        eprintln!("📭 No records, nothing to export.");
    } else {
        for path in write_bundle(&files, output_dir)? {
            eprintln!("💾 Wrote {}", path.display());
        }
    }

    if let Some(json_path) = json_output {
        let json = serde_json::to_string_pretty(&output)?;
        fs::write(json_path, json)?;
        eprintln!("💾 Full result written to: {}", json_path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_preview(input: &Path, delimiter: Option<char>) -> Result<(), Box<dyn std::error::Error>> {
    let options = ParseOptions { delimiter };
    let output = process_file(input, &options)?;

    println!("{}", output.summary);
    if !output.summary.downloads.is_empty() {
        println!("Files: {}", output.summary.downloads.join(", "));
    }
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());
    check_path(input)?;

    let result = parse_csv_file(input, &ParseOptions { delimiter })?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        sweeper::transform::pipeline::format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_rules() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", rules_description());
    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_port(port);
    sweeper::server::start_server(config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
