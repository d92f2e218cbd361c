//! Comps CLI - Turn raw comps exports into quartile-banded workbooks
//!
//! # Main Commands
//!
//! ```bash
//! comps serve                        # Start HTTP server (port 3000)
//! comps transform comps.xlsx         # Write the formatted workbook
//! comps summary comps.xlsx           # Print price range and band stats as JSON
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! comps inspect comps.xlsx           # Show sheets, headers and record count
//! ```

use clap::{Parser, Subcommand};
use comps::api::logs::LOG_BROADCASTER;
use comps::config::port_from_env;
use comps::{
    output_file_name, parse_workbook_file, process_file, transform_bytes, ReportConfig,
    TransformOptions, COLUMN_ALLOWLIST, DEFAULT_PORT,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "comps")]
#[command(about = "Transform raw comps exports into quartile-banded spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full transformation: raw workbook -> formatted quartile workbook
    Transform {
        /// Input workbook (.xlsx or .xls)
        input: PathBuf,

        /// Output file (default: Existing_Comps_Transformed_<date>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON report config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Subdivision label printed under the title
        #[arg(long)]
        subdivision: Option<String>,

        /// Input sheet name
        #[arg(long)]
        sheet: Option<String>,

        /// Report title
        #[arg(long)]
        title: Option<String>,
    },

    /// Print the statistics summary as JSON
    Summary {
        /// Input workbook (.xlsx or .xls)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON report config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input sheet name
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Show sheet names, headers and record count
    Inspect {
        /// Input workbook (.xlsx or .xls)
        input: PathBuf,

        /// Input sheet name
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: COMPS_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// JSON report config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Transform {
            input,
            output,
            config,
            subdivision,
            sheet,
            title,
        } => load_config(config.as_deref(), subdivision, sheet, title)
            .and_then(|cfg| cmd_transform(&input, output.as_deref(), cfg)),

        Commands::Summary {
            input,
            output,
            config,
            sheet,
        } => load_config(config.as_deref(), None, sheet, None)
            .and_then(|cfg| cmd_summary(&input, output.as_deref(), cfg)),

        Commands::Inspect { input, sheet } => load_config(None, None, sheet, None)
            .and_then(|cfg| cmd_inspect(&input, &cfg)),

        Commands::Serve { port, config } => cmd_serve(port, config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Defaults, then the config file, then `COMPS_*` env vars, then flags.
fn load_config(
    path: Option<&Path>,
    subdivision: Option<String>,
    sheet: Option<String>,
    title: Option<String>,
) -> Result<ReportConfig, Box<dyn std::error::Error>> {
    let mut config = ReportConfig::load(path)?;
    if let Some(s) = subdivision {
        config.subdivision = Some(s);
    }
    if let Some(s) = sheet {
        config.input_sheet = s;
    }
    if let Some(t) = title {
        config.title = t;
    }
    Ok(config)
}

fn cmd_transform(
    input: &Path,
    output: Option<&Path>,
    config: ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = TransformOptions::new(config);
    let report = process_file(input, &options, &*LOG_BROADCASTER)?;
    let summary = &report.output.summary;

    eprintln!("\n📊 Summary:");
    eprintln!("   Records: {}", summary.record_count);
    eprintln!("   Price range: {}", summary.price_range);
    eprintln!("   Quartile sizes: {}", summary.quartile_sizes);
    for band in &summary.bands {
        eprintln!("   Q{} average: {}", band.band, band.average_label());
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(output_file_name(options.today)));
    fs::write(&path, &report.xlsx)?;
    eprintln!("   💾 Saved to: {}", path.display());

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_summary(
    input: &Path,
    output: Option<&Path>,
    config: ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Summarizing: {}", input.display());

    let bytes = fs::read(input)?;
    let name = input.to_string_lossy();
    let options = TransformOptions::new(config);
    let result = transform_bytes(&bytes, Some(&name), &options, &*LOG_BROADCASTER)?;

    let json = serde_json::to_string_pretty(&result.summary)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_inspect(input: &Path, config: &ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let result = parse_workbook_file(input, &config.input_sheet)?;

    println!("Sheets: {}", result.sheet_names.join(", "));
    println!(
        "Using: {}{}",
        result.sheet_name,
        if result.used_fallback { " (only sheet)" } else { "" }
    );
    println!("Columns: {}", result.headers.join(", "));
    println!("Records: {}", result.records.len());

    let missing: Vec<&str> = COLUMN_ALLOWLIST
        .iter()
        .copied()
        .filter(|c| !result.headers.iter().any(|h| h == c))
        .collect();
    if !missing.is_empty() {
        println!("Missing (written as blanks): {}", missing.join(", "));
    }

    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ReportConfig::load(config)?;
    let port = match port {
        Some(p) => p,
        None => port_from_env(DEFAULT_PORT)?,
    };
    comps::server::start_server(port, config).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("   💾 Saved to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
