use clap::Parser;
use gerber_analysis::{analyze_package, AnalyzeOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gerber-analysis",
    about = "Analyze a Gerber/Excellon package and print board facts as JSON"
)]
struct Cli {
    /// Input package (.zip, .tar, .tar.gz, .tgz) or a single Gerber/drill file
    input: PathBuf,

    /// Output JSON file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Include per-file analyses in output
    #[arg(long)]
    files: bool,

    /// Parse files one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Largest archive entry to decompress, in MiB
    #[arg(long, default_value_t = 32)]
    max_entry_mb: u64,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let opts = AnalyzeOptions {
        parallel: !cli.sequential,
        max_entry_bytes: cli.max_entry_mb.saturating_mul(1024 * 1024),
    };

    let data = match std::fs::read(&cli.input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading file: {e}");
            std::process::exit(1);
        }
    };
    let filename = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let report = match analyze_package(&data, &filename, &opts) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let value = if cli.files {
        serde_json::to_value(&report)
    } else {
        serde_json::to_value(&report.board)
    };
    let json = value.and_then(|v| {
        if cli.pretty {
            serde_json::to_string_pretty(&v)
        } else {
            serde_json::to_string(&v)
        }
    });
    let json = match json {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error: JSON serialization failed: {e}");
            std::process::exit(1);
        }
    };

    if let Some(output_path) = cli.output {
        if let Err(e) = std::fs::write(&output_path, &json) {
            eprintln!("Error writing {}: {e}", output_path.display());
            std::process::exit(1);
        }
        eprintln!("Written to {}", output_path.display());
    } else {
        println!("{json}");
    }
}
