use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use itdashboard_lib::{ExportConfig, Exporter};

#[derive(Parser)]
#[command(name = "itdashboard")]
#[command(about = "Export an offline xlsx snapshot of the itdashboard.gov IT-investment dataset")]
struct Cli {
    /// Workbook base name, without extension
    #[arg(long, default_value = "itdashboard_gov")]
    output_file: String,

    /// Folder for the workbook and the json/pdf cache
    #[arg(long, default_value = "output")]
    folder: PathBuf,

    /// Seconds to pause before each network request
    #[arg(long, default_value_t = 0.7, value_parser = parse_delay)]
    delay: f64,

    /// Ignore cached files and refetch everything
    #[arg(long)]
    reload: bool,

    /// Agency code to export; repeatable. Omit to export all agencies
    #[arg(long = "agency")]
    agencies: Vec<String>,

    /// PDF field to extract, as "label=Column"; repeatable. Omit to skip
    /// PDF enrichment
    #[arg(long = "pdf-field", value_parser = parse_pdf_field)]
    pdf_fields: Vec<(String, String)>,

    /// Zero-based page of the business-case PDF to scan
    #[arg(long, default_value_t = 0)]
    pdf_page: usize,

    /// Emit a row-index column on every sheet
    #[arg(long)]
    index_rows: bool,

    /// Comma-separated ordered column subset for the summary sheet
    #[arg(long, value_delimiter = ',')]
    agency_columns: Option<Vec<String>>,

    /// Comma-separated ordered column subset for investment sheets
    #[arg(long, value_delimiter = ',')]
    investment_columns: Option<Vec<String>>,
}

fn parse_pdf_field(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((label, column)) if !label.is_empty() && !column.is_empty() => {
            Ok((label.to_string(), column.to_string()))
        }
        _ => bail!("expected \"label=Column\", got {:?}", raw),
    }
}

fn parse_delay(raw: &str) -> Result<f64> {
    let delay: f64 = raw.parse()?;
    // Duration::from_secs_f64 panics on negative or non-finite input.
    if !delay.is_finite() || delay < 0.0 {
        bail!("delay must be a non-negative number of seconds, got {:?}", raw);
    }
    Ok(delay)
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("itdashboard_api=info".parse().unwrap())
        .add_directive("itdashboard_lib=info".parse().unwrap())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = ExportConfig {
        output_file: cli.output_file,
        output_folder: cli.folder,
        delay: Duration::from_secs_f64(cli.delay),
        reload_files: cli.reload,
        agency_codes: cli.agencies,
        pdf_fields: cli.pdf_fields.into_iter().collect::<BTreeMap<_, _>>(),
        pdf_page: cli.pdf_page,
        index_rows: cli.index_rows,
        agency_columns: cli.agency_columns,
        investment_columns: cli.investment_columns,
        ..ExportConfig::default()
    };

    let exporter = Exporter::new(config);
    let workbook = exporter.run().await?;
    println!("{}", workbook.display());

    Ok(())
}
