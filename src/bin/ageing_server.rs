//! Ageing API Server binary
//!
//! Upload a workbook over HTTP, download the processed one.

use ageing_slab::api::{run_api_server, server::ApiConfig};
use ageing_slab::config::AgeingConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ageing-server")]
#[command(version)]
#[command(about = "Ageing API Server - HTTP front end for disbursement ageing")]
#[command(long_about = r#"
Ageing API Server

Endpoints:
  - POST /api/v1/process?date=YYYY-MM-DD  - Body: .xlsx, response: processed .xlsx
  - POST /api/v1/report?date=YYYY-MM-DD   - Body: .xlsx, response: JSON summary
  - GET  /health                          - Health check
  - GET  /version                         - Server version info
  - GET  /                                - API documentation

The processed workbook response carries an `x-invalid-date-rows` header and,
when no sheet has the date column, an `x-schema-error` header.

Example usage:
  ageing-server                           # Start on localhost:8080
  ageing-server --host 0.0.0.0 --port 3000

  curl -X POST "http://localhost:8080/api/v1/process?date=2024-03-31" \
    --data-binary @loans.xlsx -o processed_output.xlsx
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "AGEING_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "AGEING_PORT")]
    port: u16,

    /// YAML file overriding column/sheet names
    #[arg(short, long, env = "AGEING_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        ageing: AgeingConfig::load_or_default(args.config.as_deref())?,
    };

    run_api_server(config).await
}
