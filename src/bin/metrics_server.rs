//! REST API Server for the e-commerce sales metrics
//!
//! Usage:
//!   ./target/release/metrics_server [--port PORT] [--data-dir DIR]
//!
//! REST endpoints:
//!   GET /api/v1/health       - Health check
//!   GET /api/v1/years        - Years with data (?status=)
//!   GET /api/v1/dashboard    - Full KPI snapshot (?year=&month=&comparison_year=&status=)
//!   GET /api/v1/categories   - Category revenue (?year=&month=&status=&limit=)
//!   GET /api/v1/states       - State revenue (?year=&month=&status=&limit=)
//!   GET /api/v1/growth       - MoM series and YoY growth
//!   GET /api/v1/diagnostics  - Rows dropped while preparing the data

use anyhow::Result;
use clap::Parser;
use ecommerce_metrics::{api, SalesData};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "metrics_server")]
#[command(about = "Serve e-commerce sales metrics as JSON")]
struct Args {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Directory holding the six CSV tables
    #[arg(long, default_value = "ecommerce_data")]
    data_dir: PathBuf,
}

fn print_banner(port: u16, data_dir: &Path) {
    println!("============================================================");
    println!("           E-COMMERCE SALES METRICS API SERVER");
    println!("============================================================");
    println!();
    println!("  Port:     {}", port);
    println!("  Data:     {}", data_dir.display());
    println!("  REST:     http://localhost:{}/api/v1/", port);
    println!();
    println!("REST Endpoints:");
    println!("  GET /api/v1/health          Health check");
    println!("  GET /api/v1/years           Years with data");
    println!("  GET /api/v1/dashboard       Full KPI snapshot");
    println!("  GET /api/v1/categories      Category revenue");
    println!("  GET /api/v1/states          State revenue");
    println!("  GET /api/v1/growth          Growth series");
    println!("  GET /api/v1/diagnostics     Data quality");
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .init();

    let args = Args::parse();
    print_banner(args.port, &args.data_dir);

    // CSV parsing is blocking; keep it off the runtime threads
    let data_dir = args.data_dir.clone();
    let data = tokio::task::spawn_blocking(move || SalesData::load(data_dir)).await??;
    let app = api::router(Arc::new(data));

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    tracing::info!("Starting REST server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
