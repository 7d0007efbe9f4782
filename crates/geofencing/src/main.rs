//! Geofence Check CLI
//!
//! Checks a single position against a geofence file.
//!
//! Usage:
//!   check-geofence --geofences data/geofences.json --lat 28.6315 --lng 77.2167

use anyhow::Result;
use clap::Parser;
use geofencing::{alert_message, loader, risk_multiplier, should_send_alert, GeoPoint};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "check-geofence",
    about = "Check a tourist position against configured geofences"
)]
struct Args {
    /// Path to geofences JSON file
    #[arg(short = 'g', long, default_value = "data/geofences.json")]
    geofences: PathBuf,

    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,

    /// Tourist id used in the alert line
    #[arg(short, long, default_value = "T-000")]
    tourist_id: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let registry = loader::load_geofences(&args.geofences)?;
    let check = registry.check_violations(GeoPoint::new(args.lat, args.lng))?;

    info!(
        "{} violations, risk score {}, multiplier {}",
        check.violations.len(),
        check.risk_score,
        risk_multiplier(&check.violations)
    );

    println!("{}", serde_json::to_string_pretty(&check)?);

    if check.has_violations && should_send_alert(&check.violations) {
        println!("{}", alert_message(&args.tourist_id, &check.violations));
    }

    Ok(())
}
