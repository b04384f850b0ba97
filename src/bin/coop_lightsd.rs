use std::process::ExitCode;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::Parser;
use log::{error, info};
use tokio::signal;

use coop_lights as coop;
use coop::colorimetry::observer::ObserverTable;
use coop::error::DynResult;
use coop::light::sink::{ConsoleSink, LightSink};
use coop::light::state::LightState;
use coop::sun::daylight::{DaylightModel, Location};
use coop::sun::schedule::{build_day, sunset_local};

#[derive(Parser)]
#[command(
    name = "coop_lightsd",
    about = "Drive a coop light fixture along an artificial daylight curve."
)]
struct CmdArgs {
    /// Latitude of the fixture location
    #[arg(long, default_value_t = 43.09176073408273)]
    latitude: f64,
    /// Longitude of the fixture location
    #[arg(long, default_value_t = -73.49606500488254)]
    longitude: f64,
    /// Altitude of the fixture location in meters
    #[arg(long, default_value_t = 121.0)]
    altitude: f64,
    /// Timezone the schedule runs in
    #[arg(long, default_value = "America/New_York")]
    timezone: String,
    /// Topic the light states are published on
    #[arg(long, default_value = "zigbee2mqtt/Chicken Coop Light/set")]
    topic: String,
    /// Minutes between schedule points
    #[arg(long, default_value_t = 1)]
    interval: i64,
}

async fn wait_until<TzT: chrono::TimeZone>(when: &DateTime<TzT>) {
    let now = Utc::now();
    let delay = when.clone().with_timezone(&Utc) - now;
    if delay > Duration::zero() {
        if let Ok(delay) = delay.to_std() {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn run_day(
    location: &Location,
    model: &DaylightModel,
    tz: Tz,
    interval: Duration,
    sink: &mut dyn LightSink,
) -> DynResult<()> {
    let today = Utc::now().with_timezone(&tz);
    info!("Today is {}", today);

    let sunset = sunset_local(location, &today)?;
    info!("Sunset today: {}", sunset);

    let mut schedule = build_day(location, model, &today, interval)?;
    if schedule.is_empty() {
        info!("No lit points today");
        return Ok(());
    }
    info!(
        "Length of artificial day: {} minutes",
        schedule.span().num_minutes()
    );

    let start = schedule.points()[0].when.clone();
    let now = Utc::now().with_timezone(&tz);
    if start <= now {
        let before = schedule.points().len();
        schedule.drop_until(&now);
        info!(
            "Start time {} already passed, stripping {} entries",
            start,
            before - schedule.points().len()
        );
    } else {
        info!("Sleeping until start time {}", start);
    }

    let observer = ObserverTable::cie_1931();
    for point in schedule.points() {
        wait_until(&point.when).await;
        let state = LightState::from_value(&point.value, observer)?;
        sink.send_state(&state).await?;
    }
    sink.send_state(&LightState::off()).await?;
    info!("Day finished");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let args = CmdArgs::parse();
    let tz: Tz = match args.timezone.parse() {
        Ok(tz) => tz,
        Err(e) => {
            error!("Bad timezone {:?}: {}", args.timezone, e);
            return ExitCode::FAILURE;
        }
    };
    if args.interval < 1 {
        error!("Interval must be at least one minute");
        return ExitCode::FAILURE;
    }
    let location = Location {
        latitude: args.latitude,
        longitude: args.longitude,
        altitude: args.altitude,
    };
    let model = DaylightModel::default();
    let mut sink = ConsoleSink::new(&args.topic);

    let mut last_run: Option<NaiveDate> = None;
    loop {
        let today = Utc::now().with_timezone(&tz).date_naive();
        if last_run != Some(today) {
            last_run = Some(today);
            tokio::select! {
                res = run_day(&location, &model, tz, Duration::minutes(args.interval), &mut sink) => {
                    if let Err(e) = res {
                        error!("Day run failed: {}", e);
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Interrupted, turning light off");
                    let _ = sink.send_state(&LightState::off()).await;
                    return ExitCode::SUCCESS;
                }
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_secs(60)) => {}
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                return ExitCode::SUCCESS;
            }
        }
    }
}
