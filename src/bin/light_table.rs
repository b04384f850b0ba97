use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

extern crate clap;
use clap::{value_parser, Arg, Command};

use coop_lights as coop;
use coop::colorimetry::observer::ObserverTable;
use coop::colorimetry::system;
use coop::light::state::{LightColor, LightState};
use coop::sun::daylight::{DaylightModel, Location};
use coop::sun::schedule::build_day;

fn main() {
    tracing_subscriber::fmt::init();
    let matches = Command::new("light_table")
        .about("Print the computed light schedule for one day.")
        .arg(
            Arg::new("DATE")
                .help("Date to plan for, YYYY-MM-DD. Defaults to today."),
        )
        .arg(
            Arg::new("latitude")
                .long("latitude")
                .value_parser(value_parser!(f64))
                .default_value("43.09176073408273"),
        )
        .arg(
            Arg::new("longitude")
                .long("longitude")
                .value_parser(value_parser!(f64))
                .default_value("-73.49606500488254"),
        )
        .arg(
            Arg::new("altitude")
                .long("altitude")
                .value_parser(value_parser!(f64))
                .default_value("121.0")
                .help("Altitude of location in meters"),
        )
        .arg(
            Arg::new("timezone")
                .long("timezone")
                .default_value("America/New_York"),
        )
        .arg(
            Arg::new("interval")
                .long("interval")
                .value_parser(value_parser!(i64))
                .default_value("10")
                .help("Minutes between rows"),
        )
        .get_matches();

    let tz: Tz = match matches.get_one::<String>("timezone").unwrap().parse() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("Bad timezone: {}", e);
            return;
        }
    };
    let today = match matches.get_one::<String>("DATE") {
        Some(s) => match s.parse::<NaiveDate>() {
            Ok(date) => match tz.from_local_datetime(&date.and_hms_opt(12, 0, 0).unwrap()).single()
            {
                Some(d) => d,
                None => {
                    eprintln!("Ambiguous local date");
                    return;
                }
            },
            Err(e) => {
                eprintln!("Bad date: {}", e);
                return;
            }
        },
        None => Utc::now().with_timezone(&tz),
    };
    let location = Location {
        latitude: *matches.get_one::<f64>("latitude").unwrap(),
        longitude: *matches.get_one::<f64>("longitude").unwrap(),
        altitude: *matches.get_one::<f64>("altitude").unwrap(),
    };
    let interval = *matches.get_one::<i64>("interval").unwrap();
    if interval < 1 {
        eprintln!("Interval must be at least one minute");
        return;
    }

    let schedule = match build_day(
        &location,
        &DaylightModel::default(),
        &today,
        Duration::minutes(interval),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to build schedule: {}", e);
            return;
        }
    };
    if schedule.is_empty() {
        println!("No lit points on {}", today.date_naive());
        return;
    }

    let observer = ObserverTable::cie_1931();
    println!("time              kelvin      x      y  bright  rgb");
    for point in schedule.points() {
        let kelvin = match point.value.color {
            LightColor::Kelvin(k) => k,
            _ => continue,
        };
        let state = match LightState::from_value(&point.value, observer) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("{}: {}", point.when, e);
                continue;
            }
        };
        let (x, y) = state.color.map(|c| (c.x, c.y)).unwrap_or((0.0, 0.0));
        let rgb = match LightState::to_rgb_bytes(&point.value, observer, &system::HDTV) {
            Ok(rgb) => rgb,
            Err(e) => {
                eprintln!("{}: {}", point.when, e);
                continue;
            }
        };
        println!(
            "{}  {:5.0}  {:.4} {:.4}  {:6}  #{:02x}{:02x}{:02x}",
            point.when.format("%Y-%m-%d %H:%M"),
            kelvin,
            x,
            y,
            state.brightness.unwrap_or(0),
            rgb[0],
            rgb[1],
            rgb[2]
        );
    }
}
