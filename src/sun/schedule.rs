use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use solar_positioning::{spa, Horizon, SunriseResult};

use crate::error::DynResult;
use crate::light::state::LightValue;
use crate::sun::daylight::{solar_elevation, DaylightModel, Location};

// Delta T estimate for the current decade, seconds.
const DELTA_T_SECONDS: f64 = 69.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulePoint<Tz: TimeZone> {
    pub when: DateTime<Tz>,
    pub value: LightValue,
}

/// One artificial day for the fixture: lit points only, uniformly spaced,
/// ordered by time, ending at the real local sunset.
#[derive(Debug, Clone)]
pub struct DaySchedule<Tz: TimeZone> {
    points: Vec<SchedulePoint<Tz>>,
}

impl<Tz: TimeZone> DaySchedule<Tz> {
    pub fn points(&self) -> &[SchedulePoint<Tz>] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Duration from the first to the last point.
    pub fn span(&self) -> Duration {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.when.clone() - first.when.clone(),
            _ => Duration::zero(),
        }
    }

    /// Discard points that are already in the past.
    pub fn drop_until(&mut self, now: &DateTime<Tz>) {
        self.points.retain(|p| p.when >= *now);
    }
}

/// The date whose natural day length the fixture should reproduce today.
///
/// Cosine interpolation between the solstices, pivoted on Aug 15: the
/// summer solstice maps to itself while the winter solstice maps to
/// Aug 15, so winter flocks still get a long artificial day.
pub fn compressed_date<Tz: TimeZone>(today: &DateTime<Tz>) -> DynResult<DateTime<Tz>> {
    let solstice_long = today
        .with_day(21)
        .and_then(|d| d.with_month(6))
        .ok_or("no June 21 this year")?;
    let solstice_short = today
        .with_day(21)
        .and_then(|d| d.with_month(12))
        .ok_or("no December 21 this year")?;
    let pivot = today
        .with_day(15)
        .and_then(|d| d.with_month(8))
        .ok_or("no August 15 this year")?;

    let to_long = (solstice_long.clone() - today.clone()).num_seconds() as f64;
    let solstice_gap = (solstice_long.clone() - solstice_short).num_seconds() as f64;
    let half_reach = (solstice_long - pivot.clone()).num_seconds() as f64 / 2.0;
    let offset = half_reach * ((std::f64::consts::PI * to_long / solstice_gap).cos() + 1.0);
    Ok(pivot + Duration::seconds(offset.round() as i64))
}

/// Local sunset on the date of `today`.
pub fn sunset_local<Tz: TimeZone>(
    location: &Location,
    today: &DateTime<Tz>,
) -> DynResult<DateTime<Tz>> {
    // The SPA wants a calendar date; use the local one, since near local
    // midnight the UTC date can be a day off in either direction.
    let date = today.date_naive();
    let result = spa::sunrise_sunset_utc_for_horizon(
        date.year(),
        date.month(),
        date.day(),
        location.latitude,
        location.longitude,
        DELTA_T_SECONDS,
        Horizon::SunriseSunset,
    )?;
    let sunset = match result {
        SunriseResult::RegularDay { sunset, .. } => sunset,
        SunriseResult::AllDay { .. } | SunriseResult::AllNight { .. } => {
            return Err("no sunset at this latitude today".into());
        }
    };
    let (day_offset, hours) = sunset.day_and_hours();
    let base = Utc
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
        .single()
        .ok_or("invalid date")?;
    let when = base
        + Duration::days(day_offset as i64)
        + Duration::seconds((hours * 3600.0).round() as i64);
    Ok(when.with_timezone(&today.timezone()))
}

/// Build today's schedule: sample the compressed date's sun at `interval`
/// through the daylight model, keep the lit points, and shift the block so
/// it ends at today's real sunset.
pub fn build_day<Tz: TimeZone>(
    location: &Location,
    model: &DaylightModel,
    today: &DateTime<Tz>,
    interval: Duration,
) -> DynResult<DaySchedule<Tz>> {
    if interval <= Duration::zero() {
        return Err("schedule interval must be positive".into());
    }
    let target = compressed_date(today)?;
    let day_start = target
        .with_hour(0)
        .and_then(|d| d.with_minute(0))
        .and_then(|d| d.with_second(0))
        .and_then(|d| d.with_nanosecond(0))
        .ok_or("no midnight on target date")?;

    let mut points = Vec::new();
    let mut t = day_start.clone();
    while t.date_naive() == day_start.date_naive() {
        let elevation = solar_elevation(location, t.with_timezone(&Utc))?;
        let value = model.light_value(elevation);
        if !value.is_off() {
            points.push(SchedulePoint {
                when: t.clone(),
                value,
            });
        }
        t = t + interval.clone();
    }
    if points.is_empty() {
        return Ok(DaySchedule { points });
    }

    let sunset = sunset_local(location, today)?;
    let span = points.last().unwrap().when.clone() - points.first().unwrap().when.clone();
    let shift = (sunset - span) - points.first().unwrap().when.clone();
    for p in &mut points {
        p.when = p.when.clone() + shift;
    }
    Ok(DaySchedule { points })
}
