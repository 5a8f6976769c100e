use std::fmt::{self, Display};

use chrono::{DateTime, Days, Duration, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Error, Result};

/// Wall-clock time of the launch the countdown runs to.
pub const TARGET_CIVIL: &str = "2025-10-01T00:00:00";
pub const TARGET_ZONE: &str = "Europe/Amsterdam";

const CIVIL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A fixed instant, kept together with the zone its civil time was given in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetMoment {
    instant: DateTime<Tz>,
}

impl TargetMoment {
    pub fn new(civil: NaiveDateTime, zone: Tz) -> Result<Self> {
        match zone.from_local_datetime(&civil) {
            LocalResult::Single(instant) => Ok(Self { instant }),
            LocalResult::Ambiguous(..) => Err(Error::InvalidTarget(format!(
                "{civil} is ambiguous in {}",
                zone.name()
            ))),
            LocalResult::None => Err(Error::InvalidTarget(format!(
                "{civil} does not exist in {}",
                zone.name()
            ))),
        }
    }

    pub fn parse(civil: &str, zone: &str) -> Result<Self> {
        let zone: Tz = zone.parse().map_err(|_| Error::InvalidTimezone)?;
        let civil = NaiveDateTime::parse_from_str(civil, CIVIL_FORMAT)?;
        Self::new(civil, zone)
    }

    /// The launch target, `TARGET_CIVIL` in `TARGET_ZONE`.
    pub fn launch() -> Result<Self> {
        Self::parse(TARGET_CIVIL, TARGET_ZONE)
    }

    pub fn zone(&self) -> Tz {
        self.instant.timezone()
    }

    pub fn instant(&self) -> DateTime<Tz> {
        self.instant
    }

    pub fn remaining_at(&self, now: DateTime<Utc>) -> RemainingDuration {
        time_remaining(&self.instant, &now.with_timezone(&self.zone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RemainingDuration {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl RemainingDuration {
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// What the display reads one minute from now.
    pub fn next_minute(&self) -> Self {
        if self.minutes > 0 {
            Self {
                minutes: self.minutes - 1,
                ..*self
            }
        } else if self.hours > 0 {
            Self {
                hours: self.hours - 1,
                minutes: 59,
                ..*self
            }
        } else if self.days > 0 {
            Self {
                days: self.days - 1,
                hours: 23,
                minutes: 59,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn value(&self, unit: Unit) -> u32 {
        match unit {
            Unit::Days => self.days,
            Unit::Hours => self.hours,
            Unit::Minutes => self.minutes,
        }
    }

    pub fn digit_groups(&self) -> [DigitGroup; 3] {
        Unit::ALL.map(|unit| DigitGroup {
            unit,
            digits: pad(self.value(unit)),
        })
    }
}

impl Display for RemainingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {}h {}m",
            pad(self.days),
            pad(self.hours),
            pad(self.minutes)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Days,
    Hours,
    Minutes,
}

impl Unit {
    pub const ALL: [Unit; 3] = [Unit::Days, Unit::Hours, Unit::Minutes];

    pub fn label(&self) -> &'static str {
        match self {
            Unit::Days => "DAGEN",
            Unit::Hours => "UREN",
            Unit::Minutes => "MINUTEN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitGroup {
    pub unit: Unit,
    pub digits: String,
}

impl DigitGroup {
    pub fn label(&self) -> &'static str {
        self.unit.label()
    }
}

pub fn pad(value: u32) -> String {
    format!("{value:02}")
}

/// Days, hours and minutes left until `target`, as seen on the wall clock of its zone.
///
/// Days are whole calendar days: `now` is moved forward day by day at the same wall-clock
/// time for as long as that stays at or before `target`. Hours and minutes are the elapsed
/// time left after that, so a day with a DST fall-back can leave 24 hours.
pub fn time_remaining(target: &DateTime<Tz>, now: &DateTime<Tz>) -> RemainingDuration {
    if target <= now {
        return RemainingDuration::ZERO;
    }

    let zone = target.timezone();
    let start = now.with_timezone(&zone).naive_local();
    let mut days = (target.naive_local().date() - start.date())
        .num_days()
        .max(0) as u64;

    let cursor = loop {
        if days == 0 {
            break *now;
        }
        let cursor = start
            .checked_add_days(Days::new(days))
            .map(|naive| resolve_local(&zone, naive));
        match cursor {
            Some(cursor) if cursor <= *target => break cursor,
            _ => days -= 1,
        }
    };

    let rest = target.signed_duration_since(cursor);
    let hours = rest.num_hours().max(0);
    let minutes = (rest.num_minutes() - hours * 60).max(0);

    RemainingDuration {
        days: days as u32,
        hours: hours as u32,
        minutes: minutes as u32,
    }
}

/// Pins a wall-clock time to an instant. Repeated times take the earlier instant, times
/// skipped by a DST gap take the first minute after the gap.
fn resolve_local(zone: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    if let Some(dt) = zone.from_local_datetime(&naive).earliest() {
        return dt;
    }

    let mut minute = naive
        - Duration::seconds(naive.second() as i64)
        - Duration::nanoseconds(naive.nanosecond() as i64);
    for _ in 0..24 * 60 {
        minute += Duration::minutes(1);
        if let Some(dt) = zone.from_local_datetime(&minute).earliest() {
            return dt;
        }
    }

    zone.from_utc_datetime(&naive)
}
