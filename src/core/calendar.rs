use std::fmt::Write as _;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::core::Timestamp;

pub const SECONDS_PER_DAY: i64 = 24 * 3600;
pub const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Unit of a calendar step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepUnit {
    /// Fixed number of seconds, aligned to local wall-clock multiples.
    Seconds,
    /// Whole weeks starting Monday 00:00 local time.
    Weeks,
    /// Whole months starting on day 1, 00:00 local time.
    Months,
    /// Whole years starting on January 1, 00:00 local time.
    Years,
}

/// Restartable cursor over calendar-aligned timestamps in a time zone.
///
/// Seconds and weeks advance by raw second arithmetic. Months and years are
/// recomputed from calendar fields on every step so month lengths and DST
/// transitions land on local midnight. The cursor for months/years always
/// sits on day 1, so `advance` followed by `retreat` is exact for every unit.
#[derive(Debug, Clone)]
pub struct CalendarStep<Tz: TimeZone> {
    tz: Tz,
    unit: StepUnit,
    multiplier: i64,
    step_seconds: i64,
    current: Timestamp,
    year: i32,
    month: u32,
}

impl<Tz: TimeZone> CalendarStep<Tz> {
    /// Creates an invalid cursor; call [`CalendarStep::set`] before use.
    #[must_use]
    pub fn unset(tz: Tz) -> Self {
        Self {
            tz,
            unit: StepUnit::Seconds,
            multiplier: 0,
            step_seconds: 0,
            current: 0,
            year: 1970,
            month: 1,
        }
    }

    #[must_use]
    pub fn new(tz: Tz, anchor: Timestamp, multiplier: i64, unit: StepUnit) -> Self {
        let mut step = Self::unset(tz);
        step.set(anchor, multiplier, unit);
        step
    }

    /// (Re)initializes the cursor to the first aligned boundary for `anchor`.
    ///
    /// A non-positive `multiplier` leaves the cursor invalid.
    pub fn set(&mut self, anchor: Timestamp, multiplier: i64, unit: StepUnit) {
        self.unit = unit;
        self.multiplier = multiplier.max(0);
        self.step_seconds = 0;
        if multiplier <= 0 {
            return;
        }

        let local = local_datetime(&self.tz, anchor);
        match unit {
            StepUnit::Seconds => {
                let step = multiplier;
                let offset = local
                    .as_ref()
                    .map_or(0, |dt| i64::from(dt.offset().fix().local_minus_utc()));
                let wall = anchor.saturating_add(offset);
                let aligned = if wall.rem_euclid(step) == 0 {
                    wall
                } else {
                    (wall.div_euclid(step) + 1).saturating_mul(step)
                };
                self.step_seconds = step;
                self.current = aligned.saturating_sub(offset);
            }
            StepUnit::Weeks => {
                self.step_seconds = multiplier.saturating_mul(SECONDS_PER_WEEK);
                self.current = local
                    .map(|dt| dt.date_naive())
                    .and_then(|date| {
                        let back = u64::from(date.weekday().num_days_from_monday());
                        date.checked_sub_days(Days::new(back))
                    })
                    .map_or(anchor, |monday| resolve_local_midnight(&self.tz, monday));
            }
            StepUnit::Months => {
                let (year, month) = local
                    .map_or((1970, 1), |dt| (dt.year(), dt.month()));
                let (year, month) = shift_month(year, month, 1);
                self.step_seconds = multiplier.saturating_mul(30 * SECONDS_PER_DAY);
                self.year = year;
                self.month = month;
                self.current = self.resolve_fields();
            }
            StepUnit::Years => {
                let year = local.map_or(1970, |dt| dt.year());
                self.step_seconds = multiplier.saturating_mul(365 * SECONDS_PER_DAY);
                self.year = year.saturating_add(1);
                self.month = 1;
                self.current = self.resolve_fields();
            }
        }
    }

    /// Moves the cursor one step forward.
    pub fn advance(&mut self) {
        self.shift(1);
    }

    /// Moves the cursor one step backward.
    pub fn retreat(&mut self) {
        self.shift(-1);
    }

    fn shift(&mut self, direction: i64) {
        if !self.is_valid() {
            return;
        }
        match self.unit {
            StepUnit::Seconds | StepUnit::Weeks => {
                self.current = self
                    .current
                    .saturating_add(direction.saturating_mul(self.step_seconds));
            }
            StepUnit::Months => {
                let delta = direction.saturating_mul(self.multiplier);
                let (year, month) = shift_month(self.year, self.month, delta);
                self.year = year;
                self.month = month;
                self.current = self.resolve_fields();
            }
            StepUnit::Years => {
                let delta = i32::try_from(direction.saturating_mul(self.multiplier))
                    .unwrap_or(if direction < 0 { i32::MIN } else { i32::MAX });
                self.year = self.year.saturating_add(delta);
                self.current = self.resolve_fields();
            }
        }
    }

    fn resolve_fields(&self) -> Timestamp {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => resolve_local_midnight(&self.tz, date),
            // Outside chrono's calendar: park the cursor past any window end.
            None => Timestamp::MAX,
        }
    }

    /// Current cursor position.
    #[must_use]
    pub fn current(&self) -> Timestamp {
        self.current
    }

    #[must_use]
    pub fn unit(&self) -> StepUnit {
        self.unit
    }

    #[must_use]
    pub fn multiplier(&self) -> i64 {
        self.multiplier
    }

    #[must_use]
    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Approximate step length in seconds, exact for seconds/weeks.
    ///
    /// Months count as 30 days and years as 365 days; only meant for density
    /// estimates.
    #[must_use]
    pub fn interval(&self) -> i64 {
        self.step_seconds
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.step_seconds != 0
    }

    /// Lazily yields cursor positions from the current one up to and
    /// including `end`. The cursor itself is not moved.
    #[must_use]
    pub fn ticks_until(&self, end: Timestamp) -> CalendarTicks<Tz> {
        CalendarTicks {
            cursor: self.clone(),
            end,
            exhausted: !self.is_valid(),
        }
    }
}

/// Iterator returned by [`CalendarStep::ticks_until`].
#[derive(Debug, Clone)]
pub struct CalendarTicks<Tz: TimeZone> {
    cursor: CalendarStep<Tz>,
    end: Timestamp,
    exhausted: bool,
}

impl<Tz: TimeZone> Iterator for CalendarTicks<Tz> {
    type Item = Timestamp;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let current = self.cursor.current();
        if current > self.end {
            self.exhausted = true;
            return None;
        }
        self.cursor.advance();
        if self.cursor.current() <= current {
            // Saturated at the edge of the representable range.
            self.exhausted = true;
        }
        Some(current)
    }
}

/// Converts a Unix timestamp into the given zone.
#[must_use]
pub fn local_datetime<Tz: TimeZone>(tz: &Tz, timestamp: Timestamp) -> Option<DateTime<Tz>> {
    DateTime::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(tz))
}

/// Formats `timestamp` in `tz` with a strftime-style pattern.
///
/// Returns `None` for unsupported patterns (zone specifiers included) and
/// empty output.
#[must_use]
pub fn format_local<Tz: TimeZone>(tz: &Tz, timestamp: Timestamp, pattern: &str) -> Option<String> {
    let local = local_datetime(tz, timestamp)?.naive_local();
    let mut text = String::new();
    write!(text, "{}", local.format(pattern)).ok()?;
    (!text.is_empty()).then_some(text)
}

/// Timestamp of local midnight on `date`.
///
/// Ambiguous midnights resolve to the earlier instant; a midnight swallowed
/// by a DST gap resolves to the first representable local time after it.
#[must_use]
pub fn resolve_local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Timestamp {
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return Timestamp::MAX;
    };
    for quarter in 0..=(24 * 4) {
        let candidate = midnight + Duration::minutes(15 * quarter);
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved.timestamp();
        }
    }
    midnight.and_utc().timestamp()
}

fn shift_month(year: i32, month: u32, delta: i64) -> (i32, u32) {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + delta;
    let saturated = if delta < 0 { i32::MIN } else { i32::MAX };
    let year = i32::try_from(index.div_euclid(12)).unwrap_or(saturated);
    let month = u32::try_from(index.rem_euclid(12)).unwrap_or(0) + 1;
    (year, month)
}
