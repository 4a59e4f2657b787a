use chrono::TimeZone;
use tracing::trace;

use crate::core::Timestamp;
use crate::core::calendar::{CalendarStep, SECONDS_PER_DAY, StepUnit, format_local};

const MINUTE: i64 = 60;
const HOUR: i64 = 3600;
const DAY: i64 = SECONDS_PER_DAY;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 31 * DAY;
const YEAR: i64 = 365 * DAY;

/// Labels are assumed to need half their width again as spacing.
const LABEL_SPACING_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GridAlign {
    Seconds,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy)]
struct GridRow {
    max_span: i64,
    major: i64,
    minor: i64,
    format: &'static str,
    centered: bool,
    align: GridAlign,
}

const fn row(
    max_span: i64,
    major: i64,
    minor: i64,
    format: &'static str,
    centered: bool,
    align: GridAlign,
) -> GridRow {
    GridRow {
        max_span,
        major,
        minor,
        format,
        centered,
        align,
    }
}

const GRID_TABLE: [GridRow; 17] = [
    row(DAY, MINUTE, 10, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 2 * MINUTE, 30, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 5 * MINUTE, MINUTE, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 10 * MINUTE, MINUTE, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 30 * MINUTE, 10 * MINUTE, "%H:%M", false, GridAlign::Seconds),
    row(DAY, HOUR, 10 * MINUTE, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 2 * HOUR, 30 * MINUTE, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 3 * HOUR, HOUR, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 6 * HOUR, HOUR, "%H:%M", false, GridAlign::Seconds),
    row(DAY, 12 * HOUR, 3 * HOUR, "%H:%M", false, GridAlign::Seconds),
    row(WEEK, 12 * HOUR, 3 * HOUR, "%a %H:%M", false, GridAlign::Seconds),
    row(WEEK, DAY, 3 * HOUR, "%a", true, GridAlign::Seconds),
    row(WEEK, 2 * DAY, 6 * HOUR, "%a", true, GridAlign::Seconds),
    row(MONTH, DAY, 6 * HOUR, "%a %d", true, GridAlign::Seconds),
    row(MONTH, DAY, 6 * HOUR, "%d", true, GridAlign::Seconds),
    row(YEAR, WEEK, DAY, "week %V", true, GridAlign::Week),
    row(YEAR, MONTH, WEEK, "%b", true, GridAlign::Month),
];

/// Number of rows in the static grid table.
pub const GRID_TABLE_LEN: usize = GRID_TABLE.len();

/// Input of [`select_time_grid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeGridRequest {
    pub data_start: Timestamp,
    pub data_end: Timestamp,
    /// Plot width in pixels.
    pub width_px: f64,
    /// Sample instant used to measure representative labels.
    pub now: Timestamp,
}

/// Which rule produced a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridSource {
    Table { row: usize },
    YearFallback { years_per_label: i64 },
}

/// Time-axis grid: three aligned cursors plus the label format.
#[derive(Debug, Clone)]
pub struct TimeGrid<Tz: TimeZone> {
    pub format: &'static str,
    pub centered: bool,
    pub minor: CalendarStep<Tz>,
    pub major: CalendarStep<Tz>,
    pub label: CalendarStep<Tz>,
    pub source: GridSource,
}

/// Picks the finest grid whose labels fit into `width_px`.
///
/// `measure` returns the rendered width of a label in pixels. Returns `None`
/// for an empty window or a non-positive width.
pub fn select_time_grid<Tz, F>(
    tz: &Tz,
    request: TimeGridRequest,
    measure: F,
) -> Option<TimeGrid<Tz>>
where
    Tz: TimeZone,
    F: Fn(&str) -> f64,
{
    let span = request.data_end.checked_sub(request.data_start)?;
    if span <= 0 || !request.width_px.is_finite() || request.width_px <= 0.0 {
        return None;
    }
    let start = request.data_start;

    for (index, row) in GRID_TABLE.iter().enumerate() {
        if span >= row.max_span {
            continue;
        }
        let Some(sample) = format_local(tz, request.now, row.format) else {
            continue;
        };
        let estimate = measure(&sample) * (span as f64 / row.major as f64) * LABEL_SPACING_FACTOR;
        if estimate > request.width_px {
            continue;
        }

        trace!(row = index, span, estimate, "time grid row selected");
        let (minor, major) = match row.align {
            GridAlign::Seconds => (
                CalendarStep::new(tz.clone(), start, row.minor, StepUnit::Seconds),
                CalendarStep::new(tz.clone(), start, row.major, StepUnit::Seconds),
            ),
            GridAlign::Week => (
                CalendarStep::new(tz.clone(), start, DAY, StepUnit::Seconds),
                CalendarStep::new(tz.clone(), start, 1, StepUnit::Weeks),
            ),
            GridAlign::Month => (
                CalendarStep::new(tz.clone(), start, 1, StepUnit::Weeks),
                CalendarStep::new(tz.clone(), start, 1, StepUnit::Months),
            ),
        };
        return Some(TimeGrid {
            format: row.format,
            centered: row.centered,
            label: major.clone(),
            minor,
            major,
            source: GridSource::Table { row: index },
        });
    }

    let label_width = format_local(tz, request.now, "%Y")
        .map_or(0.0, |sample| measure(&sample))
        * LABEL_SPACING_FACTOR;
    // Fixed point with a 4-bit fraction.
    let num = (span as f64 * label_width * 16.0 / (YEAR as f64 * request.width_px)).floor() as i64;
    let (minor, years, centered) = if num < 16 {
        (CalendarStep::new(tz.clone(), start, 1, StepUnit::Months), 1, true)
    } else {
        let years = (num + 15) / 16;
        (CalendarStep::new(tz.clone(), start, 1, StepUnit::Years), years, false)
    };
    trace!(span, num, years, "time grid year fallback");
    let major = CalendarStep::new(tz.clone(), start, years, StepUnit::Years);

    Some(TimeGrid {
        format: "%Y",
        centered,
        label: major.clone(),
        minor,
        major,
        source: GridSource::YearFallback {
            years_per_label: years,
        },
    })
}
