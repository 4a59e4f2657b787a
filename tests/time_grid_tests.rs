use chrono::Utc;
use strip_graph::api::{EstimatedTextMetrics, TextMetrics};
use strip_graph::core::{GridSource, StepUnit, TimeGridRequest, select_time_grid};

const FONT_PX: f64 = 12.0;
const DAY: i64 = 86_400;

fn measure(label: &str) -> f64 {
    EstimatedTextMetrics.text_width(label, FONT_PX)
}

fn request(span: i64, width_px: f64) -> TimeGridRequest {
    TimeGridRequest {
        data_start: 1_700_000_000,
        data_end: 1_700_000_000 + span,
        width_px,
        now: 0,
    }
}

#[test]
fn two_hours_on_760_px_uses_ten_minute_majors() {
    let grid = select_time_grid(&Utc, request(7_200, 760.0), measure).expect("grid");
    assert_eq!(grid.source, GridSource::Table { row: 3 });
    assert_eq!(grid.format, "%H:%M");
    assert!(!grid.centered);
    assert_eq!(grid.major.interval(), 600);
    assert_eq!(grid.minor.interval(), 60);
    assert_eq!(grid.label.interval(), grid.major.interval());
}

#[test]
fn wider_plot_allows_finer_rows() {
    let narrow = select_time_grid(&Utc, request(7_200, 760.0), measure).expect("grid");
    let wide = select_time_grid(&Utc, request(7_200, 4_000.0), measure).expect("grid");
    assert!(wide.major.interval() < narrow.major.interval());
}

#[test]
fn span_of_exactly_one_day_skips_day_rows() {
    let grid = select_time_grid(&Utc, request(DAY, 2_000.0), measure).expect("grid");
    assert_eq!(grid.source, GridSource::Table { row: 10 });
    assert_eq!(grid.format, "%a %H:%M");
}

#[test]
fn two_months_use_week_row() {
    let grid = select_time_grid(&Utc, request(60 * DAY, 800.0), measure).expect("grid");
    assert_eq!(grid.source, GridSource::Table { row: 15 });
    assert_eq!(grid.format, "week %V");
    assert!(grid.centered);
    assert_eq!(grid.major.unit(), StepUnit::Weeks);
    assert_eq!(grid.minor.unit(), StepUnit::Seconds);
    assert_eq!(grid.minor.interval(), DAY);
}

#[test]
fn half_year_uses_month_row_with_week_minors() {
    let grid = select_time_grid(&Utc, request(200 * DAY, 800.0), measure).expect("grid");
    assert_eq!(grid.source, GridSource::Table { row: 16 });
    assert_eq!(grid.format, "%b");
    assert_eq!(grid.major.unit(), StepUnit::Months);
    assert_eq!(grid.label.unit(), StepUnit::Months);
    assert_eq!(grid.minor.unit(), StepUnit::Weeks);
}

#[test]
fn few_years_fall_back_to_yearly_labels_with_month_minors() {
    let grid = select_time_grid(&Utc, request(3 * 365 * DAY, 800.0), measure).expect("grid");
    assert_eq!(grid.source, GridSource::YearFallback { years_per_label: 1 });
    assert_eq!(grid.format, "%Y");
    assert!(grid.centered);
    assert_eq!(grid.minor.unit(), StepUnit::Months);
    assert_eq!(grid.major.unit(), StepUnit::Years);
}

#[test]
fn century_on_narrow_plot_scales_yearly_step() {
    let grid = select_time_grid(&Utc, request(100 * 365 * DAY, 300.0), measure).expect("grid");
    // "%Y" is 4 digits: 4 * 0.62 * 12 * 1.5 = 44.64 px per label.
    // num = floor(100 * 44.64 * 16 / 300) = 238 -> ceil(238 / 16) = 15 years.
    assert_eq!(grid.source, GridSource::YearFallback { years_per_label: 15 });
    assert!(!grid.centered);
    assert_eq!(grid.major.multiplier(), 15);
    assert_eq!(grid.minor.unit(), StepUnit::Years);
    assert_eq!(grid.minor.multiplier(), 1);
}

#[test]
fn oversized_table_labels_fall_back_to_years() {
    // Only four-character labels ("%Y") are narrow enough.
    let grid = select_time_grid(&Utc, request(7_200, 760.0), |label| {
        if label.len() == 4 { 1.0 } else { 1.0e9 }
    })
    .expect("grid");
    assert!(matches!(grid.source, GridSource::YearFallback { .. }));
}
