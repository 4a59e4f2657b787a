pub mod calendar;
pub mod runs;
pub mod scale;
pub mod time_grid;
pub mod types;
pub mod value_scale;

pub use calendar::{CalendarStep, CalendarTicks, StepUnit, format_local};
pub use runs::{RunList, Sample, envelope_runs, present_runs, samples_from_raw};
pub use scale::LinearMap;
pub use time_grid::{GridSource, TimeGrid, TimeGridRequest, select_time_grid};
pub use types::{PixelRect, Timestamp, Viewport};
pub use value_scale::{
    NormalizedRange, SiPrefix, ValueRange, adapt_label_step, adapt_line_step, format_number,
    normalize_range, sample_range, si_prefix, value_ticks,
};
