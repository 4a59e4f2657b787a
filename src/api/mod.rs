mod clock;
mod config;
mod document;
mod layout;
mod provider;
mod series_renderer;
mod text_metrics;
mod theme;
mod view;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ViewerConfig;
pub use document::{
    DocumentSnapshot, GraphDocument, Panel, PanelId, Series, SeriesId, SeriesKey, TimeWindow,
};
pub use layout::{
    DocumentLayout, GUTTER_SAMPLE_LABEL, PanelGeometry, compute_legend_lines, layout,
    legend_entry_width, legend_rows_for_widths,
};
pub use provider::{
    Aggregation, FetchRequest, FetchedSeries, MemoryProvider, MetadataProvider,
    TimeSeriesProvider,
};
pub use series_renderer::{
    RenderContext, build_render_frame, draw_bands_and_lines, draw_header, draw_legend,
    draw_x_labels, draw_x_lines, draw_y_labels, draw_y_lines, header_format, header_text,
};
pub use text_metrics::{EstimatedTextMetrics, TextMetrics};
pub use theme::{PALETTE_LEN, RenderTheme};
pub use view::{GraphView, InputEvent};
