//! strip-graph: layout and rendering core for stacked time-series strip charts.
//!
//! A [`GraphDocument`] holds panels of round-robin metrics and a time window.
//! [`GraphView`] fetches data through a [`TimeSeriesProvider`], lays the
//! panels out and emits a backend-agnostic [`render::RenderFrame`] with
//! calendar-aligned time grids, SI-prefixed value axes, min/max bands and
//! average lines.

pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod telemetry;

pub use api::{GraphDocument, GraphView, TimeSeriesProvider, ViewerConfig};
pub use error::{GraphError, GraphResult};
