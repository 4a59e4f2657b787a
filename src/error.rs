use thiserror::Error;

use crate::api::{PanelId, SeriesId};

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid time window: start={start}, span={span}")]
    InvalidTimeWindow { start: i64, span: i64 },

    #[error("unknown panel: {0:?}")]
    UnknownPanel(PanelId),

    #[error("unknown series {series:?} in panel {panel:?}")]
    UnknownSeries { panel: PanelId, series: SeriesId },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
