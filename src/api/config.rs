use serde::{Deserialize, Serialize};

use crate::api::RenderTheme;
use crate::error::{GraphError, GraphResult};

/// Viewer configuration.
///
/// Serializable so hosts can keep it next to their own settings; every field
/// falls back to its default when missing from the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub theme: RenderTheme,
    #[serde(default = "default_span_secs")]
    pub default_span_secs: i64,
    #[serde(default = "default_auto_update_interval_secs")]
    pub auto_update_interval_secs: u64,
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    #[serde(default = "default_label_precision")]
    pub label_precision: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            theme: RenderTheme::default(),
            default_span_secs: default_span_secs(),
            auto_update_interval_secs: default_auto_update_interval_secs(),
            zoom_step: default_zoom_step(),
            label_precision: default_label_precision(),
        }
    }
}

impl ViewerConfig {
    #[must_use]
    pub fn with_theme(mut self, theme: RenderTheme) -> Self {
        self.theme = theme;
        self
    }

    #[must_use]
    pub fn with_default_span_secs(mut self, span: i64) -> Self {
        self.default_span_secs = span;
        self
    }

    #[must_use]
    pub fn with_zoom_step(mut self, zoom_step: f64) -> Self {
        self.zoom_step = zoom_step;
        self
    }

    pub fn validate(&self) -> GraphResult<()> {
        if self.default_span_secs <= 0 {
            return Err(GraphError::InvalidConfig(
                "default span must be > 0".to_owned(),
            ));
        }
        if self.auto_update_interval_secs == 0 {
            return Err(GraphError::InvalidConfig(
                "auto update interval must be > 0".to_owned(),
            ));
        }
        if !self.zoom_step.is_finite() || self.zoom_step <= 1.0 {
            return Err(GraphError::InvalidConfig(
                "zoom step must be finite and > 1".to_owned(),
            ));
        }
        if self.label_precision == 0 {
            return Err(GraphError::InvalidConfig(
                "label precision must be > 0".to_owned(),
            ));
        }
        self.theme.validate()
    }

    /// Serializes config to pretty JSON.
    pub fn to_json_string(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::InvalidConfig(format!("failed to serialize config: {e}")))
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> GraphResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| GraphError::InvalidConfig(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

fn default_span_secs() -> i64 {
    24 * 3600
}

fn default_auto_update_interval_secs() -> u64 {
    10
}

fn default_zoom_step() -> f64 {
    // Cube root of two: three wheel steps double the span.
    1.259_921_050
}

fn default_label_precision() -> usize {
    6
}
