use chrono::TimeZone;
use tracing::{debug, trace};

use crate::api::{
    DocumentLayout, EstimatedTextMetrics, GraphDocument, PanelId, RenderContext, TextMetrics,
    TimeSeriesProvider, ViewerConfig, build_render_frame, layout,
};
use crate::core::{Timestamp, Viewport};
use crate::error::GraphResult;
use crate::render::{RenderFrame, Renderer};

/// Host input translated into document mutations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Primary button pressed at surface coordinates.
    DragStart { x: f64, y: f64 },
    DragMove { x: f64, y: f64 },
    DragEnd,
    /// Wheel rotation; positive zooms in, negative zooms out.
    Wheel { delta: f64 },
    Resize { width: u32, height: u32 },
    /// Auto-update timer fired.
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    x: f64,
    data_start: Timestamp,
    data_end: Timestamp,
}

/// Owns a document with its data provider and backend, and turns input and
/// redraw requests into document mutations and frames.
#[derive(Debug)]
pub struct GraphView<R, P, Tz, M = EstimatedTextMetrics>
where
    R: Renderer,
    P: TimeSeriesProvider,
    Tz: TimeZone,
    M: TextMetrics,
{
    document: GraphDocument,
    renderer: R,
    provider: P,
    tz: Tz,
    metrics: M,
    config: ViewerConfig,
    viewport: Viewport,
    layout: Option<DocumentLayout>,
    drag: Option<DragOrigin>,
}

impl<R, P, Tz> GraphView<R, P, Tz, EstimatedTextMetrics>
where
    R: Renderer,
    P: TimeSeriesProvider,
    Tz: TimeZone,
{
    pub fn new(
        document: GraphDocument,
        renderer: R,
        provider: P,
        tz: Tz,
        viewport: Viewport,
        config: ViewerConfig,
    ) -> GraphResult<Self> {
        let viewport = viewport.validate()?;
        config.validate()?;
        Ok(Self {
            document,
            renderer,
            provider,
            tz,
            metrics: EstimatedTextMetrics,
            config,
            viewport,
            layout: None,
            drag: None,
        })
    }
}

impl<R, P, Tz, M> GraphView<R, P, Tz, M>
where
    R: Renderer,
    P: TimeSeriesProvider,
    Tz: TimeZone,
    M: TextMetrics,
{
    /// Swaps the text measurement backend.
    #[must_use]
    pub fn with_text_metrics<M2: TextMetrics>(self, metrics: M2) -> GraphView<R, P, Tz, M2> {
        GraphView {
            document: self.document,
            renderer: self.renderer,
            provider: self.provider,
            tz: self.tz,
            metrics,
            config: self.config,
            viewport: self.viewport,
            layout: None,
            drag: None,
        }
    }

    #[must_use]
    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut GraphDocument {
        &mut self.document
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) -> GraphResult<()> {
        self.viewport = viewport.validate()?;
        self.layout = None;
        Ok(())
    }

    /// Current geometry, recomputed when the panel list or surface changed.
    pub fn layout(&mut self) -> &DocumentLayout {
        if self.document.layout_dirty() {
            self.layout = None;
        }
        let document = &mut self.document;
        let viewport = self.viewport;
        let metrics = &self.metrics;
        let theme = &self.config.theme;
        self.layout.get_or_insert_with(|| {
            let computed = layout(viewport, document.panels(), metrics, theme);
            document.set_min_span(computed.plot_width() as i64);
            document.mark_layout_clean();
            trace!(panels = computed.panels.len(), "layout recomputed");
            computed
        })
    }

    /// Panel under surface row `y`.
    pub fn panel_at(&mut self, y: f64) -> Option<PanelId> {
        self.layout().panel_at(y)
    }

    /// Fetches stale data and builds the frame without rendering it.
    pub fn build_frame(&mut self) -> GraphResult<RenderFrame> {
        self.document.fetch_if_needed(&mut self.provider);
        self.layout();
        let Some(layout) = self.layout.as_ref() else {
            return Ok(RenderFrame::new(self.viewport));
        };
        let ctx = RenderContext {
            theme: &self.config.theme,
            metrics: &self.metrics,
            tz: &self.tz,
            now: self.document.now(),
            label_precision: self.config.label_precision,
        };
        build_render_frame(&self.document, layout, &ctx)
    }

    /// Builds a fresh frame and hands it to the renderer.
    pub fn render(&mut self) -> GraphResult<RenderFrame> {
        let frame = self.build_frame()?;
        self.renderer.render(&frame)?;
        Ok(frame)
    }

    /// Applies one input event; returns `true` when a redraw is needed.
    pub fn handle_input(&mut self, event: InputEvent) -> GraphResult<bool> {
        match event {
            InputEvent::DragStart { x, .. } => {
                let window = self.document.window();
                self.drag = Some(DragOrigin {
                    x,
                    data_start: window.data_start,
                    data_end: window.data_end,
                });
                Ok(false)
            }
            InputEvent::DragMove { x, y } => Ok(self.drag_to(x, y)),
            InputEvent::DragEnd => {
                self.drag = None;
                Ok(false)
            }
            InputEvent::Wheel { delta } => {
                let step = self.config.zoom_step;
                let factor = if delta < 0.0 { step } else { 1.0 / step };
                self.document.zoom(factor)
            }
            InputEvent::Resize { width, height } => {
                self.set_viewport(Viewport::new(width, height))?;
                Ok(true)
            }
            InputEvent::Tick => Ok(self.document.on_tick()),
        }
    }

    fn drag_to(&mut self, x: f64, y: f64) -> bool {
        if self.document.auto_update() {
            return false;
        }
        let Some(origin) = self.drag else {
            return false;
        };
        let viewport = self.viewport;
        let graph_rect = self.layout().graph_rect;
        if x < graph_rect.left || x >= graph_rect.right() || graph_rect.width <= 0.0 {
            return false;
        }
        if y < 0.0 || y >= f64::from(viewport.height) {
            return false;
        }

        let span = (origin.data_end - origin.data_start) as f64;
        let offset = ((x - origin.x) * span / graph_rect.width) as i64;
        let target = origin.data_start - offset;
        let current = self.document.window().requested_start;
        self.document.pan(target - current);
        debug!(offset, start = self.document.window().requested_start, "dragged");
        true
    }
}
