use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::clock::{Clock, SystemClock};
use crate::api::provider::{Aggregation, FetchRequest, FetchedSeries, TimeSeriesProvider};
use crate::core::{
    NormalizedRange, Sample, Timestamp, ValueRange, normalize_range, sample_range,
    samples_from_raw,
};
use crate::error::{GraphError, GraphResult};

/// Share of the span kept behind "now" when following live data.
const LIVE_SPAN_RATIO: f64 = 0.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelId(u32);

impl PanelId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesId(u32);

impl SeriesId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Identifies a metric of a data source plus its legend label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub source: String,
    pub metric: String,
    pub label: String,
}

impl SeriesKey {
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        metric: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            metric: metric.into(),
            label: label.into(),
        }
    }
}

/// One plotted metric with its average, min and max samples.
///
/// The three sample vectors always have the same length, or are all empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    id: SeriesId,
    key: SeriesKey,
    avg: Vec<Sample>,
    min: Vec<Sample>,
    max: Vec<Sample>,
}

impl Series {
    fn new(id: SeriesId, key: SeriesKey) -> Self {
        Self {
            id,
            key,
            avg: Vec::new(),
            min: Vec::new(),
            max: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> SeriesId {
        self.id
    }

    #[must_use]
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.key.label
    }

    #[must_use]
    pub fn avg(&self) -> &[Sample] {
        &self.avg
    }

    #[must_use]
    pub fn min(&self) -> &[Sample] {
        &self.min
    }

    #[must_use]
    pub fn max(&self) -> &[Sample] {
        &self.max
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.avg.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.avg.is_empty()
    }

    #[must_use]
    pub fn value_range(&self) -> Option<ValueRange> {
        sample_range(&self.avg, &self.min, &self.max)
    }

    /// Replaces all three sample vectors.
    pub fn set_samples(
        &mut self,
        avg: Vec<Sample>,
        min: Vec<Sample>,
        max: Vec<Sample>,
    ) -> GraphResult<()> {
        if avg.len() != min.len() || avg.len() != max.len() {
            return Err(GraphError::InvalidData(format!(
                "series samples must have equal lengths: avg={}, min={}, max={}",
                avg.len(),
                min.len(),
                max.len()
            )));
        }
        self.avg = avg;
        self.min = min;
        self.max = max;
        Ok(())
    }

    fn clear_samples(&mut self) {
        self.avg.clear();
        self.min.clear();
        self.max.clear();
    }
}

/// A horizontal strip showing one or more series on a shared value axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    id: PanelId,
    series: IndexMap<SeriesId, Series>,
}

impl Panel {
    fn new(id: PanelId) -> Self {
        Self {
            id,
            series: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    #[must_use]
    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Union of all series ranges; `None` when no series has a sample.
    #[must_use]
    pub fn value_range(&self) -> Option<ValueRange> {
        self.series
            .values()
            .map(Series::value_range)
            .fold(None, ValueRange::merge)
    }

    #[must_use]
    pub fn normalized_range(&self) -> Option<NormalizedRange> {
        normalize_range(self.value_range())
    }
}

/// Requested window plus what the provider actually returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub requested_start: Timestamp,
    pub requested_span: i64,
    pub data_start: Timestamp,
    pub data_end: Timestamp,
    pub step: i64,
}

impl TimeWindow {
    fn requested(start: Timestamp, span: i64) -> Self {
        Self {
            requested_start: start,
            requested_span: span,
            data_start: start,
            data_end: start.saturating_add(span),
            step: 1,
        }
    }

    #[must_use]
    pub fn requested_end(&self) -> Timestamp {
        self.requested_start.saturating_add(self.requested_span)
    }

    #[must_use]
    pub fn data_span(&self) -> i64 {
        self.data_end - self.data_start
    }
}

/// Serializable shape of a document: panels of series keys plus view state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub panels: Vec<Vec<SeriesKey>>,
    pub span: i64,
    #[serde(default)]
    pub auto_update: bool,
}

impl DocumentSnapshot {
    pub fn to_json_pretty(&self) -> GraphResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(input: &str) -> GraphResult<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Ordered panels, the time window and the data/auto-update state.
#[derive(Debug)]
pub struct GraphDocument {
    panels: IndexMap<PanelId, Panel>,
    window: TimeWindow,
    data_valid: bool,
    changed: bool,
    layout_dirty: bool,
    live_offset: Option<i64>,
    min_span: i64,
    next_panel_id: u32,
    next_series_id: u32,
    clock: Box<dyn Clock>,
}

impl GraphDocument {
    /// Empty document showing the `span` seconds up to now.
    pub fn new(clock: impl Clock + 'static, span: i64) -> GraphResult<Self> {
        validate_span(0, span)?;
        let now = clock.now();
        Ok(Self {
            panels: IndexMap::new(),
            window: TimeWindow::requested(now - span, span),
            data_valid: false,
            changed: false,
            layout_dirty: true,
            live_offset: None,
            min_span: 1,
            next_panel_id: 0,
            next_series_id: 0,
            clock: Box::new(clock),
        })
    }

    pub fn with_system_clock(span: i64) -> GraphResult<Self> {
        Self::new(SystemClock, span)
    }

    /// Rebuilds a document from its snapshot; the result is unchanged.
    pub fn from_snapshot(
        snapshot: &DocumentSnapshot,
        clock: impl Clock + 'static,
    ) -> GraphResult<Self> {
        let mut document = Self::new(clock, snapshot.span)?;
        for keys in &snapshot.panels {
            let panel = document.add_panel();
            for key in keys {
                document.add_series(panel, &key.source, &key.metric, &key.label)?;
            }
        }
        document.set_auto_update(snapshot.auto_update);
        document.changed = false;
        Ok(document)
    }

    #[must_use]
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            panels: self
                .panels
                .values()
                .map(|panel| panel.series().map(|series| series.key.clone()).collect())
                .collect(),
            span: self.window.requested_span,
            auto_update: self.live_offset.is_some(),
        }
    }

    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        self.panels.values()
    }

    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(&id)
    }

    #[must_use]
    pub fn panel_ids(&self) -> Vec<PanelId> {
        self.panels.keys().copied().collect()
    }

    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    #[must_use]
    pub fn data_valid(&self) -> bool {
        self.data_valid
    }

    /// Marks fetched data stale so the next render re-fetches.
    pub fn invalidate_data(&mut self) {
        self.data_valid = false;
    }

    /// `true` after structural edits not yet acknowledged with
    /// [`GraphDocument::mark_saved`].
    #[must_use]
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    #[must_use]
    pub fn layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    pub fn mark_layout_clean(&mut self) {
        self.layout_dirty = false;
    }

    pub fn mark_layout_dirty(&mut self) {
        self.layout_dirty = true;
    }

    #[must_use]
    pub fn min_span(&self) -> i64 {
        self.min_span
    }

    /// Smallest span `zoom` may shrink to, usually the plot width in pixels.
    pub fn set_min_span(&mut self, min_span: i64) {
        self.min_span = min_span.max(1);
    }

    #[must_use]
    pub fn auto_update(&self) -> bool {
        self.live_offset.is_some()
    }

    pub fn add_panel(&mut self) -> PanelId {
        let id = PanelId::new(self.next_panel_id);
        self.next_panel_id += 1;
        self.panels.insert(id, Panel::new(id));
        self.structure_changed();
        debug!(panel = id.raw(), panels = self.panels.len(), "panel added");
        id
    }

    pub fn add_series(
        &mut self,
        panel: PanelId,
        source: &str,
        metric: &str,
        label: &str,
    ) -> GraphResult<SeriesId> {
        let id = SeriesId::new(self.next_series_id);
        let target = self
            .panels
            .get_mut(&panel)
            .ok_or(GraphError::UnknownPanel(panel))?;
        target
            .series
            .insert(id, Series::new(id, SeriesKey::new(source, metric, label)));
        self.next_series_id += 1;
        self.structure_changed();
        debug!(panel = panel.raw(), series = id.raw(), source, metric, "series added");
        Ok(id)
    }

    pub fn add_series_in_new_panel(
        &mut self,
        source: &str,
        metric: &str,
        label: &str,
    ) -> GraphResult<(PanelId, SeriesId)> {
        let panel = self.add_panel();
        let series = self.add_series(panel, source, metric, label)?;
        Ok((panel, series))
    }

    /// Removes one series; an emptied panel stays until removed itself.
    pub fn remove_series(&mut self, panel: PanelId, series: SeriesId) -> GraphResult<Series> {
        let target = self
            .panels
            .get_mut(&panel)
            .ok_or(GraphError::UnknownPanel(panel))?;
        let removed = target
            .series
            .shift_remove(&series)
            .ok_or(GraphError::UnknownSeries { panel, series })?;
        self.structure_changed();
        debug!(panel = panel.raw(), series = series.raw(), "series removed");
        Ok(removed)
    }

    pub fn remove_panel(&mut self, panel: PanelId) -> GraphResult<Panel> {
        let removed = self
            .panels
            .shift_remove(&panel)
            .ok_or(GraphError::UnknownPanel(panel))?;
        self.structure_changed();
        debug!(panel = panel.raw(), panels = self.panels.len(), "panel removed");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.panels.clear();
        self.structure_changed();
        debug!("document cleared");
    }

    fn structure_changed(&mut self) {
        self.data_valid = false;
        self.layout_dirty = true;
        self.changed = true;
    }

    /// Requests the window `[start, start + span]`.
    pub fn set_window(&mut self, start: Timestamp, span: i64) -> GraphResult<()> {
        validate_span(start, span)?;
        self.window.requested_start = start;
        self.window.requested_span = span;
        if self.live_offset.is_some() {
            self.live_offset = Some(self.now() - start);
        }
        self.data_valid = false;
        Ok(())
    }

    /// Shows the last `span` seconds, leaving 1% of the span ahead of now.
    pub fn show_last(&mut self, span: i64) -> GraphResult<()> {
        validate_span(0, span)?;
        let offset = live_offset_for(span);
        self.window.requested_span = span;
        self.window.requested_start = self.now() - offset;
        if self.live_offset.is_some() {
            self.live_offset = Some(offset);
        }
        self.data_valid = false;
        debug!(span, "showing last span");
        Ok(())
    }

    /// Moves the window by `delta` seconds, never past the live edge.
    pub fn pan(&mut self, delta: i64) {
        let start = self.window.requested_start.saturating_add(delta);
        self.window.requested_start = self.clamp_to_now(start, self.window.requested_span);
        if self.live_offset.is_some() {
            self.live_offset = Some(self.now() - self.window.requested_start);
        }
        self.data_valid = false;
    }

    /// Scales the span by `factor` around the window centre.
    ///
    /// Returns `Ok(false)` without changes when zooming in would go below
    /// [`GraphDocument::min_span`].
    pub fn zoom(&mut self, factor: f64) -> GraphResult<bool> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(GraphError::InvalidData(
                "zoom factor must be finite and > 0".to_owned(),
            ));
        }
        let span = self.window.requested_span;
        let scaled = span as f64 * factor;
        if factor < 1.0 && scaled < self.min_span as f64 {
            warn!(factor, span, min_span = self.min_span, "zoom rejected");
            return Ok(false);
        }
        let new_span = scaled as i64;
        if new_span <= 0 {
            return Ok(false);
        }

        let center = self.window.requested_start + span / 2;
        let start = self.clamp_to_now(center - new_span / 2, new_span);
        self.window.requested_span = new_span;
        self.window.requested_start = start;
        if self.live_offset.is_some() {
            let offset = live_offset_for(new_span);
            self.live_offset = Some(offset);
            self.window.requested_start = self.now() - offset;
        }
        self.data_valid = false;
        debug!(factor, span = new_span, "zoomed");
        Ok(true)
    }

    /// Turns live following on or off. Turning it on re-anchors the window
    /// at now.
    pub fn set_auto_update(&mut self, enabled: bool) {
        match (enabled, self.live_offset) {
            (true, None) => {
                let offset = live_offset_for(self.window.requested_span);
                self.live_offset = Some(offset);
                self.window.requested_start = self.now() - offset;
                self.data_valid = false;
                debug!(offset, "auto update enabled");
            }
            (false, Some(_)) => {
                self.live_offset = None;
                debug!("auto update disabled");
            }
            _ => {}
        }
    }

    /// Host timer callback; returns `true` when the window moved.
    pub fn on_tick(&mut self) -> bool {
        let Some(offset) = self.live_offset else {
            return false;
        };
        self.window.requested_start = self.now() - offset;
        self.data_valid = false;
        true
    }

    fn clamp_to_now(&self, start: Timestamp, span: i64) -> Timestamp {
        let latest_end = self.now().saturating_add(span / 3);
        if start.saturating_add(span) > latest_end {
            latest_end - span
        } else {
            start
        }
    }

    /// Fetches average, min and max for every series unless data is valid.
    ///
    /// Returns `true` when the provider was consulted. The first non-empty
    /// aggregation of a series defines its window; aggregations returning a
    /// different window are treated as all-missing.
    pub fn fetch_if_needed<P: TimeSeriesProvider + ?Sized>(&mut self, provider: &mut P) -> bool {
        if self.data_valid {
            return false;
        }

        let start = self.window.requested_start;
        let end = self.window.requested_end();
        let mut data_window: Option<(Timestamp, Timestamp, i64)> = None;
        let mut fetched_series = 0_usize;

        for panel in self.panels.values_mut() {
            for series in panel.series.values_mut() {
                let results: Vec<FetchedSeries> = Aggregation::ALL
                    .iter()
                    .map(|aggregation| {
                        provider.fetch(&FetchRequest {
                            source: series.key.source.clone(),
                            metric: series.key.metric.clone(),
                            start,
                            end,
                            step_hint: 1,
                            aggregation: *aggregation,
                        })
                    })
                    .map(|fetched| {
                        if !fetched.is_empty() && fetched.end <= fetched.start {
                            warn!(
                                start = fetched.start,
                                end = fetched.end,
                                "provider returned an empty window"
                            );
                            FetchedSeries::empty()
                        } else {
                            fetched
                        }
                    })
                    .collect();

                let Some(reference) = results.iter().find(|fetched| !fetched.is_empty()).cloned()
                else {
                    series.clear_samples();
                    continue;
                };

                let len = reference.values.len();
                let mut samples = results.into_iter().zip(Aggregation::ALL).map(
                    |(fetched, aggregation)| {
                        if fetched.same_window(&reference) {
                            samples_from_raw(&fetched.values)
                        } else {
                            if !fetched.is_empty() {
                                warn!(
                                    source = %series.key.source,
                                    metric = %series.key.metric,
                                    aggregation = aggregation.as_str(),
                                    start = fetched.start,
                                    end = fetched.end,
                                    step = fetched.step,
                                    "provider window drift, aggregation dropped"
                                );
                            }
                            vec![None; len]
                        }
                    },
                );
                series.avg = samples.next().unwrap_or_default();
                series.min = samples.next().unwrap_or_default();
                series.max = samples.next().unwrap_or_default();

                data_window = Some((reference.start, reference.end, reference.step));
                fetched_series += 1;
            }
        }

        match data_window {
            Some((data_start, data_end, step)) => {
                self.window.data_start = data_start;
                self.window.data_end = data_end;
                self.window.step = step;
            }
            None => {
                self.window.data_start = start;
                self.window.data_end = end;
                self.window.step = 1;
            }
        }
        self.data_valid = true;
        debug!(
            series = fetched_series,
            data_start = self.window.data_start,
            data_end = self.window.data_end,
            "data fetched"
        );
        true
    }
}

fn validate_span(start: Timestamp, span: i64) -> GraphResult<()> {
    if span <= 0 || start.checked_add(span).is_none() {
        return Err(GraphError::InvalidTimeWindow { start, span });
    }
    Ok(())
}

fn live_offset_for(span: i64) -> i64 {
    (LIVE_SPAN_RATIO * span as f64) as i64
}
