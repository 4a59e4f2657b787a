use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::Timestamp;

/// Consolidation function requested from the round-robin store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Aggregation {
    Average,
    Min,
    Max,
}

impl Aggregation {
    /// Fetch order used by the document.
    pub const ALL: [Self; 3] = [Self::Average, Self::Min, Self::Max];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Average => "AVERAGE",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// One fetch call: a metric of a source over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub source: String,
    pub metric: String,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Preferred resolution in seconds; providers may return a coarser one.
    pub step_hint: i64,
    pub aggregation: Aggregation,
}

/// Dense values covering `[start, end)` at `step` seconds per value.
///
/// Missing samples are NaN. Empty `values` means the fetch failed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchedSeries {
    pub start: Timestamp,
    pub end: Timestamp,
    pub step: i64,
    pub values: Vec<f64>,
}

impl FetchedSeries {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn same_window(&self, other: &Self) -> bool {
        self.start == other.start
            && self.end == other.end
            && self.step == other.step
            && self.values.len() == other.values.len()
    }
}

/// Source of time-series data. Failures are reported as empty data.
pub trait TimeSeriesProvider {
    fn fetch(&mut self, request: &FetchRequest) -> FetchedSeries;
}

impl<P: TimeSeriesProvider + ?Sized> TimeSeriesProvider for &mut P {
    fn fetch(&mut self, request: &FetchRequest) -> FetchedSeries {
        (**self).fetch(request)
    }
}

impl<P: TimeSeriesProvider + ?Sized> TimeSeriesProvider for Box<P> {
    fn fetch(&mut self, request: &FetchRequest) -> FetchedSeries {
        (**self).fetch(request)
    }
}

/// Lists the metrics available in a source.
pub trait MetadataProvider {
    fn list_metrics(&self, source: &str) -> BTreeSet<String>;
}

#[derive(Debug, Clone, PartialEq)]
struct StoredSeries {
    start: Timestamp,
    step: i64,
    values: BTreeMap<Aggregation, Vec<f64>>,
}

/// In-memory provider with fixed-step series, sliced to the requested window.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: BTreeMap<(String, String), StoredSeries>,
    fetch_count: usize,
}

impl MemoryProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `values` for one aggregation; later inserts replace earlier
    /// ones. All aggregations of a metric share `start` and `step`.
    pub fn insert(
        &mut self,
        source: impl Into<String>,
        metric: impl Into<String>,
        aggregation: Aggregation,
        start: Timestamp,
        step: i64,
        values: Vec<f64>,
    ) {
        let entry = self
            .series
            .entry((source.into(), metric.into()))
            .or_insert_with(|| StoredSeries {
                start,
                step: step.max(1),
                values: BTreeMap::new(),
            });
        entry.start = start;
        entry.step = step.max(1);
        entry.values.insert(aggregation, values);
    }

    /// Stores the same values for average, min and max.
    pub fn insert_all(
        &mut self,
        source: impl Into<String>,
        metric: impl Into<String>,
        start: Timestamp,
        step: i64,
        values: Vec<f64>,
    ) {
        let source = source.into();
        let metric = metric.into();
        for aggregation in Aggregation::ALL {
            self.insert(
                source.clone(),
                metric.clone(),
                aggregation,
                start,
                step,
                values.clone(),
            );
        }
    }

    /// Number of `fetch` calls served so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }
}

impl TimeSeriesProvider for MemoryProvider {
    fn fetch(&mut self, request: &FetchRequest) -> FetchedSeries {
        self.fetch_count += 1;
        let key = (request.source.clone(), request.metric.clone());
        let Some(stored) = self.series.get(&key) else {
            return FetchedSeries::empty();
        };
        let Some(values) = stored.values.get(&request.aggregation) else {
            return FetchedSeries::empty();
        };
        if request.end <= request.start || values.is_empty() {
            return FetchedSeries::empty();
        }

        let step = stored.step;
        // Align the window outward to the stored step grid.
        let first = (request.start - stored.start).div_euclid(step);
        let last = (request.end - stored.start + step - 1).div_euclid(step);
        let slice: Vec<f64> = (first..last)
            .map(|index| {
                usize::try_from(index)
                    .ok()
                    .and_then(|index| values.get(index).copied())
                    .unwrap_or(f64::NAN)
            })
            .collect();

        FetchedSeries {
            start: stored.start + first * step,
            end: stored.start + last * step,
            step,
            values: slice,
        }
    }
}

impl MetadataProvider for MemoryProvider {
    fn list_metrics(&self, source: &str) -> BTreeSet<String> {
        self.series
            .keys()
            .filter(|(stored_source, _)| stored_source == source)
            .map(|(_, metric)| metric.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Aggregation, FetchRequest, MemoryProvider, MetadataProvider, TimeSeriesProvider};

    fn request(start: i64, end: i64, aggregation: Aggregation) -> FetchRequest {
        FetchRequest {
            source: "host/load".to_owned(),
            metric: "shortterm".to_owned(),
            start,
            end,
            step_hint: 1,
            aggregation,
        }
    }

    #[test]
    fn slices_to_the_requested_window_and_pads_with_nan() {
        let mut provider = MemoryProvider::new();
        provider.insert(
            "host/load",
            "shortterm",
            Aggregation::Average,
            100,
            10,
            vec![1.0, 2.0, 3.0, 4.0],
        );

        let fetched = provider.fetch(&request(115, 150, Aggregation::Average));
        assert_eq!(fetched.start, 110);
        assert_eq!(fetched.end, 150);
        assert_eq!(fetched.step, 10);
        assert_eq!(fetched.values.len(), 4);
        assert_eq!(fetched.values[0], 2.0);
        assert!(fetched.values[3].is_nan());
    }

    #[test]
    fn window_is_half_open() {
        let mut provider = MemoryProvider::new();
        provider.insert_all("host/load", "shortterm", 0, 10, (0..10_i32).map(f64::from).collect());

        let fetched = provider.fetch(&request(0, 60, Aggregation::Average));
        assert_eq!((fetched.start, fetched.end), (0, 60));
        assert_eq!(fetched.values.len(), 6);
        assert_eq!(fetched.values[5], 5.0);
        assert_eq!(
            i64::try_from(fetched.values.len()).expect("len"),
            (fetched.end - fetched.start) / fetched.step
        );
    }

    #[test]
    fn unknown_metric_or_aggregation_is_empty() {
        let mut provider = MemoryProvider::new();
        provider.insert("host/load", "shortterm", Aggregation::Average, 0, 10, vec![1.0]);
        assert!(provider.fetch(&request(0, 10, Aggregation::Max)).is_empty());
        assert_eq!(provider.fetch_count(), 1);
    }

    #[test]
    fn lists_metrics_per_source() {
        let mut provider = MemoryProvider::new();
        provider.insert_all("host/load", "shortterm", 0, 10, vec![1.0]);
        provider.insert_all("host/load", "midterm", 0, 10, vec![1.0]);
        provider.insert_all("host/cpu", "idle", 0, 10, vec![1.0]);
        let metrics = provider.list_metrics("host/load");
        assert_eq!(metrics.into_iter().collect::<Vec<_>>(), vec!["midterm", "shortterm"]);
    }
}
