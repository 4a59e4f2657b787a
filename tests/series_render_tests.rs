use chrono::Utc;
use strip_graph::api::{
    EstimatedTextMetrics, FetchRequest, FetchedSeries, GraphDocument, GraphView, ManualClock,
    MemoryProvider, RenderContext, RenderTheme, TimeSeriesProvider, ViewerConfig,
    build_render_frame, draw_x_labels, header_text, layout,
};
use strip_graph::core::{CalendarStep, GridSource, LinearMap, StepUnit, TimeGrid, Viewport};
use strip_graph::render::{DrawCommand, NullRenderer, RenderFrame, TextHAlign};

const NOW: i64 = 1_700_000_000;
const START: i64 = 1_699_990_000;
const NAN: f64 = f64::NAN;

fn gapped_view() -> GraphView<NullRenderer, MemoryProvider, Utc> {
    let mut provider = MemoryProvider::new();
    provider.insert_all(
        "host",
        "temp",
        START,
        10,
        vec![1.0, NAN, 2.0, 3.0, NAN, NAN, 4.0],
    );
    let mut document = GraphDocument::new(ManualClock::new(NOW), 70).expect("document");
    document
        .add_series_in_new_panel("host", "temp", "temperature")
        .expect("add series");
    document.set_window(START, 70).expect("window");
    GraphView::new(
        document,
        NullRenderer::default(),
        provider,
        Utc,
        Viewport::new(800, 400),
        ViewerConfig::default(),
    )
    .expect("view")
}

fn position(frame: &RenderFrame, predicate: impl Fn(&DrawCommand) -> bool) -> Option<usize> {
    frame.commands.iter().position(predicate)
}

#[test]
fn gaps_split_lines_and_bands() {
    let mut view = gapped_view();
    let frame = view.render().expect("render");

    // Average runs [0..1, 2..4, 6..7]: only the two-sample run is drawn.
    let polylines: Vec<_> = frame.polylines().collect();
    assert_eq!(polylines.len(), 1);
    assert_eq!(polylines[0].points.len(), 2);
    // Every envelope run is filled, even single samples.
    assert_eq!(frame.polygons().count(), 3);
    assert_eq!(view.renderer().last_polyline_count, 1);
}

#[test]
fn samples_are_spread_over_the_plot_width() {
    let mut view = gapped_view();
    let frame = view.render().expect("render");
    let rect = view.layout().graph_rect;

    let line = frame.polylines().next().expect("line");
    let step = rect.width / 6.0;
    approx::assert_relative_eq!(line.points[0].0, rect.left + 2.0 * step, epsilon = 1e-9);
    approx::assert_relative_eq!(line.points[1].0, rect.left + 3.0 * step, epsilon = 1e-9);
    // Higher values sit higher on screen.
    assert!(line.points[1].1 < line.points[0].1);
}

#[test]
fn bands_are_painted_before_lines_and_after_grid() {
    let mut view = gapped_view();
    let frame = view.render().expect("render");

    let header = position(&frame, |command| matches!(command, DrawCommand::Text(_)))
        .expect("header");
    let background = position(&frame, |command| matches!(command, DrawCommand::Rect(_)))
        .expect("background");
    let first_line = position(&frame, |command| matches!(command, DrawCommand::Line(_)))
        .expect("grid");
    let first_band = position(&frame, |command| matches!(command, DrawCommand::Polygon(_)))
        .expect("band");
    let first_polyline = position(&frame, |command| matches!(command, DrawCommand::Polyline(_)))
        .expect("line");

    assert_eq!(header, 0);
    assert!(background < first_line);
    assert!(first_line < first_band);
    assert!(first_band < first_polyline);
}

/// Answers every request with one sample covering the whole window.
#[derive(Debug, Default)]
struct SingleSampleProvider;

impl TimeSeriesProvider for SingleSampleProvider {
    fn fetch(&mut self, request: &FetchRequest) -> FetchedSeries {
        FetchedSeries {
            start: request.start,
            end: request.end,
            step: request.end - request.start,
            values: vec![5.0],
        }
    }
}

#[test]
fn single_sample_series_draws_nothing() {
    let mut document = GraphDocument::new(ManualClock::new(NOW), 60).expect("document");
    document
        .add_series_in_new_panel("host", "temp", "temp")
        .expect("add series");
    document.set_window(START, 50).expect("window");
    let mut view = GraphView::new(
        document,
        NullRenderer::default(),
        SingleSampleProvider,
        Utc,
        Viewport::new(600, 300),
        ViewerConfig::default(),
    )
    .expect("view");

    let frame = view.render().expect("render");
    let panel = view.document().panels().next().expect("panel");
    assert_eq!(panel.series().next().map(|series| series.len()), Some(1));
    // The panel still gets its background and axes.
    assert!(frame.rects().next().is_some());
    assert_eq!(frame.polylines().count(), 0);
    assert_eq!(frame.polygons().count(), 0);
}

#[test]
fn series_colors_follow_panel_position() {
    let mut provider = MemoryProvider::new();
    provider.insert_all("host", "rx", START, 10, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    provider.insert_all("host", "tx", START, 10, vec![7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
    let mut document = GraphDocument::new(ManualClock::new(NOW), 60).expect("document");
    let panel = document.add_panel();
    document.add_series(panel, "host", "rx", "rx").expect("rx");
    document.add_series(panel, "host", "tx", "tx").expect("tx");
    document.set_window(START, 60).expect("window");
    let mut view = GraphView::new(
        document,
        NullRenderer::default(),
        provider,
        Utc,
        Viewport::new(800, 400),
        ViewerConfig::default(),
    )
    .expect("view");

    let frame = view.render().expect("render");
    let theme = RenderTheme::default();
    let colors: Vec<_> = frame.polylines().map(|line| line.color).collect();
    assert_eq!(colors, vec![theme.series_color(0), theme.series_color(1)]);
    let bands: Vec<_> = frame.polygons().map(|band| band.fill_color).collect();
    assert_eq!(bands, vec![theme.band_color(0), theme.band_color(1)]);

    let legend: Vec<_> = frame
        .texts()
        .filter(|text| text.text == "rx" || text.text == "tx")
        .map(|text| text.text.as_str())
        .collect();
    assert_eq!(legend, vec!["rx", "tx"]);
}

#[test]
fn empty_document_draws_only_the_hint() {
    let document = GraphDocument::new(ManualClock::new(NOW), 3_600).expect("document");
    let theme = RenderTheme::default();
    let geometry = layout(
        Viewport::new(400, 300),
        document.panels(),
        &EstimatedTextMetrics,
        &theme,
    );
    let ctx = RenderContext {
        theme: &theme,
        metrics: &EstimatedTextMetrics,
        tz: &Utc,
        now: NOW,
        label_precision: 6,
    };

    let frame = build_render_frame(&document, &geometry, &ctx).expect("frame");
    assert_eq!(frame.len(), 1);
    let hint = frame.texts().next().expect("hint");
    assert_eq!(hint.text, theme.empty_hint);
    assert_eq!(hint.h_align, TextHAlign::Center);
    assert_eq!((hint.x, hint.y), (200.0, 150.0));
}

#[test]
fn panel_without_samples_is_skipped() {
    let mut document = GraphDocument::new(ManualClock::new(NOW), 3_600).expect("document");
    document
        .add_series_in_new_panel("host", "missing", "missing")
        .expect("add series");
    let mut view = GraphView::new(
        document,
        NullRenderer::default(),
        MemoryProvider::new(),
        Utc,
        Viewport::new(400, 300),
        ViewerConfig::default(),
    )
    .expect("view");

    let frame = view.render().expect("render");
    assert_eq!(frame.rects().count(), 0);
    assert_eq!(frame.lines().count(), 0);
    // Only the header remains.
    assert_eq!(frame.texts().count(), 1);
}

#[test]
fn header_names_the_data_window() {
    let mut view = gapped_view();
    let frame = view.render().expect("render");
    let header = frame.texts().next().expect("header");
    let expected = header_text(&Utc, START, START + 70).expect("header text");
    assert_eq!(header.text, expected);
    assert!(header.text.starts_with("from "));
    assert!(header.text.contains(" to "));
}

#[test]
fn value_labels_are_right_aligned_in_the_gutter() {
    let mut view = gapped_view();
    let frame = view.render().expect("render");
    let left = view.layout().graph_rect.left;
    let right_aligned: Vec<_> = frame
        .texts()
        .filter(|text| text.h_align == TextHAlign::Right)
        .collect();
    assert!(!right_aligned.is_empty());
    assert!(right_aligned.iter().all(|text| text.x < left));
}

#[test]
fn week_grid_lines_stay_inside_the_plot() {
    // Wednesday noon, so the week cursor aligns to the Monday before.
    let start = 1_694_606_400;
    let span = 60 * 86_400;
    let mut provider = MemoryProvider::new();
    let hourly: Vec<f64> = (0..1_440_i32).map(|i| f64::from(i % 24)).collect();
    provider.insert_all("host", "temp", start, 3_600, hourly);
    let mut document =
        GraphDocument::new(ManualClock::new(start + span), span).expect("document");
    document
        .add_series_in_new_panel("host", "temp", "temp")
        .expect("add series");
    document.set_window(start, span).expect("window");
    let mut view = GraphView::new(
        document,
        NullRenderer::default(),
        provider,
        Utc,
        Viewport::new(800, 400),
        ViewerConfig::default(),
    )
    .expect("view");

    let frame = view.render().expect("render");
    let rect = view.layout().graph_rect;
    let theme = RenderTheme::default();
    let vertical: Vec<_> = frame.lines().filter(|line| line.x1 == line.x2).collect();
    assert!(vertical.iter().any(|line| line.color == theme.major_grid_color));
    for line in vertical {
        assert!(line.x1 >= rect.left - 1e-6, "line at {} left of {}", line.x1, rect.left);
        assert!(line.x1 <= rect.right() + 1e-6);
    }
}

#[test]
fn time_labels_respect_the_density_floor() {
    let day = 86_400;
    let mut document = GraphDocument::new(ManualClock::new(NOW), day).expect("document");
    document
        .add_series_in_new_panel("host", "temp", "temp")
        .expect("add series");
    let theme = RenderTheme::default();
    let geometry = layout(
        Viewport::new(800, 400),
        document.panels(),
        &EstimatedTextMetrics,
        &theme,
    );
    let panel = geometry.panels.first().expect("panel");
    let rect = geometry.plot_rect(panel);
    let xmap = LinearMap::new((NOW - day) as f64, rect.left, NOW as f64, rect.right())
        .expect("xmap");
    let ctx = RenderContext {
        theme: &theme,
        metrics: &EstimatedTextMetrics,
        tz: &Utc,
        now: NOW,
        label_precision: 6,
    };
    let grid_every = |seconds: i64| {
        let step = CalendarStep::new(Utc, NOW - day, seconds, StepUnit::Seconds);
        TimeGrid {
            format: "%H:%M",
            centered: false,
            minor: step.clone(),
            major: step.clone(),
            label: step,
            source: GridSource::Table { row: 0 },
        }
    };

    // One minute is well under a pixel at this width.
    let mut dense = RenderFrame::new(geometry.surface);
    draw_x_labels(&mut dense, &grid_every(60), xmap, NOW, rect, panel, &ctx);
    assert_eq!(dense.texts().count(), 0);

    let mut sparse = RenderFrame::new(geometry.surface);
    draw_x_labels(&mut sparse, &grid_every(6 * 3_600), xmap, NOW, rect, panel, &ctx);
    assert!(sparse.texts().count() >= 3);
}
