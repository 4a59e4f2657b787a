use chrono::Utc;
use strip_graph::api::{
    GraphDocument, GraphView, InputEvent, ManualClock, MemoryProvider, RenderTheme, ViewerConfig,
};
use strip_graph::core::Viewport;
use strip_graph::render::NullRenderer;
use strip_graph::GraphError;

const NOW: i64 = 1_700_000_000;
// Aligned to ten minutes.
const START: i64 = 1_699_992_000;
const SPAN: i64 = 7_200;

type TestView = GraphView<NullRenderer, MemoryProvider, Utc>;

fn two_hour_view(width: u32, clock: ManualClock) -> TestView {
    let mut provider = MemoryProvider::new();
    let samples: Vec<f64> = (0..120_i32).map(|i| f64::from(i % 30)).collect();
    provider.insert_all("router", "if_octets/rx", START, 60, samples.clone());
    provider.insert_all(
        "router",
        "if_octets/tx",
        START,
        60,
        samples.iter().map(|v| 30.0 - v).collect(),
    );

    let mut document = GraphDocument::new(clock, SPAN).expect("document");
    let panel = document.add_panel();
    document
        .add_series(panel, "router", "if_octets/rx", "rx")
        .expect("rx");
    document
        .add_series(panel, "router", "if_octets/tx", "tx")
        .expect("tx");
    document.set_window(START, SPAN).expect("window");

    GraphView::new(
        document,
        NullRenderer::default(),
        provider,
        Utc,
        Viewport::new(width, 400),
        ViewerConfig::default(),
    )
    .expect("view")
}

#[test]
fn two_hour_window_renders_ten_minute_grid() {
    // 822 px leaves a plot about 760 px wide next to the label gutter.
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    let frame = view.render().expect("render");
    let rect = view.layout().graph_rect;
    assert!((rect.width - 760.0).abs() < 1.0);

    let theme = RenderTheme::default();
    let mut major_xs: Vec<f64> = frame
        .lines()
        .filter(|line| line.color == theme.major_grid_color && line.x1 == line.x2)
        .map(|line| line.x1)
        .collect();
    major_xs.sort_by(f64::total_cmp);
    major_xs.dedup();
    assert!(major_xs.len() >= 2);

    let seconds_per_px = SPAN as f64 / rect.width;
    for pair in major_xs.windows(2) {
        let spacing = (pair[1] - pair[0]) * seconds_per_px;
        assert!(spacing <= 600.0 + 1e-6, "major spacing {spacing}s");
    }

    let colors: Vec<_> = frame.polylines().map(|line| line.color).collect();
    assert_eq!(colors, vec![theme.series_color(0), theme.series_color(1)]);

    let renderer = view.renderer();
    assert_eq!(renderer.frames_rendered, 1);
    assert_eq!(renderer.last_polyline_count, 2);
    assert_eq!(renderer.last_frame.as_ref(), Some(&frame));
}

#[test]
fn drag_pans_by_pixel_offset() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    view.render().expect("render");
    let width = view.layout().graph_rect.width;

    assert!(!view.handle_input(InputEvent::DragStart { x: 400.0, y: 100.0 }).expect("start"));
    assert!(view.handle_input(InputEvent::DragMove { x: 500.0, y: 100.0 }).expect("move"));
    let offset = (100.0 * SPAN as f64 / width) as i64;
    assert_eq!(view.document().window().requested_start, START - offset);

    // Moving back to the origin restores the window.
    assert!(view.handle_input(InputEvent::DragMove { x: 400.0, y: 100.0 }).expect("move"));
    assert_eq!(view.document().window().requested_start, START);
    view.handle_input(InputEvent::DragEnd).expect("end");

    assert!(!view.handle_input(InputEvent::DragMove { x: 450.0, y: 100.0 }).expect("move"));
}

#[test]
fn drag_outside_plot_or_while_live_is_ignored() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    view.render().expect("render");

    view.handle_input(InputEvent::DragStart { x: 400.0, y: 100.0 }).expect("start");
    assert!(!view.handle_input(InputEvent::DragMove { x: 5.0, y: 100.0 }).expect("move"));
    assert_eq!(view.document().window().requested_start, START);

    view.document_mut().set_auto_update(true);
    let live_start = view.document().window().requested_start;
    assert!(!view.handle_input(InputEvent::DragMove { x: 600.0, y: 100.0 }).expect("move"));
    assert_eq!(view.document().window().requested_start, live_start);
}

#[test]
fn wheel_zooms_by_configured_step() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    view.render().expect("render");
    let step = view.config().zoom_step;

    assert!(view.handle_input(InputEvent::Wheel { delta: 1.0 }).expect("zoom in"));
    let zoomed_in = view.document().window().requested_span;
    assert_eq!(zoomed_in, (SPAN as f64 * (1.0 / step)) as i64);

    assert!(view.handle_input(InputEvent::Wheel { delta: -1.0 }).expect("zoom out"));
    let zoomed_out = view.document().window().requested_span;
    assert_eq!(zoomed_out, (zoomed_in as f64 * step) as i64);
    assert!(!view.document().data_valid());
}

#[test]
fn wheel_stops_at_one_second_per_pixel() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    view.render().expect("render");
    let min_span = view.document().min_span();
    assert_eq!(min_span, view.layout().plot_width() as i64);

    let mut zooms = 0;
    while view.handle_input(InputEvent::Wheel { delta: 1.0 }).expect("zoom") {
        zooms += 1;
        assert!(zooms < 100);
    }
    assert!(view.document().window().requested_span >= min_span);
}

#[test]
fn resize_recomputes_layout() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    let before = view.layout().plot_width();
    assert!(view.handle_input(InputEvent::Resize { width: 422, height: 300 }).expect("resize"));
    assert!((before - view.layout().plot_width() - 400.0).abs() < 1e-9);
    assert_eq!(view.viewport(), Viewport::new(422, 300));

    assert!(matches!(
        view.handle_input(InputEvent::Resize { width: 0, height: 300 }),
        Err(GraphError::InvalidViewport { width: 0, .. })
    ));
}

#[test]
fn structural_edits_invalidate_cached_layout() {
    let mut view = two_hour_view(822, ManualClock::new(NOW));
    let first = view.layout().panels.len();
    view.document_mut()
        .add_series_in_new_panel("router", "if_errors/rx", "errors")
        .expect("add series");
    assert_eq!(view.layout().panels.len(), first + 1);

    let top = view.layout().panels[1].top;
    let second = view.document().panel_ids()[1];
    assert_eq!(view.panel_at(top + 1.0), Some(second));
}

#[test]
fn tick_moves_live_window_and_refetches() {
    let clock = ManualClock::new(NOW);
    let mut view = two_hour_view(822, clock.clone());
    view.document_mut().set_auto_update(true);
    view.render().expect("render");
    let fetches = view.provider_mut().fetch_count();
    let start = view.document().window().requested_start;

    clock.advance(10);
    assert!(view.handle_input(InputEvent::Tick).expect("tick"));
    assert_eq!(view.document().window().requested_start, start + 10);
    view.render().expect("render");
    assert_eq!(view.provider_mut().fetch_count(), fetches + 6);

    view.document_mut().set_auto_update(false);
    assert!(!view.handle_input(InputEvent::Tick).expect("tick"));
}

#[test]
fn invalid_config_is_rejected() {
    let document = GraphDocument::new(ManualClock::new(NOW), SPAN).expect("document");
    let result = GraphView::new(
        document,
        NullRenderer::default(),
        MemoryProvider::new(),
        Utc,
        Viewport::new(400, 300),
        ViewerConfig::default().with_zoom_step(1.0),
    );
    assert!(matches!(result, Err(GraphError::InvalidConfig(_))));
}

#[test]
fn empty_view_renders_hint() {
    let document = GraphDocument::new(ManualClock::new(NOW), SPAN).expect("document");
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
    assert_eq!(view.renderer().last_text_count, 1);
    assert_eq!(
        frame.texts().next().map(|text| text.text.as_str()),
        Some("Drop sensors from list here")
    );
}
