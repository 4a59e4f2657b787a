use strip_graph::api::{PALETTE_LEN, RenderTheme, ViewerConfig};
use strip_graph::render::Color;
use strip_graph::GraphError;

#[test]
fn defaults_are_valid() {
    let config = ViewerConfig::default();
    config.validate().expect("default config");
    assert_eq!(config.default_span_secs, 86_400);
    assert_eq!(config.auto_update_interval_secs, 10);
    assert_eq!(config.label_precision, 6);
    assert!(config.zoom_step > 1.0);
    assert_eq!(config.theme.palette.len(), PALETTE_LEN);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let config = ViewerConfig::from_json_str(r#"{ "default_span_secs": 3600 }"#).expect("config");
    assert_eq!(config.default_span_secs, 3_600);
    assert_eq!(config.theme, RenderTheme::default());
    assert_eq!(config.zoom_step, ViewerConfig::default().zoom_step);

    let themed = ViewerConfig::from_json_str(r#"{ "theme": { "font_size_px": 16.0 } }"#)
        .expect("themed config");
    assert_eq!(themed.theme.font_size_px, 16.0);
    assert_eq!(themed.theme.small_font_size_px, 10.0);
}

#[test]
fn json_round_trip_preserves_config() {
    let config = ViewerConfig::default()
        .with_default_span_secs(7_200)
        .with_zoom_step(2.0);
    let json = config.to_json_string().expect("serialize");
    let restored = ViewerConfig::from_json_str(&json).expect("parse");
    assert_eq!(restored, config);
}

#[test]
fn odd_color_channels_survive_json() {
    let mut config = ViewerConfig::default();
    config.theme.plot_background = Color::from_rgb8(17, 115, 203);
    let json = config.to_json_string().expect("serialize");
    let restored = ViewerConfig::from_json_str(&json).expect("parse");
    assert_eq!(restored.theme.plot_background, config.theme.plot_background);
}

#[test]
fn invalid_values_are_rejected() {
    for input in [
        r#"{ "zoom_step": 0.5 }"#,
        r#"{ "default_span_secs": 0 }"#,
        r#"{ "label_precision": 0 }"#,
        r#"{ "theme": { "palette": [] } }"#,
        r#"{ "default_span_secs": "soon" }"#,
    ] {
        assert!(
            matches!(ViewerConfig::from_json_str(input), Err(GraphError::InvalidConfig(_))),
            "accepted {input}"
        );
    }
}

#[test]
fn palette_wraps_and_bands_are_dimmed() {
    let theme = RenderTheme::default();
    assert_eq!(theme.series_color(0), theme.series_color(PALETTE_LEN));
    assert_ne!(theme.series_color(0), theme.series_color(1));

    let line = theme.series_color(0);
    let band = theme.band_color(0);
    assert!(band.alpha < 1.0);
    assert!(band.green <= line.green);
    assert_eq!(line, Color::from_rgb8(0, 255, 0));
}
