use chrono::TimeZone;
use tracing::trace;

use crate::api::{DocumentLayout, GraphDocument, Panel, PanelGeometry, RenderTheme, TextMetrics};
use crate::core::{
    CalendarStep, LinearMap, PixelRect, Timestamp, TimeGrid, TimeGridRequest, ValueRange,
    adapt_label_step, adapt_line_step, envelope_runs, format_local, format_number,
    present_runs, select_time_grid, si_prefix, value_ticks,
};
use crate::error::GraphResult;
use crate::render::{
    Color, LinePrimitive, PolygonPrimitive, PolylinePrimitive, RectPrimitive, RenderFrame,
    TextHAlign, TextPrimitive,
};

const MIN_TIME_LINE_SPACING_PX: f64 = 3.0;
const Y_LABEL_GAP_PX: f64 = 4.0;

/// Everything besides the document that shapes a frame.
#[derive(Debug)]
pub struct RenderContext<'a, Tz: TimeZone, M: TextMetrics + ?Sized> {
    pub theme: &'a RenderTheme,
    pub metrics: &'a M,
    pub tz: &'a Tz,
    /// Instant used for representative grid labels.
    pub now: Timestamp,
    pub label_precision: usize,
}

/// Builds the complete draw list for `document` laid out as `layout`.
///
/// Pure function of its inputs; panels without a valid value range or with
/// a degenerate plot area are skipped.
pub fn build_render_frame<Tz, M>(
    document: &GraphDocument,
    layout: &DocumentLayout,
    ctx: &RenderContext<'_, Tz, M>,
) -> GraphResult<RenderFrame>
where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    let viewport = layout.surface.validate()?;
    let mut frame = RenderFrame::new(viewport);

    if document.is_empty() {
        draw_empty_hint(&mut frame, ctx);
        return Ok(frame);
    }

    let window = document.window();
    let (data_start, data_end) = (window.data_start, window.data_end);
    draw_header(&mut frame, data_start, data_end, ctx);

    let grid = select_time_grid(
        ctx.tz,
        TimeGridRequest {
            data_start,
            data_end,
            width_px: layout.plot_width(),
            now: ctx.now,
        },
        |label| ctx.metrics.text_width(label, ctx.theme.font_size_px),
    );

    for (panel, geometry) in document.panels().zip(&layout.panels) {
        let rect = layout.plot_rect(geometry);
        if !rect.is_drawable() {
            trace!(panel = panel.id().raw(), "panel skipped: plot area too small");
            continue;
        }
        let Some(normalized) = panel.normalized_range() else {
            trace!(panel = panel.id().raw(), "panel skipped: no samples");
            continue;
        };
        let Ok(xmap) = LinearMap::new(data_start as f64, rect.left, data_end as f64, rect.right())
        else {
            continue;
        };
        let range = normalized.range;
        let base = normalized.base;

        let theme = ctx.theme;
        frame.push_rect(RectPrimitive::filled(
            rect.left,
            rect.top,
            rect.width,
            rect.height,
            theme.plot_background,
        ));
        if let Some(grid) = &grid {
            draw_x_labels(&mut frame, grid, xmap, data_end, rect, geometry, ctx);
            draw_x_lines(
                &mut frame,
                &grid.minor,
                xmap,
                (data_start, data_end),
                rect,
                theme.minor_grid_color,
                theme,
            );
        }
        draw_y_lines(&mut frame, rect, range, base / 10.0, theme.minor_grid_color, theme);
        if let Some(grid) = &grid {
            draw_x_lines(
                &mut frame,
                &grid.major,
                xmap,
                (data_start, data_end),
                rect,
                theme.major_grid_color,
                theme,
            );
        }
        draw_y_lines(&mut frame, rect, range, base, theme.major_grid_color, theme);
        draw_y_labels(&mut frame, rect, range, base, ctx);
        draw_bands_and_lines(&mut frame, panel, rect, range, theme);
        draw_legend(&mut frame, panel, geometry, layout.box_size, ctx);
    }

    Ok(frame)
}

/// Vertical grid lines at every cursor position inside `window`.
///
/// Week and month cursors start at or before the window; their earlier
/// ticks are skipped. Nothing is drawn when lines would be closer than 3 px.
pub fn draw_x_lines<Tz: TimeZone>(
    frame: &mut RenderFrame,
    step: &CalendarStep<Tz>,
    xmap: LinearMap,
    window: (Timestamp, Timestamp),
    rect: PixelRect,
    color: Color,
    theme: &RenderTheme,
) {
    if !dense_enough(step, xmap) {
        return;
    }
    let (data_start, data_end) = window;
    for tick in step
        .ticks_until(data_end)
        .skip_while(|tick| *tick < data_start)
    {
        let x = xmap.apply(tick as f64);
        frame.push_line(LinePrimitive::new(
            x,
            rect.top,
            x,
            rect.bottom(),
            theme.line_width_px,
            color,
        ));
    }
}

fn dense_enough<Tz: TimeZone>(step: &CalendarStep<Tz>, xmap: LinearMap) -> bool {
    step.is_valid() && step.interval() as f64 * xmap.slope() >= MIN_TIME_LINE_SPACING_PX
}

/// Time labels under a panel. Centered labels sit midway between ticks,
/// starting one step before the first tick.
pub fn draw_x_labels<Tz, M>(
    frame: &mut RenderFrame,
    grid: &TimeGrid<Tz>,
    xmap: LinearMap,
    data_end: Timestamp,
    rect: PixelRect,
    geometry: &PanelGeometry,
    ctx: &RenderContext<'_, Tz, M>,
) where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    if !dense_enough(&grid.label, xmap) {
        return;
    }
    let mut cursor = grid.label.clone();
    if grid.centered {
        cursor.retreat();
    }
    let half_interval = cursor.interval() / 2;
    let font_size = ctx.theme.small_font_size_px;

    for tick in cursor.ticks_until(data_end) {
        let at = if grid.centered { tick + half_interval } else { tick };
        let Some(label) = format_local(ctx.tz, at, grid.format) else {
            continue;
        };
        let width = ctx.metrics.text_width(&label, font_size);
        let x = xmap.apply(at as f64) - width / 2.0;
        if x > rect.left && x + width < rect.right() {
            frame.push_text(TextPrimitive::new(
                label,
                x,
                geometry.x_label_baseline,
                font_size,
                ctx.theme.text_color,
                TextHAlign::Left,
            ));
        }
    }
}

/// Horizontal grid lines every `base` (adapted to at least 5 px spacing).
pub fn draw_y_lines(
    frame: &mut RenderFrame,
    rect: PixelRect,
    range: ValueRange,
    base: f64,
    color: Color,
    theme: &RenderTheme,
) {
    let Ok(ymap) = LinearMap::new(range.min, rect.bottom(), range.max, rect.top) else {
        return;
    };
    let Some(step) = adapt_line_step(base, ymap.slope().abs()) else {
        return;
    };
    for value in value_ticks(range.min, range.max, step, false) {
        let y = ymap.apply(value);
        frame.push_line(LinePrimitive::new(
            rect.left,
            y,
            rect.right(),
            y,
            theme.line_width_px,
            color,
        ));
    }
}

/// SI-prefixed value labels right-aligned in the gutter left of `rect`.
pub fn draw_y_labels<Tz, M>(
    frame: &mut RenderFrame,
    rect: PixelRect,
    range: ValueRange,
    base: f64,
    ctx: &RenderContext<'_, Tz, M>,
) where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    let Ok(ymap) = LinearMap::new(range.min, rect.bottom(), range.max, rect.top) else {
        return;
    };
    let font_size = ctx.theme.font_size_px;
    let Some(step) = adapt_label_step(
        range.span(),
        base,
        rect.height,
        ctx.metrics.height(font_size),
    ) else {
        return;
    };

    let prefix = si_prefix(range.max);
    let baseline_shift = ctx.metrics.ascent(font_size) / 2.0;
    for value in value_ticks(range.min, range.max, step, true) {
        frame.push_text(TextPrimitive::new(
            format_number(value, ctx.label_precision, prefix),
            rect.left - Y_LABEL_GAP_PX,
            ymap.apply(value) + baseline_shift,
            font_size,
            ctx.theme.text_color,
            TextHAlign::Right,
        ));
    }
}

/// Min/max bands for every series, then the average lines on top.
///
/// Sample `i` of an `n`-sample series lands at `left + i * width / (n - 1)`;
/// series with fewer than two samples draw nothing.
pub fn draw_bands_and_lines(
    frame: &mut RenderFrame,
    panel: &Panel,
    rect: PixelRect,
    range: ValueRange,
    theme: &RenderTheme,
) {
    let Ok(ymap) = LinearMap::new(range.min, rect.bottom(), range.max, rect.top) else {
        return;
    };
    let sample_map = |len: usize| {
        (len >= 2)
            .then(|| LinearMap::new(0.0, rect.left, (len - 1) as f64, rect.right()).ok())
            .flatten()
    };

    for (index, series) in panel.series().enumerate() {
        let Some(xmap) = sample_map(series.len()) else {
            continue;
        };
        let (min, max) = (series.min(), series.max());
        for run in envelope_runs(min, max) {
            let lower = run
                .clone()
                .filter_map(|i| min[i].map(|value| (xmap.apply(i as f64), ymap.apply(value))));
            let upper = run
                .rev()
                .filter_map(|i| max[i].map(|value| (xmap.apply(i as f64), ymap.apply(value))));
            frame.push_polygon(PolygonPrimitive::new(
                lower.chain(upper).collect(),
                theme.band_color(index),
            ));
        }
    }

    for (index, series) in panel.series().enumerate() {
        let Some(xmap) = sample_map(series.len()) else {
            continue;
        };
        let avg = series.avg();
        for run in present_runs(avg) {
            if run.len() < 2 {
                continue;
            }
            let points = run
                .filter_map(|i| avg[i].map(|value| (xmap.apply(i as f64), ymap.apply(value))))
                .collect();
            frame.push_polyline(PolylinePrimitive::new(
                points,
                theme.line_width_px,
                theme.series_color(index),
            ));
        }
    }
}

/// Color swatches and labels below a panel, wrapping into a new column
/// every `legend_lines` entries.
pub fn draw_legend<Tz, M>(
    frame: &mut RenderFrame,
    panel: &Panel,
    geometry: &PanelGeometry,
    box_size: f64,
    ctx: &RenderContext<'_, Tz, M>,
) where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    let rows = geometry.legend_lines;
    if rows == 0 {
        return;
    }
    let theme = ctx.theme;
    let font_size = theme.font_size_px;
    let line_spacing = ctx.metrics.line_spacing(font_size);
    let (mut x, mut y) = (theme.margin_px, geometry.legend_baseline);
    let mut column_width: f64 = 0.0;

    for (index, series) in panel.series().enumerate() {
        frame.push_rect(RectPrimitive::outlined(
            x,
            y - box_size,
            (box_size - 1.0).max(0.0),
            (box_size - 1.0).max(0.0),
            theme.legend_border_color,
        ));
        frame.push_rect(RectPrimitive::filled(
            x + 1.0,
            y - box_size + 1.0,
            (box_size - 2.0).max(0.0),
            (box_size - 2.0).max(0.0),
            theme.series_color(index),
        ));
        if !series.label().is_empty() {
            frame.push_text(TextPrimitive::new(
                series.label(),
                x + box_size + theme.margin_px,
                y,
                font_size,
                theme.text_color,
                TextHAlign::Left,
            ));
        }

        let entry_width =
            box_size + theme.margin_px + ctx.metrics.text_width(series.label(), font_size);
        column_width = column_width.max(entry_width);
        y += line_spacing;
        if (index + 1) % rows == 0 {
            x += column_width + 4.0 * theme.margin_px;
            column_width = 0.0;
            y = geometry.legend_baseline;
        }
    }
}

/// strftime pattern for the "from A to B" header, coarser for longer spans.
#[must_use]
pub fn header_format(span: i64) -> &'static str {
    const DAY: i64 = 24 * 3600;
    if span > 356 * DAY {
        "%Y-%m"
    } else if span > 31 * DAY {
        "%A %Y-%m-%d"
    } else if span > DAY {
        "%A %Y-%m-%d %H:%M"
    } else {
        "%A %Y-%m-%d %H:%M:%S"
    }
}

/// Header text for a data window, or `None` when a bound cannot be formatted.
#[must_use]
pub fn header_text<Tz: TimeZone>(
    tz: &Tz,
    data_start: Timestamp,
    data_end: Timestamp,
) -> Option<String> {
    let format = header_format(data_end - data_start);
    let from = format_local(tz, data_start, format)?;
    let to = format_local(tz, data_end, format)?;
    Some(format!("from {from} to {to}"))
}

/// Centered header line naming the data window.
pub fn draw_header<Tz, M>(
    frame: &mut RenderFrame,
    data_start: Timestamp,
    data_end: Timestamp,
    ctx: &RenderContext<'_, Tz, M>,
) where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    let Some(text) = header_text(ctx.tz, data_start, data_end) else {
        return;
    };
    let font_size = ctx.theme.header_font_size_px();
    frame.push_text(TextPrimitive::new(
        text,
        f64::from(frame.viewport.width) / 2.0,
        ctx.metrics.ascent(font_size) + ctx.theme.margin_px,
        font_size,
        ctx.theme.text_color,
        TextHAlign::Center,
    ));
}

fn draw_empty_hint<Tz, M>(frame: &mut RenderFrame, ctx: &RenderContext<'_, Tz, M>)
where
    Tz: TimeZone,
    M: TextMetrics + ?Sized,
{
    if ctx.theme.empty_hint.is_empty() {
        return;
    }
    frame.push_text(TextPrimitive::new(
        ctx.theme.empty_hint.clone(),
        f64::from(frame.viewport.width) / 2.0,
        f64::from(frame.viewport.height) / 2.0,
        ctx.theme.font_size_px,
        ctx.theme.text_color,
        TextHAlign::Center,
    ));
}
