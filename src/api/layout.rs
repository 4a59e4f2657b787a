use ordered_float::OrderedFloat;
use tracing::trace;

use crate::api::{Panel, PanelId, RenderTheme, TextMetrics};
use crate::core::{PixelRect, Viewport};

/// Widest value-axis label the left gutter has to fit.
pub const GUTTER_SAMPLE_LABEL: &str = "888.888 M";

/// Vertical placement of one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelGeometry {
    pub panel_id: PanelId,
    /// First row of the plot area.
    pub top: f64,
    /// Last row of the plot area; equals `top` for degenerate layouts.
    pub bottom: f64,
    /// Rows the legend wraps into; zero for an empty panel.
    pub legend_lines: usize,
    /// Baseline of the first legend row.
    pub legend_baseline: f64,
    /// Baseline of the time-axis labels under the plot.
    pub x_label_baseline: f64,
}

impl PanelGeometry {
    #[must_use]
    pub fn plot_height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Geometry of the whole surface, computed from the panel list.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub surface: Viewport,
    pub header_height: f64,
    /// Area shared by all panels, right of the value-label gutter.
    pub graph_rect: PixelRect,
    /// Height allotted to each panel including its x labels.
    pub graph_height: f64,
    pub label_width: f64,
    pub box_size: f64,
    pub panels: Vec<PanelGeometry>,
}

impl DocumentLayout {
    /// Panel whose plot area strictly contains row `y`.
    #[must_use]
    pub fn panel_at(&self, y: f64) -> Option<PanelId> {
        self.panels
            .iter()
            .find(|geometry| geometry.top < y && y < geometry.bottom)
            .map(|geometry| geometry.panel_id)
    }

    #[must_use]
    pub fn panel(&self, id: PanelId) -> Option<&PanelGeometry> {
        self.panels.iter().find(|geometry| geometry.panel_id == id)
    }

    /// Plot rectangle of a panel, spanning the graph area horizontally.
    #[must_use]
    pub fn plot_rect(&self, geometry: &PanelGeometry) -> PixelRect {
        PixelRect::new(
            self.graph_rect.left,
            geometry.top,
            self.graph_rect.width,
            geometry.plot_height(),
        )
    }

    /// Width in pixels usable for the time axis.
    #[must_use]
    pub fn plot_width(&self) -> f64 {
        self.graph_rect.width
    }
}

/// Fewest legend rows so that column-major packing fits into `width`.
///
/// Columns are as wide as their widest entry and separated by `gap`. Falls
/// back to one entry per row when nothing fits; zero entries need no rows.
#[must_use]
pub fn legend_rows_for_widths(widths: &[f64], width: f64, gap: f64) -> usize {
    let count = widths.len();
    for rows in 1..count {
        let columns = count.div_ceil(rows);
        let total: f64 = widths
            .chunks(rows)
            .map(|column| {
                column
                    .iter()
                    .copied()
                    .map(OrderedFloat)
                    .max()
                    .map_or(0.0, |widest| widest.0)
            })
            .sum::<f64>()
            + gap * (columns - 1) as f64;
        if total <= width {
            return rows;
        }
    }
    count
}

/// Legend entry width: swatch, margin, then the label text.
#[must_use]
pub fn legend_entry_width<M: TextMetrics + ?Sized>(
    label: &str,
    metrics: &M,
    theme: &RenderTheme,
    box_size: f64,
) -> f64 {
    metrics.text_width(label, theme.font_size_px) + box_size + theme.margin_px
}

/// Legend rows for every panel, in panel order.
pub fn compute_legend_lines<'a, M: TextMetrics + ?Sized>(
    panels: impl IntoIterator<Item = &'a Panel>,
    metrics: &M,
    theme: &RenderTheme,
    box_size: f64,
    width: f64,
) -> Vec<usize> {
    let gap = 4.0 * theme.margin_px;
    panels
        .into_iter()
        .map(|panel| {
            let widths: Vec<f64> = panel
                .series()
                .map(|series| legend_entry_width(series.label(), metrics, theme, box_size))
                .collect();
            legend_rows_for_widths(&widths, width, gap)
        })
        .collect()
}

/// Splits `surface` into a header band and equal-height panels, each
/// followed by its legend.
pub fn layout<'a, M: TextMetrics + ?Sized>(
    surface: Viewport,
    panels: impl IntoIterator<Item = &'a Panel>,
    metrics: &M,
    theme: &RenderTheme,
) -> DocumentLayout {
    let font = theme.font_size_px;
    let small_font = theme.small_font_size_px;
    let margin = theme.margin_px;
    let width = f64::from(surface.width);
    let height = f64::from(surface.height);

    let label_width = metrics.text_width(GUTTER_SAMPLE_LABEL, font);
    let box_size = (metrics.ascent(font) - 2.0).max(1.0);
    let header_height = metrics.height(theme.header_font_size_px()) + 2.0 * margin;
    let graph_rect = PixelRect::new(
        label_width + margin,
        header_height,
        (width - label_width - margin).max(0.0),
        (height - header_height).max(0.0),
    );

    let panels: Vec<&Panel> = panels.into_iter().collect();
    let legend_lines = compute_legend_lines(
        panels.iter().copied(),
        metrics,
        theme,
        box_size,
        width - 2.0 * margin,
    );

    let line_spacing = metrics.line_spacing(font);
    let count = panels.len();
    let graph_height = if count == 0 {
        0.0
    } else {
        let total_legend = legend_lines.iter().sum::<usize>() as f64 * line_spacing;
        let gaps = margin * (2 * count - 1) as f64;
        ((graph_rect.height - total_legend - gaps) / count as f64)
            .floor()
            .max(0.0)
    };

    let small_line_spacing = metrics.line_spacing(small_font);
    let small_ascent = metrics.ascent(small_font);
    let ascent = metrics.ascent(font);
    let mut top = graph_rect.top;
    let mut geometries = Vec::with_capacity(count);
    for (panel, lines) in panels.iter().zip(legend_lines) {
        let bottom = (top + graph_height - margin - small_line_spacing).max(top);
        geometries.push(PanelGeometry {
            panel_id: panel.id(),
            top,
            bottom,
            legend_lines: lines,
            legend_baseline: top + graph_height + ascent,
            x_label_baseline: bottom + margin + small_ascent,
        });
        trace!(panel = panel.id().raw(), top, bottom, legend_lines = lines, "panel placed");
        top += graph_height + lines as f64 * line_spacing + 2.0 * margin;
    }

    DocumentLayout {
        surface,
        header_height,
        graph_rect,
        graph_height,
        label_width,
        box_size,
        panels: geometries,
    }
}
