use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use cairo::{Context, Format, ImageSurface};
use pango::FontDescription;

use crate::api::TextMetrics;
use crate::error::{GraphError, GraphResult};
use crate::render::{Color, DrawCommand, RenderFrame, Renderer, TextHAlign};

const FONT_FAMILY: &str = "Sans";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub polylines_drawn: usize,
    pub polygons_drawn: usize,
    pub texts_drawn: usize,
}

/// Extension trait for renderers that can draw into an external Cairo
/// context (for example a toolkit drawing callback).
pub trait CairoContextRenderer {
    fn render_on_cairo_context(&mut self, context: &Context, frame: &RenderFrame)
    -> GraphResult<()>;
}

/// Cairo + Pango renderer backend.
///
/// Renders offscreen into an `ImageSurface` through `Renderer::render`, or
/// in place through `CairoContextRenderer`.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    clear_color: Color,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(width: i32, height: i32) -> GraphResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(GraphError::InvalidData(
                "cairo surface size must be > 0".to_owned(),
            ));
        }

        let surface = ImageSurface::create(Format::ARgb32, width, height)
            .map_err(|err| map_backend_error("failed to create cairo surface", err))?;
        Ok(Self {
            surface,
            clear_color: Color::WHITE,
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    #[must_use]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) -> GraphResult<()> {
        color.validate()?;
        self.clear_color = color;
        Ok(())
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    /// Writes the current surface content as PNG.
    pub fn write_png(&self, path: impl AsRef<Path>) -> GraphResult<()> {
        let file = File::create(path.as_ref()).map_err(|err| {
            GraphError::InvalidData(format!("failed to create png file: {err}"))
        })?;
        let mut writer = BufWriter::new(file);
        self.surface
            .write_to_png(&mut writer)
            .map_err(|err| GraphError::InvalidData(format!("failed to write png: {err}")))
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> GraphResult<()> {
        frame.validate()?;
        self.clear_color.validate()?;

        apply_color(context, self.clear_color);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;

        let mut stats = CairoRenderStats::default();

        for command in &frame.commands {
            match command {
                DrawCommand::Line(line) => {
                    apply_color(context, line.color);
                    context.set_line_width(line.stroke_width);
                    context.move_to(line.x1, line.y1);
                    context.line_to(line.x2, line.y2);
                    context
                        .stroke()
                        .map_err(|err| map_backend_error("failed to stroke line", err))?;
                    stats.lines_drawn += 1;
                }
                DrawCommand::Rect(rect) => {
                    context.rectangle(rect.x, rect.y, rect.width, rect.height);
                    if let Some(fill) = rect.fill_color {
                        apply_color(context, fill);
                        context
                            .fill_preserve()
                            .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
                    }
                    if let Some(border) = rect.border_color {
                        apply_color(context, border);
                        context.set_line_width(rect.border_width);
                        context.stroke_preserve().map_err(|err| {
                            map_backend_error("failed to stroke rectangle border", err)
                        })?;
                    }
                    context.new_path();
                    stats.rects_drawn += 1;
                }
                DrawCommand::Polyline(polyline) => {
                    append_point_path(context, &polyline.points);
                    apply_color(context, polyline.color);
                    context.set_line_width(polyline.stroke_width);
                    context
                        .stroke()
                        .map_err(|err| map_backend_error("failed to stroke polyline", err))?;
                    stats.polylines_drawn += 1;
                }
                DrawCommand::Polygon(polygon) => {
                    append_point_path(context, &polygon.points);
                    context.close_path();
                    apply_color(context, polygon.fill_color);
                    context
                        .fill()
                        .map_err(|err| map_backend_error("failed to fill polygon", err))?;
                    stats.polygons_drawn += 1;
                }
                DrawCommand::Text(text) => {
                    let layout = pangocairo::functions::create_layout(context);
                    layout.set_font_description(Some(&font_description(text.font_size_px)));
                    layout.set_text(&text.text);

                    let (text_width, _text_height) = layout.pixel_size();
                    let x = match text.h_align {
                        TextHAlign::Left => text.x,
                        TextHAlign::Center => text.x - f64::from(text_width) / 2.0,
                        TextHAlign::Right => text.x - f64::from(text_width),
                    };
                    let baseline = f64::from(layout.baseline()) / f64::from(pango::SCALE);

                    apply_color(context, text.color);
                    context.move_to(x, text.y - baseline);
                    pangocairo::functions::show_layout(context, &layout);
                    stats.texts_drawn += 1;
                }
            }
        }

        self.last_stats = stats;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> GraphResult<()> {
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> GraphResult<()> {
        self.render_with_context(context, frame)
    }
}

/// Text metrics measured through Pango with the same font the renderer uses.
pub struct PangoTextMetrics {
    context: Context,
}

impl PangoTextMetrics {
    pub fn new() -> GraphResult<Self> {
        let surface = ImageSurface::create(Format::ARgb32, 1, 1)
            .map_err(|err| map_backend_error("failed to create measuring surface", err))?;
        let context = Context::new(&surface)
            .map_err(|err| map_backend_error("failed to create measuring context", err))?;
        Ok(Self { context })
    }

    fn layout(&self, text: &str, font_size: f64) -> pango::Layout {
        let layout = pangocairo::functions::create_layout(&self.context);
        layout.set_font_description(Some(&font_description(font_size)));
        layout.set_text(text);
        layout
    }
}

impl fmt::Debug for PangoTextMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PangoTextMetrics").finish_non_exhaustive()
    }
}

impl TextMetrics for PangoTextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        f64::from(self.layout(text, font_size).pixel_size().0)
    }

    fn ascent(&self, font_size: f64) -> f64 {
        f64::from(self.layout("0", font_size).baseline()) / f64::from(pango::SCALE)
    }

    fn height(&self, font_size: f64) -> f64 {
        f64::from(self.layout("0", font_size).pixel_size().1)
    }

    fn line_spacing(&self, font_size: f64) -> f64 {
        let layout = self.layout("0\n0", font_size);
        f64::from(layout.pixel_size().1) - self.height(font_size)
    }
}

fn font_description(font_size_px: f64) -> FontDescription {
    let mut description = FontDescription::new();
    description.set_family(FONT_FAMILY);
    description.set_absolute_size(font_size_px * f64::from(pango::SCALE));
    description
}

fn append_point_path(context: &Context, points: &[(f64, f64)]) {
    let mut iter = points.iter();
    if let Some(&(x, y)) = iter.next() {
        context.move_to(x, y);
    }
    for &(x, y) in iter {
        context.line_to(x, y);
    }
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> GraphError {
    GraphError::InvalidData(format!("{prefix}: {err}"))
}
