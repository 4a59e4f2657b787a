/// Font measurements the layout engine depends on.
///
/// All values are pixels for a font of `font_size` pixels.
pub trait TextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64;
    fn ascent(&self, font_size: f64) -> f64;
    fn height(&self, font_size: f64) -> f64;
    fn line_spacing(&self, font_size: f64) -> f64;
}

impl<T: TextMetrics + ?Sized> TextMetrics for &T {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        (**self).text_width(text, font_size)
    }

    fn ascent(&self, font_size: f64) -> f64 {
        (**self).ascent(font_size)
    }

    fn height(&self, font_size: f64) -> f64 {
        (**self).height(font_size)
    }

    fn line_spacing(&self, font_size: f64) -> f64 {
        (**self).line_spacing(font_size)
    }
}

/// Deterministic, backend-independent estimate from per-glyph widths.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EstimatedTextMetrics;

impl TextMetrics for EstimatedTextMetrics {
    fn text_width(&self, text: &str, font_size: f64) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        let units = text.chars().fold(0.0, |acc, ch| {
            acc + match ch {
                '0'..='9' => 0.62,
                '.' | ',' => 0.34,
                '-' | '+' | '%' => 0.42,
                ' ' => 0.33,
                _ => 0.58,
            }
        });
        (units * font_size).max(font_size)
    }

    fn ascent(&self, font_size: f64) -> f64 {
        0.8 * font_size
    }

    fn height(&self, font_size: f64) -> f64 {
        1.2 * font_size
    }

    fn line_spacing(&self, font_size: f64) -> f64 {
        1.2 * font_size
    }
}
