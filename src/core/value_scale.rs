use serde::{Deserialize, Serialize};

use crate::core::Sample;

const MIN_LINE_SPACING_PX: f64 = 5.0;
const MAX_TICKS: usize = 10_000;
const MAX_STEP_ADAPTATIONS: usize = 64;

/// Closed value interval `[min, max]` with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    /// Returns `None` unless both ends are finite and ordered.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Option<Self> {
        (min.is_finite() && max.is_finite() && min <= max).then_some(Self { min, max })
    }

    #[must_use]
    pub fn span(self) -> f64 {
        self.max - self.min
    }

    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Union where a missing range is the identity.
    #[must_use]
    pub fn merge(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (Some(range), None) | (None, Some(range)) => Some(range),
            (None, None) => None,
        }
    }

    fn include(current: &mut Option<Self>, value: f64) {
        *current = Some(match *current {
            Some(range) => Self {
                min: range.min.min(value),
                max: range.max.max(value),
            },
            None => Self {
                min: value,
                max: value,
            },
        });
    }
}

/// Value range covered by one series.
///
/// Averages count wherever present; min/max count only at indices where both
/// are present. Length mismatch or no sample at all yields `None`.
#[must_use]
pub fn sample_range(avg: &[Sample], min: &[Sample], max: &[Sample]) -> Option<ValueRange> {
    if avg.len() != min.len() || avg.len() != max.len() {
        return None;
    }

    let mut range = None;
    for value in avg.iter().flatten() {
        ValueRange::include(&mut range, *value);
    }
    for (low, high) in min.iter().zip(max) {
        if let (Some(low), Some(high)) = (low, high) {
            ValueRange::include(&mut range, *low);
            ValueRange::include(&mut range, *high);
        }
    }
    range
}

/// Range widened to round numbers plus the grid base it was aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRange {
    pub range: ValueRange,
    pub base: f64,
}

/// Aligns `range` outward to a power-of-ten base and pads 5% on each side.
///
/// A flat range becomes `[v - 1, v + 1]` with base 1.
#[must_use]
pub fn normalize_range(range: Option<ValueRange>) -> Option<NormalizedRange> {
    let range = range?;
    if range.min == range.max {
        return Some(NormalizedRange {
            range: ValueRange {
                min: range.min - 1.0,
                max: range.max + 1.0,
            },
            base: 1.0,
        });
    }

    let base = 10_f64.powf(range.span().log10().floor());
    let min = (range.min / base).floor() * base;
    let max = (range.max / base).ceil() * base;
    let margin = 0.05 * (max - min);
    ValueRange::new(min - margin, max + margin).map(|range| NormalizedRange { range, base })
}

/// Grid step for value lines given the pixel density of the axis.
///
/// Steps closer than 5 px are doubled when that suffices, otherwise
/// quintupled; `None` when even that stays below 5 px.
#[must_use]
pub fn adapt_line_step(base: f64, px_per_unit: f64) -> Option<f64> {
    if !base.is_finite() || base <= 0.0 || !px_per_unit.is_finite() {
        return None;
    }
    let px_per_unit = px_per_unit.abs();
    let mut step = base;
    if step * px_per_unit < MIN_LINE_SPACING_PX {
        step *= if 2.0 * step * px_per_unit >= MIN_LINE_SPACING_PX {
            2.0
        } else {
            5.0
        };
    }
    (step * px_per_unit >= MIN_LINE_SPACING_PX).then_some(step)
}

/// Label step so that labels of `font_height` do not overlap in `height_px`.
#[must_use]
pub fn adapt_label_step(span: f64, base: f64, height_px: f64, font_height: f64) -> Option<f64> {
    if !span.is_finite()
        || span <= 0.0
        || !base.is_finite()
        || base <= 0.0
        || !height_px.is_finite()
        || height_px <= 0.0
        || !font_height.is_finite()
        || font_height <= 0.0
    {
        return None;
    }

    let mut step = base;
    for _ in 0..MAX_STEP_ADAPTATIONS {
        let needed = font_height * span / step;
        if height_px >= needed {
            return Some(step);
        }
        step *= if height_px > needed / 2.0 {
            2.0
        } else if height_px > needed / 5.0 {
            5.0
        } else {
            10.0
        };
    }
    None
}

/// Multiples of `step` from `ceil(min / step)` upward, stopping at `max`
/// (inclusive when `include_max`).
pub fn value_ticks(
    min: f64,
    max: f64,
    step: f64,
    include_max: bool,
) -> impl Iterator<Item = f64> {
    let valid = min.is_finite() && max.is_finite() && step.is_finite() && step > 0.0;
    let first = if valid { (min / step).ceil() } else { 0.0 };
    (0..MAX_TICKS)
        .take_while(move |_| valid)
        .map(move |index| (first + index as f64) * step)
        .take_while(move |value| if include_max { *value <= max } else { *value < max })
}

/// SI prefix symbol and the factor it stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiPrefix {
    pub symbol: &'static str,
    pub magnitude: f64,
}

impl SiPrefix {
    pub const NONE: Self = Self {
        symbol: "",
        magnitude: 1.0,
    };
}

const SI_TABLE: [(f64, &str); 17] = [
    (1e-24, "y"),
    (1e-21, "z"),
    (1e-18, "a"),
    (1e-15, "f"),
    (1e-12, "p"),
    (1e-9, "n"),
    (1e-6, "µ"),
    (1e-3, "m"),
    (1.0, ""),
    (1e3, "k"),
    (1e6, "M"),
    (1e9, "G"),
    (1e12, "T"),
    (1e15, "P"),
    (1e18, "E"),
    (1e21, "Z"),
    (1e24, "Y"),
];

/// Largest SI prefix whose factor does not exceed `value`.
///
/// Values below 1e-24 (zero and negatives included), at or above 1e24, and
/// NaN get no prefix.
#[must_use]
pub fn si_prefix(value: f64) -> SiPrefix {
    let index = SI_TABLE
        .iter()
        .position(|(factor, _)| value < *factor)
        .unwrap_or(SI_TABLE.len());
    if index == 0 || index == SI_TABLE.len() {
        return SiPrefix::NONE;
    }
    let (magnitude, symbol) = SI_TABLE[index - 1];
    SiPrefix { symbol, magnitude }
}

/// Formats `value / prefix.magnitude` with `precision` significant digits in
/// `%g` style, followed by the prefix symbol.
#[must_use]
pub fn format_number(value: f64, precision: usize, prefix: SiPrefix) -> String {
    let mut text = format_general(value / prefix.magnitude, precision.max(1));
    if !prefix.symbol.is_empty() {
        text.push(' ');
        text.push_str(prefix.symbol);
    }
    text
}

fn format_general(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let precision = i32::try_from(precision).unwrap_or(i32::MAX);

    if exponent < -4 || exponent >= precision {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = usize::try_from(precision - 1 - exponent).unwrap_or(0);
        trim_fraction(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
