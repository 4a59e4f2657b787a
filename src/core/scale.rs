use crate::error::{GraphError, GraphResult};

/// Affine map `f(x) = m * x + t` solved from two point correspondences.
///
/// Used for time -> pixel-x and value -> pixel-y; the y mapping is built
/// with `(min, bottom)` and `(max, top)` so larger values land on smaller rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMap {
    slope: f64,
    intercept: f64,
}

impl LinearMap {
    pub fn new(domain_lo: f64, range_lo: f64, domain_hi: f64, range_hi: f64) -> GraphResult<Self> {
        if !domain_lo.is_finite()
            || !domain_hi.is_finite()
            || !range_lo.is_finite()
            || !range_hi.is_finite()
        {
            return Err(GraphError::InvalidData(
                "linear map endpoints must be finite".to_owned(),
            ));
        }
        if domain_lo == domain_hi {
            return Err(GraphError::InvalidData(
                "linear map domain must be non-zero".to_owned(),
            ));
        }

        let slope = (range_hi - range_lo) / (domain_hi - domain_lo);
        Ok(Self {
            slope,
            intercept: range_lo - slope * domain_lo,
        })
    }

    #[must_use]
    pub fn apply(self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Inverse mapping; `slope` is never zero for maps built from a
    /// non-degenerate range, callers building flat maps get `None`.
    #[must_use]
    pub fn invert(self, y: f64) -> Option<f64> {
        if self.slope == 0.0 {
            return None;
        }
        Some((y - self.intercept) / self.slope)
    }

    #[must_use]
    pub fn slope(self) -> f64 {
        self.slope
    }
}
