use crate::bounds::BoundingBox;

/// One-dimensional distance rule shared by every Minkowski order.
///
/// This allows swapping between plain coordinates (`Direct`) and wrapped
/// coordinates (`Periodic`) without touching the order-specific code.
pub trait Dist1D: Send + Sync {
    /// Smallest and largest separation along `k` between any point of `r1`
    /// and any point of `r2`.
    fn interval_interval(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64);

    /// Absolute separation of two coordinates along `k`.
    fn point_point(&self, x: f64, y: f64, k: usize) -> f64;
}

/// Unbounded space: separation is the plain coordinate difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct Direct;

impl Dist1D for Direct {
    #[inline]
    fn interval_interval(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        let min = (r1.min[k] - r2.max[k]).max(r2.min[k] - r1.max[k]).max(0.0);
        let max = (r1.max[k] - r2.min[k]).max(r2.max[k] - r1.min[k]);
        (min, max)
    }

    #[inline]
    fn point_point(&self, x: f64, y: f64, _k: usize) -> f64 {
        (x - y).abs()
    }
}

/// Periodic box: coordinates along dimension `k` wrap modulo `full[k]`.
///
/// A box size of zero marks a dimension as non-periodic. Coordinates along
/// periodic dimensions are expected in `[0, full[k])`, which the tree checks
/// at build time.
#[derive(Clone, Debug)]
pub struct Periodic {
    full: Vec<f64>,
    half: Vec<f64>,
}

impl Periodic {
    pub fn new(boxsize: &[f64]) -> Self {
        Self {
            full: boxsize.to_vec(),
            half: boxsize.iter().map(|&l| 0.5 * l).collect(),
        }
    }
}

impl Dist1D for Periodic {
    fn interval_interval(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        let full = self.full[k];
        if full <= 0.0 {
            return Direct.interval_interval(r1, r2, k);
        }
        let half = self.half[k];

        // All differences x - y lie in [lo, hi].
        let lo = r1.min[k] - r2.max[k];
        let hi = r1.max[k] - r2.min[k];

        if lo <= 0.0 && hi >= 0.0 {
            // The intervals overlap.
            return (0.0, lo.abs().max(hi).min(half));
        }

        let (near, far) = {
            let (a, b) = (lo.abs(), hi.abs());
            if a < b { (a, b) } else { (b, a) }
        };

        if far < half {
            (near, far)
        } else if near > half {
            (full - far, full - near)
        } else {
            (near.min(full - far), half)
        }
    }

    #[inline]
    fn point_point(&self, x: f64, y: f64, k: usize) -> f64 {
        let full = self.full[k];
        let d = x - y;
        if full <= 0.0 {
            return d.abs();
        }
        let half = self.half[k];
        let wrapped = if d < -half {
            d + full
        } else if d > half {
            d - full
        } else {
            d
        };
        wrapped.abs()
    }
}
