//! Minkowski distance family used by the dual-tree queries.
//!
//! Distances are handled in "power space": for a finite order `p` every value
//! produced here is `distance^p` (squared distance for `p = 2`), which keeps the
//! per-dimension terms additive. For `p = inf` values are plain distances.

use crate::bounds::BoundingBox;

mod dist1d;
mod minkowski;

pub use dist1d::{Dist1D, Direct, Periodic};
pub use minkowski::{MinkowskiP1, MinkowskiP2, MinkowskiPInf, MinkowskiPp};

/// Trait defining the distance operations a query needs.
///
/// Implementations must return valid bounds: for any `x` in `r1` and `y` in
/// `r2`, `point_point_p(x, y, inf)` lies within `rect_rect_p(r1, r2)`.
pub trait MinMaxDist: Send + Sync {
    /// `true` when per-dimension terms are summed, `false` when they are maxed.
    const ADDITIVE: bool;

    /// The Minkowski order.
    fn p(&self) -> f64;

    /// Distance between two points, in power space.
    ///
    /// Accumulation may stop as soon as the partial value exceeds `upper_bound`;
    /// the returned value is then larger than `upper_bound` but not exact.
    fn point_point_p(&self, x: &[f64], y: &[f64], upper_bound: f64) -> f64;

    /// Min and max contribution of dimension `k` to the distance between two boxes.
    fn interval_interval_p(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64);

    /// Min and max distance between two boxes, in power space.
    fn rect_rect_p(&self, r1: &BoundingBox, r2: &BoundingBox) -> (f64, f64) {
        let mut min: f64 = 0.0;
        let mut max: f64 = 0.0;
        for k in 0..r1.dims() {
            let (lo, hi) = self.interval_interval_p(r1, r2, k);
            if Self::ADDITIVE {
                min += lo;
                max += hi;
            } else {
                min = min.max(lo);
                max = max.max(hi);
            }
        }
        (min, max)
    }

    /// Converts a plain distance into power space.
    fn distance_p(&self, s: f64) -> f64;
}

// Selects the concrete metric once per query, keyed by (boxed?, p), and runs
// `$body` with it bound to `$metric`. Each arm is monomorphised separately.
macro_rules! dispatch_metric {
    (@order $p:ident, $dist:expr, |$metric:ident| $body:expr) => {{
        if $p == 2.0 {
            let $metric = $crate::metric::MinkowskiP2::new($dist);
            $body
        } else if $p == 1.0 {
            let $metric = $crate::metric::MinkowskiP1::new($dist);
            $body
        } else if $p.is_infinite() {
            let $metric = $crate::metric::MinkowskiPInf::new($dist);
            $body
        } else {
            let $metric = $crate::metric::MinkowskiPp::new($dist, $p);
            $body
        }
    }};
    ($p:expr, $boxsize:expr, |$metric:ident| $body:expr) => {{
        let p: f64 = $p;
        match $boxsize {
            None => $crate::metric::dispatch_metric!(@order p, $crate::metric::Direct, |$metric| $body),
            Some(boxsize) => $crate::metric::dispatch_metric!(
                @order p,
                $crate::metric::Periodic::new(boxsize),
                |$metric| $body
            ),
        }
    }};
}

pub(crate) use dispatch_metric;
