use super::dist1d::Dist1D;
use super::MinMaxDist;
use crate::bounds::BoundingBox;

/// Manhattan distance (`p = 1`).
#[derive(Clone, Debug)]
pub struct MinkowskiP1<D> {
    dist: D,
}

impl<D: Dist1D> MinkowskiP1<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }
}

impl<D: Dist1D> MinMaxDist for MinkowskiP1<D> {
    const ADDITIVE: bool = true;

    fn p(&self) -> f64 {
        1.0
    }

    #[inline]
    fn point_point_p(&self, x: &[f64], y: &[f64], upper_bound: f64) -> f64 {
        let mut r = 0.0;
        for k in 0..x.len() {
            r += self.dist.point_point(x[k], y[k], k);
            if r > upper_bound {
                break;
            }
        }
        r
    }

    #[inline]
    fn interval_interval_p(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        self.dist.interval_interval(r1, r2, k)
    }

    fn distance_p(&self, s: f64) -> f64 {
        s
    }
}

/// Euclidean distance (`p = 2`), tracked as squared distance.
#[derive(Clone, Debug)]
pub struct MinkowskiP2<D> {
    dist: D,
}

impl<D: Dist1D> MinkowskiP2<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }
}

impl<D: Dist1D> MinMaxDist for MinkowskiP2<D> {
    const ADDITIVE: bool = true;

    fn p(&self) -> f64 {
        2.0
    }

    #[inline]
    fn point_point_p(&self, x: &[f64], y: &[f64], upper_bound: f64) -> f64 {
        let mut r = 0.0;
        for k in 0..x.len() {
            let d = self.dist.point_point(x[k], y[k], k);
            r += d * d;
            if r > upper_bound {
                break;
            }
        }
        r
    }

    #[inline]
    fn interval_interval_p(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        let (min, max) = self.dist.interval_interval(r1, r2, k);
        (min * min, max * max)
    }

    fn distance_p(&self, s: f64) -> f64 {
        s * s
    }
}

/// Chebyshev distance (`p = inf`).
///
/// The distance is a maximum over dimensions, not a sum, so bounds cannot be
/// updated by swapping a single term and are recomputed instead.
#[derive(Clone, Debug)]
pub struct MinkowskiPInf<D> {
    dist: D,
}

impl<D: Dist1D> MinkowskiPInf<D> {
    pub fn new(dist: D) -> Self {
        Self { dist }
    }
}

impl<D: Dist1D> MinMaxDist for MinkowskiPInf<D> {
    const ADDITIVE: bool = false;

    fn p(&self) -> f64 {
        f64::INFINITY
    }

    #[inline]
    fn point_point_p(&self, x: &[f64], y: &[f64], upper_bound: f64) -> f64 {
        let mut r: f64 = 0.0;
        for k in 0..x.len() {
            r = r.max(self.dist.point_point(x[k], y[k], k));
            if r > upper_bound {
                break;
            }
        }
        r
    }

    #[inline]
    fn interval_interval_p(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        self.dist.interval_interval(r1, r2, k)
    }

    fn distance_p(&self, s: f64) -> f64 {
        s
    }
}

/// General Minkowski distance for any finite `p >= 1`, tracked as `distance^p`.
#[derive(Clone, Debug)]
pub struct MinkowskiPp<D> {
    dist: D,
    p: f64,
}

impl<D: Dist1D> MinkowskiPp<D> {
    pub fn new(dist: D, p: f64) -> Self {
        debug_assert!(p >= 1.0 && p.is_finite(), "general Minkowski order must be finite and >= 1");
        Self { dist, p }
    }
}

impl<D: Dist1D> MinMaxDist for MinkowskiPp<D> {
    const ADDITIVE: bool = true;

    fn p(&self) -> f64 {
        self.p
    }

    #[inline]
    fn point_point_p(&self, x: &[f64], y: &[f64], upper_bound: f64) -> f64 {
        let mut r = 0.0;
        for k in 0..x.len() {
            r += self.dist.point_point(x[k], y[k], k).powf(self.p);
            if r > upper_bound {
                break;
            }
        }
        r
    }

    #[inline]
    fn interval_interval_p(&self, r1: &BoundingBox, r2: &BoundingBox, k: usize) -> (f64, f64) {
        let (min, max) = self.dist.interval_interval(r1, r2, k);
        (min.powf(self.p), max.powf(self.p))
    }

    fn distance_p(&self, s: f64) -> f64 {
        s.powf(self.p)
    }
}
