/// Axis-aligned bounding box in m-dimensional space.
///
/// The tree keeps one box around its whole point set. Queries copy it and shrink
/// the copy one dimension at a time while descending, restoring the saved bound
/// on the way back up.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        debug_assert_eq!(min.len(), max.len(), "min and max must have the same dimension");
        Self { min, max }
    }

    /// Tight box around the points selected by `indices` from a row-major buffer.
    ///
    /// An empty selection yields a degenerate box at the origin.
    pub fn from_points(data: &[f64], dims: usize, indices: &[usize]) -> Self {
        let Some((&first, rest)) = indices.split_first() else {
            return Self::new(vec![0.0; dims], vec![0.0; dims]);
        };

        let mut min = data[first * dims..(first + 1) * dims].to_vec();
        let mut max = min.clone();
        for &idx in rest {
            let point = &data[idx * dims..(idx + 1) * dims];
            for k in 0..dims {
                let v = point[k];
                if v < min[k] { min[k] = v; }
                if v > max[k] { max[k] = v; }
            }
        }
        Self { min, max }
    }

    pub fn dims(&self) -> usize {
        self.min.len()
    }

    /// Width along dimension `k`.
    pub fn spread(&self, k: usize) -> f64 {
        self.max[k] - self.min[k]
    }

    /// Lowers the upper face along `k` to `value`, returning the previous bound.
    pub fn shrink_max(&mut self, k: usize, value: f64) -> f64 {
        std::mem::replace(&mut self.max[k], value)
    }

    /// Raises the lower face along `k` to `value`, returning the previous bound.
    pub fn shrink_min(&mut self, k: usize, value: f64) -> f64 {
        std::mem::replace(&mut self.min[k], value)
    }

    /// Puts back both faces along `k`, undoing a `shrink_*` call.
    pub fn restore(&mut self, k: usize, min: f64, max: f64) {
        self.min[k] = min;
        self.max[k] = max;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_is_tight() {
        let data = vec![
            0.0, 5.0,
            3.0, -1.0,
            -2.0, 2.0,
        ];
        let bbox = BoundingBox::from_points(&data, 2, &[0, 1, 2]);
        assert_eq!(bbox.min, vec![-2.0, -1.0]);
        assert_eq!(bbox.max, vec![3.0, 5.0]);

        let sub = BoundingBox::from_points(&data, 2, &[1]);
        assert_eq!(sub.min, sub.max);
        assert_eq!(sub.spread(0), 0.0);
    }

    #[test]
    fn test_shrink_and_restore() {
        let mut bbox = BoundingBox::new(vec![0.0, 0.0], vec![10.0, 10.0]);
        let old = bbox.shrink_max(1, 4.0);
        assert_eq!(old, 10.0);
        assert_eq!(bbox.max, vec![10.0, 4.0]);
        assert_eq!(bbox.spread(1), 4.0);

        bbox.restore(1, 0.0, old);
        assert_eq!(bbox, BoundingBox::new(vec![0.0, 0.0], vec![10.0, 10.0]));
    }
}
