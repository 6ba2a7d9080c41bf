use std::cmp::Ordering;

use ndarray::Array1;

/// A scored point of the simplex
///
/// `index` is the (1-based) evaluation number that produced the value, and is
/// used to break ties when ordering vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    point: Array1<f64>,
    value: f64,
    index: usize,
}

impl Vertex {
    /// Create a new vertex. NaN values are stored as `+inf` so that vertices
    /// always have a total order.
    pub fn new(point: Array1<f64>, value: f64, index: usize) -> Self {
        let value = if value.is_nan() { f64::INFINITY } else { value };
        Vertex {
            point,
            value,
            index,
        }
    }

    pub fn point(&self) -> &Array1<f64> {
        &self.point
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Compare by value, then by evaluation order (earlier first)
    pub fn rank(&self, other: &Vertex) -> Ordering {
        self.value
            .total_cmp(&other.value)
            .then(self.index.cmp(&other.index))
    }

    pub fn into_point(self) -> Array1<f64> {
        self.point
    }
}
