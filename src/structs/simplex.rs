use ndarray::{Array1, Zip};

use crate::error::{ConfigError, Result};
use crate::structs::bounds::Bounds;
use crate::structs::vertex::Vertex;

/// Reflection coefficient
pub const REFLECT: f64 = 1.0;
/// Expansion coefficient
pub const EXPAND: f64 = 2.0;
/// Contraction coefficient
pub const CONTRACT: f64 = 0.5;
/// Shrink coefficient
pub const SHRINK: f64 = 0.5;

/// The working figure of the Nelder-Mead method: `n + 1` scored vertices in
/// an `n`-dimensional parameter space
///
/// After [Simplex::order], vertex 0 is the best and vertex `n` the worst.
/// Every move returns a candidate point already projected into the bounds; the
/// caller is responsible for evaluating it and putting it back into the simplex.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplex {
    vertices: Vec<Vertex>,
}

impl Simplex {
    /// Build a simplex from its vertices, which are ordered immediately
    ///
    /// Fails with [ConfigError::EmptyBounds] if fewer than two vertices are
    /// given, as that leaves no parameter to optimize.
    pub fn new(vertices: Vec<Vertex>) -> Result<Self> {
        if vertices.len() < 2 {
            return Err(ConfigError::EmptyBounds);
        }
        Ok(Simplex::from_scored(vertices))
    }

    /// Same as [Simplex::new] for callers that already hold `n + 1 >= 2`
    /// vertices
    pub(crate) fn from_scored(vertices: Vec<Vertex>) -> Self {
        let mut simplex = Simplex { vertices };
        simplex.order();
        simplex
    }

    /// Number of parameters, one less than the number of vertices
    pub fn dim(&self) -> usize {
        self.vertices.len() - 1
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Sort the vertices by value, earlier evaluations first on ties
    pub fn order(&mut self) {
        self.vertices.sort_by(|a, b| a.rank(b));
    }

    pub fn best(&self) -> &Vertex {
        &self.vertices[0]
    }

    pub fn second_worst(&self) -> &Vertex {
        &self.vertices[self.dim() - 1]
    }

    pub fn worst(&self) -> &Vertex {
        &self.vertices[self.dim()]
    }

    /// Mean position of every vertex except the worst
    pub fn centroid(&self) -> Array1<f64> {
        let n = self.dim();
        let mut centroid = Array1::<f64>::zeros(self.best().point().len());
        for vertex in &self.vertices[..n] {
            centroid += vertex.point();
        }
        centroid / n as f64
    }

    /// `centroid + REFLECT * (centroid - worst)`
    pub fn reflect(&self, centroid: &Array1<f64>, bounds: &Bounds) -> Array1<f64> {
        toward(centroid, self.worst().point(), -REFLECT, bounds)
    }

    /// `centroid + EXPAND * (reflected - centroid)`
    pub fn expand(
        &self,
        centroid: &Array1<f64>,
        reflected: &Array1<f64>,
        bounds: &Bounds,
    ) -> Array1<f64> {
        toward(centroid, reflected, EXPAND, bounds)
    }

    /// `centroid + CONTRACT * (reflected - centroid)`, used when the reflected
    /// point beats the worst vertex but not the second worst
    pub fn contract_outside(
        &self,
        centroid: &Array1<f64>,
        reflected: &Array1<f64>,
        bounds: &Bounds,
    ) -> Array1<f64> {
        toward(centroid, reflected, CONTRACT, bounds)
    }

    /// `centroid + CONTRACT * (worst - centroid)`, used when the reflected
    /// point is no better than the worst vertex
    pub fn contract_inside(&self, centroid: &Array1<f64>, bounds: &Bounds) -> Array1<f64> {
        toward(centroid, self.worst().point(), CONTRACT, bounds)
    }

    /// Candidate points for every vertex but the best, moved toward the best:
    /// `best + SHRINK * (vertex - best)`
    pub fn shrink(&self, bounds: &Bounds) -> Vec<Array1<f64>> {
        let best = self.best().point();
        self.vertices[1..]
            .iter()
            .map(|vertex| toward(best, vertex.point(), SHRINK, bounds))
            .collect()
    }

    /// Replace the worst vertex
    pub fn replace_worst(&mut self, vertex: Vertex) {
        let n = self.dim();
        self.vertices[n] = vertex;
    }

    /// Replace vertices `1..=shrunk.len()` with shrunk ones, keeping the best
    ///
    /// Fewer than `n` vertices may be given when the evaluation budget ran out
    /// part way through a shrink.
    pub fn replace_shrunk(&mut self, shrunk: Vec<Vertex>) {
        for (slot, vertex) in self.vertices[1..].iter_mut().zip(shrunk) {
            *slot = vertex;
        }
    }

    /// Difference between the worst and the best value
    pub fn value_spread(&self) -> f64 {
        self.worst().value() - self.best().value()
    }

    /// Largest Euclidean distance of any vertex from the best one
    pub fn size(&self) -> f64 {
        let best = self.best().point();
        self.vertices[1..]
            .iter()
            .map(|vertex| distance(best, vertex.point()))
            .fold(0.0, f64::max)
    }

    /// `true` once every vertex sits on top of the best one, up to rounding
    pub fn is_collapsed(&self) -> bool {
        self.size() <= f64::EPSILON * norm(self.best().point()).max(1.0)
    }
}

/// `base + coefficient * (target - base)`, projected into the bounds
fn toward(base: &Array1<f64>, target: &Array1<f64>, coefficient: f64, bounds: &Bounds) -> Array1<f64> {
    let mut point = Zip::from(base)
        .and(target)
        .map_collect(|&b, &t| b + coefficient * (t - b));
    bounds.project_mut(&mut point);
    point
}

pub(crate) fn norm(x: &Array1<f64>) -> f64 {
    x.dot(x).sqrt()
}

fn distance(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
    Zip::from(a)
        .and(b)
        .fold(0.0, |acc, &x, &y| acc + (x - y).powi(2))
        .sqrt()
}
