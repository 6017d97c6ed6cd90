use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Distance,
    Dotproduct,
    Cosine,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Distance, Metric::Dotproduct, Metric::Cosine];

    /// Distance ranks closest first, the similarities rank largest first.
    pub fn lower_is_closer(&self) -> bool {
        matches!(self, Metric::Distance)
    }

    /// Orders two scores so that the closer one comes first.
    pub fn rank(&self, a: f64, b: f64) -> Ordering {
        if self.lower_is_closer() {
            a.total_cmp(&b)
        } else {
            b.total_cmp(&a)
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Distance => write!(f, "Distance"),
            Metric::Dotproduct => write!(f, "Dotproduct"),
            Metric::Cosine => write!(f, "Cosine"),
        }
    }
}

impl FromStr for Metric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(Metric::Distance),
            "dotproduct" => Ok(Metric::Dotproduct),
            "cosine" => Ok(Metric::Cosine),
            _ => Err(CoreError::UnknownMetric(s.to_string())),
        }
    }
}

/// Square n x n table of one metric, row-major over embedding rows.
#[derive(Clone, Debug)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    fn zeros(n: usize) -> Self {
        SimilarityMatrix {
            n,
            values: vec![0.0; n * n],
        }
    }

    fn set_pair(&mut self, a: usize, b: usize, value: f64) {
        self.values[a * self.n + b] = value;
        self.values[b * self.n + a] = value;
    }

    pub fn get(&self, a: usize, b: usize) -> f64 {
        self.values[a * self.n + b]
    }

    pub fn len(&self) -> usize {
        self.n
    }
}

#[derive(Clone, Debug)]
pub struct Similarities {
    pub distance: SimilarityMatrix,
    pub dotproduct: SimilarityMatrix,
    pub cosine: SimilarityMatrix,
}

impl Similarities {
    pub fn matrix(&self, metric: Metric) -> &SimilarityMatrix {
        match metric {
            Metric::Distance => &self.distance,
            Metric::Dotproduct => &self.dotproduct,
            Metric::Cosine => &self.cosine,
        }
    }

    pub fn len(&self) -> usize {
        self.distance.len()
    }
}

/// All pairwise scores for every metric. Each unordered pair is computed once
/// and written to both cells, so the matrices are exactly symmetric. Products
/// and sums are taken in f64.
pub fn precompute(embeddings: &[Vec<f32>]) -> Result<Similarities, CoreError> {
    let dim = embeddings.first().ok_or(CoreError::EmptyInput)?.len();
    for (index, vector) in embeddings.iter().enumerate() {
        if vector.is_empty() || vector.len() != dim {
            return Err(CoreError::ShapeMismatch {
                index,
                expected: dim.max(1),
                found: vector.len(),
            });
        }
        check_finite(index, vector)?;
    }

    let n = embeddings.len();
    let norms = embeddings.iter().map(|v| magnitude(v)).collect::<Vec<_>>();
    let mut distance = SimilarityMatrix::zeros(n);
    let mut dotproduct = SimilarityMatrix::zeros(n);
    let mut cosine = SimilarityMatrix::zeros(n);

    for a in 0..n {
        for b in a..n {
            let dot = dot_product(&embeddings[a], &embeddings[b]);
            let (dist, cos) = if a == b {
                (0.0, if norms[a] > 0.0 { 1.0 } else { 0.0 })
            } else {
                (
                    euclidean_distance(&embeddings[a], &embeddings[b]),
                    cosine_from_parts(dot, norms[a], norms[b]),
                )
            };
            debug!(
                "a: {}, b: {}, distance: {}, dotproduct: {}, cosine: {}",
                a, b, dist, dot, cos
            );
            distance.set_pair(a, b, dist);
            dotproduct.set_pair(a, b, dot);
            cosine.set_pair(a, b, cos);
        }
    }

    Ok(Similarities {
        distance,
        dotproduct,
        cosine,
    })
}

pub(crate) fn check_finite(index: usize, vector: &[f32]) -> Result<(), CoreError> {
    match vector.iter().position(|v| !v.is_finite()) {
        Some(position) => Err(CoreError::NonFiniteEmbedding { index, position }),
        None => Ok(()),
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

fn magnitude(a: &[f32]) -> f64 {
    a.iter()
        .map(|x| *x as f64 * *x as f64)
        .sum::<f64>()
        .sqrt()
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = *x as f64 - *y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

// zero-norm vectors have no direction; score them 0 instead of NaN
fn cosine_from_parts(dot: f64, mag_a: f64, mag_b: f64) -> f64 {
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    (dot / (mag_a * mag_b)).clamp(-1.0, 1.0)
}
