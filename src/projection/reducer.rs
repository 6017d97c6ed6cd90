use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Black-box dimensionality reduction: one 2D point per input row, in input
/// order, deterministic for a fixed configuration.
pub trait Reducer {
    fn reduce(&self, points: &[Vec<f32>]) -> Vec<[f64; 2]>;
}

/// Seeded Gaussian random projection onto two axes, applied to mean-centred rows.
#[derive(Clone, Debug)]
pub struct GaussianProjection {
    pub(crate) seed: u64,
}

impl GaussianProjection {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    fn axes(&self, dim: usize) -> Vec<[f64; 2]> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let scale = 1.0 / 2f64.sqrt();
        (0..dim)
            .map(|_| {
                let x: f64 = StandardNormal.sample(&mut rng);
                let y: f64 = StandardNormal.sample(&mut rng);
                [x * scale, y * scale]
            })
            .collect()
    }
}

impl Reducer for GaussianProjection {
    fn reduce(&self, points: &[Vec<f32>]) -> Vec<[f64; 2]> {
        let dim = match points.first() {
            Some(p) => p.len(),
            None => return vec![],
        };
        debug!(
            "reduce {} points of dim {} with seed {}",
            points.len(),
            dim,
            self.seed
        );

        let mut mean = vec![0f64; dim];
        for p in points {
            for (m, v) in mean.iter_mut().zip(p.iter()) {
                *m += *v as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= points.len() as f64);

        let axes = self.axes(dim);
        points
            .iter()
            .map(|p| {
                let mut xy = [0.0; 2];
                for ((v, m), axis) in p.iter().zip(mean.iter()).zip(axes.iter()) {
                    let centred = *v as f64 - m;
                    xy[0] += centred * axis[0];
                    xy[1] += centred * axis[1];
                }
                xy
            })
            .collect()
    }
}
