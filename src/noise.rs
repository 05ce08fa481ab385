use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Ornstein-Uhlenbeck exploration noise.
///
/// Temporally correlated noise suited to inertial controls like steering:
/// each sample drifts back toward `mu` instead of jumping independently.
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: f64,
    dt: f64,
    state: Vec<f64>,
    rng: StdRng,
    normal: Normal<f64>,
}

impl OuNoise {
    pub fn new(dims: usize, theta: f64, sigma: f64) -> Self {
        OuNoise {
            mu: 0.0,
            theta,
            sigma,
            dt: 1e-2,
            state: vec![0.0; dims],
            rng: StdRng::from_os_rng(),
            normal: Normal::new(0.0, 1.0).expect("unit normal"),
        }
    }

    /// Advance the process one step and return the noise vector.
    pub fn sample(&mut self) -> Vec<f64> {
        let scale = self.sigma * self.dt.sqrt();
        for x in &mut self.state {
            let dw = self.normal.sample(&mut self.rng);
            *x += self.theta * (self.mu - *x) * self.dt + scale * dw;
        }
        self.state.clone()
    }

    /// Return the process to its mean state (call between episodes).
    pub fn reset(&mut self) {
        self.state.fill(self.mu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_has_requested_dims() {
        let mut noise = OuNoise::new(2, 0.6, 0.2);
        assert_eq!(noise.sample().len(), 2);
    }

    #[test]
    fn test_reset_returns_to_mean() {
        let mut noise = OuNoise::new(3, 0.6, 0.2);
        for _ in 0..50 {
            noise.sample();
        }
        noise.reset();
        // State is exactly mu after reset; the next sample drifts from it.
        assert!(noise.state.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_sigma_decays_toward_mean() {
        let mut noise = OuNoise::new(1, 0.6, 0.0);
        noise.state[0] = 1.0;
        let mut prev = 1.0;
        for _ in 0..10 {
            let x = noise.sample()[0];
            assert!(x < prev, "deterministic OU should decay toward mu");
            prev = x;
        }
    }

    #[test]
    fn test_samples_stay_bounded() {
        let mut noise = OuNoise::new(1, 0.6, 0.2);
        for _ in 0..1000 {
            let x = noise.sample()[0];
            assert!(x.abs() < 5.0, "mean-reverting noise escaped: {x}");
        }
    }
}
