use ml_core::{MlError, Result, ensure_len};
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use super::ParamGen;
use crate::arch::layers::Linear;

/// How a random initialization derives its distribution from a map's fans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scheme {
    /// `U(low, high)` regardless of the fans.
    Uniform { low: f32, high: f32 },
    /// `N(mean, std_dev²)` regardless of the fans.
    Normal { mean: f32, std_dev: f32 },
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, the default of an affine layer.
    FanInUniform,
    /// `U(-a, a)` with `a = sqrt(6 / (fan_in + fan_out))`.
    XavierUniform,
    /// `N(0, 2 / (fan_in + fan_out))`.
    Xavier,
    /// `N(0, 2 / fan_in)`.
    Kaiming,
    /// `N(0, 1 / fan_in)`.
    Lecun,
}

/// Samples every parameter of a map, biases included, from a [`Scheme`].
pub struct RandParamGen<R: Rng> {
    rng: R,
    scheme: Scheme,
}

impl<R: Rng> RandParamGen<R> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - The source of randomness, consumed map after map.
    /// * `scheme` - The distribution family to draw from.
    pub fn new(rng: R, scheme: Scheme) -> Self {
        Self { rng, scheme }
    }

    fn sample_into<D: Distribution<f32>>(&mut self, distribution: D, params: &mut [f32]) {
        for (p, v) in params.iter_mut().zip(distribution.sample_iter(&mut self.rng)) {
            *p = v;
        }
    }

    fn uniform(&mut self, low: f32, high: f32, params: &mut [f32]) -> Result<()> {
        let uniform = Uniform::new(low, high).map_err(|e| MlError::Init(e.to_string()))?;
        self.sample_into(uniform, params);
        Ok(())
    }

    fn normal(&mut self, mean: f32, std_dev: f32, params: &mut [f32]) -> Result<()> {
        let normal = Normal::new(mean, std_dev).map_err(|e| MlError::Init(e.to_string()))?;
        self.sample_into(normal, params);
        Ok(())
    }
}

impl<R: Rng> ParamGen for RandParamGen<R> {
    fn fill(&mut self, linear: &Linear, params: &mut [f32]) -> Result<()> {
        ensure_len("linear params", params.len(), linear.size())?;

        let (fan_in, fan_out) = linear.dim();
        let (fan_in, fan_sum) = (fan_in as f32, (fan_in + fan_out) as f32);

        match self.scheme {
            Scheme::Uniform { low, high } => self.uniform(low, high, params),
            Scheme::Normal { mean, std_dev } => self.normal(mean, std_dev, params),
            Scheme::FanInUniform => {
                let a = fan_in.sqrt().recip();
                self.uniform(-a, a, params)
            }
            Scheme::XavierUniform => {
                let a = (6. / fan_sum).sqrt();
                self.uniform(-a, a, params)
            }
            Scheme::Xavier => self.normal(0., (2. / fan_sum).sqrt(), params),
            Scheme::Kaiming => self.normal(0., (2. / fan_in).sqrt(), params),
            Scheme::Lecun => self.normal(0., fan_in.sqrt().recip(), params),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn param_gen(scheme: Scheme) -> RandParamGen<StdRng> {
        RandParamGen::new(StdRng::seed_from_u64(42), scheme)
    }

    #[test]
    fn fan_in_uniform_scales_with_each_map() {
        let linears = [Linear::new((4, 25)), Linear::new((100, 1))];
        let refs: Vec<&Linear> = linears.iter().collect();

        let params = param_gen(Scheme::FanInUniform).generate(&refs).unwrap();
        let (first, second) = params.split_at(linears[0].size());

        assert_eq!(params.len(), 125 + 101);
        assert!(first.iter().all(|p| p.abs() <= 0.5));
        assert!(second.iter().all(|p| p.abs() <= 0.1));
        assert!(first.iter().any(|p| p.abs() > 0.1));
    }

    #[test]
    fn same_seed_same_parameters() {
        let linear = Linear::new((3, 3));

        let a = param_gen(Scheme::Kaiming).generate(&[&linear]).unwrap();
        let b = param_gen(Scheme::Kaiming).generate(&[&linear]).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn invalid_distributions_are_rejected() {
        let linear = Linear::new((1, 1));

        let uniform = param_gen(Scheme::Uniform { low: 1., high: 1. }).generate(&[&linear]);
        assert!(matches!(uniform, Err(MlError::Init(_))));

        let normal = param_gen(Scheme::Normal {
            mean: 0.,
            std_dev: f32::NAN,
        })
        .generate(&[&linear]);
        assert!(matches!(normal, Err(MlError::Init(_))));
    }
}
