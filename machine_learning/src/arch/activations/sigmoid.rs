/// The logistic function. Saturates to `0` or `1` at `f32` precision for large inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sigmoid;

impl Sigmoid {
    pub fn new() -> Self {
        Self
    }

    pub fn f(&self, z: f32) -> f32 {
        // Split on the sign so `exp` never overflows.
        if z >= 0. {
            1. / (1. + (-z).exp())
        } else {
            let e = z.exp();
            e / (1. + e)
        }
    }

    pub fn df(&self, z: f32) -> f32 {
        let s = self.f(z);
        s * (1. - s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_and_centered() {
        let sigmoid = Sigmoid::new();

        assert_eq!(sigmoid.f(0.), 0.5);
        for z in [-15., -3., -0.1, 0.1, 3., 15.] {
            let s = sigmoid.f(z);
            assert!(s > 0. && s < 1., "sigmoid({z}) = {s}");
        }
        assert!(sigmoid.f(-1000.).is_finite());
        assert!((sigmoid.df(0.) - 0.25).abs() < 1e-7);
    }
}
