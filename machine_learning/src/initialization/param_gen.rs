use ml_core::Result;

use crate::arch::layers::Linear;

/// A `ParamGen` generates the initial values of a model's affine maps.
pub trait ParamGen {
    /// Fills the `[W | b]` parameters of `linear`.
    ///
    /// # Arguments
    /// * `linear` - The map being initialized, which gives the fans.
    /// * `params` - Exactly `linear.size()` values to overwrite.
    ///
    /// # Returns
    /// An `Init` error if no valid distribution exists for this map.
    fn fill(&mut self, linear: &Linear, params: &mut [f32]) -> Result<()>;

    /// Generates the parameters of every map in `linears`, laid out back to back.
    fn generate(&mut self, linears: &[&Linear]) -> Result<Vec<f32>> {
        let size = linears.iter().map(|linear| linear.size()).sum();
        let mut params = vec![0.; size];

        let mut offset = 0;
        for linear in linears {
            let end = offset + linear.size();
            self.fill(linear, &mut params[offset..end])?;
            offset = end;
        }

        Ok(params)
    }
}
