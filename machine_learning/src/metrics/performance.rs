use log::info;
use ml_core::{Result, ensure_len};
use serde::{Deserialize, Serialize};

use super::Confusion;

/// The rates reported for a whole cross-validation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub accuracy: f32,
    pub sensitivity: f32,
    pub specificity: f32,
    pub precision: f32,
    pub mcc: f32,
    pub fpr: f32,
}

impl From<Confusion> for Performance {
    fn from(c: Confusion) -> Self {
        Self {
            accuracy: c.accuracy(),
            sensitivity: c.sensitivity(),
            specificity: c.specificity(),
            precision: c.precision(),
            mcc: c.mcc(),
            fpr: c.fpr(),
        }
    }
}

/// Combines per-fold confusion counts into overall rates.
///
/// The counts are summed across folds first and the rates computed on the totals, which
/// is not the same as averaging per-fold rates.
///
/// # Arguments
/// * `tp`, `tn`, `fp`, `fn_` - Per-fold counts, all of the same length.
///
/// # Returns
/// The aggregated rates or a `ShapeMismatch` error.
pub fn performance(tp: &[usize], tn: &[usize], fp: &[usize], fn_: &[usize]) -> Result<Performance> {
    ensure_len("true negative folds", tn.len(), tp.len())?;
    ensure_len("false positive folds", fp.len(), tp.len())?;
    ensure_len("false negative folds", fn_.len(), tp.len())?;

    let folds = (0..tp.len()).map(|i| Confusion::new(tp[i], tn[i], fp[i], fn_[i]));
    Ok(aggregate(folds))
}

/// Same as [`performance`], over already grouped counts.
pub fn aggregate<I>(folds: I) -> Performance
where
    I: IntoIterator<Item = Confusion>,
{
    let total: Confusion = folds.into_iter().sum();
    info!(
        "TN:{},TP:{},FP:{},FN:{}",
        total.tn,
        total.tp,
        total.fp,
        total.fn_
    );

    total.into()
}
