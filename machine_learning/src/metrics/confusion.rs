use std::{iter::Sum, ops::Add};

use ml_core::{Result, ensure_len};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Counts the positions where `pred == pred_class` and `target == target_class`.
fn count(
    pred: ArrayView1<u8>,
    target: ArrayView1<u8>,
    pred_class: u8,
    target_class: u8,
) -> Result<usize> {
    ensure_len("predictions", pred.len(), target.len())?;

    Ok(pred
        .iter()
        .zip(&target)
        .filter(|&(&p, &t)| p == pred_class && t == target_class)
        .count())
}

/// Number of positive predictions whose target is positive.
pub fn true_positive(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<usize> {
    count(pred, target, 1, 1)
}

/// Number of negative predictions whose target is negative.
pub fn true_negative(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<usize> {
    count(pred, target, 0, 0)
}

/// Number of positive predictions whose target is negative.
pub fn false_positive(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<usize> {
    count(pred, target, 1, 0)
}

/// Number of negative predictions whose target is positive.
pub fn false_negative(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<usize> {
    count(pred, target, 0, 1)
}

/// `num / den`, defined as zero when the denominator is zero.
pub(crate) fn ratio(num: f64, den: f64) -> f32 {
    if den == 0. {
        log::debug!("zero denominator in rate, reporting 0");
        return 0.;
    }

    (num / den) as f32
}

/// The confusion counts of a binary classifier.
///
/// Counts are plain integers detached from any model computation, so they can be
/// accumulated across batches and folds freely.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl Confusion {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    /// Counts the four outcomes of `pred` against `target`.
    ///
    /// # Arguments
    /// * `pred` - Thresholded `0`/`1` predictions.
    /// * `target` - Ground truth `0`/`1` labels, same length as `pred`.
    ///
    /// # Returns
    /// The counts or a `ShapeMismatch` error.
    pub fn from_predictions(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<Self> {
        Ok(Self {
            tp: true_positive(pred, target)?,
            tn: true_negative(pred, target)?,
            fp: false_positive(pred, target)?,
            fn_: false_negative(pred, target)?,
        })
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// `(tp + tn) / total`
    pub fn accuracy(&self) -> f32 {
        ratio((self.tp + self.tn) as f64, self.total() as f64)
    }

    /// `tp / (tp + fp)`
    pub fn precision(&self) -> f32 {
        ratio(self.tp as f64, (self.tp + self.fp) as f64)
    }

    /// `tp / (tp + fn)`, also known as recall.
    pub fn sensitivity(&self) -> f32 {
        ratio(self.tp as f64, (self.tp + self.fn_) as f64)
    }

    /// `tn / (tn + fp)`
    pub fn specificity(&self) -> f32 {
        ratio(self.tn as f64, (self.tn + self.fp) as f64)
    }

    /// `fp / (fp + tn)`
    pub fn fpr(&self) -> f32 {
        ratio(self.fp as f64, (self.fp + self.tn) as f64)
    }

    /// `tp / (tp + fn)`
    pub fn tpr(&self) -> f32 {
        self.sensitivity()
    }

    /// The Matthews correlation coefficient.
    pub fn mcc(&self) -> f32 {
        let (tp, tn, fp, fn_) = (
            self.tp as f64,
            self.tn as f64,
            self.fp as f64,
            self.fn_ as f64,
        );

        let den = ((tp + fp) * (tn + fn_) * (tp + fn_) * (tn + fp)).sqrt();
        ratio(tp * tn - fp * fn_, den)
    }
}

impl Add for Confusion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            tp: self.tp + rhs.tp,
            tn: self.tn + rhs.tn,
            fp: self.fp + rhs.fp,
            fn_: self.fn_ + rhs.fn_,
        }
    }
}

impl Sum for Confusion {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn counts_each_outcome_once() {
        let pred = array![1u8, 1, 0, 0];
        let target = array![1u8, 0, 0, 1];

        let confusion = Confusion::from_predictions(pred.view(), target.view()).unwrap();

        assert_eq!(confusion, Confusion::new(1, 1, 1, 1));
    }

    #[test]
    fn rejects_length_mismatch() {
        let pred = array![1u8, 1, 0];
        let target = array![1u8, 0];

        assert!(true_positive(pred.view(), target.view()).is_err());
    }

    #[test]
    fn rates_are_zero_on_empty_denominators() {
        let empty = Confusion::default();

        assert_eq!(empty.accuracy(), 0.);
        assert_eq!(empty.precision(), 0.);
        assert_eq!(empty.sensitivity(), 0.);
        assert_eq!(empty.specificity(), 0.);
        assert_eq!(empty.fpr(), 0.);
        assert_eq!(empty.tpr(), 0.);
        assert_eq!(empty.mcc(), 0.);

        // Only negatives: MCC's denominator vanishes.
        let negatives = Confusion::new(0, 4, 0, 0);
        assert_eq!(negatives.mcc(), 0.);
        assert_eq!(negatives.accuracy(), 1.);
    }

    #[test]
    fn mcc_of_perfect_and_inverted_classifiers() {
        assert!((Confusion::new(3, 5, 0, 0).mcc() - 1.).abs() < 1e-6);
        assert!((Confusion::new(0, 0, 5, 3).mcc() + 1.).abs() < 1e-6);
    }

    #[test]
    fn sums_field_by_field() {
        let total: Confusion = [Confusion::new(3, 2, 1, 0), Confusion::new(5, 4, 0, 1)]
            .into_iter()
            .sum();

        assert_eq!(total, Confusion::new(8, 6, 1, 1));
    }
}
