use log::info;
use ml_core::Result;
use ndarray::{Array1, ArrayView1};

use super::Confusion;

/// Turns continuous scores into `0`/`1` predictions, `1` when `score >= cutoff`.
pub fn threshold(scores: ArrayView1<f32>, cutoff: f32) -> Array1<u8> {
    scores.mapv(|s| (s >= cutoff) as u8)
}

/// `tp / (tp + fp)`, zero when nothing is predicted positive.
pub fn precision(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.precision())
}

/// `tp / (tp + fn)`, zero when there are no positive targets.
pub fn sensitivity(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.sensitivity())
}

/// `tn / (tn + fp)`, zero when there are no negative targets.
pub fn specificity(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.specificity())
}

/// Fraction of correct predictions, zero for empty inputs.
pub fn accuracy(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.accuracy())
}

/// Matthews correlation coefficient, zero when any marginal is empty.
pub fn mcc(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.mcc())
}

/// False positive rate `fp / (fp + tn)`.
pub fn fpr(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.fpr())
}

/// True positive rate `tp / (tp + fn)`.
pub fn tpr(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<f32> {
    Ok(Confusion::from_predictions(pred, target)?.tpr())
}

/// Counts the confusion outcomes of a batch and logs them.
pub fn log_counts(pred: ArrayView1<u8>, target: ArrayView1<u8>) -> Result<Confusion> {
    let c = Confusion::from_predictions(pred, target)?;
    info!("TN:{},TP:{},FP:{},FN:{}", c.tn, c.tp, c.fp, c.fn_);
    Ok(c)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn precision_without_positive_predictions_is_zero() {
        let pred = array![0u8, 0];
        let target = array![0u8, 0];

        assert_eq!(precision(pred.view(), target.view()).unwrap(), 0.);
        assert_eq!(sensitivity(pred.view(), target.view()).unwrap(), 0.);
        assert_eq!(tpr(pred.view(), target.view()).unwrap(), 0.);
        assert_eq!(mcc(pred.view(), target.view()).unwrap(), 0.);
        assert_eq!(specificity(pred.view(), target.view()).unwrap(), 1.);
        assert_eq!(fpr(pred.view(), target.view()).unwrap(), 0.);
    }

    #[test]
    fn rates_of_a_mixed_batch() {
        let pred = array![1u8, 1, 1, 0, 0];
        let target = array![1u8, 1, 0, 0, 1];

        assert!((accuracy(pred.view(), target.view()).unwrap() - 0.6).abs() < 1e-6);
        assert!((precision(pred.view(), target.view()).unwrap() - 2. / 3.).abs() < 1e-6);
        assert!((sensitivity(pred.view(), target.view()).unwrap() - 2. / 3.).abs() < 1e-6);
        assert!((specificity(pred.view(), target.view()).unwrap() - 0.5).abs() < 1e-6);
        assert!((fpr(pred.view(), target.view()).unwrap() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn threshold_is_inclusive() {
        let scores = array![0.2f32, 0.5, 0.9];

        assert_eq!(threshold(scores.view(), 0.5), array![0u8, 1, 1]);
    }
}
