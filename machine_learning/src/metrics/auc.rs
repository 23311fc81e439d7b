use ml_core::{MlError, Result, ensure_len};
use ndarray::ArrayView1;

/// Area under the ROC curve of `scores` against binary `labels`.
///
/// Computed as the normalized Mann–Whitney rank statistic, tied scores sharing their
/// average rank.
///
/// # Arguments
/// * `labels` - Ground truth, every value `0` or `1`.
/// * `scores` - Continuous scores, higher meaning more likely positive.
///
/// # Returns
/// The AUC in `[0, 1]`, or an `InvalidInput` error if only one class is present, a label
/// is not binary or a score is NaN.
pub fn auc(labels: ArrayView1<u8>, scores: ArrayView1<f32>) -> Result<f32> {
    ensure_len("scores", scores.len(), labels.len())?;

    if labels.iter().any(|&l| l > 1) {
        return Err(MlError::InvalidInput("labels must be 0 or 1"));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(MlError::InvalidInput("scores must not be NaN"));
    }

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(MlError::InvalidInput(
            "AUC is undefined when only one class is present",
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0f64;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }

        // 1-based ranks start + 1 ..= end + 1 share their mean.
        let rank = (start + end) as f64 / 2. + 1.;
        let tied_positives = order[start..=end]
            .iter()
            .filter(|&&i| labels[i] == 1)
            .count();
        positive_rank_sum += rank * tied_positives as f64;

        start = end + 1;
    }

    let (p, n) = (positives as f64, negatives as f64);
    Ok(((positive_rank_sum - p * (p + 1.) / 2.) / (p * n)) as f32)
}
