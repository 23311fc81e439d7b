use std::collections::BTreeMap;

use log::{debug, warn};
use ml_core::{MlError, Result};
use ndarray::{Array2, ArrayView1};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use super::TabularDataset;

/// The train and test row indices of one fold.
pub type FoldIndices = (Vec<usize>, Vec<usize>);

/// Splits samples into `k` folds that keep the class proportions of the whole set.
///
/// Each class is dealt round-robin over the folds, continuing from the fold where the
/// previous class stopped, so fold sizes never differ by more than one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
    shuffle: bool,
    seed: Option<u64>,
}

impl StratifiedKFold {
    /// Creates a new `StratifiedKFold` without shuffling.
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            shuffle: false,
            seed: None,
        }
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fixes the shuffling seed, which implies shuffling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.shuffle = true;
        self
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Computes the folds for `labels`.
    ///
    /// # Arguments
    /// * `labels` - The integral class id of every sample.
    ///
    /// # Returns
    /// `n_splits` pairs of train and test indices, or an `InvalidInput` error if
    /// `n_splits < 2`, there are fewer samples than folds or a label is not a finite
    /// integer. Continuous targets are never bucketed into classes.
    pub fn split(&self, labels: ArrayView1<f32>) -> Result<Vec<FoldIndices>> {
        let k = self.n_splits;
        if k < 2 {
            return Err(MlError::InvalidInput("at least two folds are required"));
        }
        if labels.len() < k {
            return Err(MlError::InvalidInput("more folds than samples"));
        }

        let mut classes: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (i, &label) in labels.iter().enumerate() {
            if !label.is_finite() || label.fract() != 0. {
                return Err(MlError::InvalidInput("labels must be integral class ids"));
            }
            classes.entry(label as i64).or_default().push(i);
        }

        for (class, members) in classes.iter().filter(|(_, m)| m.len() < k) {
            warn!(
                "class {class} has {} samples, fewer than {k} folds",
                members.len()
            );
        }

        if self.shuffle {
            let mut rng = match self.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for members in classes.values_mut() {
                members.shuffle(&mut rng);
            }
        }

        let mut folds = vec![Vec::new(); k];
        let mut offset = 0;
        for members in classes.values() {
            for (j, &i) in members.iter().enumerate() {
                folds[(offset + j) % k].push(i);
            }
            offset = (offset + members.len()) % k;
        }

        let splits = (0..k)
            .map(|i| {
                let train = folds
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .flat_map(|(_, fold)| fold.iter().copied())
                    .collect();
                (train, folds[i].clone())
            })
            .collect();

        Ok(splits)
    }
}

/// Partitions `data` into `k` shuffled, stratified train/test pairs.
///
/// # Arguments
/// * `k` - The number of folds.
/// * `data` - The samples, stratified by their last column.
/// * `seed` - Fixes the shuffling when set; otherwise every call differs.
///
/// # Returns
/// The `k` train tables and the `k` test tables, as parallel vectors.
pub fn get_k_fold_data(
    k: usize,
    data: &TabularDataset,
    seed: Option<u64>,
) -> Result<(Vec<Array2<f32>>, Vec<Array2<f32>>)> {
    let mut kfold = StratifiedKFold::new(k).with_shuffle(true);
    if let Some(seed) = seed {
        kfold = kfold.with_seed(seed);
    }

    let labels = data.labels();
    let (train, test) = kfold
        .split(labels.view())?
        .into_iter()
        .map(|(train, test)| (data.select(&train), data.select(&test)))
        .unzip();

    debug!("split {} rows into {k} folds", data.len());
    Ok((train, test))
}
