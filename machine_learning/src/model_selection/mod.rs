mod dataset;
mod kfold;

pub use dataset::TabularDataset;
pub use kfold::{FoldIndices, StratifiedKFold, get_k_fold_data};
