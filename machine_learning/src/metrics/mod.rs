mod auc;
mod confusion;
mod performance;
mod rates;

pub use auc::auc;
pub use confusion::{Confusion, false_negative, false_positive, true_negative, true_positive};
pub use performance::{Performance, aggregate, performance};
pub use rates::{
    accuracy, fpr, log_counts, mcc, precision, sensitivity, specificity, threshold, tpr,
};
