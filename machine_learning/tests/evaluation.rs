use machine_learning::{
    MlError,
    metrics::{self, Confusion},
    model_selection::{StratifiedKFold, TabularDataset, get_k_fold_data},
};
use ndarray::{Array1, array};

fn dataset() -> TabularDataset {
    // 12 positives, 18 negatives, one feature mirroring the label.
    let rows = (0..30)
        .map(|i| {
            let label = (i % 5 < 2) as u8 as f32;
            vec![i as f32, label * 2. - 1., label]
        })
        .collect();

    TabularDataset::from_rows(rows).unwrap()
}

#[test]
fn k_fold_folds_mirror_the_class_balance() {
    let data = dataset();
    let (train, test) = get_k_fold_data(3, &data, Some(1)).unwrap();

    assert_eq!(train.len(), 3);
    for (train, test) in train.iter().zip(&test) {
        assert_eq!(test.nrows(), 10);
        assert_eq!(train.nrows(), 20);

        let positives = test.column(2).iter().filter(|&&l| l == 1.).count();
        assert_eq!(positives, 4);
    }
}

#[test]
fn folds_without_a_seed_still_partition_the_rows() {
    let data = dataset();
    let (_, test) = get_k_fold_data(5, &data, None).unwrap();

    let mut ids: Vec<usize> = test
        .iter()
        .flat_map(|fold| fold.column(0).to_vec())
        .map(|id| id as usize)
        .collect();
    ids.sort_unstable();

    assert_eq!(ids, (0..30).collect::<Vec<_>>());
}

#[test]
fn cross_validated_metrics_sum_counts_across_folds() {
    let data = dataset();
    let labels = data.labels();
    let splits = StratifiedKFold::new(3).with_seed(4).split(labels.view()).unwrap();

    let mut confusions = Vec::new();
    for (_, test) in splits {
        let rows = data.select(&test);
        let scores = rows.column(1).to_owned();
        // Flip the first prediction of every fold to get non-trivial counts.
        let mut pred = metrics::threshold(scores.view(), 0.);
        pred[0] = 1 - pred[0];
        let target: Array1<u8> = rows.column(2).mapv(|l| l as u8);

        confusions.push(Confusion::from_predictions(pred.view(), target.view()).unwrap());
    }

    let tp: Vec<usize> = confusions.iter().map(|c| c.tp).collect();
    let tn: Vec<usize> = confusions.iter().map(|c| c.tn).collect();
    let fp: Vec<usize> = confusions.iter().map(|c| c.fp).collect();
    let fn_: Vec<usize> = confusions.iter().map(|c| c.fn_).collect();

    let perf = metrics::performance(&tp, &tn, &fp, &fn_).unwrap();
    let total: Confusion = confusions.into_iter().sum();

    assert_eq!(total.total(), 30);
    assert_eq!(total.tp + total.tn, 27);
    assert!((perf.accuracy - 0.9).abs() < 1e-6);
    assert_eq!(perf, metrics::aggregate([total]));
}

#[test]
fn auc_ranks_separable_scores_perfectly() {
    let labels = array![0u8, 1, 0, 1, 1];
    let scores = array![-0.4f32, 0.9, -1.2, 0.3, 0.31];

    assert_eq!(metrics::auc(labels.view(), scores.view()).unwrap(), 1.);
}

#[test]
fn metric_inputs_must_align() {
    let pred = array![1u8, 0, 1];
    let target = array![1u8, 0];

    assert!(matches!(
        metrics::accuracy(pred.view(), target.view()),
        Err(MlError::ShapeMismatch { .. })
    ));
}
