use std::{env, process};

use log::{debug, error, info, warn};
use machine_learning::{
    Model, Result,
    arch::{
        GatedGraphConvNet,
        loss::{LossFn, Mse},
    },
    config::Config,
    graph::{Graph, normalize_adjacencies, to_sparse_tensor},
    metrics::{self, Performance},
    model_selection::StratifiedKFold,
    optimization::Optimizer,
};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

const SAMPLES: usize = 60;
const NODES: usize = 6;

#[derive(Serialize)]
struct Report {
    folds: usize,
    performance: Performance,
    auc: Option<f32>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let mut rng = StdRng::seed_from_u64(config.eval.seed.unwrap_or_default());
    let (graphs, labels) = synthetic_graphs(&mut rng, &config)?;

    let mut kfold = StratifiedKFold::new(config.eval.folds).with_shuffle(true);
    if let Some(seed) = config.eval.seed {
        kfold = kfold.with_seed(seed);
    }

    let strata = labels.mapv(f32::from);
    let mut confusions = Vec::with_capacity(config.eval.folds);
    let mut all_scores = Vec::with_capacity(SAMPLES);
    let mut all_labels = Vec::with_capacity(SAMPLES);

    for (fold, (train, test)) in kfold.split(strata.view())?.into_iter().enumerate() {
        let net = fit(&config, &graphs, &labels, &train)?;

        let scores = test
            .iter()
            .map(|&i| net.forward(&graphs[i]).map(|out| out.score))
            .collect::<Result<Array1<f32>>>()?;
        let pred = scores.mapv(|s| config.eval.predict(s));
        let target = labels.select(Axis(0), &test);

        info!("fold {fold}: {} train, {} test", train.len(), test.len());
        confusions.push(metrics::log_counts(pred.view(), target.view())?);

        all_scores.extend(scores.iter().copied());
        all_labels.extend(target.iter().copied());
    }

    let report = Report {
        folds: config.eval.folds,
        performance: metrics::aggregate(confusions),
        auc: auc_or_warn(
            Array1::from(all_labels).view(),
            Array1::from(all_scores).view(),
        ),
    };

    let json = serde_json::to_string_pretty(&report)?;
    println!("{json}");
    Ok(())
}

/// The AUC over every fold, or `None` with a warning when it is undefined, e.g. a
/// single class among the labels.
fn auc_or_warn(labels: ArrayView1<u8>, scores: ArrayView1<f32>) -> Option<f32> {
    match metrics::auc(labels, scores) {
        Ok(auc) => Some(auc),
        Err(e) => {
            warn!("auc left out of the report: {e}");
            None
        }
    }
}

/// Trains a freshly initialized network on the graphs at `train`.
fn fit(
    config: &Config,
    graphs: &[Graph],
    labels: &Array1<u8>,
    train: &[usize],
) -> Result<GatedGraphConvNet> {
    let mut net = GatedGraphConvNet::from_config(&config.model)?.with_gates(false);
    let mut optimizer = Optimizer::for_model(&config.train.optimizer, &net);
    let loss_fn = Mse::new();
    let mut grad = vec![0.; net.size()];

    for epoch in 0..config.train.epochs {
        let mut total = 0.;
        for &i in train {
            let target = config.eval.label_to_score(labels[i])?;
            let score = net.score(&graphs[i])?;
            total += loss_fn.loss(score, target);

            grad.fill(0.);
            net.backward(&graphs[i], &loss_fn.loss_prime(score, target), &mut grad)?;
            optimizer.step(&mut net, &grad)?;
        }

        debug!("epoch {epoch}: loss {}", total / train.len() as f32);
    }

    Ok(net)
}

/// Generates labeled graphs where positive samples have denser operators and larger
/// features. Every other graph is stored sparse.
fn synthetic_graphs(rng: &mut StdRng, config: &Config) -> Result<(Vec<Graph>, Array1<u8>)> {
    let channels = config.model.in_channels;
    let labels: Array1<u8> = (0..SAMPLES).map(|i| (i % 3 == 0) as u8).collect();

    let adjacencies: Vec<Array2<f32>> = labels
        .iter()
        .map(|&label| {
            let density = if label == 1 { 0.6 } else { 0.25 };
            Array2::from_shape_fn((NODES, NODES), |(i, j)| {
                (i == j || rng.random_bool(density)) as u8 as f32
            })
        })
        .collect();
    let adjacencies = normalize_adjacencies(&adjacencies, config.eval.symmetric);

    let mut graphs = Vec::with_capacity(SAMPLES);
    for (i, (adj, &label)) in adjacencies.into_iter().zip(&labels).enumerate() {
        let shift = label as f32 * 0.5;
        let features =
            Array2::from_shape_fn((NODES, channels), |_| rng.random::<f32>() + shift);

        let graph = if i % 2 == 0 {
            Graph::new(features, adj)?
        } else {
            Graph::new(features, to_sparse_tensor(&adj, config.model.device)?)?
        };
        graphs.push(graph);
    }

    Ok((graphs, labels))
}
