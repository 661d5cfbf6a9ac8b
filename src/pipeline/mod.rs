//! Train-and-evaluate pipeline
//!
//! Runs the stages in a fixed order:
//! 1. load and split the dataset
//! 2. fit a random forest and print its accuracy and report
//! 3. build and fit the feed-forward network
//! 4. print the network's test loss and accuracy

mod config;

pub use config::{ForestSettings, ModelPaths, NetworkSettings, PipelineConfig};

use crate::error::Result;
use crate::evaluation::{evaluate_model, EvaluationResult};
use crate::preprocessing::{prepare_data_with, DataSplit};
use crate::training::{
    Activation, Adam, FitOptions, History, Layer, Loss, NetworkEvaluation, RandomForest, Sequential,
};
use ndarray::{Array1, Array2};
use std::time::Instant;
use tracing::info;

/// Everything a pipeline run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub forest: EvaluationResult,
    pub network: NetworkEvaluation,
    pub history: History,
    pub n_train: usize,
    pub n_test: usize,
}

/// Fit a 100-tree random forest
pub fn train_rf_model(x_train: &Array2<f64>, y_train: &Array1<f64>) -> Result<RandomForest> {
    train_rf_model_with(x_train, y_train, &ForestSettings::default())
}

pub fn train_rf_model_with(
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    settings: &ForestSettings,
) -> Result<RandomForest> {
    let start = Instant::now();
    let mut model = RandomForest::new(settings.n_estimators);
    if let Some(seed) = settings.random_state {
        model = model.with_random_state(seed);
    }
    model.fit(x_train, y_train)?;

    info!(
        trees = model.n_trees(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "random forest trained"
    );
    Ok(model)
}

/// Build the binary classifier network for `input_shape` features:
/// Dense(64, relu) → Dropout(0.2) → Dense(32, relu) → Dense(1, sigmoid),
/// compiled with Adam and binary cross-entropy.
pub fn create_nn_model(input_shape: usize) -> Result<Sequential> {
    create_nn_model_with(input_shape, &NetworkSettings::default())
}

pub fn create_nn_model_with(input_shape: usize, settings: &NetworkSettings) -> Result<Sequential> {
    let mut model = Sequential::new(input_shape)?;
    if let Some(seed) = settings.random_state {
        model = model.with_random_state(seed);
    }

    model
        .add(Layer::dense(64, Activation::ReLU))
        .add(Layer::dropout(0.2)?)
        .add(Layer::dense(32, Activation::ReLU))
        .add(Layer::dense(1, Activation::Sigmoid))
        .compile(
            Adam::new().with_learning_rate(settings.learning_rate),
            Loss::BinaryCrossentropy,
        )
}

/// Fit the network with the configured epochs, batch size and validation split
pub fn train_nn_model(
    model: &mut Sequential,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    settings: &NetworkSettings,
) -> Result<History> {
    let options = FitOptions {
        epochs: settings.epochs,
        batch_size: settings.batch_size,
        validation_split: settings.validation_split,
    };
    model.fit(x_train, y_train, &options)
}

/// Evaluate the network on the test split and print loss and accuracy
pub fn evaluate_nn_model(
    model: &Sequential,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<NetworkEvaluation> {
    let evaluation = model.evaluate(x_test, y_test)?;
    println!("Neural Network Loss: {:.4}", evaluation.loss);
    println!("Neural Network Accuracy: {:.4}", evaluation.accuracy);
    Ok(evaluation)
}

/// Run every stage in order and print the completion message
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    info!(dataset = %config.dataset_path.display(), "starting pipeline");

    let DataSplit {
        x_train,
        x_test,
        y_train,
        y_test,
        ..
    } = prepare_data_with(
        &config.dataset_path,
        &config.target_column,
        config.test_size,
        config.random_state,
    )?;

    let rf_model = train_rf_model_with(&x_train, &y_train, &config.forest)?;
    let forest = evaluate_model(&rf_model, &x_test, &y_test)?;

    let mut nn_model = create_nn_model_with(x_train.ncols(), &config.network)?;
    info!("network architecture\n{}", nn_model.summary());
    let history = train_nn_model(&mut nn_model, &x_train, &y_train, &config.network)?;
    let network = evaluate_nn_model(&nn_model, &x_test, &y_test)?;

    // Nothing is persisted
    info!(
        random_forest = %config.model_paths.random_forest.display(),
        neural_network = %config.model_paths.neural_network.display(),
        "model saving disabled, nothing written"
    );

    println!("Model training and evaluation complete!");

    Ok(PipelineReport {
        forest,
        network,
        history,
        n_train: x_train.nrows(),
        n_test: x_test.nrows(),
    })
}
