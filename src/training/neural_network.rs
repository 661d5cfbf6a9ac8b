//! Feed-forward neural network
//!
//! A layer stack trained with mini-batch backpropagation. Models are built
//! with [`Sequential::new`] and [`Sequential::add`], given weights and an
//! optimizer by [`Sequential::compile`], and then trained with
//! [`Sequential::fit`].

use super::adam::Adam;
use super::layers::{Activation, Layer, LayerCache};
use super::models::Classifier;
use crate::error::{PipelineError, Result};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs
const EPSILON: f64 = 1e-7;

/// Training loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Loss {
    /// Binary cross-entropy on probabilities
    BinaryCrossentropy,
}

impl Loss {
    /// Mean loss over the batch
    pub fn compute(self, y_pred: ArrayView1<f64>, y_true: ArrayView1<f64>) -> f64 {
        let n = y_true.len().max(1) as f64;
        let total: f64 = match self {
            Loss::BinaryCrossentropy => y_pred
                .iter()
                .zip(y_true.iter())
                .map(|(&p, &y)| {
                    let p = p.clamp(EPSILON, 1.0 - EPSILON);
                    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
                })
                .sum(),
        };
        total / n
    }

    /// Error at the pre-activation of the sigmoid output unit, already divided by batch size
    fn output_delta(self, output: &Array2<f64>, y: &Array2<f64>) -> Array2<f64> {
        let n = y.nrows().max(1) as f64;
        match self {
            // Sigmoid and cross-entropy cancel to (p - y)
            Loss::BinaryCrossentropy => (output - y) / n,
        }
    }
}

/// Settings for [`Sequential::fit`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of rows, taken from the end, held out for validation
    pub validation_split: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            validation_split: 0.1,
        }
    }
}

/// Metrics recorded after one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochLog {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
}

/// Per-epoch training record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochLog>,
}

impl History {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochLog> {
        self.epochs.last()
    }
}

/// Loss and accuracy on a labelled set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvaluation {
    pub loss: f64,
    pub accuracy: f64,
}

/// A linear stack of layers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequential {
    input_dim: usize,
    layers: Vec<Layer>,
    optimizer: Option<Adam>,
    loss: Option<Loss>,
    random_state: Option<u64>,
}

impl Sequential {
    /// Start an empty model taking rows of `input_dim` features
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(PipelineError::invalid_parameter(
                "input_dim",
                input_dim,
                "must be a positive number of features",
            ));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
            optimizer: None,
            loss: None,
            random_state: None,
        })
    }

    /// Seed weight initialisation, shuffling and dropout
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Append a layer
    pub fn add(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Initialise weights and attach the optimizer and loss.
    ///
    /// Binary cross-entropy needs a final dense layer with one sigmoid unit.
    pub fn compile(mut self, optimizer: Adam, loss: Loss) -> Result<Self> {
        match self.layers.last() {
            Some(Layer::Dense(d)) if d.units == 1 && d.activation == Activation::Sigmoid => {}
            _ => {
                return Err(PipelineError::TrainingError(format!(
                    "{:?} needs a final Dense(1, Sigmoid) layer",
                    loss
                )))
            }
        }

        let mut rng = self.rng(0);
        let mut dim = self.input_dim;
        for layer in &mut self.layers {
            if let Layer::Dense(d) = layer {
                if d.units == 0 {
                    return Err(PipelineError::invalid_parameter("units", 0, "must be at least 1"));
                }
                d.build(dim, &mut rng);
            }
            dim = layer.output_dim(dim);
        }

        self.optimizer = Some(optimizer);
        self.loss = Some(loss);
        Ok(self)
    }

    fn rng(&self, stream: u64) -> Xoshiro256PlusPlus {
        match self.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(stream)),
            None => Xoshiro256PlusPlus::from_entropy(),
        }
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_compiled(&self) -> bool {
        self.optimizer.is_some() && self.loss.is_some()
    }

    /// Width of the final layer
    pub fn output_dim(&self) -> usize {
        self.layers
            .iter()
            .fold(self.input_dim, |dim, layer| layer.output_dim(dim))
    }

    /// Total number of trainable parameters
    pub fn count_params(&self) -> usize {
        let mut dim = self.input_dim;
        let mut total = 0;
        for layer in &self.layers {
            total += layer.n_params(dim);
            dim = layer.output_dim(dim);
        }
        total
    }

    /// Layer table with output shapes and parameter counts
    pub fn summary(&self) -> String {
        self.to_string()
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<()> {
        if !self.is_compiled() {
            return Err(PipelineError::ModelNotFitted);
        }
        if x.ncols() != self.input_dim {
            return Err(PipelineError::ShapeError {
                expected: format!("{} features", self.input_dim),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    fn forward_infer(&self, x: &Array2<f64>) -> Array2<f64> {
        self.layers
            .iter()
            .fold(x.clone(), |input, layer| layer.infer(&input))
    }

    fn forward_train<R: Rng + ?Sized>(&self, x: &Array2<f64>, rng: &mut R) -> (Array2<f64>, Vec<LayerCache>) {
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current = x.clone();
        for layer in &self.layers {
            let (out, cache) = layer.forward_train(&current, rng);
            caches.push(cache);
            current = out;
        }
        (current, caches)
    }

    /// Output of the first unit of the last layer, one value per row.
    ///
    /// With a sigmoid output these are probabilities in [0, 1].
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x)?;
        Ok(self.forward_infer(x).column(0).to_owned())
    }

    /// Predictions thresholded at 0.5
    pub fn predict_classes(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        Ok(self.predict(x)?.mapv(threshold))
    }

    /// Loss and accuracy in inference mode (no dropout)
    pub fn evaluate(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<NetworkEvaluation> {
        self.check_input(x)?;
        check_lengths(x, y)?;
        let loss_fn = self.loss.ok_or(PipelineError::ModelNotFitted)?;
        let y_pred = self.forward_infer(x).column(0).to_owned();
        Ok(NetworkEvaluation {
            loss: loss_fn.compute(y_pred.view(), y.view()),
            accuracy: binary_accuracy(y_pred.view(), y.view()),
        })
    }

    /// Train for a fixed number of epochs.
    ///
    /// The first `floor(n * (1 - validation_split))` rows are shuffled and fed
    /// in mini-batches; the remaining rows are held out and scored after
    /// every epoch.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, options: &FitOptions) -> Result<History> {
        if !self.is_compiled() {
            return Err(PipelineError::TrainingError(
                "model must be compiled before fit".to_string(),
            ));
        }
        self.check_input(x)?;
        check_lengths(x, y)?;
        if options.batch_size == 0 {
            return Err(PipelineError::invalid_parameter("batch_size", 0, "must be at least 1"));
        }
        if !(0.0..1.0).contains(&options.validation_split) {
            return Err(PipelineError::invalid_parameter(
                "validation_split",
                options.validation_split,
                "must be in [0, 1)",
            ));
        }

        let n_samples = x.nrows();
        let train_size = train_rows(n_samples, options.validation_split);
        let val_size = n_samples - train_size;
        if train_size == 0 {
            return Err(PipelineError::TrainingError(
                "no rows left for training after the validation split".to_string(),
            ));
        }

        let x_train = x.slice(s![..train_size, ..]).to_owned();
        let y_train = y.slice(s![..train_size]).to_owned();
        let x_val = x.slice(s![train_size.., ..]).to_owned();
        let y_val = y.slice(s![train_size..]).to_owned();

        let mut rng = self.rng(1);
        let mut history = History::default();

        info!(
            train = train_size,
            validation = val_size,
            epochs = options.epochs,
            batch_size = options.batch_size,
            params = self.count_params(),
            "fitting network"
        );

        for epoch in 0..options.epochs {
            let mut indices: Vec<usize> = (0..train_size).collect();
            indices.shuffle(&mut rng);

            let mut loss_sum = 0.0;
            let mut correct = 0.0;

            for batch in indices.chunks(options.batch_size) {
                let x_batch = x_train.select(Axis(0), batch);
                let y_batch = y_train.select(Axis(0), batch);

                let (output, caches) = self.forward_train(&x_batch, &mut rng);
                let y_pred = output.column(0);
                let batch_len = batch.len() as f64;

                let batch_loss = self.loss_fn()?.compute(y_pred, y_batch.view());
                loss_sum += batch_loss * batch_len;
                correct += binary_accuracy(y_pred, y_batch.view()) * batch_len;

                let grads = self.backward(&output, &y_batch, &caches)?;
                self.apply_gradients(grads)?;
                debug!(epoch = epoch + 1, batch_loss, "batch step");
            }

            let (val_loss, val_accuracy) = if val_size > 0 {
                let eval = self.evaluate(&x_val, &y_val)?;
                (Some(eval.loss), Some(eval.accuracy))
            } else {
                (None, None)
            };

            let log = EpochLog {
                epoch: epoch + 1,
                loss: loss_sum / train_size as f64,
                accuracy: correct / train_size as f64,
                val_loss,
                val_accuracy,
            };
            info!(
                epoch = log.epoch,
                epochs = options.epochs,
                loss = log.loss,
                accuracy = log.accuracy,
                val_loss = ?log.val_loss,
                val_accuracy = ?log.val_accuracy,
                "epoch finished"
            );
            history.epochs.push(log);
        }

        Ok(history)
    }

    fn loss_fn(&self) -> Result<Loss> {
        self.loss.ok_or(PipelineError::ModelNotFitted)
    }

    fn backward(
        &self,
        output: &Array2<f64>,
        y: &Array1<f64>,
        caches: &[LayerCache],
    ) -> Result<Vec<Option<(Array2<f64>, Array1<f64>)>>> {
        let loss_fn = self.loss_fn()?;
        let n_layers = self.layers.len();
        let mut grads = vec![None; n_layers];

        let y_col = y.view().insert_axis(Axis(1)).to_owned();
        let last = n_layers - 1;

        let mut grad = match (&self.layers[last], &caches[last]) {
            (Layer::Dense(d), LayerCache::Dense { input, .. }) => {
                let delta = loss_fn.output_delta(output, &y_col);
                let (grad_in, grad_w, grad_b) = d.backward_from_delta(&delta, input);
                grads[last] = Some((grad_w, grad_b));
                grad_in
            }
            _ => {
                return Err(PipelineError::TrainingError(
                    "the last layer must be a dense layer".to_string(),
                ))
            }
        };

        for i in (0..last).rev() {
            let (grad_in, param_grads) = self.layers[i].backward(&grad, &caches[i]);
            grads[i] = param_grads;
            grad = grad_in;
        }

        Ok(grads)
    }

    fn apply_gradients(&mut self, grads: Vec<Option<(Array2<f64>, Array1<f64>)>>) -> Result<()> {
        let optimizer = self.optimizer.as_mut().ok_or(PipelineError::ModelNotFitted)?;
        optimizer.begin_step();
        for (slot, (layer, grad)) in self.layers.iter_mut().zip(grads).enumerate() {
            if let (Layer::Dense(d), Some((grad_w, grad_b))) = (layer, grad) {
                optimizer.update(slot, &mut d.weights, &mut d.bias, &grad_w, &grad_b);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Sequential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule_heavy = "=".repeat(62);
        writeln!(f, "Model: \"sequential\"")?;
        writeln!(f, "{:<30}{:<20}{:>12}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{}", rule_heavy)?;

        let mut dim = self.input_dim;
        let mut dense_seen = 0;
        let mut dropout_seen = 0;
        for layer in &self.layers {
            let counter = match layer {
                Layer::Dense(_) => &mut dense_seen,
                Layer::Dropout(_) => &mut dropout_seen,
            };
            let base = layer.kind().to_lowercase();
            let name = if *counter == 0 { base } else { format!("{}_{}", base, counter) };
            *counter += 1;

            let params = layer.n_params(dim);
            dim = layer.output_dim(dim);
            writeln!(
                f,
                "{:<30}{:<20}{:>12}",
                format!("{} ({})", name, layer.kind()),
                format!("(None, {})", dim),
                params
            )?;
        }

        writeln!(f, "{}", rule_heavy)?;
        write!(f, "Total params: {}", self.count_params())
    }
}

impl Classifier for Sequential {
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.predict_classes(x)
    }

    fn name(&self) -> &'static str {
        "Sequential"
    }
}

/// Rows kept for training before the trailing validation rows
fn train_rows(n_samples: usize, validation_split: f64) -> usize {
    (n_samples as f64 * (1.0 - validation_split)) as usize
}

fn threshold(p: f64) -> f64 {
    if p > 0.5 {
        1.0
    } else {
        0.0
    }
}

fn binary_accuracy(y_pred: ArrayView1<f64>, y_true: ArrayView1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(&p, &y)| threshold(p) == y)
        .count();
    correct as f64 / y_true.len() as f64
}

fn check_lengths(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(PipelineError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if x.nrows() == 0 {
        return Err(PipelineError::DataError("empty input".to_string()));
    }
    Ok(())
}
