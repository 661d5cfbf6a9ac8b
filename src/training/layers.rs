//! Layers for the feed-forward network

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Rectified Linear Unit
    #[default]
    ReLU,
    /// Sigmoid
    Sigmoid,
}

impl Activation {
    pub fn apply(self, z: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(sigmoid),
        }
    }

    /// Derivative with respect to the pre-activation `z`, given the output `a`
    pub fn derivative(self, z: &Array2<f64>, a: &Array2<f64>) -> Array2<f64> {
        match self {
            Activation::ReLU => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => a * &a.mapv(|s| 1.0 - s),
        }
    }
}

fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

/// Fully connected layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub units: usize,
    pub activation: Activation,
    pub(crate) weights: Array2<f64>,
    pub(crate) bias: Array1<f64>,
}

impl Dense {
    pub fn new(units: usize, activation: Activation) -> Self {
        Self {
            units,
            activation,
            weights: Array2::zeros((0, units)),
            bias: Array1::zeros(units),
        }
    }

    /// Glorot-uniform weights, zero bias
    pub(crate) fn build<R: Rng + ?Sized>(&mut self, n_inputs: usize, rng: &mut R) {
        let limit = (6.0 / (n_inputs + self.units) as f64).sqrt();
        self.weights = Array2::from_shape_fn((n_inputs, self.units), |_| rng.gen_range(-limit..limit));
        self.bias = Array1::zeros(self.units);
    }

    pub(crate) fn is_built(&self) -> bool {
        self.weights.nrows() > 0
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f64> {
        &self.bias
    }

    fn forward(&self, input: &Array2<f64>) -> (Array2<f64>, Array2<f64>) {
        let z = input.dot(&self.weights) + &self.bias;
        let a = self.activation.apply(&z);
        (z, a)
    }

    /// Gradients from the error at the pre-activation: (grad_input, grad_w, grad_b)
    pub(crate) fn backward_from_delta(
        &self,
        delta: &Array2<f64>,
        input: &Array2<f64>,
    ) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
        let grad_w = input.t().dot(delta);
        let grad_b = delta.sum_axis(Axis(0));
        let grad_in = delta.dot(&self.weights.t());
        (grad_in, grad_w, grad_b)
    }
}

/// Dropout layer (inverted dropout, active only while training)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(PipelineError::invalid_parameter("rate", rate, "must be in [0, 1)"));
        }
        Ok(Self { rate })
    }

    fn mask<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f64> {
        let scale = 1.0 / (1.0 - self.rate);
        Array2::from_shape_fn(shape, |_| if rng.gen::<f64>() >= self.rate { scale } else { 0.0 })
    }
}

/// A network layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Layer {
    Dense(Dense),
    Dropout(Dropout),
}

/// Values kept from the training forward pass for backpropagation
#[derive(Debug)]
pub(crate) enum LayerCache {
    Dense {
        input: Array2<f64>,
        z: Array2<f64>,
        output: Array2<f64>,
    },
    Dropout {
        mask: Option<Array2<f64>>,
    },
}

impl Layer {
    /// Fully connected layer with `units` outputs
    pub fn dense(units: usize, activation: Activation) -> Self {
        Layer::Dense(Dense::new(units, activation))
    }

    /// Dropout layer; `rate` must be in [0, 1)
    pub fn dropout(rate: f64) -> Result<Self> {
        Ok(Layer::Dropout(Dropout::new(rate)?))
    }

    /// Type name shown in model summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Dense(_) => "Dense",
            Layer::Dropout(_) => "Dropout",
        }
    }

    pub fn output_dim(&self, input_dim: usize) -> usize {
        match self {
            Layer::Dense(d) => d.units,
            Layer::Dropout(_) => input_dim,
        }
    }

    pub fn n_params(&self, input_dim: usize) -> usize {
        match self {
            Layer::Dense(d) => (input_dim + 1) * d.units,
            Layer::Dropout(_) => 0,
        }
    }

    pub(crate) fn infer(&self, input: &Array2<f64>) -> Array2<f64> {
        match self {
            Layer::Dense(d) => d.forward(input).1,
            Layer::Dropout(_) => input.clone(),
        }
    }

    pub(crate) fn forward_train<R: Rng + ?Sized>(
        &self,
        input: &Array2<f64>,
        rng: &mut R,
    ) -> (Array2<f64>, LayerCache) {
        match self {
            Layer::Dense(d) => {
                let (z, a) = d.forward(input);
                let cache = LayerCache::Dense {
                    input: input.clone(),
                    z,
                    output: a.clone(),
                };
                (a, cache)
            }
            Layer::Dropout(dropout) => {
                if dropout.rate == 0.0 {
                    return (input.clone(), LayerCache::Dropout { mask: None });
                }
                let mask = dropout.mask(input.dim(), rng);
                (input * &mask, LayerCache::Dropout { mask: Some(mask) })
            }
        }
    }

    /// Propagate `grad_out` (dL/d output) back through the layer.
    ///
    /// Returns dL/d input and, for dense layers, the weight and bias gradients.
    pub(crate) fn backward(
        &self,
        grad_out: &Array2<f64>,
        cache: &LayerCache,
    ) -> (Array2<f64>, Option<(Array2<f64>, Array1<f64>)>) {
        match (self, cache) {
            (Layer::Dense(d), LayerCache::Dense { input, z, output }) => {
                let delta = grad_out * &d.activation.derivative(z, output);
                let (grad_in, grad_w, grad_b) = d.backward_from_delta(&delta, input);
                (grad_in, Some((grad_w, grad_b)))
            }
            (Layer::Dropout(_), LayerCache::Dropout { mask }) => match mask {
                Some(m) => (grad_out * m, None),
                None => (grad_out.clone(), None),
            },
            _ => unreachable!("layer cache does not match layer kind"),
        }
    }
}
