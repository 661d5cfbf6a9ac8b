//! Adam optimizer

use ndarray::{Array1, Array2, Zip};
use serde::{Deserialize, Serialize};

/// First and second moment estimates for one dense layer
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Slot {
    m_w: Array2<f64>,
    v_w: Array2<f64>,
    m_b: Array1<f64>,
    v_b: Array1<f64>,
}

/// Adaptive moment estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    /// Number of update steps taken
    iterations: u64,
    slots: Vec<Option<Slot>>,
}

impl Default for Adam {
    fn default() -> Self {
        Self {
            learning_rate: 0.001,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            iterations: 0,
            slots: Vec::new(),
        }
    }
}

impl Adam {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set learning rate
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Advance the step counter; call once per mini-batch before [`Adam::update`]
    pub fn begin_step(&mut self) {
        self.iterations += 1;
    }

    /// Apply one bias-corrected update to a layer's parameters
    pub fn update(
        &mut self,
        slot: usize,
        weights: &mut Array2<f64>,
        bias: &mut Array1<f64>,
        grad_w: &Array2<f64>,
        grad_b: &Array1<f64>,
    ) {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, None);
        }
        let state = self.slots[slot].get_or_insert_with(|| Slot {
            m_w: Array2::zeros(weights.raw_dim()),
            v_w: Array2::zeros(weights.raw_dim()),
            m_b: Array1::zeros(bias.raw_dim()),
            v_b: Array1::zeros(bias.raw_dim()),
        });

        let t = self.iterations.max(1) as i32;
        let (b1, b2, eps) = (self.beta_1, self.beta_2, self.epsilon);
        let lr_t = self.learning_rate * (1.0 - b2.powi(t)).sqrt() / (1.0 - b1.powi(t));

        Zip::from(weights)
            .and(&mut state.m_w)
            .and(&mut state.v_w)
            .and(grad_w)
            .for_each(|w, m, v, &g| {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                *w -= lr_t * *m / (v.sqrt() + eps);
            });

        Zip::from(bias)
            .and(&mut state.m_b)
            .and(&mut state.v_b)
            .and(grad_b)
            .for_each(|b, m, v, &g| {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                *b -= lr_t * *m / (v.sqrt() + eps);
            });
    }
}
