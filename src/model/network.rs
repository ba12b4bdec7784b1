//! Feed-forward cognitive-state classifier
//!
//! A small MLP with ReLU hidden layers and a softmax output, trained against
//! soft label distributions rather than one-hot targets. Backpropagation
//! descends the softmax cross-entropy gradient (`probs - target`); the loss
//! value reported to the burst controller is the mean squared error between
//! prediction and target, which is what the stopping thresholds are scaled
//! for.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointError;

/// Configuration for the classifier network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Input size (feature vector length)
    pub input_size: usize,
    /// Hidden layer widths, applied in order
    pub hidden_sizes: Vec<usize>,
    /// Output size (number of cognitive states)
    pub output_size: usize,
    /// Random seed for weight initialization
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_size: 58, // 13 features x 4 channels + 6 pairwise correlations
            hidden_sizes: vec![64, 48, 24],
            output_size: 3,
            seed: 42,
        }
    }
}

impl NetworkConfig {
    /// Full layer width sequence from input to output.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_size);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.output_size);
        sizes
    }
}

/// Gradients for backpropagation, one entry per layer
#[derive(Debug, Clone)]
pub struct Gradients {
    pub dw: Vec<Array2<f32>>,
    pub db: Vec<Array1<f32>>,
}

/// Flat copy of all network parameters.
///
/// The burst controller keeps the best-so-far snapshot in memory and restores
/// it when patience runs out; the same structure is what model artifacts
/// persist to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<Vec<f32>>,
}

/// MLP classifier: input → hidden stack (ReLU) → output (softmax)
pub struct StateNetwork {
    config: NetworkConfig,
    // weights[l] has shape [fan_out, fan_in]
    weights: Vec<Array2<f32>>,
    biases: Vec<Array1<f32>>,
}

impl StateNetwork {
    /// Create a new network with Xavier-style random initialization.
    pub fn new(config: NetworkConfig) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);

        let sizes = config.layer_sizes();
        let mut weights = Vec::with_capacity(sizes.len() - 1);
        let mut biases = Vec::with_capacity(sizes.len() - 1);

        for pair in sizes.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let scale = (2.0 / fan_in as f32).sqrt();
            weights.push(Array2::from_shape_fn((fan_out, fan_in), |_| {
                (rng.gen::<f32>() - 0.5) * 2.0 * scale
            }));
            biases.push(Array1::zeros(fan_out));
        }

        Self {
            config,
            weights,
            biases,
        }
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn input_size(&self) -> usize {
        self.config.input_size
    }

    pub fn output_size(&self) -> usize {
        self.config.output_size
    }

    /// ReLU activation
    fn relu(x: &Array1<f32>) -> Array1<f32> {
        x.mapv(|v| v.max(0.0))
    }

    /// ReLU derivative
    fn relu_derivative(x: &Array1<f32>) -> Array1<f32> {
        x.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
    }

    /// Softmax activation
    fn softmax(x: &Array1<f32>) -> Array1<f32> {
        let max = x.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let exp: Array1<f32> = x.mapv(|v| (v - max).exp());
        let sum: f32 = exp.sum();
        exp / sum
    }

    /// Forward pass keeping hidden activations and pre-activations for backprop.
    fn forward_with_cache(
        &self,
        input: &Array1<f32>,
    ) -> (Array1<f32>, Vec<Array1<f32>>, Vec<Array1<f32>>) {
        let hidden_count = self.weights.len() - 1;
        let mut pre_activations = Vec::with_capacity(hidden_count);
        let mut activations = Vec::with_capacity(hidden_count);

        let mut current = input.to_owned();
        for layer in 0..hidden_count {
            let z = self.weights[layer].dot(&current) + &self.biases[layer];
            current = Self::relu(&z);
            pre_activations.push(z);
            activations.push(current.clone());
        }

        let z_out = self.weights[hidden_count].dot(&current) + &self.biases[hidden_count];
        let output = Self::softmax(&z_out);

        (output, activations, pre_activations)
    }

    /// Predict the class distribution for a scaled feature vector.
    ///
    /// `features` must hold exactly `input_size` entries; the serving layer
    /// validates this before calling.
    pub fn forward(&self, features: &[f32]) -> Array1<f32> {
        let input = Array1::from_vec(features.to_vec());
        let (output, _, _) = self.forward_with_cache(&input);
        output
    }

    /// Index of the most probable class for a scaled feature vector.
    pub fn predict_index(&self, features: &[f32]) -> usize {
        let probs = self.forward(features);
        probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    /// Compute the batch loss and gradients against soft targets.
    pub fn compute_loss(
        &self,
        inputs: &[Array1<f32>],
        targets: &[Array1<f32>],
    ) -> (f32, Gradients) {
        let mut dw: Vec<Array2<f32>> =
            self.weights.iter().map(|w| Array2::zeros(w.dim())).collect();
        let mut db: Vec<Array1<f32>> =
            self.biases.iter().map(|b| Array1::zeros(b.dim())).collect();

        let mut total_loss = 0.0;

        for (input, target) in inputs.iter().zip(targets.iter()) {
            let (output, activations, pre_activations) = self.forward_with_cache(input);

            // probs - target is both the monitored residual and the
            // cross-entropy gradient at the softmax logits.
            let diff = &output - target;
            total_loss += diff.mapv(|d| d * d).sum() / output.len() as f32;

            let mut dz = diff;
            for layer in (0..self.weights.len()).rev() {
                let upstream: &Array1<f32> = if layer == 0 {
                    input
                } else {
                    &activations[layer - 1]
                };

                for i in 0..dz.len() {
                    let dzi = dz[i];
                    for j in 0..upstream.len() {
                        dw[layer][[i, j]] += dzi * upstream[j];
                    }
                    db[layer][i] += dzi;
                }

                if layer > 0 {
                    let dh = self.weights[layer].t().dot(&dz);
                    dz = &dh * &Self::relu_derivative(&pre_activations[layer - 1]);
                }
            }
        }

        // Average gradients over batch
        let batch_size = inputs.len().max(1) as f32;
        for grad in dw.iter_mut() {
            *grad /= batch_size;
        }
        for grad in db.iter_mut() {
            *grad /= batch_size;
        }

        (total_loss / batch_size, Gradients { dw, db })
    }

    /// Gradient descent step: W = W - lr * dW
    pub fn update_weights(&mut self, gradients: &Gradients, learning_rate: f32) {
        for (weight, dw) in self.weights.iter_mut().zip(gradients.dw.iter()) {
            *weight -= &(dw * learning_rate);
        }
        for (bias, db) in self.biases.iter_mut().zip(gradients.db.iter()) {
            *bias -= &(db * learning_rate);
        }
    }

    /// Copy all current parameters into a flat snapshot.
    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            weights: self
                .weights
                .iter()
                .map(|w| w.iter().cloned().collect())
                .collect(),
            biases: self.biases.iter().map(|b| b.to_vec()).collect(),
        }
    }

    /// Replace all parameters from a snapshot, validating shapes.
    pub fn restore(&mut self, snapshot: &ParameterSnapshot) -> Result<(), CheckpointError> {
        if snapshot.weights.len() != self.weights.len()
            || snapshot.biases.len() != self.biases.len()
        {
            return Err(CheckpointError::InvalidFormat(format!(
                "snapshot has {} weight layers, network has {}",
                snapshot.weights.len(),
                self.weights.len()
            )));
        }

        for (layer, weight) in self.weights.iter_mut().enumerate() {
            let dims = weight.dim();
            *weight = Array2::from_shape_vec(dims, snapshot.weights[layer].clone()).map_err(
                |err| {
                    CheckpointError::InvalidFormat(format!(
                        "weight layer {layer} does not fit {dims:?}: {err}"
                    ))
                },
            )?;
        }
        for (layer, bias) in self.biases.iter_mut().enumerate() {
            if snapshot.biases[layer].len() != bias.len() {
                return Err(CheckpointError::InvalidFormat(format!(
                    "bias layer {layer} has {} entries, expected {}",
                    snapshot.biases[layer].len(),
                    bias.len()
                )));
            }
            *bias = Array1::from_vec(snapshot.biases[layer].clone());
        }

        Ok(())
    }
}
