//! Score sources: anything that turns an encoded query into per-position logits
//!
//! Handles:
//! - The `ScoreSource` seam the prediction facade calls into
//! - `ScoreMatrix`, a `[1, seq_len, vocab_size]` Candle tensor of logits
//! - `EmbeddingScorer`, a small Candle network loaded from bincode weights
//!
//! The pretrained transformer normally behind this seam lives outside the
//! crate; `EmbeddingScorer` is a light local stand-in with the same contract.

use candle_core::{DType, Device, IndexOp, Module, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

use crate::error::{PredictError, Result};
use crate::llm::encoder::EncodedSequence;

/// Opaque scoring function behind the pipeline.
///
/// Implementations receive the fixed-length ids and attention mask and
/// return one logit per vocabulary id for every sequence position. No
/// timeout is imposed here.
pub trait ScoreSource: Send + Sync {
    fn score(&self, sequence: &EncodedSequence) -> Result<ScoreMatrix>;
}

/// Logits shaped `[1, seq_len, vocab_size]`
#[derive(Clone, Debug)]
pub struct ScoreMatrix {
    logits: Tensor,
    seq_len: usize,
    vocab_size: usize,
}

impl ScoreMatrix {
    /// Wrap a model output tensor, checking its shape
    pub fn from_tensor(logits: Tensor) -> Result<Self> {
        let (batch, seq_len, vocab_size) = match logits.dims3() {
            Ok(dims) => dims,
            Err(_) => {
                return Err(PredictError::ScoreShape {
                    actual: logits.dims().to_vec(),
                    seq_len: 0,
                })
            }
        };
        if batch != 1 || vocab_size == 0 {
            return Err(PredictError::ScoreShape {
                actual: logits.dims().to_vec(),
                seq_len,
            });
        }

        Ok(ScoreMatrix {
            logits: logits.to_dtype(DType::F32)?,
            seq_len,
            vocab_size,
        })
    }

    /// Build from one score row per sequence position
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let seq_len = rows.len();
        let vocab_size = rows.first().map(Vec::len).unwrap_or(0);
        if rows.iter().any(|row| row.len() != vocab_size) {
            let actual = rows.iter().map(Vec::len).collect();
            return Err(PredictError::ScoreShape { actual, seq_len });
        }

        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let logits = Tensor::from_vec(flat, (1, seq_len, vocab_size), &Device::Cpu)?;
        Self::from_tensor(logits)
    }

    /// Scores for every vocabulary id at one position
    pub fn row(&self, position: usize) -> Result<Vec<f32>> {
        if position >= self.seq_len {
            return Err(PredictError::MaskOutOfRange {
                position,
                seq_len: self.seq_len,
            });
        }
        Ok(self.logits.i((0, position))?.to_vec1::<f32>()?)
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

/// Shape of an `EmbeddingScorer`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
}

/// One named tensor, flattened
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TensorData {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// On-disk format of a scorer: config plus named tensors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScorerWeights {
    pub config: ScorerConfig,
    pub tensors: Vec<TensorData>,
}

impl ScorerWeights {
    /// Read weights from a bincode file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PredictError::WeightsIo {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::deserialize_from(BufReader::new(file)).map_err(|e| {
            PredictError::WeightsMalformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }

    /// Write weights as bincode
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| PredictError::WeightsIo {
            path: path.to_path_buf(),
            source,
        })?;
        bincode::serialize_into(BufWriter::new(file), self).map_err(|e| {
            PredictError::WeightsMalformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }
}

/// Token embedding + attended-mean context + ReLU + vocabulary projection
pub struct EmbeddingScorer {
    config: ScorerConfig,
    device: Device,
    embedding: Embedding,
    output: Linear,
}

impl EmbeddingScorer {
    /// Build layers from a var builder (`embedding.weight`, `output.weight`, `output.bias`)
    pub fn new(vb: VarBuilder, config: ScorerConfig) -> Result<Self> {
        let device = vb.device().clone();
        let embedding =
            candle_nn::embedding(config.vocab_size, config.hidden_size, vb.pp("embedding"))?;
        let output = candle_nn::linear(config.hidden_size, config.vocab_size, vb.pp("output"))?;

        Ok(EmbeddingScorer {
            config,
            device,
            embedding,
            output,
        })
    }

    /// Build from deserialized weights
    pub fn from_weights(weights: ScorerWeights, device: &Device) -> Result<Self> {
        let mut tensors = HashMap::with_capacity(weights.tensors.len());
        for tensor in weights.tensors {
            let value = Tensor::from_vec(tensor.data, tensor.shape, device)?;
            tensors.insert(tensor.name, value);
        }
        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
        Self::new(vb, weights.config)
    }

    /// Load a scorer from a bincode weights file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Use Metal GPU on macOS, fallback to CPU
        #[cfg(target_os = "macos")]
        let device = Device::new_metal(0).unwrap_or(Device::Cpu);
        #[cfg(not(target_os = "macos"))]
        let device = Device::Cpu;

        let path = path.as_ref();
        let weights = ScorerWeights::load(path)?;
        let scorer = Self::from_weights(weights, &device)?;
        info!(
            path = %path.display(),
            vocab_size = scorer.config.vocab_size,
            hidden_size = scorer.config.hidden_size,
            "loaded scorer weights"
        );
        Ok(scorer)
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    fn forward(&self, sequence: &EncodedSequence) -> Result<Tensor> {
        let seq_len = sequence.len();
        let ids = Tensor::new(sequence.token_ids(), &self.device)?.unsqueeze(0)?;
        let mask = Tensor::new(sequence.attention_mask(), &self.device)?
            .to_dtype(DType::F32)?
            .reshape((1, seq_len, 1))?;

        // (1, seq_len, hidden)
        let embedded = self.embedding.forward(&ids)?;
        let attended = sequence.attended_len().max(1) as f64;
        let context = (embedded.broadcast_mul(&mask)?.sum_keepdim(1)? / attended)?;
        let hidden = embedded.broadcast_add(&context)?.relu()?;

        // (1, seq_len, vocab_size)
        Ok(self.output.forward(&hidden)?)
    }
}

impl ScoreSource for EmbeddingScorer {
    fn score(&self, sequence: &EncodedSequence) -> Result<ScoreMatrix> {
        if let Some(&id) = sequence
            .token_ids()
            .iter()
            .find(|&&id| id as usize >= self.config.vocab_size)
        {
            return Err(PredictError::TokenOutOfRange {
                id,
                vocab_size: self.config.vocab_size,
            });
        }
        ScoreMatrix::from_tensor(self.forward(sequence)?)
    }
}
