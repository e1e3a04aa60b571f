//! Scorer initialisation binary
//!
//! Writes a randomly initialised `EmbeddingScorer` sized to a vocabulary so
//! the prediction pipeline can run without an external pretrained model.
//! Usage: cargo run --bin init-model -- --vocab data/vocab.json --output models/scorer.bin

use anyhow::{anyhow, Context, Result};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use word_predict::llm::model::{EmbeddingScorer, ScorerConfig, ScorerWeights, TensorData};
use word_predict::Vocab;

#[derive(Parser, Debug)]
#[command(name = "init-model")]
#[command(about = "Create scorer weights matching a vocabulary")]
struct Args {
    /// Path to vocabulary file
    #[arg(short, long, default_value = "data/vocab.json")]
    vocab: PathBuf,

    /// Output weights file
    #[arg(short, long, default_value = "models/scorer.bin")]
    output: PathBuf,

    /// Hidden dimension
    #[arg(long, default_value = "64")]
    hidden_size: usize,
}

/// Flatten every variable in the map into named tensors
fn export_weights(config: ScorerConfig, varmap: &VarMap) -> Result<ScorerWeights> {
    let vars = varmap
        .data()
        .lock()
        .map_err(|_| anyhow!("variable map lock poisoned"))?;

    let mut tensors = Vec::with_capacity(vars.len());
    for (name, var) in vars.iter() {
        tensors.push(TensorData {
            name: name.clone(),
            shape: var.dims().to_vec(),
            data: var.flatten_all()?.to_vec1::<f32>()?,
        });
    }
    tensors.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(ScorerWeights { config, tensors })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    let vocab = Vocab::load(&args.vocab)?;

    let device = Device::Cpu;

    let config = ScorerConfig {
        vocab_size: vocab.max_id() as usize + 1,
        hidden_size: args.hidden_size,
    };
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    EmbeddingScorer::new(vb, config.clone())?;

    let weights = export_weights(config, &varmap)?;
    let parameters: usize = weights.tensors.iter().map(|t| t.data.len()).sum();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    weights.save(&args.output)?;

    info!(
        output = %args.output.display(),
        vocab_size = weights.config.vocab_size,
        hidden_size = weights.config.hidden_size,
        parameters,
        "wrote scorer weights"
    );
    Ok(())
}
