// Local sentence embeddings via candle
use anyhow::{Context, Result};
use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};

use crate::embedding::Embedder;
use crate::errors::ResumeError;

/// Small general-purpose sentence model, 384 dimensions
pub const DEFAULT_LOCAL_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Longest token sequence fed to the model
const MAX_SEQUENCE_LEN: usize = 256;

struct LoadedModel {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

/// Sentence-transformers BERT model run in-process, mean pooled
#[derive(Clone)]
pub struct CandleEmbedder {
    inner: Arc<LoadedModel>,
    model_id: String,
    dimension: usize,
}

impl CandleEmbedder {
    /// Load a model from the HuggingFace Hub (downloads on first use)
    pub fn load(model_id: &str) -> crate::errors::Result<Self> {
        Ok(Self::load_inner(model_id)?)
    }

    fn load_inner(model_id: &str) -> Result<Self> {
        let device = Device::Cpu;

        let api = Api::new().context("Failed to create HuggingFace API client")?;
        let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .context("Failed to download model config")?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .context("Failed to download tokenizer")?;
        let weights_path = repo
            .get("model.safetensors")
            .context("Failed to download model weights")?;

        let config_contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&config_contents).context("Failed to parse model config")?;
        let dimension = serde_json::from_str::<serde_json::Value>(&config_contents)?
            .get("hidden_size")
            .and_then(|v| v.as_u64())
            .context("Model config has no hidden_size")? as usize;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;

        // SAFETY: the safetensors file is owned by the hf-hub cache and not
        // modified while mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
                .context("Failed to load model weights")?
        };

        let model = BertModel::load(vb, &config).context("Failed to create BERT model")?;

        log::info!("loaded embedding model {} ({} dims)", model_id, dimension);

        Ok(Self {
            inner: Arc::new(LoadedModel {
                model,
                tokenizer,
                device,
            }),
            model_id: model_id.to_string(),
            dimension,
        })
    }

    /// Output vector length
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Run the model on a batch (blocking)
    pub fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner.encode(texts)
    }
}

impl LoadedModel {
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let encodings = self.tokenizer
            .encode_batch(inputs, true)
            .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);
        let batch_size = encodings.len();

        // Right-pad ids and masks with zeros
        let mut flat_ids = Vec::with_capacity(batch_size * max_len);
        let mut flat_mask = Vec::with_capacity(batch_size * max_len);
        for encoding in &encodings {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            flat_ids.extend_from_slice(ids);
            flat_ids.resize(flat_ids.len() + (max_len - ids.len()), 0);
            flat_mask.extend_from_slice(mask);
            flat_mask.resize(flat_mask.len() + (max_len - mask.len()), 0);
        }

        let token_ids = Tensor::from_vec(flat_ids, (batch_size, max_len), &self.device)?;
        let attention_mask = Tensor::from_vec(flat_mask, (batch_size, max_len), &self.device)?;
        let token_type_ids = token_ids.zeros_like()?;

        let hidden = self.model.forward(&token_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = mean_pool(&hidden, &attention_mask)?;

        Ok(pooled.to_vec2::<f32>()?)
    }
}

/// Mean of token embeddings, ignoring padding
fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let (batch, seq, width) = hidden.dims3()?;
    let mask = attention_mask
        .unsqueeze(2)?
        .expand((batch, seq, width))?
        .to_dtype(hidden.dtype())?;

    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;

    Ok(summed.broadcast_div(&counts)?)
}

#[async_trait]
impl Embedder for CandleEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_batch(&self, texts: &[String]) -> crate::errors::Result<Vec<Vec<f32>>> {
        let inner = Arc::clone(&self.inner);
        let texts = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || inner.encode(&texts))
            .await
            .map_err(|e| ResumeError::EmbeddingError(format!("embedding task failed: {}", e)))?
            .map_err(|e| ResumeError::EmbeddingError(format!("{:#}", e)))?;
        Ok(vectors)
    }
}
