use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use hf_hub::{Repo, RepoType, api::sync::Api};
use tokenizers::Tokenizer;

use crate::{
   embed::{Encoder, l2_normalize},
   error::{Error, Result},
};

const MAX_SEQ_LEN: usize = 128;

/// Sentence-transformer encoder running a BERT model through candle.
///
/// Embeddings are the attention-masked mean of the last hidden layer,
/// L2-normalised.
pub struct CandleEncoder {
   bert:       BertModel,
   tokenizer:  Tokenizer,
   device:     Device,
   model_id:   String,
   batch_size: usize,
}

impl CandleEncoder {
   /// Downloads (or reuses the hub cache for) `model_id` and loads it.
   pub fn load(model_id: &str, batch_size: usize) -> Result<Self> {
      let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
      tracing::info!(model = model_id, ?device, "loading sentence transformer model");

      let files = download_model(model_id)?;

      let tokenizer = Tokenizer::from_file(&files.tokenizer)
         .map_err(|e| Error::encoder("failed to load tokenizer", e))?;

      let config: BertConfig = serde_json::from_str(
         &std::fs::read_to_string(&files.config)
            .map_err(|e| Error::encoder("failed to read model config", e))?,
      )
      .map_err(|e| Error::encoder("failed to parse model config", e))?;

      let vb = load_weights(&files.weights, &device)?;
      let bert =
         BertModel::load(vb, &config).map_err(|e| Error::encoder("failed to load model", e))?;

      tracing::info!(model = model_id, "model loaded");

      Ok(Self { bert, tokenizer, device, model_id: model_id.to_string(), batch_size: batch_size.max(1) })
   }

   fn tokenize_batch(&self, texts: &[String]) -> Result<Vec<(Vec<u32>, Vec<u32>)>> {
      texts
         .iter()
         .map(|text| {
            let encoding = self
               .tokenizer
               .encode(text.as_str(), true)
               .map_err(|e| Error::encoder("tokenization failed", e))?;

            let mut token_ids = encoding.get_ids().to_vec();
            let mut attention_mask = encoding.get_attention_mask().to_vec();

            if token_ids.len() > MAX_SEQ_LEN {
               token_ids.truncate(MAX_SEQ_LEN);
               attention_mask.truncate(MAX_SEQ_LEN);
            }

            Ok((token_ids, attention_mask))
         })
         .collect()
   }

   fn embed_batch(&self, tokenized: &[(Vec<u32>, Vec<u32>)]) -> Result<Vec<Vec<f32>>> {
      if tokenized.is_empty() {
         return Ok(Vec::new());
      }

      let max_len = tokenized
         .iter()
         .map(|(ids, _)| ids.len())
         .max()
         .unwrap_or(0);
      let batch_size = tokenized.len();

      let mut all_token_ids = Vec::with_capacity(batch_size * max_len);
      let mut all_attention_masks = Vec::with_capacity(batch_size * max_len);

      for (token_ids, attention_mask) in tokenized {
         all_token_ids.extend(token_ids);
         all_token_ids.extend(std::iter::repeat_n(0u32, max_len - token_ids.len()));

         all_attention_masks.extend(attention_mask);
         all_attention_masks.extend(std::iter::repeat_n(0u32, max_len - attention_mask.len()));
      }

      let token_ids = Tensor::new(all_token_ids.as_slice(), &self.device)
         .and_then(|t| t.reshape((batch_size, max_len)))
         .map_err(|e| Error::encoder("failed to build token tensor", e))?;
      let attention_mask = Tensor::new(all_attention_masks.as_slice(), &self.device)
         .and_then(|t| t.reshape((batch_size, max_len)))
         .map_err(|e| Error::encoder("failed to build mask tensor", e))?;
      let token_type_ids = token_ids
         .zeros_like()
         .map_err(|e| Error::encoder("failed to build type tensor", e))?;

      let hidden = self
         .bert
         .forward(&token_ids, &token_type_ids, Some(&attention_mask))
         .map_err(|e| Error::encoder("forward pass failed", e))?;

      let pooled = mean_pool(&hidden, &attention_mask)
         .map_err(|e| Error::encoder("pooling failed", e))?;

      let mut rows: Vec<Vec<f32>> = pooled
         .to_dtype(DType::F32)
         .and_then(|t| t.to_vec2())
         .map_err(|e| Error::encoder("failed to read embeddings", e))?;

      for row in &mut rows {
         l2_normalize(row);
      }
      Ok(rows)
   }
}

fn mean_pool(hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
   let mask = attention_mask.to_dtype(DTYPE)?.unsqueeze(2)?;
   let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
   let counts = mask.sum(1)?;
   summed.broadcast_div(&counts)
}

struct ModelFiles {
   config:    PathBuf,
   tokenizer: PathBuf,
   weights:   PathBuf,
}

fn download_model(model_id: &str) -> Result<ModelFiles> {
   let api = Api::new().map_err(|e| Error::encoder("failed to initialize hf_hub API", e))?;
   let repo = api.repo(Repo::new(model_id.to_string(), RepoType::Model));

   let fetch = |filename: &str| {
      repo
         .get(filename)
         .map_err(|e| Error::encoder(&format!("failed to download {filename}"), e))
   };

   let config = fetch("config.json")?;
   let tokenizer = fetch("tokenizer.json")?;
   let weights = fetch("model.safetensors").or_else(|_| fetch("pytorch_model.bin"))?;

   Ok(ModelFiles { config, tokenizer, weights })
}

fn load_weights(path: &Path, device: &Device) -> Result<VarBuilder<'static>> {
   let is_safetensors = path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("safetensors"));

   if is_safetensors {
      // SAFETY: the hub cache file is not modified while mapped.
      unsafe { VarBuilder::from_mmaped_safetensors(&[path], DTYPE, device) }
         .map_err(|e| Error::encoder("failed to load weights", e))
   } else {
      VarBuilder::from_pth(path, DTYPE, device)
         .map_err(|e| Error::encoder("failed to load weights", e))
   }
}

#[async_trait::async_trait]
impl Encoder for CandleEncoder {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      let mut vectors = Vec::with_capacity(texts.len());
      for chunk in texts.chunks(self.batch_size) {
         let tokenized = self.tokenize_batch(chunk)?;
         vectors.extend(self.embed_batch(&tokenized)?);
      }
      Ok(vectors)
   }

   fn model_id(&self) -> &str {
      &self.model_id
   }
}
