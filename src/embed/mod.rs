//! Sentence encoders turning petition titles and queries into dense vectors.
//!
//! The engine only depends on the [`Encoder`] trait. [`CandleEncoder`] runs a
//! BERT sentence-transformer locally; [`HashingEncoder`] is a model-free
//! feature-hashing encoder for offline use.

pub mod candle;
pub mod hashing;

use std::sync::Arc;

pub use candle::CandleEncoder;
pub use hashing::HashingEncoder;

use crate::{
   config::{Config, EncoderKind},
   error::{Error, Result},
};

/// Maps text to fixed-length vectors. Implementations must be deterministic
/// for a given model.
#[async_trait::async_trait]
pub trait Encoder: Send + Sync {
   /// Encodes a batch of texts, one vector per text, in input order.
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

   /// Encodes a single query.
   async fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
      self
         .encode(&[text.to_string()])
         .await?
         .pop()
         .ok_or_else(|| Error::Encoder("encoder returned no vector for query".to_string()))
   }

   /// Identifier of the underlying model.
   fn model_id(&self) -> &str;
}

#[async_trait::async_trait]
impl<T: Encoder + ?Sized> Encoder for Arc<T> {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      (**self).encode(texts).await
   }

   async fn encode_query(&self, text: &str) -> Result<Vec<f32>> {
      (**self).encode_query(text).await
   }

   fn model_id(&self) -> &str {
      (**self).model_id()
   }
}

/// Builds the encoder selected in the configuration. Loading failures are
/// fatal for the engine.
pub fn from_config(config: &Config) -> Result<Arc<dyn Encoder>> {
   Ok(match config.encoder {
      EncoderKind::Candle => Arc::new(CandleEncoder::load(&config.model, config.batch_size)?),
      EncoderKind::Hashing => Arc::new(HashingEncoder::new(config.hashing_dim)),
   })
}

pub fn l2_normalize(v: &mut [f32]) {
   let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
   if norm > 0.0 {
      for x in v.iter_mut() {
         *x /= norm;
      }
   }
}
