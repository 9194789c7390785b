use rayon::prelude::*;

use crate::{
   embed::{Encoder, l2_normalize},
   error::Result,
};

const FNV_OFFSET: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Bag-of-words encoder using signed FNV-1a feature hashing.
///
/// Deterministic and model-free: texts sharing words score high, texts with
/// no words in common score zero (barring hash collisions).
#[derive(Debug, Clone)]
pub struct HashingEncoder {
   dim:      usize,
   model_id: String,
}

impl HashingEncoder {
   pub fn new(dim: usize) -> Self {
      let dim = dim.max(1);
      Self { dim, model_id: format!("fnv1a-hashing-{dim}") }
   }

   pub fn embed(&self, text: &str) -> Vec<f32> {
      let mut v = vec![0.0f32; self.dim];
      for token in tokens(text) {
         let hash = fnv1a(token.as_bytes());
         let idx = (hash % self.dim as u64) as usize;
         let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
         v[idx] += sign;
      }
      l2_normalize(&mut v);
      v
   }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
   text
      .split(|c: char| !c.is_alphanumeric())
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
   bytes.iter().fold(FNV_OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

#[async_trait::async_trait]
impl Encoder for HashingEncoder {
   async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
      Ok(texts.par_iter().map(|text| self.embed(text)).collect())
   }

   fn model_id(&self) -> &str {
      &self.model_id
   }
}
