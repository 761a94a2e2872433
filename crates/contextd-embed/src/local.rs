//! Local embeddings using ONNX Runtime.
//!
//! This module requires the `local-embeddings` feature to be enabled.

use std::path::Path;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::TensorRef;
use parking_lot::Mutex;
use tokenizers::Tokenizer;

use crate::embedder::{Embedder, normalize};
use crate::error::{EmbedError, Result};

/// Sequences per inference call.
const CHUNK_SIZE: usize = 32;

/// Local embedder using ONNX Runtime.
///
/// Runs a sentence-transformer model (all-MiniLM-L6-v2 by default) with
/// attention-masked mean pooling, producing unit-length vectors.
pub struct LocalEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dimensions: usize,
}

impl LocalEmbedder {
    /// Load a local embedder from an ONNX model and a `tokenizer.json`.
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer_path: impl AsRef<Path>,
        dimensions: usize,
    ) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| EmbedError::Internal(format!("Failed to create ONNX session: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                EmbedError::Internal(format!("Failed to set optimization level: {}", e))
            })?
            .commit_from_file(model_path.as_ref())
            .map_err(|e| {
                EmbedError::Internal(format!(
                    "Failed to load ONNX model from {:?}: {}",
                    model_path.as_ref(),
                    e
                ))
            })?;

        let tokenizer = Tokenizer::from_file(tokenizer_path.as_ref()).map_err(|e| {
            EmbedError::Internal(format!(
                "Failed to load tokenizer from {:?}: {}",
                tokenizer_path.as_ref(),
                e
            ))
        })?;

        tracing::info!(
            "Loaded local embedding model from {:?} ({} dims)",
            model_path.as_ref(),
            dimensions
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions,
        })
    }

    /// Pads a chunk of encodings to a common length and runs one inference.
    fn run_batch(&self, encodings: &[tokenizers::Encoding]) -> Result<Vec<Vec<f32>>> {
        let batch_size = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            let offset = i * max_len;
            for (j, ((id, mask), ty)) in enc
                .get_ids()
                .iter()
                .zip(enc.get_attention_mask())
                .zip(enc.get_type_ids())
                .enumerate()
            {
                input_ids[offset + j] = *id as i64;
                attention_mask[offset + j] = *mask as i64;
                token_type_ids[offset + j] = *ty as i64;
            }
        }

        let shape = (batch_size, max_len);
        let array_err = |e: ndarray::ShapeError| EmbedError::Internal(format!("Array error: {}", e));
        let ids_array = Array2::from_shape_vec(shape, input_ids).map_err(array_err)?;
        let mask_array = Array2::from_shape_vec(shape, attention_mask.clone()).map_err(array_err)?;
        let types_array = Array2::from_shape_vec(shape, token_type_ids).map_err(array_err)?;

        let tensor_err = |e: ort::Error| EmbedError::Internal(format!("Input error: {}", e));
        let ids_tensor = TensorRef::from_array_view(&ids_array).map_err(tensor_err)?;
        let mask_tensor = TensorRef::from_array_view(&mask_array).map_err(tensor_err)?;
        let types_tensor = TensorRef::from_array_view(&types_array).map_err(tensor_err)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => types_tensor,
            ])
            .map_err(|e| EmbedError::Internal(format!("ONNX inference failed: {}", e)))?;

        // (batch, seq_len, hidden)
        let hidden_states = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| EmbedError::Internal(format!("Output extraction failed: {}", e)))?;
        let dims = hidden_states.shape().to_vec();
        if dims.len() != 3 {
            return Err(EmbedError::Internal(format!(
                "Unexpected output shape {:?}",
                dims
            )));
        }
        let (seq_len_out, hidden_dim) = (dims[1], dims[2]);

        let mut results = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let mask = &attention_mask[i * max_len..(i + 1) * max_len];
            let mut pooled = vec![0.0f32; hidden_dim];
            let mut count = 0.0f32;

            for (j, &m) in mask.iter().enumerate().take(seq_len_out) {
                if m > 0 {
                    for (k, slot) in pooled.iter_mut().enumerate() {
                        *slot += hidden_states[[i, j, k]];
                    }
                    count += 1.0;
                }
            }

            if count > 0.0 {
                for v in &mut pooled {
                    *v /= count;
                }
            }
            normalize(&mut pooled);
            results.push(pooled);
        }

        Ok(results)
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Internal("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let encodings = texts
            .iter()
            .map(|text| {
                self.tokenizer
                    .encode(*text, true)
                    .map_err(|e| EmbedError::Internal(format!("Tokenization failed: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut all_results = Vec::with_capacity(texts.len());
        for chunk in encodings.chunks(CHUNK_SIZE) {
            all_results.extend(self.run_batch(chunk)?);
        }

        Ok(all_results)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "local"
    }
}
