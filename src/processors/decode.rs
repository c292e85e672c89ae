//! Greedy CTC decoding of recognizer output.
//!
//! The recognizer emits a `T x C` score matrix: one row per time step, one
//! column per class. The last class (`C - 1`) is the CTC blank; class `i`
//! below it maps to entry `i` of the character table.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::core::OCRError;

/// Text decoded from one region together with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedText {
    pub text: String,
    /// Mean over all time steps of the highest class probability.
    pub confidence: f32,
}

/// Greedy (best path) CTC decoder.
#[derive(Debug, Clone)]
pub struct CTCLabelDecode {
    character: Vec<String>,
    apply_softmax: bool,
}

impl CTCLabelDecode {
    /// Creates a decoder over a character table.
    ///
    /// # Arguments
    ///
    /// * `character` - One entry per non-blank class, in class order.
    /// * `apply_softmax` - Turn raw scores into probabilities before
    ///   computing the confidence. Disable for models that already output
    ///   probabilities.
    pub fn new(character: Vec<String>, apply_softmax: bool) -> Self {
        Self {
            character,
            apply_softmax,
        }
    }

    /// Number of entries in the character table.
    pub fn character_count(&self) -> usize {
        self.character.len()
    }

    /// Decodes one `T x C` score matrix.
    ///
    /// A class is emitted when it differs from the previous step's class and
    /// is not the blank. An all-blank sequence decodes to an empty string
    /// with its confidence still computed; zero time steps give confidence 0.
    ///
    /// # Errors
    ///
    /// Fails when `C` is zero or when the character table has fewer than
    /// `C - 1` entries, since some classes would have no character.
    pub fn decode(&self, scores: &ArrayView2<f32>) -> Result<DecodedText, OCRError> {
        let (steps, classes) = scores.dim();
        if classes == 0 {
            return Err(OCRError::invalid_input(
                "recognition output has zero classes",
            ));
        }
        let blank = classes - 1;
        if self.character.len() < blank {
            return Err(OCRError::config_error(format!(
                "character table has {} entries but the model predicts {} non-blank classes",
                self.character.len(),
                blank
            )));
        }

        let mut text = String::new();
        let mut prob_sum = 0.0f64;
        let mut previous: Option<usize> = None;

        for row in scores.rows() {
            let (best_idx, best_score) = row.iter().copied().enumerate().fold(
                (0usize, f32::NEG_INFINITY),
                |(bi, bs), (i, s)| if s > bs { (i, s) } else { (bi, bs) },
            );

            prob_sum += if self.apply_softmax {
                // Probability of the argmax under a numerically stable softmax.
                let denom: f32 = row.iter().map(|&s| (s - best_score).exp()).sum();
                (1.0 / denom) as f64
            } else {
                best_score as f64
            };

            if best_idx != blank && previous != Some(best_idx) {
                text.push_str(&self.character[best_idx]);
            }
            previous = Some(best_idx);
        }

        let confidence = if steps == 0 {
            0.0
        } else {
            (prob_sum / steps as f64) as f32
        };

        Ok(DecodedText { text, confidence })
    }
}
