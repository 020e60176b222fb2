//! Scripted model and codec for decoding tests.

use formpilot_protocols::BackendError;

use crate::model::{CausalLm, TextCodec};

pub const EOS: u32 = 0;

/// Builds logits from a probability table keyed by the last token.
pub struct TableLm {
    vocab: usize,
    rows: Vec<(u32, Vec<(u32, f32)>)>,
    fallback: Vec<(u32, f32)>,
    pub calls: usize,
}

impl TableLm {
    pub fn new(vocab: usize) -> Self {
        Self {
            vocab,
            rows: Vec::new(),
            fallback: vec![(EOS, 1.0)],
            calls: 0,
        }
    }

    /// After `last`, emit tokens with the given probabilities.
    pub fn after(mut self, last: u32, probs: &[(u32, f32)]) -> Self {
        self.rows.push((last, probs.to_vec()));
        self
    }

    /// Distribution used when no row matches.
    pub fn otherwise(mut self, probs: &[(u32, f32)]) -> Self {
        self.fallback = probs.to_vec();
        self
    }
}

impl CausalLm for TableLm {
    fn next_token_logits(&mut self, tokens: &[u32]) -> Result<Vec<f32>, BackendError> {
        self.calls += 1;
        let last = tokens.last().copied().unwrap_or(EOS);
        let probs = self
            .rows
            .iter()
            .find(|(t, _)| *t == last)
            .map(|(_, p)| p)
            .unwrap_or(&self.fallback);

        // Log-probabilities are valid logits; unlisted tokens get ~0 mass.
        let mut logits = vec![(1e-6f32).ln(); self.vocab];
        for (token, prob) in probs {
            logits[*token as usize] = prob.ln();
        }
        Ok(logits)
    }

    fn eos_token_id(&self) -> u32 {
        EOS
    }
}

/// One token per character of a fixed alphabet; id 0 is end-of-sequence.
pub struct CharCodec {
    alphabet: Vec<char>,
}

impl CharCodec {
    pub fn new(alphabet: &str) -> Self {
        Self {
            alphabet: alphabet.chars().collect(),
        }
    }
}

impl TextCodec for CharCodec {
    fn encode(&self, text: &str) -> Result<Vec<u32>, BackendError> {
        text.chars()
            .map(|c| {
                self.alphabet
                    .iter()
                    .position(|a| *a == c)
                    .map(|i| i as u32 + 1)
                    .ok_or_else(|| BackendError::Tokenizer(format!("unknown char {:?}", c)))
            })
            .collect()
    }

    fn decode(&self, ids: &[u32]) -> Result<String, BackendError> {
        Ok(ids
            .iter()
            .filter(|id| **id != EOS)
            .filter_map(|id| self.alphabet.get(*id as usize - 1))
            .collect())
    }
}
