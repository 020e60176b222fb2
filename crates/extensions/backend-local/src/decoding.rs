//! Decoding strategies.
//!
//! Every strategy stops at the end-of-sequence token or after
//! [`MAX_NEW_TOKENS`] new tokens. Returned ids exclude the prompt and the
//! end-of-sequence token.

use std::collections::HashSet;

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use tracing::trace;

use formpilot_protocols::{BackendError, DecodingStrategy, GenerationConfig, MAX_NEW_TOKENS};

use crate::model::CausalLm;

/// Beam search never repeats an n-gram of this size.
pub const NO_REPEAT_NGRAM_SIZE: usize = 2;

const SAMPLING_TEMPERATURE: f32 = 0.7;
const QUESTION_TEMPERATURE: f32 = 1.5;
const STATEMENT_TEMPERATURE: f32 = 0.9;

/// A fully parameterized decoding strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodingPlan {
    Greedy,
    Beam {
        width: usize,
        no_repeat_ngram: usize,
        early_stopping: bool,
    },
    TopK {
        k: usize,
        temperature: f32,
    },
    TopP {
        p: f32,
        temperature: f32,
    },
    /// Temperature sampling over the full vocabulary.
    Sample {
        temperature: f32,
    },
}

impl DecodingPlan {
    /// Plan for `config`. The custom strategy runs hotter for questions.
    pub fn from_config(config: &GenerationConfig, label_is_question: bool) -> Result<Self, BackendError> {
        let params = &config.params;
        let plan = match config.strategy {
            DecodingStrategy::Greedy => Self::Greedy,
            DecodingStrategy::Beam => {
                if params.beam_size == 0 {
                    return Err(BackendError::InvalidConfig("beam_size must be at least 1".to_string()));
                }
                Self::Beam {
                    width: params.beam_size,
                    no_repeat_ngram: NO_REPEAT_NGRAM_SIZE,
                    early_stopping: true,
                }
            }
            DecodingStrategy::TopK => {
                if params.top_k == 0 {
                    return Err(BackendError::InvalidConfig("top_k must be at least 1".to_string()));
                }
                Self::TopK {
                    k: params.top_k,
                    temperature: SAMPLING_TEMPERATURE,
                }
            }
            DecodingStrategy::TopP => {
                if !(params.top_p > 0.0 && params.top_p <= 1.0) {
                    return Err(BackendError::InvalidConfig(format!(
                        "top_p must be in (0, 1], got {}",
                        params.top_p
                    )));
                }
                Self::TopP {
                    p: params.top_p,
                    temperature: SAMPLING_TEMPERATURE,
                }
            }
            DecodingStrategy::Custom => Self::Sample {
                temperature: if label_is_question {
                    QUESTION_TEMPERATURE
                } else {
                    STATEMENT_TEMPERATURE
                },
            },
        };
        Ok(plan)
    }

    /// Run the plan. `on_token` sees each accepted token as soon as it is
    /// known (beam search only knows its tokens at the end). Decoding stops
    /// with [`BackendError::Cancelled`] once `cancelled` returns true.
    pub fn decode<R: Rng>(
        &self,
        model: &mut dyn CausalLm,
        prompt: &[u32],
        rng: &mut R,
        cancelled: &dyn Fn() -> bool,
        on_token: &mut dyn FnMut(u32),
    ) -> Result<Vec<u32>, BackendError> {
        match self {
            Self::Beam {
                width,
                no_repeat_ngram,
                early_stopping,
            } => {
                let tokens = beam_search(model, prompt, *width, *no_repeat_ngram, *early_stopping, cancelled)?;
                tokens.iter().for_each(|t| on_token(*t));
                Ok(tokens)
            }
            _ => self.decode_stepwise(model, prompt, rng, cancelled, on_token),
        }
    }

    fn decode_stepwise<R: Rng>(
        &self,
        model: &mut dyn CausalLm,
        prompt: &[u32],
        rng: &mut R,
        cancelled: &dyn Fn() -> bool,
        on_token: &mut dyn FnMut(u32),
    ) -> Result<Vec<u32>, BackendError> {
        let eos = model.eos_token_id();
        let mut sequence = prompt.to_vec();
        let mut generated = Vec::new();

        for _ in 0..MAX_NEW_TOKENS {
            if cancelled() {
                return Err(BackendError::Cancelled);
            }
            let logits = model.next_token_logits(&sequence)?;
            let token = self.pick(&logits, rng)?;
            trace!("Decoded token {}", token);
            if token == eos {
                break;
            }
            sequence.push(token);
            generated.push(token);
            on_token(token);
        }

        Ok(generated)
    }

    fn pick<R: Rng>(&self, logits: &[f32], rng: &mut R) -> Result<u32, BackendError> {
        match self {
            Self::Greedy | Self::Beam { .. } => argmax(logits),
            Self::TopK { k, temperature } => {
                let mut ranked = ranked(logits);
                ranked.truncate((*k).max(1));
                sample(&ranked, *temperature, rng)
            }
            Self::TopP { p, temperature } => {
                let ranked = ranked(logits);
                let probs = softmax(&ranked.iter().map(|(_, l)| *l).collect::<Vec<_>>(), *temperature);
                let mut cumulative = 0.0;
                let mut keep = 0;
                for prob in &probs {
                    cumulative += prob;
                    keep += 1;
                    if cumulative >= *p {
                        break;
                    }
                }
                let keep = keep.max(1).min(ranked.len());
                sample(&ranked[..keep], *temperature, rng)
            }
            Self::Sample { temperature } => {
                let all: Vec<(u32, f32)> = logits.iter().enumerate().map(|(i, l)| (i as u32, *l)).collect();
                sample(&all, *temperature, rng)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Hypothesis {
    tokens: Vec<u32>,
    logprob: f32,
}

impl Hypothesis {
    /// Length-normalized score.
    fn score(&self, length: usize) -> f32 {
        self.logprob / length.max(1) as f32
    }
}

fn beam_search(
    model: &mut dyn CausalLm,
    prompt: &[u32],
    width: usize,
    no_repeat_ngram: usize,
    early_stopping: bool,
    cancelled: &dyn Fn() -> bool,
) -> Result<Vec<u32>, BackendError> {
    let eos = model.eos_token_id();
    let width = width.max(1);
    let mut beams = vec![Hypothesis {
        tokens: Vec::new(),
        logprob: 0.0,
    }];
    // (tokens, score)
    let mut finished: Vec<(Vec<u32>, f32)> = Vec::new();

    for _ in 0..MAX_NEW_TOKENS {
        if cancelled() {
            return Err(BackendError::Cancelled);
        }

        let mut candidates: Vec<(usize, u32, f32)> = Vec::new();
        for (index, beam) in beams.iter().enumerate() {
            let mut sequence = prompt.to_vec();
            sequence.extend_from_slice(&beam.tokens);
            let logprobs = log_softmax(&model.next_token_logits(&sequence)?);
            let banned = banned_tokens(&sequence, no_repeat_ngram);

            let mut ranked: Vec<(u32, f32)> = logprobs
                .iter()
                .enumerate()
                .map(|(t, lp)| (t as u32, *lp))
                .filter(|(t, lp)| !banned.contains(t) && lp.is_finite())
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked.truncate(2 * width);
            candidates.extend(ranked.into_iter().map(|(t, lp)| (index, t, beam.logprob + lp)));
        }
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut next = Vec::with_capacity(width);
        for (rank, (index, token, logprob)) in candidates.into_iter().enumerate() {
            if next.len() == width {
                break;
            }
            let parent = &beams[index];
            if token == eos {
                // Only end-of-sequence among the top `width` candidates
                // completes a hypothesis.
                if rank < width {
                    let hypothesis = Hypothesis {
                        tokens: parent.tokens.clone(),
                        logprob,
                    };
                    let score = hypothesis.score(parent.tokens.len() + 1);
                    finished.push((hypothesis.tokens, score));
                }
            } else {
                let mut tokens = parent.tokens.clone();
                tokens.push(token);
                next.push(Hypothesis { tokens, logprob });
            }
        }

        beams = next;
        if beams.is_empty() || (early_stopping && finished.len() >= width) {
            break;
        }
    }

    if finished.len() < width {
        for beam in &beams {
            finished.push((beam.tokens.clone(), beam.score(beam.tokens.len())));
        }
    }

    finished
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(tokens, _)| tokens)
        .ok_or_else(|| BackendError::Inference("beam search produced no hypothesis".to_string()))
}

/// Tokens that would complete an n-gram already present in `sequence`.
fn banned_tokens(sequence: &[u32], n: usize) -> HashSet<u32> {
    let mut banned = HashSet::new();
    if n == 0 || sequence.len() + 1 < n {
        return banned;
    }
    let prefix = &sequence[sequence.len() + 1 - n..];
    for window in sequence.windows(n) {
        if &window[..n - 1] == prefix {
            banned.insert(window[n - 1]);
        }
    }
    banned
}

fn argmax(logits: &[f32]) -> Result<u32, BackendError> {
    logits
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.is_nan())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i as u32)
        .ok_or_else(|| BackendError::Inference("model returned no logits".to_string()))
}

/// (token, logit) pairs, highest first.
fn ranked(logits: &[f32]) -> Vec<(u32, f32)> {
    let mut ranked: Vec<(u32, f32)> = logits
        .iter()
        .enumerate()
        .filter(|(_, l)| !l.is_nan())
        .map(|(i, l)| (i as u32, *l))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

fn sample<R: Rng>(candidates: &[(u32, f32)], temperature: f32, rng: &mut R) -> Result<u32, BackendError> {
    let logits: Vec<f32> = candidates.iter().map(|(_, l)| *l).collect();
    let probs = softmax(&logits, temperature);
    let dist = WeightedIndex::new(&probs)
        .map_err(|e| BackendError::Inference(format!("cannot sample: {}", e)))?;
    Ok(candidates[dist.sample(rng)].0)
}

/// Temperature-scaled softmax.
pub(crate) fn softmax(logits: &[f32], temperature: f32) -> Vec<f32> {
    let temperature = temperature.max(f32::EPSILON);
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| ((l - max) / temperature).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let log_sum = logits.iter().map(|l| (l - max).exp()).sum::<f32>().ln();
    logits.iter().map(|l| l - max - log_sum).collect()
}

#[cfg(test)]
#[path = "decoding_tests.rs"]
mod tests;
