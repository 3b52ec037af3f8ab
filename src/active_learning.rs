//! Human-in-the-loop active learning.
//!
//! The controller starts in query mode, offering the candidates most (and
//! least) similar to a seed query to quickly collect positive and negative
//! labels. Once enough of each polarity is recorded it switches to margin
//! mode: a binary model is retrained on every answer and the unlabeled
//! candidate closest to the decision boundary becomes the next question.
//! The driving loop and its I/O belong to the caller; this module only
//! exposes `select_question`/`get_answer`.

use std::io::Write;

use ndarray::{Array1, Array2};
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FeatureExtractor;
use crate::math::{normalize_columns, normalized, sort_perm};
use crate::models::{BinaryModel, BinaryModelFactory};

/// Label state of one candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum CandidateLabel {
    Unlabeled,
    Positive,
    Negative,
}

/// User verdict on an offered candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Positive,
    Negative,
}

/// Controller state: query mode first, margin mode once enough labels of
/// both polarities are collected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Query,
    Margin,
}

/// Tuning knobs for [`ActiveLearner`].
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ActiveLearnerSettings {
    /// Positive labels required before leaving query mode.
    pub n_pos: usize,
    /// Negative labels required before leaving query mode.
    pub n_neg: usize,
    /// Subsample this many records from the query pool (all when unset).
    pub query_sample_size: Option<usize>,
    /// Subsample this many records from the random pool (all when unset).
    pub random_sample_size: Option<usize>,
}

impl Default for ActiveLearnerSettings {
    fn default() -> Self {
        Self {
            n_pos: 2,
            n_neg: 2,
            query_sample_size: None,
            random_sample_size: None,
        }
    }
}

/// Interactive sampling controller over a fixed candidate matrix.
pub struct ActiveLearner<F: BinaryModelFactory> {
    settings: ActiveLearnerSettings,
    factory: F,
    /// Candidate feature matrix, columns normalized.
    candidates: Array2<f64>,
    /// Cosine similarities to the query, sorted ascending.
    similarities: Vec<f64>,
    /// Permutation matching `similarities` back to candidate indices.
    sim_perm: Vec<usize>,
    labels: Vec<CandidateLabel>,
    /// Answered candidates in answer order, with their ±1 targets.
    answered: Vec<(usize, f64)>,
    /// Latest margin score per unlabeled candidate (margin mode only).
    scores: Vec<f64>,
    model: Option<F::Model>,
    mode: Mode,
    /// Questions asked from the most-similar end.
    pos_cursor: usize,
    /// Questions asked from the least-similar end.
    neg_cursor: usize,
    selected_question: Option<usize>,
}

impl<F: BinaryModelFactory> ActiveLearner<F> {
    /// Build the learner from domain records through a feature extractor:
    /// the query string becomes the seed vector and the (optionally
    /// subsampled) union of the two pools becomes the candidate matrix.
    pub fn from_records<R: Clone, E: FeatureExtractor<R>>(
        query: &str,
        query_pool: &[R],
        random_pool: &[R],
        extractor: &E,
        factory: F,
        settings: ActiveLearnerSettings,
    ) -> Result<Self> {
        if query_pool.is_empty() && random_pool.is_empty() {
            return Err(Error::Config(
                "no candidate records provided for active learning".into(),
            ));
        }
        let query_vec = extractor.extract_query(query)?;
        let mut union: Vec<R> = subsample(query_pool, settings.query_sample_size);
        union.extend(subsample(random_pool, settings.random_sample_size));
        let candidates = extractor.extract_matrix(&union)?;
        Self::from_precomputed(Some(query_vec), Some(candidates), factory, settings)
    }

    /// Build the learner from an already extracted query vector and
    /// candidate matrix. Both inputs are required; a missing one is a
    /// fatal configuration error.
    pub fn from_precomputed(
        query_vec: Option<Array1<f64>>,
        candidates: Option<Array2<f64>>,
        factory: F,
        settings: ActiveLearnerSettings,
    ) -> Result<Self> {
        let query_vec =
            query_vec.ok_or_else(|| Error::Config("query vector not provided".into()))?;
        let mut candidates =
            candidates.ok_or_else(|| Error::Config("candidate matrix not provided".into()))?;
        if candidates.nrows() != query_vec.len() {
            return Err(Error::InvalidShape {
                what: "ActiveLearner candidate dimension",
                expected: query_vec.len(),
                found: candidates.nrows(),
            });
        }

        let query_vec = normalized(&query_vec.view());
        normalize_columns(&mut candidates);
        let sims: Vec<f64> = candidates.t().dot(&query_vec).to_vec();
        let (similarities, sim_perm) = sort_perm(&sims, true);

        let n = candidates.ncols();
        Ok(Self {
            settings,
            factory,
            candidates,
            similarities,
            sim_perm,
            labels: vec![CandidateLabel::Unlabeled; n],
            answered: Vec::new(),
            scores: vec![0.0; n],
            model: None,
            mode: Mode::Query,
            pos_cursor: 0,
            neg_cursor: 0,
            selected_question: None,
        })
    }

    pub fn settings(&self) -> &ActiveLearnerSettings {
        &self.settings
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True while the learner still gathers seed labels by similarity.
    pub fn query_mode(&self) -> bool {
        self.mode == Mode::Query
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.ncols()
    }

    pub fn labels(&self) -> &[CandidateLabel] {
        &self.labels
    }

    /// Index returned by the last `select_question` call.
    pub fn selected_question_idx(&self) -> Option<usize> {
        self.selected_question
    }

    /// Sorted cosine similarities of the candidates to the seed query,
    /// ascending, with the matching candidate permutation.
    pub fn similarity_ranking(&self) -> (&[f64], &[usize]) {
        (&self.similarities, &self.sim_perm)
    }

    fn positives_recorded(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l == CandidateLabel::Positive)
            .count()
    }

    fn negatives_recorded(&self) -> usize {
        self.labels
            .iter()
            .filter(|&&l| l == CandidateLabel::Negative)
            .count()
    }

    /// Pick the candidate whose label would help the most right now.
    ///
    /// # Returns
    ///
    /// The candidate index to ask about, or `None` when query mode has
    /// exhausted both ends of the similarity ranking before enough labels
    /// were gathered.
    pub fn select_question(&mut self) -> Result<Option<usize>> {
        if self.positives_recorded() >= self.settings.n_pos
            && self.negatives_recorded() >= self.settings.n_neg
        {
            self.mode = Mode::Margin;
        }
        match self.mode {
            Mode::Query => Ok(self.select_by_similarity()),
            Mode::Margin => self.select_by_margin().map(Some),
        }
    }

    /// Query mode: alternate between the most similar candidate (hoping
    /// for a positive) and the least similar one (hoping for a negative).
    fn select_by_similarity(&mut self) -> Option<usize> {
        let n = self.candidate_count();
        if self.positives_recorded() < self.settings.n_pos && self.pos_cursor + 1 < n {
            self.pos_cursor += 1;
            log::trace!("query mode, try to get a positive");
            let idx = self.sim_perm[n - 1 - (self.pos_cursor - 1)];
            self.selected_question = Some(idx);
            return self.selected_question;
        }
        if self.negatives_recorded() < self.settings.n_neg && self.neg_cursor + 1 < n {
            self.neg_cursor += 1;
            log::trace!("query mode, try to get a negative");
            let idx = self.sim_perm[self.neg_cursor - 1];
            self.selected_question = Some(idx);
            return self.selected_question;
        }
        self.selected_question = None;
        None
    }

    /// Margin mode: retrain on everything answered so far, score the
    /// unlabeled candidates and pick the one closest to the boundary.
    fn select_by_margin(&mut self) -> Result<usize> {
        self.retrain()?;
        let model = self
            .model
            .as_ref()
            .ok_or(Error::NotFitted("ActiveLearner margin model"))?;

        let mut predicted_pos = self.positives_recorded();
        let mut predicted_neg = self.negatives_recorded();
        let mut margins: Vec<(usize, f64)> = Vec::new();
        for idx in 0..self.candidates.ncols() {
            if self.labels[idx] != CandidateLabel::Unlabeled {
                continue;
            }
            let margin = model.decision_function(self.candidates.column(idx))?;
            if margin > 0.0 {
                predicted_pos += 1;
            } else {
                predicted_neg += 1;
            }
            margins.push((idx, margin));
        }

        let mut best: Option<(usize, f64)> = None;
        for &(idx, margin) in &margins {
            self.scores[idx] = margin;
            match best {
                Some((_, dist)) if margin.abs() >= dist => {}
                _ => best = Some((idx, margin.abs())),
            }
        }
        let (idx, dist) = best.ok_or_else(|| {
            Error::Config("all candidates are already labeled".into())
        })?;
        log::trace!(
            "margin mode, margin: {}, npos: {}, nneg: {}",
            dist,
            predicted_pos,
            predicted_neg
        );
        self.selected_question = Some(idx);
        Ok(idx)
    }

    /// Fit the binary model on the labeled examples collected so far.
    pub fn retrain(&mut self) -> Result<()> {
        if self.answered.is_empty() {
            return Err(Error::Config(
                "no labeled examples to train on".into(),
            ));
        }
        let dim = self.candidates.nrows();
        let mut x = Array2::zeros((dim, self.answered.len()));
        let mut y = Array1::zeros(self.answered.len());
        for (col, &(idx, target)) in self.answered.iter().enumerate() {
            x.column_mut(col).assign(&self.candidates.column(idx));
            y[col] = target;
        }
        let mut model = self.factory.build();
        model.fit(&x, &y)?;
        self.model = Some(model);
        Ok(())
    }

    /// Record the user's verdict on candidate `idx`.
    pub fn get_answer(&mut self, answer: Answer, idx: usize) -> Result<()> {
        if idx >= self.candidate_count() {
            return Err(Error::InvalidShape {
                what: "ActiveLearner::get_answer candidate index",
                expected: self.candidate_count(),
                found: idx,
            });
        }
        if self.labels[idx] != CandidateLabel::Unlabeled {
            return Err(Error::Config(format!(
                "candidate {} is already labeled",
                idx
            )));
        }
        match answer {
            Answer::Positive => {
                self.labels[idx] = CandidateLabel::Positive;
                self.answered.push((idx, 1.0));
            }
            Answer::Negative => {
                self.labels[idx] = CandidateLabel::Negative;
                self.answered.push((idx, -1.0));
            }
        }
        Ok(())
    }

    fn require_margin_mode(&self) -> Result<&F::Model> {
        if self.mode != Mode::Margin {
            return Err(Error::NotFitted("ActiveLearner margin model"));
        }
        self.model
            .as_ref()
            .ok_or(Error::NotFitted("ActiveLearner margin model"))
    }

    /// Indices considered positive: every candidate labeled positive plus
    /// the unlabeled ones whose latest margin score is at least
    /// `threshold`. Margin mode only.
    pub fn positives(&self, threshold: f64) -> Result<Vec<usize>> {
        self.require_margin_mode()?;
        let mut result = Vec::new();
        for idx in 0..self.candidate_count() {
            match self.labels[idx] {
                CandidateLabel::Positive => result.push(idx),
                CandidateLabel::Unlabeled if self.scores[idx] >= threshold => result.push(idx),
                _ => {}
            }
        }
        Ok(result)
    }

    /// The `limit` highest-scoring candidates with their margin scores;
    /// labeled positives rank first, labeled negatives last. Margin mode
    /// only.
    pub fn top_positive(&self, limit: usize) -> Result<Vec<(usize, f64)>> {
        self.require_margin_mode()?;
        let ranked: Vec<f64> = (0..self.candidate_count())
            .map(|idx| match self.labels[idx] {
                CandidateLabel::Positive => f64::MAX,
                CandidateLabel::Negative => f64::MIN,
                CandidateLabel::Unlabeled => self.scores[idx],
            })
            .collect();
        let (values, perm) = sort_perm(&ranked, false);
        Ok(perm
            .into_iter()
            .zip(values)
            .take(limit)
            .collect())
    }

    /// Serialize the trained binary model. Margin mode only.
    pub fn save_model<W: Write>(&self, out: &mut W) -> Result<()>
    where
        F::Model: Serialize,
    {
        let model = self.require_margin_mode()?;
        serde_json::to_writer(out, model)?;
        Ok(())
    }
}

/// Random subsample of `amount` records, or the whole pool when unset.
fn subsample<R: Clone>(pool: &[R], amount: Option<usize>) -> Vec<R> {
    match amount {
        Some(amount) if amount < pool.len() => {
            sample(&mut rand::thread_rng(), pool.len(), amount)
                .into_iter()
                .map(|i| pool[i].clone())
                .collect()
        }
        _ => pool.to_vec(),
    }
}
