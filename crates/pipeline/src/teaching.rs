//! The teach flow: extract pairs, review them, train them in order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lutspace_backend::models::training_log::{CreateTrainingLog, SpaceTrainingLog};
use lutspace_backend::repositories::TrainingLogRepo;
use lutspace_backend::{best_effort, BackendClient, SessionUser};
use lutspace_core::types::{EntityId, QaPair};
use lutspace_extraction::{ExtractionError, QaExtractor};
use lutspace_inference::{InferenceApi, InferenceError, TuningParams};

/// Errors from the teach flow.
#[derive(Debug, thiserror::Error)]
pub enum TeachingError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The sequential train loop failed partway. Pairs before `completed`
    /// are applied and stay applied; the rest were never attempted.
    #[error("Training failed after {completed} pair(s): {source}")]
    Training {
        completed: usize,
        #[source]
        source: InferenceError,
    },

    #[error(transparent)]
    Backend(#[from] lutspace_backend::BackendError),

    /// A reviewed pair has an empty question or answer. Only checked at
    /// commit time; blanking a field during review is allowed.
    #[error("Pair {id} has an empty question or answer")]
    EmptyPair { id: u64 },

    #[error("There are no pairs to train")]
    NothingToTrain,

    /// The orchestrator is not in the right state for the call.
    #[error("Operation not valid in the current state")]
    InvalidState,
}

/// Where the teach flow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeachingState {
    Idle,
    Extracting,
    Reviewing,
    Training,
}

/// An extracted pair under review, addressable for editing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewPair {
    /// Local handle for edit/remove; never persisted.
    pub id: u64,
    pub question: String,
    pub answer: String,
}

/// Progress of the sequential train loop, reported after each pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingProgress {
    pub completed: usize,
    pub total: usize,
    /// elapsed / completed x remaining. `None` until one pair is done.
    pub eta: Option<Duration>,
}

/// The result of a successful commit.
#[derive(Debug)]
pub struct CommitOutcome {
    pub trained: usize,
    /// The created (or retrain-updated) training log, when persistence
    /// succeeded.
    pub log: Option<SpaceTrainingLog>,
}

/// Drives one teach session for one space.
///
/// `Idle → Extracting → Reviewing → Training → Idle`. A mid-loop training
/// failure drops back to `Reviewing` with the pairs intact so the editor
/// can retry; there is no rollback of already-trained pairs.
pub struct TeachingOrchestrator {
    extractor: Arc<dyn QaExtractor>,
    inference: Arc<dyn InferenceApi>,
    backend: Arc<BackendClient>,
    editor: SessionUser,
    space_id: EntityId,
    lut_name: String,
    params: TuningParams,
    state: TeachingState,
    pairs: Vec<ReviewPair>,
    next_pair_id: u64,
    source_text: String,
    /// Set by [`Self::load_log`]; commit then overwrites this log instead
    /// of creating a new one.
    retrain_log_id: Option<EntityId>,
}

impl TeachingOrchestrator {
    pub fn new(
        extractor: Arc<dyn QaExtractor>,
        inference: Arc<dyn InferenceApi>,
        backend: Arc<BackendClient>,
        editor: SessionUser,
        space_id: EntityId,
        lut_name: &str,
    ) -> Self {
        Self {
            extractor,
            inference,
            backend,
            editor,
            space_id,
            lut_name: lut_name.to_string(),
            params: TuningParams::default(),
            state: TeachingState::Idle,
            pairs: Vec::new(),
            next_pair_id: 0,
            source_text: String::new(),
            retrain_log_id: None,
        }
    }

    /// Override the tuning parameters.
    pub fn with_params(mut self, params: TuningParams) -> Self {
        self.params = params;
        self
    }

    pub fn state(&self) -> TeachingState {
        self.state
    }

    pub fn pairs(&self) -> &[ReviewPair] {
        &self.pairs
    }

    /// Run extraction on source text and enter review.
    ///
    /// Returns the number of pairs extracted. An extraction failure (or a
    /// call in the wrong state) leaves the orchestrator `Idle`.
    pub async fn submit_source(&mut self, source_text: &str) -> Result<usize, TeachingError> {
        if self.state != TeachingState::Idle {
            return Err(TeachingError::InvalidState);
        }
        self.state = TeachingState::Extracting;

        let extracted = match self.extractor.extract_qas(source_text).await {
            Ok(pairs) => pairs,
            Err(error) => {
                self.state = TeachingState::Idle;
                return Err(error.into());
            }
        };

        self.source_text = source_text.trim().to_string();
        self.retrain_log_id = None;
        self.pairs = extracted
            .into_iter()
            .map(|pair| self.make_review_pair(pair))
            .collect();
        self.state = TeachingState::Reviewing;
        Ok(self.pairs.len())
    }

    /// Put a stored log's pairs into review for retraining. Commit will
    /// overwrite that log's pairs rather than creating a new log.
    pub fn load_log(&mut self, log: &SpaceTrainingLog) -> Result<(), TeachingError> {
        if self.state != TeachingState::Idle {
            return Err(TeachingError::InvalidState);
        }
        self.source_text = log.source_text.clone();
        self.retrain_log_id = Some(log.id);
        self.pairs = log
            .qas
            .iter()
            .cloned()
            .map(|pair| self.make_review_pair(pair))
            .collect();
        self.state = TeachingState::Reviewing;
        Ok(())
    }

    /// Replace both fields of a pair. `false` when the id is unknown.
    pub fn edit_pair(&mut self, id: u64, question: &str, answer: &str) -> bool {
        match self.pairs.iter_mut().find(|pair| pair.id == id) {
            Some(pair) => {
                pair.question = question.to_string();
                pair.answer = answer.to_string();
                true
            }
            None => false,
        }
    }

    /// Drop a pair from the review set. `false` when the id is unknown.
    pub fn remove_pair(&mut self, id: u64) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|pair| pair.id != id);
        self.pairs.len() != before
    }

    /// Train every reviewed pair, strictly in order, then persist the log.
    ///
    /// Pair *i+1* is not sent until pair *i* has resolved. `on_progress`
    /// fires after each trained pair. A failure aborts the remainder and
    /// surfaces the first error; the orchestrator drops back to
    /// `Reviewing`. On full success the log write happens (create for a
    /// fresh session, pair overwrite for a retrain) and the orchestrator
    /// resets to `Idle` even if that write fails.
    pub async fn commit(
        &mut self,
        mut on_progress: impl FnMut(TrainingProgress),
    ) -> Result<CommitOutcome, TeachingError> {
        if self.state != TeachingState::Reviewing {
            return Err(TeachingError::InvalidState);
        }
        if self.pairs.is_empty() {
            return Err(TeachingError::NothingToTrain);
        }
        if let Some(pair) = self
            .pairs
            .iter()
            .find(|pair| pair.question.trim().is_empty() || pair.answer.trim().is_empty())
        {
            return Err(TeachingError::EmptyPair { id: pair.id });
        }

        self.state = TeachingState::Training;
        let total = self.pairs.len();
        let started = Instant::now();

        for (index, pair) in self.pairs.iter().enumerate() {
            let result = self
                .inference
                .train(&self.lut_name, &pair.answer, Some(&pair.question), &self.params)
                .await;
            if let Err(source) = result {
                self.state = TeachingState::Reviewing;
                return Err(TeachingError::Training {
                    completed: index,
                    source,
                });
            }
            let completed = index + 1;
            on_progress(TrainingProgress {
                completed,
                total,
                eta: estimate_remaining(started.elapsed(), completed, total),
            });
        }

        let qas: Vec<QaPair> = self
            .pairs
            .iter()
            .map(|pair| QaPair {
                question: pair.question.clone(),
                answer: pair.answer.clone(),
            })
            .collect();

        let log = match self.retrain_log_id {
            // Retrain overwrite is an audit update, tolerated on failure.
            Some(log_id) => best_effort(
                TrainingLogRepo::replace_qas(&self.backend, log_id, &qas, self.editor.id).await,
                "training log overwrite",
            )
            .flatten(),
            None => {
                let create = CreateTrainingLog {
                    space_id: self.space_id,
                    source_text: self.source_text.clone(),
                    qas,
                    created_by: self.editor.id,
                };
                match TrainingLogRepo::create(&self.backend, &create).await {
                    Ok(log) => Some(log),
                    Err(error) => {
                        // The table state is already applied; reset first,
                        // then surface the persistence failure.
                        self.reset();
                        return Err(error.into());
                    }
                }
            }
        };

        self.reset();
        Ok(CommitOutcome {
            trained: total,
            log,
        })
    }

    fn make_review_pair(&mut self, pair: QaPair) -> ReviewPair {
        let id = self.next_pair_id;
        self.next_pair_id += 1;
        ReviewPair {
            id,
            question: pair.question,
            answer: pair.answer,
        }
    }

    fn reset(&mut self) {
        self.pairs.clear();
        self.source_text.clear();
        self.retrain_log_id = None;
        self.state = TeachingState::Idle;
    }
}

/// Linear ETA: elapsed / completed x remaining.
fn estimate_remaining(elapsed: Duration, completed: usize, total: usize) -> Option<Duration> {
    if completed == 0 {
        return None;
    }
    let remaining = (total - completed) as u32;
    Some(elapsed / completed as u32 * remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_is_linear_in_remaining_pairs() {
        let eta = estimate_remaining(Duration::from_secs(10), 2, 6).unwrap();
        assert_eq!(eta, Duration::from_secs(20));
    }

    #[test]
    fn eta_is_zero_when_done() {
        let eta = estimate_remaining(Duration::from_secs(10), 4, 4).unwrap();
        assert_eq!(eta, Duration::ZERO);
    }

    #[test]
    fn eta_undefined_before_first_pair() {
        assert_eq!(estimate_remaining(Duration::from_secs(1), 0, 4), None);
    }
}
