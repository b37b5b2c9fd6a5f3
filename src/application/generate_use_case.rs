// ============================================================
// Layer 2 — GenerateUseCase
// ============================================================
// Grows the generated partition by N batches. Per batch:
//
//   Step 1: Pick the next free slot S            (Layer 4 - corpus)
//   Step 2: Assign industry / layout to S..S+W   (Layer 4 - corpus)
//   Step 3: Ask the generator for W documents    (collaborator)
//   Step 4: Stamp id / industry / layout         (here)
//   Step 5: Validate and normalise each document (Layer 4 - corpus)
//   Step 6: Style accepted forms, in order       (Layer 4 - corpus)
//   Step 7: Merge and commit atomically          (Layer 6 - infra)
//   Step 8: Commit run state, release the inputs (Layer 6 - infra)
//   Step 9: Log metrics                          (Layer 6 - infra)
//
// A generator failure abandons only its batch; rejected forms
// only cost their slot. A persistence failure stops the run,
// leaving the last committed batch on disk.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::corpus::{
    distribution::{next_position, DistributionAssigner, DEFAULT_BATCH_WIDTH},
    style::StyleAssigner,
    validator::Validator,
};
use crate::domain::error::{BatchError, GenerationError};
use crate::domain::form::FormDefinition;
use crate::domain::traits::{FormGenerator, GenerationRequest, SlotAssignment};
use crate::infra::{
    metrics::{BatchMetrics, BatchOutcome, MetricsLogger},
    run_state::RunState,
    store::{write_json_atomic, ConfigStore, Corpus, CorpusPaths},
};

// ─── Generate Configuration ──────────────────────────────────────────────────
// Written to generate_config.json next to the corpus so a run
// can be replayed with the same settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateConfig {
    pub paths:      CorpusPaths,
    pub batches:    usize,
    pub batch_size: usize,
    pub inbox_dir:  PathBuf,
    /// Date passed to the generator; today when unset.
    #[serde(default)]
    pub today:      Option<NaiveDate>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            paths:      CorpusPaths::default(),
            batches:    1,
            batch_size: DEFAULT_BATCH_WIDTH,
            inbox_dir:  PathBuf::from("inbox"),
            today:      None,
        }
    }
}

/// What a run did, for the CLI to print.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub batches_committed: usize,
    pub batches_abandoned: usize,
    pub forms_accepted:    usize,
    pub forms_rejected:    usize,
    pub corpus_size:       usize,
}

/// Forms that survived validation in one batch.
struct BatchYield {
    accepted: Vec<FormDefinition>,
    rejected: usize,
}

// ─── GenerateUseCase ──────────────────────────────────────────────────────────
pub struct GenerateUseCase<G: FormGenerator> {
    config:    GenerateConfig,
    generator: G,
    store:     ConfigStore,
    assigner:  DistributionAssigner,
    validator: Validator,
}

impl<G: FormGenerator> GenerateUseCase<G> {
    pub fn new(config: GenerateConfig, generator: G) -> Self {
        let store    = ConfigStore::new(config.paths.clone());
        let assigner = DistributionAssigner::new(config.batch_size);
        Self { config, generator, store, assigner, validator: Validator::intake() }
    }

    pub fn execute(&mut self) -> Result<RunSummary> {
        let paths = self.config.paths.clone();

        let mut corpus = self
            .store
            .load()
            .with_context(|| format!("Cannot load corpus from '{}'", paths.corpus_dir.display()))?;

        let mut state = RunState::load_or_rebuild(&paths.run_state_path(), &corpus.generated)
            .context("Cannot load run state")?;
        let mut styles = StyleAssigner::new(state.style_counters);

        write_json_atomic(&paths.generate_config_path(), &self.config)
            .context("Cannot save generate config")?;
        let metrics = MetricsLogger::new(paths.metrics_path())?;

        let today = self.config.today.unwrap_or_else(|| Local::now().date_naive());
        let mut summary = RunSummary::default();

        tracing::info!(
            "Generating {} batch(es) of {} into '{}'",
            self.config.batches,
            self.assigner.width(),
            paths.generated_path().display(),
        );

        for batch in 1..=self.config.batches {
            let start = next_position(corpus.generated.ids(), state.last_slot);

            match self.process_batch(start, today, &mut corpus, &mut styles, &mut state) {
                Ok((accepted, rejected)) => {
                    summary.batches_committed += 1;
                    summary.forms_accepted    += accepted;
                    summary.forms_rejected    += rejected;
                    metrics.log(&BatchMetrics {
                        batch,
                        start_slot: start,
                        requested:  self.assigner.width(),
                        accepted,
                        rejected,
                        outcome:    BatchOutcome::Committed,
                    })?;
                    tracing::info!(
                        "Batch {}/{} committed: {} accepted, {} rejected (corpus: {})",
                        batch,
                        self.config.batches,
                        accepted,
                        rejected,
                        corpus.generated.len(),
                    );
                }
                Err(e) if e.is_fatal() => {
                    return Err(e).with_context(|| format!("Batch {} could not be committed", batch));
                }
                Err(e) => {
                    summary.batches_abandoned += 1;
                    metrics.log(&BatchMetrics::abandoned(batch, start, self.assigner.width()))?;
                    tracing::warn!("Batch {} abandoned: {}", batch, e);
                }
            }
        }

        summary.corpus_size = corpus.generated.len();
        tracing::info!(
            "Run finished: {} committed, {} abandoned, {} forms accepted (metrics in '{}')",
            summary.batches_committed,
            summary.batches_abandoned,
            summary.forms_accepted,
            metrics.csv_path().display(),
        );
        Ok(summary)
    }

    /// Steps 2–8 for the batch starting at `start`.
    fn process_batch(
        &mut self,
        start:  u64,
        today:  NaiveDate,
        corpus: &mut Corpus,
        styles: &mut StyleAssigner,
        state:  &mut RunState,
    ) -> Result<(usize, usize), BatchError> {
        let request = GenerationRequest { slots: self.assigner.assign_batch(start), today };
        let batch   = self.produce(&request, styles)?;

        let accepted = batch.accepted.len();
        let outcome  = corpus.generated.merge(batch.accepted);
        if !outcome.skipped.is_empty() {
            tracing::warn!("Ids already in corpus, kept existing: {:?}", outcome.skipped);
        }

        self.store.save_generated(&corpus.generated)?;

        state.style_counters     = styles.counters();
        state.batches_committed += 1;
        state.last_slot          = state.last_slot.max(start + request.count() as u64 - 1);
        state.save(&self.config.paths.run_state_path())?;

        self.generator.commit()?;

        Ok((accepted, batch.rejected))
    }

    /// Steps 3–6: generate, stamp, validate, style.
    fn produce(&mut self, request: &GenerationRequest, styles: &mut StyleAssigner) -> Result<BatchYield, GenerationError> {
        let documents = self.generator.generate(request)?;

        if documents.len() > request.count() {
            tracing::warn!(
                "Generator returned {} documents for {} slots; dropping the extra",
                documents.len(),
                request.count(),
            );
        } else if documents.len() < request.count() {
            tracing::warn!(
                "Generator returned {} documents for {} slots; the rest stay empty",
                documents.len(),
                request.count(),
            );
        }

        let mut batch = BatchYield { accepted: Vec::new(), rejected: 0 };

        for (slot, mut raw) in request.slots.iter().zip(documents) {
            stamp(&mut raw, slot);

            match self.validator.validate(raw) {
                Ok(validated) => {
                    for w in &validated.warnings {
                        tracing::debug!("'{}': {}", slot.form_id, w);
                    }
                    let mut form = validated.form;
                    styles.assign(&mut form);
                    batch.accepted.push(form);
                }
                Err(violation) => {
                    tracing::warn!("{}", violation);
                    for v in &violation.violations {
                        tracing::warn!("  {}", v);
                    }
                    batch.rejected += 1;
                }
            }
        }

        Ok(batch)
    }
}

/// Overwrite the slot-owned attributes of a raw document.
/// Non-object documents are left alone for the validator to reject.
fn stamp(raw: &mut Value, slot: &SlotAssignment) {
    if let Some(obj) = raw.as_object_mut() {
        obj.insert("id".into(), Value::String(slot.form_id.clone()));
        obj.insert("industry".into(), Value::String(slot.industry.clone()));
        obj.insert("layout".into(), Value::String(slot.layout.as_str().to_string()));
    }
}
