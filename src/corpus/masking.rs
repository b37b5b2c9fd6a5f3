// ============================================================
// Layer 4 — Masking Sampler
// ============================================================
// Picks which training tasks, corpus-wide, must leave some
// fields out of their instruction, and which fields.
//
//   total_tasks = forms × 5
//   num_masked  = max(1, round(total_tasks × fraction))
//
// One seeded RNG stream drives everything, in this order:
//   1. draw num_masked distinct flat task indices
//   2. walk the flat task list (form by form, slot by slot) and,
//      for every masked slot, draw max(1, fields / 3) field ids
//      without replacement from that form's groundTruth keys
//
// The caller decides the flat order (hand-authored forms first,
// then generated, each by ascending numeric id; see
// infra::store::Corpus::task_order). Same seed, same order,
// same field counts → the same plan, bit for bit.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeSet;

use crate::domain::form::{TaskMask, TASKS_PER_FORM};

pub const DEFAULT_MASK_SEED: u64 = 42;
pub const DEFAULT_MASK_FRACTION: f64 = 0.10;

/// One form as the sampler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskInput {
    pub form_id:   String,
    /// groundTruth keys, in stored order.
    pub field_ids: Vec<String>,
}

/// The five task masks of one form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormMasks {
    pub form_id: String,
    pub tasks:   Vec<TaskMask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskPlan {
    /// Flat indices in [0, total_tasks) that were selected.
    pub masked_indices: BTreeSet<usize>,
    pub forms:          Vec<FormMasks>,
}

impl MaskPlan {
    /// Tasks that actually omit at least one field.
    pub fn masked_task_count(&self) -> usize {
        self.forms
            .iter()
            .flat_map(|f| f.tasks.iter())
            .filter(|t| t.masked)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct MaskingSampler {
    seed:     u64,
    fraction: f64,
}

impl MaskingSampler {
    pub fn new(seed: u64, fraction: f64) -> Self {
        Self { seed, fraction: fraction.clamp(0.0, 1.0) }
    }

    /// How many of `total_tasks` get masked. Zero only when there
    /// are no tasks at all.
    pub fn masked_count(&self, total_tasks: usize) -> usize {
        if total_tasks == 0 {
            return 0;
        }
        let wanted = (total_tasks as f64 * self.fraction).round() as usize;
        wanted.max(1).min(total_tasks)
    }

    /// Fields omitted by one masked task of a form with `field_count` keys.
    pub fn fields_to_omit(field_count: usize) -> usize {
        (field_count / 3).max(1).min(field_count)
    }

    pub fn plan(&self, forms: &[MaskInput]) -> MaskPlan {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let total_tasks = forms.len() * TASKS_PER_FORM;
        let num_masked  = self.masked_count(total_tasks);

        let masked_indices: BTreeSet<usize> =
            rand::seq::index::sample(&mut rng, total_tasks, num_masked)
                .into_iter()
                .collect();

        tracing::info!(
            "Masking {} of {} tasks across {} forms (seed {})",
            num_masked,
            total_tasks,
            forms.len(),
            self.seed,
        );

        let plans = forms
            .iter()
            .enumerate()
            .map(|(form_idx, form)| {
                let tasks = (0..TASKS_PER_FORM)
                    .map(|slot| {
                        let flat = form_idx * TASKS_PER_FORM + slot;
                        if !masked_indices.contains(&flat) || form.field_ids.is_empty() {
                            return TaskMask::unmasked();
                        }
                        let n = Self::fields_to_omit(form.field_ids.len());
                        let omitted: Vec<String> = form
                            .field_ids
                            .choose_multiple(&mut rng, n)
                            .cloned()
                            .collect();
                        TaskMask::omitting(omitted)
                    })
                    .collect();
                FormMasks { form_id: form.form_id.clone(), tasks }
            })
            .collect();

        MaskPlan { masked_indices, forms: plans }
    }
}

impl Default for MaskingSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_SEED, DEFAULT_MASK_FRACTION)
    }
}
