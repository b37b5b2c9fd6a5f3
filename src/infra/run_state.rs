// ============================================================
// Layer 6 — Run State
// ============================================================
// What a generation run carries between batches: the style
// counters and the highest slot handed to a committed batch.
// Both are committed to run_state.json right after the corpus
// itself, so a resumed run continues the same date / date-range
// rotation and never re-issues a slot.
//
// The generated partition is the source of truth for the
// counters. They are recounted on every load; a stored value
// that disagrees (a crash between the two writes, or a missing
// file) is replaced by the recount.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::corpus::style::StyleCounters;
use crate::domain::error::PersistenceError;
use crate::infra::store::{read_json, write_json_atomic, Partition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub style_counters:    StyleCounters,
    /// Batches committed over the lifetime of the corpus.
    #[serde(default)]
    pub batches_committed: u64,
    /// Highest slot position of any committed batch.
    #[serde(default)]
    pub last_slot:         u64,
    pub updated_at:        DateTime<Utc>,
}

impl RunState {
    pub fn new(style_counters: StyleCounters, batches_committed: u64) -> Self {
        Self { style_counters, batches_committed, last_slot: 0, updated_at: Utc::now() }
    }

    pub fn load(path: &Path) -> Result<Option<Self>, PersistenceError> {
        read_json(path)
    }

    /// Stored state with its counters checked against `generated`,
    /// or fresh state counted from `generated` if none is stored.
    pub fn load_or_rebuild(path: &Path, generated: &Partition) -> Result<Self, PersistenceError> {
        let counted = StyleCounters::from_forms(generated.iter());

        let Some(mut state) = Self::load(path)? else {
            tracing::info!(
                "No run state found; rebuilt style counters from {} generated forms (date={}, range={})",
                generated.len(),
                counted.date_counter,
                counted.range_counter,
            );
            return Ok(Self::new(counted, 0));
        };

        if state.style_counters != counted {
            tracing::warn!(
                "Stored style counters (date={}, range={}) disagree with the generated partition (date={}, range={}); using the recount",
                state.style_counters.date_counter,
                state.style_counters.range_counter,
                counted.date_counter,
                counted.range_counter,
            );
            state.style_counters = counted;
        }
        tracing::debug!(
            "Resuming style rotation at date={}, range={} after slot {}",
            state.style_counters.date_counter,
            state.style_counters.range_counter,
            state.last_slot,
        );
        Ok(state)
    }

    pub fn save(&mut self, path: &Path) -> Result<(), PersistenceError> {
        self.updated_at = Utc::now();
        write_json_atomic(path, self)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::FormDefinition;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("run_state.json");

        let mut state = RunState::new(StyleCounters { date_counter: 5, range_counter: 2 }, 3);
        state.save(&path).unwrap();

        let loaded = RunState::load(&path).unwrap().unwrap();
        assert_eq!(loaded.style_counters, state.style_counters);
        assert_eq!(loaded.batches_committed, 3);
    }

    #[test]
    fn test_missing_state_is_rebuilt_from_partition() {
        let dir = TempDir::new().unwrap();
        let form: FormDefinition = serde_json::from_value(json!({
            "id": "llm-form-1", "title": "t", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "a", "type": "date", "label": "A" },
                { "id": "b", "type": "date-range", "label": "B" },
                { "id": "c", "type": "date", "label": "C" }
            ]}]
        }))
        .unwrap();
        let generated: Partition = vec![form].into_iter().collect();

        let state = RunState::load_or_rebuild(&dir.path().join("run_state.json"), &generated).unwrap();
        assert_eq!(state.style_counters, StyleCounters { date_counter: 2, range_counter: 1 });
        assert_eq!(state.batches_committed, 0);
    }

    #[test]
    fn test_stale_counters_are_replaced_by_recount() {
        let dir  = TempDir::new().unwrap();
        let path = dir.path().join("run_state.json");
        let form: FormDefinition = serde_json::from_value(json!({
            "id": "llm-form-6", "title": "t", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "a", "type": "date", "label": "A" },
                { "id": "b", "type": "date", "label": "B" }
            ]}]
        }))
        .unwrap();
        let generated: Partition = vec![form].into_iter().collect();

        // Written before the last batch landed.
        let mut stale = RunState::new(StyleCounters::default(), 4);
        stale.last_slot = 5;
        stale.save(&path).unwrap();

        let state = RunState::load_or_rebuild(&path, &generated).unwrap();
        assert_eq!(state.style_counters, StyleCounters { date_counter: 2, range_counter: 0 });
        assert_eq!(state.batches_committed, 4);
        assert_eq!(state.last_slot, 5);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let state = RunState::new(StyleCounters::default(), 0);
        let raw = serde_json::to_value(&state).unwrap();
        assert!(raw.get("styleCounters").is_some());
        assert!(raw["styleCounters"].get("dateCounter").is_some());
    }
}
