// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores one agent submission (a JSON object of field id →
// value) against the groundTruth of a form in the corpus.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use std::{fs, path::Path};

use crate::corpus::comparison::{compare_with_ground_truth, ComparisonResult};
use crate::infra::store::{ConfigStore, CorpusPaths};

pub struct EvaluateUseCase {
    store: ConfigStore,
}

impl EvaluateUseCase {
    pub fn new(paths: CorpusPaths) -> Self {
        Self { store: ConfigStore::new(paths) }
    }

    pub fn evaluate(&self, form_id: &str, submission: &Path) -> Result<ComparisonResult> {
        let corpus = self.store.load().context("Cannot load corpus")?;
        let Some(form) = corpus.get(form_id) else {
            bail!("form '{}' is not in the corpus", form_id);
        };

        let text = fs::read_to_string(submission)
            .with_context(|| format!("Cannot read submission '{}'", submission.display()))?;
        let data: Map<String, Value> = serde_json::from_str(&text)
            .with_context(|| format!("Submission '{}' must be a JSON object", submission.display()))?;

        let result = compare_with_ground_truth(&data, form);
        tracing::info!(
            "Evaluated '{}': accuracy {}%, required {}%, optional {}%",
            form_id,
            result.accuracy,
            result.required_field_score,
            result.optional_field_score,
        );
        Ok(result)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CorpusPaths) {
        let dir   = TempDir::new().unwrap();
        let paths = CorpusPaths::in_dir(dir.path());
        let form  = json!({
            "id": "4", "title": "T", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "email", "type": "email", "label": "Email", "required": true }
            ]}],
            "groundTruth": { "email": "a@b.co" }
        });
        fs::write(paths.manual_path(), json!({ "4": form }).to_string()).unwrap();
        (dir, paths)
    }

    #[test]
    fn test_scores_submission_file() {
        let (dir, paths) = setup();
        let sub = dir.path().join("sub.json");
        fs::write(&sub, r#"{"email": "A@B.co "}"#).unwrap();

        let result = EvaluateUseCase::new(paths).evaluate("4", &sub).unwrap();
        assert_eq!(result.accuracy, 100.0);
    }

    #[test]
    fn test_unknown_form_is_an_error() {
        let (dir, paths) = setup();
        let sub = dir.path().join("sub.json");
        fs::write(&sub, "{}").unwrap();
        assert!(EvaluateUseCase::new(paths).evaluate("99", &sub).is_err());
    }

    #[test]
    fn test_non_object_submission_is_an_error() {
        let (dir, paths) = setup();
        let sub = dir.path().join("sub.json");
        fs::write(&sub, "[1, 2]").unwrap();
        assert!(EvaluateUseCase::new(paths).evaluate("4", &sub).is_err());
    }
}
