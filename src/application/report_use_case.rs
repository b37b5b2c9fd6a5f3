// ============================================================
// Layer 2 — Report Use Cases
// ============================================================
// Read-only views over forms on disk:
//
//   validate → run the schema validator over a file holding a
//              single form, an array of forms, or a whole
//              partition (id → form)
//   stats    → distribution counts per partition and combined

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::{fs, path::Path};

use crate::corpus::{stats::CorpusStats, validator::Validator};
use crate::domain::error::Violation;
use crate::infra::store::{ConfigStore, CorpusPaths};

// ─── Validate ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormReport {
    pub form_id:    String,
    pub violations: Vec<Violation>,
    pub warnings:   Vec<Violation>,
}

impl FormReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub forms: Vec<FormReport>,
}

impl ValidationReport {
    pub fn accepted(&self) -> usize {
        self.forms.iter().filter(|f| f.is_valid()).count()
    }

    pub fn rejected(&self) -> usize {
        self.forms.len() - self.accepted()
    }
}

/// Validate every form found in `path`.
pub fn validate_file(path: &Path, strict: bool) -> Result<ValidationReport> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    let doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not valid JSON", path.display()))?;

    let validator = if strict { Validator::strict() } else { Validator::intake() };
    let report = ValidationReport {
        forms: candidates(doc).into_iter().map(|raw| check_one(&validator, raw)).collect(),
    };

    tracing::info!(
        "Validated '{}': {} accepted, {} rejected",
        path.display(),
        report.accepted(),
        report.rejected(),
    );
    Ok(report)
}

/// Split a document into candidate forms.
/// An object with `pages` is one form; any other object is a partition.
fn candidates(doc: Value) -> Vec<Value> {
    match doc {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("pages") => vec![Value::Object(map)],
        Value::Object(map) => map
            .into_iter()
            .map(|(key, mut form)| {
                if let Some(obj) = form.as_object_mut() {
                    obj.entry("id").or_insert(Value::String(key));
                }
                form
            })
            .collect(),
        other => vec![other],
    }
}

fn check_one(validator: &Validator, raw: Value) -> FormReport {
    let fallback = raw.get("id").and_then(Value::as_str).unwrap_or("<unknown>").to_string();
    match validator.validate(raw) {
        Ok(v) => FormReport { form_id: v.form.id, violations: Vec::new(), warnings: v.warnings },
        Err(e) => FormReport {
            form_id:    if e.form_id.is_empty() { fallback } else { e.form_id },
            violations: e.violations,
            warnings:   Vec::new(),
        },
    }
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub manual:    CorpusStats,
    pub generated: CorpusStats,
    pub combined:  CorpusStats,
}

pub fn corpus_stats(paths: &CorpusPaths) -> Result<StatsReport> {
    let corpus = ConfigStore::new(paths.clone()).load().context("Cannot load corpus")?;

    let manual    = CorpusStats::from_forms(corpus.manual.iter());
    let generated = CorpusStats::from_forms(corpus.generated.iter());
    let mut combined = manual.clone();
    combined.merge(&generated);

    Ok(StatsReport { manual, generated, combined })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::Invariant;
    use serde_json::json;
    use tempfile::TempDir;

    fn good(id: &str) -> Value {
        json!({
            "id": id, "title": "T", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "c", "type": "country", "label": "Country" }
            ]}],
            "groundTruth": { "c": "Canada" }
        })
    }

    fn write(dir: &TempDir, doc: &Value) -> std::path::PathBuf {
        let path = dir.path().join("forms.json");
        fs::write(&path, doc.to_string()).unwrap();
        path
    }

    #[test]
    fn test_single_form_file() {
        let dir = TempDir::new().unwrap();
        let report = validate_file(&write(&dir, &good("1")), false).unwrap();
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.forms[0].form_id, "1");
    }

    #[test]
    fn test_partition_file_uses_keys_as_ids() {
        let dir = TempDir::new().unwrap();
        let mut bad = good("");
        bad.as_object_mut().unwrap().remove("id");
        bad["groundTruth"]["c"] = json!("Atlantis");

        let report = validate_file(&write(&dir, &json!({ "1": good("1"), "2": bad })), false).unwrap();
        assert_eq!(report.accepted(), 1);
        assert_eq!(report.rejected(), 1);

        let rejected = &report.forms[1];
        assert_eq!(rejected.form_id, "2");
        assert_eq!(rejected.violations[0].invariant, Invariant::ClosedVocabulary);
    }

    #[test]
    fn test_strict_mode_requires_tasks() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, &json!([good("1")]));
        assert_eq!(validate_file(&path, false).unwrap().rejected(), 0);
        assert_eq!(validate_file(&path, true).unwrap().rejected(), 1);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{").unwrap();
        assert!(validate_file(&path, false).is_err());
    }

    #[test]
    fn test_stats_combine_partitions() {
        let dir = TempDir::new().unwrap();
        let paths = CorpusPaths::in_dir(dir.path());
        fs::write(paths.manual_path(), json!({ "1": good("1") }).to_string()).unwrap();
        fs::write(paths.generated_path(), json!({ "llm-form-1": good("llm-form-1") }).to_string()).unwrap();

        let report = corpus_stats(&paths).unwrap();
        assert_eq!(report.manual.total_forms, 1);
        assert_eq!(report.generated.total_forms, 1);
        assert_eq!(report.combined.total_forms, 2);
        assert_eq!(report.combined.field_kinds.get("country"), Some(&2));
    }
}
