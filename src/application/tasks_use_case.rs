// ============================================================
// Layer 2 — TasksUseCase
// ============================================================
// Rewrites the trainingTasks of every form in the corpus:
//
//   Step 1: Load both partitions                (Layer 6 - infra)
//   Step 2: Walk forms in task order            (Layer 6 - infra)
//   Step 3: Draw the corpus-wide masking plan   (Layer 4 - corpus)
//   Step 4: Write 5 instructions per form       (collaborator)
//   Step 5: Check masking on the new tasks      (Layer 4 - corpus)
//   Step 6: Stamp tasks and save both files     (Layer 6 - infra)
//
// A form whose writer fails, returns the wrong number of
// instructions, or leaks a masked value keeps its previous
// tasks; the rest of the corpus is still stamped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::{
    masking::{MaskInput, MaskingSampler, DEFAULT_MASK_FRACTION, DEFAULT_MASK_SEED},
    validator::Validator,
};
use crate::domain::error::{GenerationError, Invariant};
use crate::domain::form::{FormDefinition, Task, TaskMask, TASKS_PER_FORM};
use crate::domain::traits::InstructionWriter;
use crate::infra::store::{ConfigStore, CorpusPaths};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksConfig {
    pub paths:         CorpusPaths,
    pub seed:          u64,
    pub mask_fraction: f64,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            paths:         CorpusPaths::default(),
            seed:          DEFAULT_MASK_SEED,
            mask_fraction: DEFAULT_MASK_FRACTION,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksSummary {
    pub forms_total:   usize,
    pub forms_stamped: usize,
    pub forms_skipped: usize,
    pub tasks_masked:  usize,
}

pub struct TasksUseCase<W: InstructionWriter> {
    config: TasksConfig,
    writer: W,
    store:  ConfigStore,
}

impl<W: InstructionWriter> TasksUseCase<W> {
    pub fn new(config: TasksConfig, writer: W) -> Self {
        let store = ConfigStore::new(config.paths.clone());
        Self { config, writer, store }
    }

    pub fn execute(&self) -> Result<TasksSummary> {
        let mut corpus = self.store.load().context("Cannot load corpus")?;
        if corpus.is_empty() {
            tracing::info!("Corpus is empty; no tasks to stamp");
            return Ok(TasksSummary::default());
        }

        let inputs: Vec<MaskInput> = corpus
            .task_order()
            .into_iter()
            .map(|f| MaskInput { form_id: f.id.clone(), field_ids: f.ground_truth_ids() })
            .collect();

        let plan = MaskingSampler::new(self.config.seed, self.config.mask_fraction).plan(&inputs);
        tracing::info!(
            "Masking plan: {} of {} task slots selected, {} omit fields",
            plan.masked_indices.len(),
            inputs.len() * TASKS_PER_FORM,
            plan.masked_task_count(),
        );

        let mut summary = TasksSummary { forms_total: inputs.len(), ..TasksSummary::default() };
        let mut updates = Vec::with_capacity(plan.forms.len());

        for masks in &plan.forms {
            let Some(form) = corpus.get(&masks.form_id) else {
                continue;
            };
            match self.build_tasks(form, &masks.tasks) {
                Ok(tasks) => {
                    summary.tasks_masked += tasks.iter().filter(|t| t.masked).count();
                    updates.push((masks.form_id.clone(), tasks));
                }
                Err(e) => {
                    summary.forms_skipped += 1;
                    tracing::warn!("Keeping previous tasks of '{}': {:#}", masks.form_id, e);
                }
            }
        }

        for (id, tasks) in updates {
            if corpus.replace_tasks(&id, tasks) {
                summary.forms_stamped += 1;
            }
        }

        self.store.save(&corpus).context("Cannot save corpus")?;

        tracing::info!(
            "Stamped tasks on {}/{} forms ({} masked tasks, {} forms skipped)",
            summary.forms_stamped,
            summary.forms_total,
            summary.tasks_masked,
            summary.forms_skipped,
        );
        Ok(summary)
    }

    /// Steps 4–5 for one form.
    fn build_tasks(&self, form: &FormDefinition, masks: &[TaskMask]) -> Result<Vec<Task>> {
        let instructions = self.writer.write(form, masks)?;
        if instructions.len() != TASKS_PER_FORM {
            return Err(GenerationError::InstructionCount {
                expected: TASKS_PER_FORM,
                actual:   instructions.len(),
            }
            .into());
        }

        let tasks: Vec<Task> = instructions
            .into_iter()
            .zip(masks)
            .enumerate()
            .map(|(slot, (instruction, mask))| Task {
                id:            Task::slot_id(slot),
                instruction,
                masked:        mask.masked,
                masked_fields: mask.masked_fields.clone(),
            })
            .collect();

        let mut candidate = form.clone();
        candidate.training_tasks = tasks;
        let (violations, _) = Validator::strict().check(&candidate);
        let task_violations: Vec<String> = violations
            .iter()
            .filter(|v| matches!(v.invariant, Invariant::TaskMasking | Invariant::TaskCount))
            .map(|v| v.to_string())
            .collect();
        if !task_violations.is_empty() {
            anyhow::bail!("new tasks break masking: {}", task_violations.join("; "));
        }

        Ok(candidate.training_tasks)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::instructions::TemplateInstructionWriter;
    use crate::infra::store::Corpus;
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    /// Form `id` with `n` text fields whose values never contain each other.
    fn form(id: &str, n: usize) -> FormDefinition {
        let fields: Vec<Value> = (0..n)
            .map(|i| json!({ "id": format!("f{}", i), "type": "text", "label": format!("Item {}", i) }))
            .collect();
        let truth: Map<String, Value> = (0..n)
            .map(|i| (format!("f{}", i), json!(format!("v{}q{}z", i, id))))
            .collect();
        serde_json::from_value(json!({
            "id": id, "title": "T", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": fields }],
            "groundTruth": truth
        }))
        .unwrap()
    }

    fn seeded(dir: &TempDir) -> TasksConfig {
        let corpus = Corpus {
            manual:    (1..=12).map(|i| form(&i.to_string(), 4)).collect(),
            generated: (1..=8).map(|i| form(&format!("llm-form-{}", i), 6)).collect(),
        };
        let paths = CorpusPaths::in_dir(dir.path());
        ConfigStore::new(paths.clone()).save(&corpus).unwrap();
        TasksConfig { paths, ..TasksConfig::default() }
    }

    struct ShortWriter;

    impl InstructionWriter for ShortWriter {
        fn write(&self, _form: &FormDefinition, _masks: &[TaskMask]) -> Result<Vec<String>, GenerationError> {
            Ok(vec!["only one".into()])
        }
    }

    #[test]
    fn test_every_form_gets_five_valid_tasks() {
        let dir = TempDir::new().unwrap();
        let cfg = seeded(&dir);
        let summary = TasksUseCase::new(cfg.clone(), TemplateInstructionWriter::new()).execute().unwrap();

        assert_eq!(summary.forms_total, 20);
        assert_eq!(summary.forms_stamped, 20);
        assert_eq!(summary.tasks_masked, 10);

        let corpus = ConfigStore::new(cfg.paths).load().unwrap();
        for form in corpus.task_order() {
            assert_eq!(form.training_tasks.len(), 5);
            let (violations, warnings) = Validator::strict().check(form);
            assert!(violations.is_empty(), "{}: {:?}", form.id, violations);
            assert!(warnings.is_empty());
            for task in form.training_tasks.iter().filter(|t| t.masked) {
                // 4 keys → 1 field, 6 keys → 2 fields
                let expected = if form.id.starts_with("llm") { 2 } else { 1 };
                assert_eq!(task.masked_fields.len(), expected);
            }
        }
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let cfg = seeded(&dir);
        let read = |p: &CorpusPaths| {
            (
                std::fs::read_to_string(p.manual_path()).unwrap(),
                std::fs::read_to_string(p.generated_path()).unwrap(),
            )
        };

        TasksUseCase::new(cfg.clone(), TemplateInstructionWriter::new()).execute().unwrap();
        let first = read(&cfg.paths);
        TasksUseCase::new(cfg.clone(), TemplateInstructionWriter::new()).execute().unwrap();
        assert_eq!(read(&cfg.paths), first);
    }

    #[test]
    fn test_wrong_instruction_count_keeps_old_tasks() {
        let dir = TempDir::new().unwrap();
        let cfg = seeded(&dir);
        let summary = TasksUseCase::new(cfg.clone(), ShortWriter).execute().unwrap();

        assert_eq!(summary.forms_stamped, 0);
        assert_eq!(summary.forms_skipped, 20);
        let corpus = ConfigStore::new(cfg.paths).load().unwrap();
        assert!(corpus.task_order().iter().all(|f| f.training_tasks.is_empty()));
    }

    #[test]
    fn test_masked_value_shared_with_title_still_gets_tasks() {
        let dir = TempDir::new().unwrap();
        let form: FormDefinition = serde_json::from_value(json!({
            "id": "1", "title": "Sales Department Intake", "type": "single-page",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "dept", "type": "text", "label": "Department" },
                { "id": "role", "type": "text", "label": "Role" },
                { "id": "name", "type": "text", "label": "Name" }
            ]}],
            "groundTruth": { "dept": "Sales", "role": "Head of Sales", "name": "Ivo Brandt" }
        }))
        .unwrap();
        let paths = CorpusPaths::in_dir(dir.path());
        let corpus = Corpus { manual: vec![form].into_iter().collect(), ..Corpus::default() };
        ConfigStore::new(paths.clone()).save(&corpus).unwrap();

        let cfg = TasksConfig { paths, mask_fraction: 1.0, ..TasksConfig::default() };
        let summary = TasksUseCase::new(cfg.clone(), TemplateInstructionWriter::new()).execute().unwrap();
        assert_eq!(summary.forms_stamped, 1);
        assert_eq!(summary.forms_skipped, 0);
        assert_eq!(summary.tasks_masked, 5);

        let corpus = ConfigStore::new(cfg.paths).load().unwrap();
        let form = corpus.get("1").unwrap();
        assert_eq!(form.training_tasks.len(), 5);
        assert!(Validator::strict().check(form).0.is_empty());
    }

    #[test]
    fn test_empty_corpus_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let cfg = TasksConfig { paths: CorpusPaths::in_dir(dir.path()), ..TasksConfig::default() };
        let summary = TasksUseCase::new(cfg, TemplateInstructionWriter::new()).execute().unwrap();
        assert_eq!(summary, TasksSummary::default());
    }
}
