// ============================================================
// Layer 3 — Collaborator Traits
// ============================================================
// The two places where creative content enters the pipeline.
// Both are external in production (an LLM service), so the
// core only sees these traits:
//
//   FormGenerator     → raw candidate form documents for a batch
//   InstructionWriter → five first-person instructions per form
//
// Implementations:
//   - infra::inbox::DirectoryGenerator           (FormGenerator)
//   - corpus::instructions::TemplateInstructionWriter (InstructionWriter)
//
// Anything a collaborator returns is untrusted: generator output
// goes through the schema validator, writer output is checked
// for count before it is stamped onto a form.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::domain::error::{GenerationError, PersistenceError};
use crate::domain::form::{FormDefinition, Layout, TaskMask};

// ─── GenerationRequest ────────────────────────────────────────────────────────

/// The deterministic attributes decided for one new form slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAssignment {
    /// 1-indexed position in the generated partition.
    pub position: u64,
    pub form_id:  String,
    pub industry: String,
    pub layout:   Layout,
}

/// What the generator is asked to produce for one batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub slots: Vec<SlotAssignment>,
    /// Lets the generator pick plausible past/future dates.
    pub today: NaiveDate,
}

impl GenerationRequest {
    pub fn count(&self) -> usize {
        self.slots.len()
    }
}

// ─── FormGenerator ────────────────────────────────────────────────────────────
/// Produces raw candidate documents for a batch of slots.
///
/// Returned documents are matched to `request.slots` by position.
/// An `Err` abandons the whole batch.
///
/// `commit` is called once the batch built from the last
/// `generate` call is on disk. A source that hands out stored
/// documents releases them there, so a batch that never commits
/// leaves them to the next run.
pub trait FormGenerator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<Vec<Value>, GenerationError>;

    fn commit(&mut self) -> Result<(), PersistenceError> {
        Ok(())
    }
}

// ─── InstructionWriter ────────────────────────────────────────────────────────
/// Writes one instruction per task slot of a form.
///
/// `masks[i]` lists the fields instruction `i` must not mention.
pub trait InstructionWriter {
    fn write(&self, form: &FormDefinition, masks: &[TaskMask]) -> Result<Vec<String>, GenerationError>;
}
