// ============================================================
// Layer 4 — Template Instruction Writer
// ============================================================
// Offline InstructionWriter: composes the five first-person
// instructions of a form from its groundTruth, one clause per
// field, skipping whatever the task's mask omits.
//
// Each task slot uses its own phrasing so the five instructions
// are not verbatim copies:
//
//   slot 0: "I'm filling out the X. My name is Ana. ..."
//   slot 1: "I need to complete the X. For name, use Ana. ..."
//   ...
//
// Values are copied verbatim from groundTruth so every
// unmasked value can be found in the text by the validator.
// On a masked task, any part that would still reveal a masked
// value (the title, another field's label or value) is dropped.

use serde_json::Value;

use crate::corpus::validator::mentioned_in;
use crate::domain::error::GenerationError;
use crate::domain::form::{Field, FieldKind, FormDefinition, TaskMask};
use crate::domain::traits::InstructionWriter;

const OPENERS: [&str; 5] = [
    "I'm filling out the {title}.",
    "I need to complete the {title}.",
    "Here are my details for the {title}.",
    "I'd like to submit the {title}.",
    "Please help me fill in the {title}.",
];

const CLAUSES: [&str; 5] = [
    "My {label} is {value}.",
    "For {label}, use {value}.",
    "{label}: {value}.",
    "Put {value} as my {label}.",
    "The {label} should be {value}.",
];

#[derive(Debug, Clone, Default)]
pub struct TemplateInstructionWriter;

impl TemplateInstructionWriter {
    pub fn new() -> Self {
        Self
    }

    fn compose(&self, form: &FormDefinition, slot: usize, mask: &TaskMask) -> String {
        let variant = slot % OPENERS.len();

        // Values this task must not reveal, wherever else they show up.
        let hidden: Vec<&Value> = mask
            .masked_fields
            .iter()
            .filter_map(|id| form.ground_truth.get(id))
            .collect();
        let reveals = |text: &str| {
            let lower = text.to_lowercase();
            hidden.iter().any(|v| mentioned_in(&lower, v).is_some())
        };

        let mut parts = Vec::new();
        let titled = OPENERS[variant].replace("{title}", form.title.trim());
        let plain  = OPENERS[variant].replace("{title}", "form");
        if let Some(opener) = [titled, plain].into_iter().find(|o| !reveals(o.as_str())) {
            parts.push(opener);
        }

        for (id, value) in &form.ground_truth {
            if mask.omits(id) {
                continue;
            }
            let field = form.field(id);
            let Some(text) = render_value(field, value) else {
                continue;
            };
            let label = field
                .map(|f| f.label.trim().to_string())
                .unwrap_or_else(|| id.clone());
            let label = if variant == 2 { label } else { label.to_lowercase() };

            let clause = CLAUSES[variant]
                .replace("{label}", &label)
                .replace("{value}", &text);
            if reveals(clause.as_str()) {
                continue;
            }
            parts.push(clause);
        }

        parts.join(" ")
    }
}

impl InstructionWriter for TemplateInstructionWriter {
    fn write(&self, form: &FormDefinition, masks: &[TaskMask]) -> Result<Vec<String>, GenerationError> {
        Ok(masks
            .iter()
            .enumerate()
            .map(|(slot, mask)| self.compose(form, slot, mask))
            .collect())
    }
}

/// Natural-language rendering of one ground-truth value.
/// `None` for values with nothing to say (null, "", []).
fn render_value(field: Option<&Field>, value: &Value) -> Option<String> {
    let kind = field.map(|f| f.kind);
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "yes" } else { "no" }.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) if kind == Some(FieldKind::ReactiveChunks) => {
            let entries: Vec<String> = items
                .iter()
                .enumerate()
                .filter_map(|(n, entry)| render_entry(field, entry).map(|e| format!("entry {} has {}", n + 1, e)))
                .collect();
            (!entries.is_empty()).then(|| entries.join("; "))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(|v| render_value(None, v)).collect();
            Some(join_list(&parts))
        }
        Value::Object(map) => match (map.get("from"), map.get("to")) {
            (Some(from), Some(to)) => Some(format!(
                "from {} to {}",
                render_value(None, from).unwrap_or_default(),
                render_value(None, to).unwrap_or_default(),
            )),
            _ => {
                let parts: Vec<String> = map
                    .iter()
                    .filter_map(|(k, v)| render_value(None, v).map(|t| format!("{} {}", k, t)))
                    .collect();
                (!parts.is_empty()).then(|| parts.join(", "))
            }
        },
    }
}

/// One reactive-chunks entry, labelled by its sub-fields.
fn render_entry(field: Option<&Field>, entry: &Value) -> Option<String> {
    let map = entry.as_object()?;
    let parts: Vec<String> = map
        .iter()
        .filter_map(|(k, v)| {
            let sub   = field.and_then(|f| f.sub_fields().iter().find(|s| &s.id == k));
            let label = sub.map(|s| s.label.to_lowercase()).unwrap_or_else(|| k.clone());
            render_value(sub, v).map(|t| format!("{} {}", label, t))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn join_list(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
