// ============================================================
// Layer 4 — Schema Validator
// ============================================================
// Admission gate for every form entering the corpus.
//
//   raw JSON
//       │
//       ▼
//   strip_style_hints   → drop generator-supplied dateStyle/rangeStyle
//       │
//       ▼
//   serde decode        → FormDefinition (or one Shape violation)
//       │
//       ▼
//   check               → every broken invariant, not just the first
//
// A single violation rejects the whole form; there is no
// partial repair. Unmasked instructions that forget a value are
// reported as warnings and do not block admission.
//
// Two modes:
//   intake — fresh generator output, trainingTasks may be absent
//   strict — finished corpus entries, exactly 5 tasks required

use serde_json::Value;
use std::collections::HashSet;

use crate::domain::error::{Invariant, SchemaViolation, Violation};
use crate::domain::form::{Field, FormDefinition, Layout, TASKS_PER_FORM};
use crate::domain::vocab::Vocabulary;

/// Shortest value text that counts as "mentioned" in an instruction.
/// Shorter values ("1", "no") appear inside unrelated words.
const MIN_MENTION_LEN: usize = 3;

/// A form that passed validation, plus non-blocking findings.
#[derive(Debug, Clone)]
pub struct Validated {
    pub form:     FormDefinition,
    pub warnings: Vec<Violation>,
}

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    require_tasks: bool,
}

impl Validator {
    /// For generator output: tasks are stamped by a later pass.
    pub fn intake() -> Self {
        Self { require_tasks: false }
    }

    /// For corpus entries that must be complete.
    pub fn strict() -> Self {
        Self { require_tasks: true }
    }

    /// Normalise and validate one raw candidate document.
    pub fn validate(&self, mut raw: Value) -> Result<Validated, SchemaViolation> {
        let form_id = raw
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();

        let stripped = strip_style_hints(&mut raw);
        if stripped > 0 {
            tracing::debug!("Stripped {} style hint(s) from '{}'", stripped, form_id);
        }

        let form: FormDefinition = serde_json::from_value(raw).map_err(|e| SchemaViolation {
            form_id: form_id.clone(),
            violations: vec![Violation::form(Invariant::Shape, e.to_string())],
        })?;

        let (violations, warnings) = self.check(&form);
        if violations.is_empty() {
            Ok(Validated { form, warnings })
        } else {
            Err(SchemaViolation { form_id: form.id, violations })
        }
    }

    /// Check an already-decoded form. Returns (violations, warnings).
    pub fn check(&self, form: &FormDefinition) -> (Vec<Violation>, Vec<Violation>) {
        let mut violations = Vec::new();
        let mut warnings   = Vec::new();

        check_pages(form, &mut violations);
        check_field_ids(form, &mut violations);
        check_composition(form, &mut violations);
        check_vocabularies(form, &mut violations);
        check_ground_truth_keys(form, &mut violations);
        check_website_context(form, &mut violations);
        self.check_tasks(form, &mut violations, &mut warnings);

        (violations, warnings)
    }

    fn check_tasks(&self, form: &FormDefinition, out: &mut Vec<Violation>, warnings: &mut Vec<Violation>) {
        let tasks = &form.training_tasks;
        if tasks.is_empty() && !self.require_tasks {
            return;
        }
        if tasks.len() != TASKS_PER_FORM {
            out.push(Violation::form(
                Invariant::TaskCount,
                format!("expected {} training tasks, found {}", TASKS_PER_FORM, tasks.len()),
            ));
        }

        for task in tasks {
            let instruction = task.instruction.to_lowercase();

            if !task.masked {
                if !task.masked_fields.is_empty() {
                    out.push(Violation::form(
                        Invariant::TaskMasking,
                        format!("unmasked task '{}' lists masked fields", task.id),
                    ));
                }
                for (id, value) in &form.ground_truth {
                    if !value_mentions(value).is_empty() && mentioned_in(&instruction, value).is_none() {
                        warnings.push(Violation::field(
                            id.clone(),
                            Invariant::TaskMasking,
                            format!("unmasked task '{}' does not mention this value", task.id),
                        ));
                    }
                }
                continue;
            }

            if task.masked_fields.is_empty() {
                out.push(Violation::form(
                    Invariant::TaskMasking,
                    format!("masked task '{}' has no masked fields", task.id),
                ));
            }
            for id in &task.masked_fields {
                let Some(value) = form.ground_truth.get(id) else {
                    out.push(Violation::field(
                        id.clone(),
                        Invariant::TaskMasking,
                        format!("task '{}' masks a field that is not in groundTruth", task.id),
                    ));
                    continue;
                };
                if let Some(leak) = mentioned_in(&instruction, value) {
                    out.push(Violation::field(
                        id.clone(),
                        Invariant::TaskMasking,
                        format!("task '{}' mentions masked value '{}'", task.id, leak),
                    ));
                }
            }
        }
    }
}

// ─── Normalisation ────────────────────────────────────────────────────────────

/// Remove `dateStyle` / `rangeStyle` from every field and sub-field.
/// Returns how many attributes were removed.
pub fn strip_style_hints(raw: &mut Value) -> usize {
    let Some(pages) = raw.get_mut("pages").and_then(Value::as_array_mut) else {
        return 0;
    };
    pages
        .iter_mut()
        .filter_map(|page| page.get_mut("fields").and_then(Value::as_array_mut))
        .map(|fields| fields.iter_mut().map(strip_field).sum::<usize>())
        .sum()
}

fn strip_field(field: &mut Value) -> usize {
    let Some(obj) = field.as_object_mut() else {
        return 0;
    };
    let mut removed = 0;
    for key in ["dateStyle", "rangeStyle"] {
        if obj.remove(key).is_some() {
            removed += 1;
        }
    }
    if let Some(subs) = obj.get_mut("chunkFields").and_then(Value::as_array_mut) {
        removed += subs.iter_mut().map(strip_field).sum::<usize>();
    }
    removed
}

// ─── Structural checks ────────────────────────────────────────────────────────

fn check_pages(form: &FormDefinition, out: &mut Vec<Violation>) {
    let mut previous = 0u32;
    for page in &form.pages {
        if page.page_number == 0 {
            out.push(Violation::form(Invariant::PageOrder, "page numbers start at 1"));
        } else if page.page_number <= previous {
            out.push(Violation::form(
                Invariant::PageOrder,
                format!("page {} follows page {}", page.page_number, previous),
            ));
        }
        previous = previous.max(page.page_number);
    }
}

fn check_field_ids(form: &FormDefinition, out: &mut Vec<Violation>) {
    let mut seen = HashSet::new();
    for field in form.fields() {
        if !seen.insert(field.id.as_str()) {
            out.push(Violation::field(&field.id, Invariant::UniqueFieldIds, "duplicate field id"));
        }

        let mut sub_seen = HashSet::new();
        for sub in field.sub_fields() {
            if !sub_seen.insert(sub.id.as_str()) {
                out.push(Violation::field(
                    &field.id,
                    Invariant::UniqueFieldIds,
                    format!("duplicate sub-field id '{}'", sub.id),
                ));
            }
        }
    }
}

fn check_composition(form: &FormDefinition, out: &mut Vec<Violation>) {
    for field in form.fields() {
        match (field.kind.is_composite(), &field.chunk_fields) {
            (true, None) => out.push(Violation::field(
                &field.id,
                Invariant::Composition,
                "composite field has no chunkFields",
            )),
            (true, Some(subs)) if subs.is_empty() => out.push(Violation::field(
                &field.id,
                Invariant::Composition,
                "composite field has no chunkFields",
            )),
            (false, Some(_)) => out.push(Violation::field(
                &field.id,
                Invariant::Composition,
                format!("'{}' fields cannot carry chunkFields", field.kind),
            )),
            _ => {}
        }

        for sub in field.sub_fields() {
            if sub.kind.is_composite() || sub.chunk_fields.is_some() {
                out.push(Violation::field(
                    &field.id,
                    Invariant::Composition,
                    format!("sub-field '{}' cannot be composite", sub.id),
                ));
            }
        }
    }
}

fn check_ground_truth_keys(form: &FormDefinition, out: &mut Vec<Violation>) {
    let field_ids: HashSet<&str> = form.fields().map(|f| f.id.as_str()).collect();

    for field in form.fields() {
        if !form.ground_truth.contains_key(&field.id) {
            out.push(Violation::field(
                &field.id,
                Invariant::GroundTruthBijection,
                "missing from groundTruth",
            ));
        }
    }
    for key in form.ground_truth.keys() {
        if !field_ids.contains(key.as_str()) {
            out.push(Violation::field(
                key,
                Invariant::GroundTruthBijection,
                "groundTruth key has no matching field",
            ));
        }
    }
}

fn check_website_context(form: &FormDefinition, out: &mut Vec<Violation>) {
    match (form.layout, &form.website_context) {
        (Layout::WebsiteStyle, None) => out.push(Violation::form(
            Invariant::WebsiteContext,
            "website-style layout requires websiteContext",
        )),
        (Layout::WebsiteStyle, Some(ctx)) if ctx.branding.logo_url.is_some() => out.push(Violation::form(
            Invariant::WebsiteContext,
            "websiteContext.branding.logoUrl must be absent",
        )),
        (layout, Some(_)) if layout != Layout::WebsiteStyle => out.push(Violation::form(
            Invariant::WebsiteContext,
            format!("{} layout must not carry websiteContext", layout),
        )),
        _ => {}
    }
}

// ─── Closed vocabularies ──────────────────────────────────────────────────────

fn check_vocabularies(form: &FormDefinition, out: &mut Vec<Violation>) {
    for field in form.fields() {
        check_field_attributes(field, &field.id, out);
        for sub in field.sub_fields() {
            check_field_attributes(sub, &field.id, out);
        }

        let Some(value) = form.ground_truth.get(&field.id) else {
            continue;
        };

        if let Some(vocab) = Vocabulary::for_kind(field.kind) {
            check_value(vocab, value, &field.id, "groundTruth", out);
        }

        if field.kind.is_composite() {
            check_chunk_entries(field, value, out);
        }
    }
}

/// `options` and `defaultValue` of a closed-kind field.
fn check_field_attributes(field: &Field, owner_id: &str, out: &mut Vec<Violation>) {
    let Some(vocab) = Vocabulary::for_kind(field.kind) else {
        return;
    };
    let place = if field.id == owner_id {
        String::new()
    } else {
        format!("sub-field '{}' ", field.id)
    };

    for option in field.options.iter().flatten() {
        if !vocab.contains(option) {
            out.push(Violation::field(
                owner_id,
                Invariant::ClosedVocabulary,
                format!("{}option '{}' is not a canonical {}", place, option, vocab),
            ));
        }
    }
    if let Some(default) = &field.default_value {
        check_value(vocab, default, owner_id, &format!("{}defaultValue", place), out);
    }
}

/// Composite ground truth is a list of entries keyed by sub-field id.
fn check_chunk_entries(field: &Field, value: &Value, out: &mut Vec<Violation>) {
    let Some(entries) = value.as_array() else {
        if !value.is_null() {
            out.push(Violation::field(
                &field.id,
                Invariant::Composition,
                "groundTruth for a composite field must be a list of entries",
            ));
        }
        return;
    };

    for (n, entry) in entries.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            out.push(Violation::field(
                &field.id,
                Invariant::Composition,
                format!("entry {} is not an object", n + 1),
            ));
            continue;
        };
        for sub in field.sub_fields() {
            if let (Some(vocab), Some(v)) = (Vocabulary::for_kind(sub.kind), entry.get(&sub.id)) {
                let place = format!("entry {} sub-field '{}'", n + 1, sub.id);
                check_value(vocab, v, &field.id, &place, out);
            }
        }
    }
}

/// Scalar values must be canonical; lists are checked element-wise.
/// Null and "" mean "no value" and are accepted.
fn check_value(vocab: Vocabulary, value: &Value, field_id: &str, place: &str, out: &mut Vec<Violation>) {
    match value {
        Value::Null => {}
        Value::String(s) if s.is_empty() => {}
        Value::String(s) => {
            if !vocab.contains(s) {
                out.push(Violation::field(
                    field_id,
                    Invariant::ClosedVocabulary,
                    format!("{} '{}' is not a canonical {}", place, s, vocab),
                ));
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(s) if vocab.contains(s) => {}
                    other => out.push(Violation::field(
                        field_id,
                        Invariant::ClosedVocabulary,
                        format!("{} element {} is not a canonical {}", place, other, vocab),
                    )),
                }
            }
        }
        other => out.push(Violation::field(
            field_id,
            Invariant::ClosedVocabulary,
            format!("{} {} is not a canonical {}", place, other, vocab),
        )),
    }
}

// ─── Instruction mentions ─────────────────────────────────────────────────────

/// Lower-cased text fragments that would reveal `value` if they
/// appeared in an instruction.
pub fn value_mentions(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_mentions(value, &mut out);
    out
}

/// First fragment of `value` that appears in `text` as a whole
/// word. `text` must already be lower-cased.
pub fn mentioned_in(text: &str, value: &Value) -> Option<String> {
    value_mentions(value).into_iter().find(|m| contains_word(text, m))
}

/// `needle` occurs in `text` with no letter or digit on either side.
fn contains_word(text: &str, needle: &str) -> bool {
    text.match_indices(needle).any(|(at, _)| {
        let before = text[..at].chars().next_back();
        let after  = text[at + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn collect_mentions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.chars().count() >= MIN_MENTION_LEN {
                out.push(s.to_lowercase());
            }
        }
        Value::Number(n) => {
            let s = n.to_string();
            if s.len() >= MIN_MENTION_LEN {
                out.push(s);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_mentions(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_mentions(v, out)),
        Value::Bool(_) | Value::Null => {}
    }
}
