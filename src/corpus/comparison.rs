// ============================================================
// Layer 4 — Ground-Truth Comparison
// ============================================================
// Scores a filled-in submission against a form's groundTruth.
//
//   required field → 1 if the value matches, else 0
//   optional field → 1 if any value was given, else 0
//
// "Matches" depends on the field kind: dates compare by
// calendar day, multi-selects ignore order, phone/card numbers
// compare by digits, money and numbers numerically, times as
// HH:MM, and everything else as trimmed, case-insensitive text.
//
// All three scores are percentages rounded to 2 decimals. With
// no required (or optional) fields the respective score is 100.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::form::{Field, FieldKind, FormDefinition};

const NUMERIC_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldResult {
    pub field_id: String,
    pub kind:     FieldKind,
    pub required: bool,
    pub expected: Value,
    pub actual:   Value,
    pub matched:  bool,
    pub score:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub total_fields:         usize,
    pub correct_fields:       usize,
    pub incorrect_fields:     usize,
    pub missing_fields:       Vec<String>,
    pub extra_fields:         Vec<String>,
    pub required_fields:      Vec<String>,
    pub optional_fields:      Vec<String>,
    pub field_results:        Vec<FieldResult>,
    pub accuracy:             f64,
    pub required_field_score: f64,
    pub optional_field_score: f64,
}

/// Compare `submission` (field id → submitted value) with `form.ground_truth`.
pub fn compare_with_ground_truth(submission: &Map<String, Value>, form: &FormDefinition) -> ComparisonResult {
    let mut results  = Vec::with_capacity(form.ground_truth.len());
    let mut missing  = Vec::new();
    let mut required = Vec::new();
    let mut optional = Vec::new();

    for (id, expected) in &form.ground_truth {
        let field       = form.field(id);
        let kind        = field.map(|f| f.kind).unwrap_or(FieldKind::Text);
        let is_required = field.map(|f| f.required).unwrap_or(false);
        let actual      = submission.get(id).cloned().unwrap_or(Value::Null);

        let matched = if is_required {
            required.push(id.clone());
            let ok = values_match(field, kind, expected, &actual);
            if !ok && is_empty(&actual) {
                missing.push(id.clone());
            }
            ok
        } else {
            optional.push(id.clone());
            !is_empty(&actual)
        };

        results.push(FieldResult {
            field_id: id.clone(),
            kind,
            required: is_required,
            expected: expected.clone(),
            actual,
            matched,
            score:    if matched { 1.0 } else { 0.0 },
        });
    }

    let extra: Vec<String> = submission
        .keys()
        .filter(|k| !form.ground_truth.contains_key(k.as_str()))
        .cloned()
        .collect();

    let total   = results.len();
    let correct = results.iter().filter(|r| r.matched).count();
    let score_of = |want_required: bool| {
        let picked: Vec<&FieldResult> = results.iter().filter(|r| r.required == want_required).collect();
        if picked.is_empty() {
            100.0
        } else {
            percent(picked.iter().map(|r| r.score).sum(), picked.len())
        }
    };

    let result = ComparisonResult {
        total_fields:         total,
        correct_fields:       correct,
        incorrect_fields:     total - correct,
        missing_fields:       missing,
        extra_fields:         extra,
        required_fields:      required,
        optional_fields:      optional,
        accuracy:             if total == 0 { 0.0 } else { percent(correct as f64, total) },
        required_field_score: score_of(true),
        optional_field_score: score_of(false),
        field_results:        results,
    };

    tracing::debug!(
        "Compared '{}': {}/{} correct ({}%)",
        form.id,
        result.correct_fields,
        result.total_fields,
        result.accuracy,
    );
    result
}

fn percent(sum: f64, count: usize) -> f64 {
    round2(sum / count as f64 * 100.0)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// null, "", [] and {} all count as "no value".
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

// ─── Matching ─────────────────────────────────────────────────────────────────

fn values_match(field: Option<&Field>, kind: FieldKind, expected: &Value, actual: &Value) -> bool {
    if expected.is_null() {
        return is_empty(actual) || actual == &Value::Bool(false);
    }
    if is_empty(actual) {
        return false;
    }

    match (kind, expected) {
        (FieldKind::ReactiveChunks, Value::Array(want)) => chunks_match(field, want, actual),
        (_, Value::Array(want)) => lists_match(want, actual),
        (_, Value::Bool(b)) => *b == truthy(actual),
        (FieldKind::DateRange, _) => ranges_match(expected, actual),
        (FieldKind::Date, _) => match (calendar_day(expected), calendar_day(actual)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        (FieldKind::Time, _) => normalize_time(&text(expected)) == normalize_time(&text(actual)),
        (FieldKind::Phone | FieldKind::CreditCard | FieldKind::Cvv | FieldKind::Zip, _) => {
            digits(&text(expected)) == digits(&text(actual))
        }
        (FieldKind::Currency | FieldKind::Number | FieldKind::Slider | FieldKind::StarRating, _)
        | (_, Value::Number(_)) => match (number(expected), number(actual)) {
            (Some(a), Some(b)) => (a - b).abs() < NUMERIC_TOLERANCE,
            _ => false,
        },
        _ => normalize_text(&text(expected)) == normalize_text(&text(actual)),
    }
}

/// Same elements regardless of order, compared as normalized text.
fn lists_match(want: &[Value], actual: &Value) -> bool {
    let Some(got) = actual.as_array() else {
        return false;
    };
    if want.len() != got.len() {
        return false;
    }
    let mut a: Vec<String> = want.iter().map(|v| normalize_text(&text(v))).collect();
    let mut b: Vec<String> = got.iter().map(|v| normalize_text(&text(v))).collect();
    a.sort();
    b.sort();
    a == b
}

/// Entries compared in order, each sub-field by its own kind.
fn chunks_match(field: Option<&Field>, want: &[Value], actual: &Value) -> bool {
    let Some(got) = actual.as_array() else {
        return false;
    };
    if want.len() != got.len() {
        return false;
    }
    want.iter().zip(got).all(|(w, g)| match (w.as_object(), g.as_object()) {
        (Some(w), Some(g)) => w.iter().all(|(key, expected)| {
            let sub  = field.and_then(|f| f.sub_fields().iter().find(|s| &s.id == key));
            let kind = sub.map(|s| s.kind).unwrap_or(FieldKind::Text);
            let got  = g.get(key).unwrap_or(&Value::Null);
            values_match(sub, kind, expected, got)
        }),
        _ => w == g,
    })
}

fn ranges_match(expected: &Value, actual: &Value) -> bool {
    let ends = |v: &Value| {
        (
            v.get("from").and_then(calendar_day),
            v.get("to").and_then(calendar_day),
        )
    };
    ends(expected) == ends(actual)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|x| x != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(['$', ','], "").parse().ok(),
        _ => None,
    }
}

/// Calendar day of an ISO date, an ISO timestamp, or a US-style date.
fn calendar_day(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    let day = s.split('T').next().unwrap_or(s);
    ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// "2:30 PM" → "14:30", "9:05" → "09:05".
fn normalize_time(s: &str) -> String {
    let s = s.trim();
    let upper = s.to_uppercase();
    let Some((h, rest)) = s.split_once(':') else {
        return s.to_string();
    };
    let Ok(mut hours) = h.trim().parse::<u32>() else {
        return s.to_string();
    };
    let minutes: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();

    if upper.contains("PM") && hours < 12 {
        hours += 12;
    }
    if upper.contains("AM") && hours == 12 {
        hours = 0;
    }
    format!("{:02}:{:0>2}", hours, minutes)
}
