// ============================================================
// Layer 3 — Form Definition Domain Types
// ============================================================
// One synthetic form, as stored in the corpus JSON files:
//
//   FormDefinition
//     ├── pages: Vec<Page>
//     │     └── fields: Vec<Field>
//     │           └── chunkFields: Vec<Field>   (reactive-chunks only)
//     ├── groundTruth: { fieldId → expected value }
//     └── trainingTasks: [Task; 5]
//
// Field is a single record with kind-specific optional
// attributes. Which attributes are legal for which kind is a
// validation rule (corpus::validator), not a type-level one,
// so hand-authored forms with extra attributes still load.
//
// Serde renames follow the corpus files exactly (camelCase,
// kebab-case enum values, `type` and `inputToLLM` keys).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ─── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormType {
    SinglePage,
    Multipage,
}

impl FormType {
    pub const ALL: [FormType; 2] = [FormType::SinglePage, FormType::Multipage];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinglePage => "single-page",
            Self::Multipage  => "multipage",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    SingleColumn,
    TwoColumn,
    SplitScreen,
    WizardStyle,
    WebsiteStyle,
}

impl Layout {
    /// Rotation order used by the distribution assigner.
    pub const ALL: [Layout; 5] = [
        Layout::SingleColumn,
        Layout::TwoColumn,
        Layout::SplitScreen,
        Layout::WizardStyle,
        Layout::WebsiteStyle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleColumn => "single-column",
            Self::TwoColumn    => "two-column",
            Self::SplitScreen  => "split-screen",
            Self::WizardStyle  => "wizard-style",
            Self::WebsiteStyle => "website-style",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every input widget the form renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Textarea,
    Phone,
    Email,
    Url,
    File,
    Checkbox,
    Switch,
    Select,
    Radio,
    Multiselect,
    SearchableMultiselect,
    Date,
    Time,
    DateRange,
    Number,
    Slider,
    Color,
    Currency,
    StarRating,
    Address,
    HomeAddress,
    Country,
    State,
    Zip,
    CreditCard,
    ExpirationDate,
    Cvv,
    ReactiveChunks,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text                  => "text",
            Self::Textarea              => "textarea",
            Self::Phone                 => "phone",
            Self::Email                 => "email",
            Self::Url                   => "url",
            Self::File                  => "file",
            Self::Checkbox              => "checkbox",
            Self::Switch                => "switch",
            Self::Select                => "select",
            Self::Radio                 => "radio",
            Self::Multiselect           => "multiselect",
            Self::SearchableMultiselect => "searchable-multiselect",
            Self::Date                  => "date",
            Self::Time                  => "time",
            Self::DateRange             => "date-range",
            Self::Number                => "number",
            Self::Slider                => "slider",
            Self::Color                 => "color",
            Self::Currency              => "currency",
            Self::StarRating            => "star-rating",
            Self::Address               => "address",
            Self::HomeAddress           => "home-address",
            Self::Country               => "country",
            Self::State                 => "state",
            Self::Zip                   => "zip",
            Self::CreditCard            => "credit-card",
            Self::ExpirationDate        => "expiration-date",
            Self::Cvv                   => "cvv",
            Self::ReactiveChunks        => "reactive-chunks",
        }
    }

    /// Kinds that carry nested `chunkFields`.
    pub fn is_composite(self) -> bool {
        matches!(self, Self::ReactiveChunks)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `allowed` restriction on date fields: only past or only future dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRestriction {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateStyle {
    Default,
    IosScroll,
    TextInput,
}

impl DateStyle {
    pub const ALL: [DateStyle; 3] = [DateStyle::Default, DateStyle::IosScroll, DateStyle::TextInput];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default   => "default",
            Self::IosScroll => "ios-scroll",
            Self::TextInput => "text-input",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeStyle {
    SingleCalendar,
    DualCalendar,
}

impl RangeStyle {
    pub const ALL: [RangeStyle; 2] = [RangeStyle::SingleCalendar, RangeStyle::DualCalendar];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleCalendar => "single-calendar",
            Self::DualCalendar   => "dual-calendar",
        }
    }
}

// ─── Field / Page ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: FieldKind,

    pub label: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Number or string depending on the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stars: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<DateRestriction>,

    /// Sub-fields of a composite kind. Sub-fields never nest further.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_fields: Option<Vec<Field>>,

    /// Owned by the style assigner; stripped from generator output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<DateStyle>,

    /// Owned by the style assigner; stripped from generator output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range_style: Option<RangeStyle>,
}

#[cfg(test)]
impl Field {
    /// A bare field with no optional attributes.
    pub fn new(id: impl Into<String>, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            id:            id.into(),
            kind,
            label:         label.into(),
            required:      false,
            placeholder:   None,
            options:       None,
            min:           None,
            max:           None,
            step:          None,
            default_value: None,
            currency:      None,
            max_stars:     None,
            max_length:    None,
            accept:        None,
            allowed:       None,
            chunk_fields:  None,
            date_style:    None,
            range_style:   None,
        }
    }
}

impl Field {
    pub fn sub_fields(&self) -> &[Field] {
        self.chunk_fields.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub page_number: u32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

// ─── Website context ──────────────────────────────────────────────────────────
// Chrome rendered around a website-style form. The logo is
// always a rendered placeholder, so `logoUrl` must stay empty.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteContext {
    #[serde(default)]
    pub branding: Branding,
    #[serde(default)]
    pub navigation: Vec<NavLink>,
    #[serde(default)]
    pub footer: Footer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default)]
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub links: Vec<NavLink>,
}

// ─── Training tasks ───────────────────────────────────────────────────────────

pub const TASKS_PER_FORM: usize = 5;

/// One paraphrased filling instruction attached to a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub instruction: String,
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub masked_fields: Vec<String>,
}

impl Task {
    /// `task_1` .. `task_5`
    pub fn slot_id(slot: usize) -> String {
        format!("task_{}", slot + 1)
    }
}

/// Which fields one task slot must leave out of its instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskMask {
    pub masked: bool,
    pub masked_fields: Vec<String>,
}

impl TaskMask {
    pub fn unmasked() -> Self {
        Self::default()
    }

    pub fn omitting(fields: Vec<String>) -> Self {
        Self { masked: true, masked_fields: fields }
    }

    pub fn omits(&self, field_id: &str) -> bool {
        self.masked_fields.iter().any(|f| f == field_id)
    }
}

// ─── FormDefinition ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub form_type: FormType,

    #[serde(default)]
    pub layout: Layout,

    /// Stamped by the distribution assigner on generated forms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_context: Option<WebsiteContext>,

    #[serde(rename = "inputToLLM", default)]
    pub input_to_llm: String,

    pub pages: Vec<Page>,

    #[serde(default)]
    pub ground_truth: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training_tasks: Vec<Task>,
}

impl FormDefinition {
    /// Top-level fields of every page, pages in storage order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.pages.iter().flat_map(|p| p.fields.iter())
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields().find(|f| f.id == id)
    }

    pub fn field_count(&self) -> usize {
        self.pages.iter().map(|p| p.fields.len()).sum()
    }

    /// Page indices sorted by ascending page number.
    /// Stable, so equal numbers keep their storage order.
    pub fn page_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.pages.len()).collect();
        order.sort_by_key(|&i| self.pages[i].page_number);
        order
    }

    /// Ground-truth keys in stored order.
    pub fn ground_truth_ids(&self) -> Vec<String> {
        self.ground_truth.keys().cloned().collect()
    }
}

// ─── Form id ordering ─────────────────────────────────────────────────────────

/// Sort key giving "ascending numeric id" order.
///
/// Ids are split into a text prefix and a trailing integer, so
/// `"2" < "10"` and `"llm-form-2" < "llm-form-10"`. Ids without
/// a numeric tail sort after numbered ids sharing their prefix.
pub fn id_sort_key(id: &str) -> (String, u64, String) {
    let digits_at = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    match digits_at {
        Some(i) => {
            let number = id[i..].parse::<u64>().unwrap_or(u64::MAX);
            (id[..i].to_string(), number, id.to_string())
        }
        None => (id.to_string(), u64::MAX, id.to_string()),
    }
}

/// Trailing slot number of an id like `llm-form-12`.
pub fn id_position(id: &str) -> Option<u64> {
    let (_, number, _) = id_sort_key(id);
    (number != u64::MAX).then_some(number)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_corpus_json() {
        let raw = json!({
            "id": "7",
            "title": "Clinic Intake",
            "type": "multipage",
            "layout": "two-column",
            "inputToLLM": "I am Ana.",
            "pages": [
                { "pageNumber": 1, "fields": [
                    { "id": "name", "type": "text", "label": "Name", "required": true },
                    { "id": "visit", "type": "date-range", "label": "Stay", "rangeStyle": "dual-calendar" }
                ]}
            ],
            "groundTruth": { "name": "Ana", "visit": { "from": "2025-01-01", "to": "2025-01-03" } }
        });

        let form: FormDefinition = serde_json::from_value(raw).unwrap();
        assert_eq!(form.form_type, FormType::Multipage);
        assert_eq!(form.layout, Layout::TwoColumn);
        assert_eq!(form.input_to_llm, "I am Ana.");
        assert_eq!(form.pages[0].fields[1].kind, FieldKind::DateRange);
        assert_eq!(form.pages[0].fields[1].range_style, Some(RangeStyle::DualCalendar));
        assert!(form.training_tasks.is_empty());
    }

    #[test]
    fn test_layout_defaults_to_single_column() {
        let raw = json!({ "id": "1", "title": "t", "type": "single-page", "pages": [] });
        let form: FormDefinition = serde_json::from_value(raw).unwrap();
        assert_eq!(form.layout, Layout::SingleColumn);
    }

    #[test]
    fn test_ground_truth_keeps_key_order() {
        let raw = r#"{"id":"1","title":"t","type":"single-page","pages":[],
                      "groundTruth":{"zeta":1,"alpha":2,"mid":3}}"#;
        let form: FormDefinition = serde_json::from_str(raw).unwrap();
        assert_eq!(form.ground_truth_ids(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_serialises_input_to_llm_key() {
        let raw = json!({ "id": "1", "title": "t", "type": "single-page", "pages": [] });
        let form: FormDefinition = serde_json::from_value(raw).unwrap();
        let out = serde_json::to_value(&form).unwrap();
        assert!(out.get("inputToLLM").is_some());
        assert!(out.get("trainingTasks").is_none());
        assert!(out.get("websiteContext").is_none());
    }

    #[test]
    fn test_page_order_sorts_by_number() {
        let raw = json!({ "id": "1", "title": "t", "type": "multipage", "pages": [
            { "pageNumber": 3, "fields": [] },
            { "pageNumber": 1, "fields": [] },
            { "pageNumber": 2, "fields": [] }
        ]});
        let form: FormDefinition = serde_json::from_value(raw).unwrap();
        assert_eq!(form.page_order(), vec![1, 2, 0]);
    }

    #[test]
    fn test_id_sort_key_orders_numerically() {
        let mut ids = vec!["10", "2", "llm-form-10", "llm-form-2", "1"];
        ids.sort_by_key(|id| id_sort_key(id));
        assert_eq!(ids, vec!["1", "2", "10", "llm-form-2", "llm-form-10"]);
    }

    #[test]
    fn test_id_position() {
        assert_eq!(id_position("llm-form-12"), Some(12));
        assert_eq!(id_position("42"), Some(42));
        assert_eq!(id_position("contact"), None);
    }
}
