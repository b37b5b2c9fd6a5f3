// ============================================================
// Layer 4 — Corpus Statistics
// ============================================================
// Counts how the corpus is spread over form types, layouts,
// field kinds and picker styles, so a run can be checked for
// balance at a glance (`form-corpus stats`).
//
// Counters are BTreeMaps keyed by the wire name so the report
// is stable from run to run. Date and date-range fields with
// no style are counted under "not-set".

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::domain::form::{DateRestriction, DateStyle, FieldKind, FormDefinition, FormType, Layout, RangeStyle};

pub const NOT_SET: &str = "not-set";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusStats {
    pub total_forms:         usize,
    pub total_pages:         usize,
    pub total_fields:        usize,
    pub required_fields:     usize,
    pub optional_fields:     usize,
    pub form_types:          BTreeMap<String, usize>,
    pub layouts:             BTreeMap<String, usize>,
    pub field_kinds:         BTreeMap<String, usize>,
    pub date_styles:         BTreeMap<String, usize>,
    pub range_styles:        BTreeMap<String, usize>,
    pub date_restrictions:   BTreeMap<String, usize>,
    pub fields_with_options: BTreeMap<String, usize>,
    pub fields_per_form:     Vec<usize>,
    pub pages_per_form:      Vec<usize>,
}

fn bump(map: &mut BTreeMap<String, usize>, key: &str) {
    *map.entry(key.to_string()).or_default() += 1;
}

impl CorpusStats {
    pub fn from_forms<'a>(forms: impl IntoIterator<Item = &'a FormDefinition>) -> Self {
        let mut stats = Self::default();
        for form in forms {
            stats.add(form);
        }
        stats
    }

    pub fn add(&mut self, form: &FormDefinition) {
        self.total_forms += 1;
        bump(&mut self.form_types, form.form_type.as_str());
        bump(&mut self.layouts, form.layout.as_str());

        self.total_pages += form.pages.len();
        self.pages_per_form.push(form.pages.len());
        self.fields_per_form.push(form.field_count());

        for field in form.fields() {
            self.total_fields += 1;
            bump(&mut self.field_kinds, field.kind.as_str());

            if field.required {
                self.required_fields += 1;
            } else {
                self.optional_fields += 1;
            }
            if field.options.as_ref().is_some_and(|o| !o.is_empty()) {
                bump(&mut self.fields_with_options, field.kind.as_str());
            }

            match field.kind {
                FieldKind::Date => {
                    bump(&mut self.date_styles, field.date_style.map(DateStyle::as_str).unwrap_or(NOT_SET));
                    if let Some(allowed) = field.allowed {
                        let name = match allowed {
                            DateRestriction::Before => "before",
                            DateRestriction::After  => "after",
                        };
                        bump(&mut self.date_restrictions, name);
                    }
                }
                FieldKind::DateRange => {
                    bump(&mut self.range_styles, field.range_style.map(RangeStyle::as_str).unwrap_or(NOT_SET));
                }
                _ => {}
            }
        }
    }

    /// Fold another partition's counts into this one.
    pub fn merge(&mut self, other: &CorpusStats) {
        self.total_forms     += other.total_forms;
        self.total_pages     += other.total_pages;
        self.total_fields    += other.total_fields;
        self.required_fields += other.required_fields;
        self.optional_fields += other.optional_fields;

        for (mine, theirs) in [
            (&mut self.form_types, &other.form_types),
            (&mut self.layouts, &other.layouts),
            (&mut self.field_kinds, &other.field_kinds),
            (&mut self.date_styles, &other.date_styles),
            (&mut self.range_styles, &other.range_styles),
            (&mut self.date_restrictions, &other.date_restrictions),
            (&mut self.fields_with_options, &other.fields_with_options),
        ] {
            for (k, v) in theirs {
                *mine.entry(k.clone()).or_default() += v;
            }
        }

        self.fields_per_form.extend(&other.fields_per_form);
        self.pages_per_form.extend(&other.pages_per_form);
    }

    pub fn avg_fields_per_form(&self) -> f64 {
        mean(&self.fields_per_form)
    }

    pub fn avg_pages_per_form(&self) -> f64 {
        mean(&self.pages_per_form)
    }

    /// Field kinds by descending count, ties by name.
    pub fn top_field_kinds(&self, n: usize) -> Vec<(&str, usize)> {
        let mut kinds: Vec<(&str, usize)> = self.field_kinds.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        kinds.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        kinds.truncate(n);
        kinds
    }

    /// Largest minus smallest count over the assigned date styles.
    pub fn date_style_spread(&self) -> usize {
        spread(DateStyle::ALL.iter().map(|s| self.count(&self.date_styles, s.as_str())))
    }

    pub fn range_style_spread(&self) -> usize {
        spread(RangeStyle::ALL.iter().map(|s| self.count(&self.range_styles, s.as_str())))
    }

    fn count(&self, map: &BTreeMap<String, usize>, key: &str) -> usize {
        map.get(key).copied().unwrap_or(0)
    }

    /// Plain-text report, one section per dimension.
    pub fn render(&self, title: &str) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);
        let _ = writeln!(out, "{}\n{}\n{}", rule, title.to_uppercase(), rule);
        let _ = writeln!(out, "Forms:  {}", self.total_forms);
        let _ = writeln!(out, "Pages:  {} (avg {:.2}/form)", self.total_pages, self.avg_pages_per_form());
        let _ = writeln!(out, "Fields: {} (avg {:.2}/form)", self.total_fields, self.avg_fields_per_form());
        let _ = writeln!(out, "Required / optional: {} / {}", self.required_fields, self.optional_fields);

        let form_types: Vec<&str> = FormType::ALL.iter().map(|t| t.as_str()).collect();
        let layouts:    Vec<&str> = Layout::ALL.iter().map(|l| l.as_str()).collect();
        let mut dates:  Vec<&str> = DateStyle::ALL.iter().map(|s| s.as_str()).collect();
        let mut ranges: Vec<&str> = RangeStyle::ALL.iter().map(|s| s.as_str()).collect();
        dates.push(NOT_SET);
        ranges.push(NOT_SET);

        section(&mut out, "Form types", &form_types, &self.form_types, self.total_forms);
        section(&mut out, "Layouts", &layouts, &self.layouts, self.total_forms);

        let kinds: Vec<&str> = self.top_field_kinds(usize::MAX).into_iter().map(|(k, _)| k).collect();
        section(&mut out, "Field kinds", &kinds, &self.field_kinds, self.total_fields);

        let date_total: usize = self.date_styles.values().sum();
        if date_total > 0 {
            section(&mut out, "Date styles", &dates, &self.date_styles, date_total);
            let _ = writeln!(out, "  spread (max - min): {}", self.date_style_spread());
        }
        let range_total: usize = self.range_styles.values().sum();
        if range_total > 0 {
            section(&mut out, "Date-range styles", &ranges, &self.range_styles, range_total);
            let _ = writeln!(out, "  spread (max - min): {}", self.range_style_spread());
        }
        if !self.date_restrictions.is_empty() {
            let keys: Vec<&str> = self.date_restrictions.keys().map(String::as_str).collect();
            let total = self.date_restrictions.values().sum();
            section(&mut out, "Date restrictions", &keys, &self.date_restrictions, total);
        }
        out
    }
}

fn section(out: &mut String, heading: &str, keys: &[&str], counts: &BTreeMap<String, usize>, total: usize) {
    let _ = writeln!(out, "\n{}:", heading);
    for key in keys {
        let n   = counts.get(*key).copied().unwrap_or(0);
        let pct = if total > 0 { n as f64 / total as f64 * 100.0 } else { 0.0 };
        let _ = writeln!(out, "  {:<24} {:>5} ({:>5.1}%)", key, n, pct);
    }
}

fn mean(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

fn spread(counts: impl Iterator<Item = usize>) -> usize {
    let counts: Vec<usize> = counts.collect();
    match (counts.iter().max(), counts.iter().min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus() -> Vec<FormDefinition> {
        let a = json!({
            "id": "1", "title": "A", "type": "single-page", "layout": "two-column",
            "pages": [{ "pageNumber": 1, "fields": [
                { "id": "d1", "type": "date", "label": "D", "required": true, "dateStyle": "ios-scroll", "allowed": "before" },
                { "id": "d2", "type": "date", "label": "D" },
                { "id": "c",  "type": "country", "label": "C", "options": ["Canada"] }
            ]}]
        });
        let b = json!({
            "id": "2", "title": "B", "type": "multipage",
            "pages": [
                { "pageNumber": 1, "fields": [
                    { "id": "r", "type": "date-range", "label": "R", "rangeStyle": "dual-calendar" }
                ]},
                { "pageNumber": 2, "fields": [
                    { "id": "t", "type": "text", "label": "T", "required": true }
                ]}
            ]
        });
        vec![serde_json::from_value(a).unwrap(), serde_json::from_value(b).unwrap()]
    }

    #[test]
    fn test_counts_by_dimension() {
        let stats = CorpusStats::from_forms(&corpus());
        assert_eq!(stats.total_forms, 2);
        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.total_fields, 5);
        assert_eq!(stats.required_fields, 2);
        assert_eq!(stats.optional_fields, 3);
        assert_eq!(stats.layouts.get("two-column"), Some(&1));
        assert_eq!(stats.layouts.get("single-column"), Some(&1));
        assert_eq!(stats.form_types.get("multipage"), Some(&1));
        assert_eq!(stats.date_styles.get("ios-scroll"), Some(&1));
        assert_eq!(stats.date_styles.get(NOT_SET), Some(&1));
        assert_eq!(stats.range_styles.get("dual-calendar"), Some(&1));
        assert_eq!(stats.date_restrictions.get("before"), Some(&1));
        assert_eq!(stats.fields_with_options.get("country"), Some(&1));
        assert_eq!(stats.fields_per_form, vec![3, 2]);
        assert_eq!(stats.avg_pages_per_form(), 1.5);
    }

    #[test]
    fn test_merge_equals_combined_count() {
        let forms = corpus();
        let mut left = CorpusStats::from_forms(&forms[..1]);
        left.merge(&CorpusStats::from_forms(&forms[1..]));
        assert_eq!(left, CorpusStats::from_forms(&forms));
    }

    #[test]
    fn test_top_field_kinds_orders_by_count() {
        let stats = CorpusStats::from_forms(&corpus());
        assert_eq!(stats.top_field_kinds(1), vec![("date", 2)]);
    }

    #[test]
    fn test_style_spread() {
        let stats = CorpusStats::from_forms(&corpus());
        // ios-scroll 1, default 0, text-input 0
        assert_eq!(stats.date_style_spread(), 1);
        assert_eq!(CorpusStats::default().range_style_spread(), 0);
    }

    #[test]
    fn test_render_mentions_every_layout() {
        let text = CorpusStats::from_forms(&corpus()).render("all forms");
        assert!(text.contains("ALL FORMS"));
        for layout in Layout::ALL {
            assert!(text.contains(layout.as_str()));
        }
        assert!(text.contains("Date restrictions"));
        assert!(text.contains("spread (max - min): 1"));
    }

    #[test]
    fn test_empty_corpus() {
        let stats = CorpusStats::from_forms(std::iter::empty());
        assert_eq!(stats.avg_fields_per_form(), 0.0);
        assert!(stats.render("none").contains("Forms:  0"));
    }
}
