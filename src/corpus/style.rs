// ============================================================
// Layer 4 — Style Assigner
// ============================================================
// Stamps a presentation style onto every date and date-range
// field, round-robin over the whole run:
//
//   date field       → DateStyle::ALL[date  % 3], date  += 1
//   date-range field → RangeStyle::ALL[range % 2], range += 1
//
// Traversal order: forms in generation order, pages by
// ascending pageNumber, fields in declaration order. Only
// top-level fields are styled; chunk sub-fields render with
// the default picker.
//
// The counters are the only state. They are persisted with the
// corpus (infra::run_state) so a resumed run continues the same
// rotation, and the counts of each variant never differ by more
// than one across everything the assigner has touched.

use serde::{Deserialize, Serialize};

use crate::domain::form::{DateStyle, FieldKind, FormDefinition, RangeStyle};

/// Position of the rotation for both field families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleCounters {
    pub date_counter:  u64,
    pub range_counter: u64,
}

impl StyleCounters {
    /// Rebuild counters from an already-styled partition by counting
    /// the fields the assigner would have visited.
    pub fn from_forms<'a>(forms: impl IntoIterator<Item = &'a FormDefinition>) -> Self {
        let mut counters = Self::default();
        for form in forms {
            for field in form.fields() {
                match field.kind {
                    FieldKind::Date      => counters.date_counter  += 1,
                    FieldKind::DateRange => counters.range_counter += 1,
                    _ => {}
                }
            }
        }
        counters
    }
}

/// Owns the counters for one generation run.
#[derive(Debug, Clone)]
pub struct StyleAssigner {
    counters: StyleCounters,
}

impl StyleAssigner {
    pub fn new(counters: StyleCounters) -> Self {
        Self { counters }
    }

    pub fn counters(&self) -> StyleCounters {
        self.counters
    }

    /// Overwrite the style of every date / date-range field of `form`.
    /// Returns the number of fields styled.
    pub fn assign(&mut self, form: &mut FormDefinition) -> usize {
        let mut styled = 0;

        for page_idx in form.page_order() {
            for field in form.pages[page_idx].fields.iter_mut() {
                match field.kind {
                    FieldKind::Date => {
                        field.date_style  = Some(self.next_date_style());
                        field.range_style = None;
                        styled += 1;
                    }
                    FieldKind::DateRange => {
                        field.range_style = Some(self.next_range_style());
                        field.date_style  = None;
                        styled += 1;
                    }
                    _ => {
                        field.date_style  = None;
                        field.range_style = None;
                    }
                }
            }
        }

        tracing::debug!(
            "Styled {} field(s) on '{}' (date={}, range={})",
            styled,
            form.id,
            self.counters.date_counter,
            self.counters.range_counter,
        );
        styled
    }

    fn next_date_style(&mut self) -> DateStyle {
        let n     = DateStyle::ALL.len() as u64;
        let style = DateStyle::ALL[(self.counters.date_counter % n) as usize];
        self.counters.date_counter += 1;
        style
    }

    fn next_range_style(&mut self) -> RangeStyle {
        let n     = RangeStyle::ALL.len() as u64;
        let style = RangeStyle::ALL[(self.counters.range_counter % n) as usize];
        self.counters.range_counter += 1;
        style
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::{Field, FormType, Layout, Page};
    use serde_json::Map;
    use std::collections::HashMap;

    /// A form whose pages hold the given kinds, page numbers as given.
    fn form(id: &str, pages: Vec<(u32, Vec<FieldKind>)>) -> FormDefinition {
        let pages = pages
            .into_iter()
            .map(|(number, kinds)| Page {
                page_number: number,
                fields: kinds
                    .into_iter()
                    .enumerate()
                    .map(|(i, k)| Field::new(format!("p{}f{}", number, i), k, "Label"))
                    .collect(),
            })
            .collect();

        FormDefinition {
            id:              id.to_string(),
            title:           "t".into(),
            description:     String::new(),
            form_type:       FormType::Multipage,
            layout:          Layout::SingleColumn,
            industry:        None,
            website_context: None,
            input_to_llm:    String::new(),
            pages,
            ground_truth:    Map::new(),
            training_tasks:  Vec::new(),
        }
    }

    fn date_styles(forms: &[FormDefinition]) -> Vec<DateStyle> {
        forms
            .iter()
            .flat_map(|f| f.page_order().into_iter().flat_map(move |p| f.pages[p].fields.iter()))
            .filter_map(|f| f.date_style)
            .collect()
    }

    #[test]
    fn test_rotation_spans_forms() {
        use FieldKind::*;
        let mut forms = vec![
            form("a", vec![(1, vec![Date, Text, Date])]),
            form("b", vec![(1, vec![Date, DateRange]), (2, vec![DateRange, Date])]),
        ];
        let mut assigner = StyleAssigner::new(StyleCounters::default());
        for f in forms.iter_mut() {
            assigner.assign(f);
        }

        assert_eq!(
            date_styles(&forms),
            vec![DateStyle::Default, DateStyle::IosScroll, DateStyle::TextInput, DateStyle::Default]
        );
        assert_eq!(forms[1].pages[0].fields[1].range_style, Some(RangeStyle::SingleCalendar));
        assert_eq!(forms[1].pages[1].fields[0].range_style, Some(RangeStyle::DualCalendar));
        assert_eq!(assigner.counters(), StyleCounters { date_counter: 4, range_counter: 2 });
    }

    #[test]
    fn test_pages_visited_by_page_number() {
        use FieldKind::*;
        let mut f = form("a", vec![(2, vec![Date]), (1, vec![Date])]);
        StyleAssigner::new(StyleCounters::default()).assign(&mut f);
        // page 1 (stored second) is visited first
        assert_eq!(f.pages[1].fields[0].date_style, Some(DateStyle::Default));
        assert_eq!(f.pages[0].fields[0].date_style, Some(DateStyle::IosScroll));
    }

    #[test]
    fn test_same_start_reproduces_assignment() {
        use FieldKind::*;
        let template = vec![
            form("a", vec![(1, vec![Date, DateRange, Date])]),
            form("b", vec![(1, vec![DateRange, Date, Text, Date])]),
        ];
        let start = StyleCounters { date_counter: 7, range_counter: 3 };

        let run = |mut forms: Vec<FormDefinition>| {
            let mut assigner = StyleAssigner::new(start);
            forms.iter_mut().for_each(|f| { assigner.assign(f); });
            forms
        };

        assert_eq!(run(template.clone()), run(template));
    }

    #[test]
    fn test_population_balance_with_uneven_forms() {
        use FieldKind::*;
        let shapes: Vec<Vec<FieldKind>> = vec![
            vec![Date],
            vec![Date, Date, Date, Date, DateRange],
            vec![Text],
            vec![Date, DateRange, DateRange, Date],
            vec![Date, Date],
            vec![DateRange, Date, Date, Date, Date, Date, DateRange],
        ];
        let mut assigner = StyleAssigner::new(StyleCounters::default());
        let mut date_counts:  HashMap<DateStyle, usize>  = HashMap::new();
        let mut range_counts: HashMap<RangeStyle, usize> = HashMap::new();

        for (i, kinds) in shapes.iter().enumerate() {
            let mut f = form(&i.to_string(), vec![(1, kinds.clone())]);
            assigner.assign(&mut f);
            for field in f.fields() {
                if let Some(s) = field.date_style  { *date_counts.entry(s).or_default()  += 1; }
                if let Some(s) = field.range_style { *range_counts.entry(s).or_default() += 1; }
            }
        }

        let d: Vec<usize> = DateStyle::ALL.iter().map(|s| date_counts.get(s).copied().unwrap_or(0)).collect();
        let r: Vec<usize> = RangeStyle::ALL.iter().map(|s| range_counts.get(s).copied().unwrap_or(0)).collect();
        assert!(d.iter().max().unwrap() - d.iter().min().unwrap() <= 1);
        assert!(r.iter().max().unwrap() - r.iter().min().unwrap() <= 1);
    }

    #[test]
    fn test_counters_rebuilt_from_forms() {
        use FieldKind::*;
        let forms = vec![
            form("a", vec![(1, vec![Date, DateRange])]),
            form("b", vec![(1, vec![Date, Text, Date])]),
        ];
        assert_eq!(
            StyleCounters::from_forms(&forms),
            StyleCounters { date_counter: 3, range_counter: 1 }
        );
    }
}
