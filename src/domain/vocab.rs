// ============================================================
// Layer 3 — Canonical Vocabularies
// ============================================================
// Fixed reference lists consulted by the validator, the
// assigners and the instruction writer. These lists are
// versioned together with the validator: changing one of them
// changes which forms are admissible.
//
//   COUNTRIES      — 16 values for `country` fields
//   US_STATES      — 50 values for `state` fields
//   HOME_ADDRESSES — 25 values for `home-address` fields
//   INDUSTRIES     — 15 labels rotated by the distribution assigner
//
// Layouts and style variants live next to their enums in
// domain::form (Layout::ALL, DateStyle::ALL, RangeStyle::ALL).

use serde::Serialize;
use std::fmt;

use crate::domain::form::FieldKind;

pub const COUNTRIES: [&str; 16] = [
    "United States", "Canada", "United Kingdom", "Australia",
    "Germany", "France", "Japan", "China",
    "India", "Brazil", "Mexico", "Spain",
    "Italy", "South Korea", "Netherlands", "Sweden",
];

pub const US_STATES: [&str; 50] = [
    "Alabama", "Alaska", "Arizona", "Arkansas", "California",
    "Colorado", "Connecticut", "Delaware", "Florida", "Georgia",
    "Hawaii", "Idaho", "Illinois", "Indiana", "Iowa",
    "Kansas", "Kentucky", "Louisiana", "Maine", "Maryland",
    "Massachusetts", "Michigan", "Minnesota", "Mississippi", "Missouri",
    "Montana", "Nebraska", "Nevada", "New Hampshire", "New Jersey",
    "New Mexico", "New York", "North Carolina", "North Dakota", "Ohio",
    "Oklahoma", "Oregon", "Pennsylvania", "Rhode Island", "South Carolina",
    "South Dakota", "Tennessee", "Texas", "Utah", "Vermont",
    "Virginia", "Washington", "West Virginia", "Wisconsin", "Wyoming",
];

pub const HOME_ADDRESSES: [&str; 25] = [
    "123 Main Street, New York, NY 10001",
    "123 Main St, Boston, MA 02101",
    "1234 Main Street, Los Angeles, CA 90001",
    "1234 Main St, Chicago, IL 60601",
    "12 Main Avenue, New York, NY 10002",
    "12 Main Ave, San Francisco, CA 94102",
    "123 Oak Street, Seattle, WA 98101",
    "123 Oak St, Portland, OR 97201",
    "1234 Oak Street, Denver, CO 80201",
    "1234 Oak Ave, Phoenix, AZ 85001",
    "456 Park Avenue, New York, NY 10022",
    "456 Park Ave, Miami, FL 33101",
    "4567 Park Avenue, Houston, TX 77001",
    "4567 Park St, Atlanta, GA 30301",
    "789 Elm Street, Philadelphia, PA 19101",
    "789 Elm St, Washington, DC 20001",
    "7890 Elm Street, Dallas, TX 75201",
    "7890 Elm Ave, San Diego, CA 92101",
    "321 Pine Street, Austin, TX 78701",
    "321 Pine St, Nashville, TN 37201",
    "3210 Pine Avenue, Las Vegas, NV 89101",
    "3210 Pine St, Minneapolis, MN 55401",
    "555 Broadway, New York, NY 10012",
    "555 Broadway St, San Antonio, TX 78201",
    "5555 Broadway Avenue, Columbus, OH 43201",
];

pub const INDUSTRIES: [&str; 15] = [
    "Healthcare",
    "Banking & Finance",
    "Insurance",
    "Education",
    "Real Estate",
    "Hospitality & Travel",
    "Retail & E-commerce",
    "Technology & SaaS",
    "Government Services",
    "Legal Services",
    "Human Resources & Recruiting",
    "Transportation & Logistics",
    "Nonprofit & Volunteering",
    "Telecommunications",
    "Events & Entertainment",
];

/// A closed list that constrains the values of one field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Vocabulary {
    Country,
    State,
    HomeAddress,
}

impl Vocabulary {
    /// The vocabulary that governs `kind`, if it is a closed kind.
    pub fn for_kind(kind: FieldKind) -> Option<Self> {
        match kind {
            FieldKind::Country     => Some(Self::Country),
            FieldKind::State       => Some(Self::State),
            FieldKind::HomeAddress => Some(Self::HomeAddress),
            _ => None,
        }
    }

    pub fn values(self) -> &'static [&'static str] {
        match self {
            Self::Country     => &COUNTRIES,
            Self::State       => &US_STATES,
            Self::HomeAddress => &HOME_ADDRESSES,
        }
    }

    /// Exact, case-sensitive membership. The rendered select boxes
    /// only ever emit the canonical spelling, so nothing else can
    /// be filled in by an agent.
    pub fn contains(self, value: &str) -> bool {
        self.values().contains(&value)
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Country     => "country",
            Self::State       => "state",
            Self::HomeAddress => "home-address",
        };
        f.write_str(name)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_list_sizes() {
        assert_eq!(COUNTRIES.len(), 16);
        assert_eq!(US_STATES.len(), 50);
        assert_eq!(HOME_ADDRESSES.len(), 25);
    }

    #[test]
    fn test_lists_have_no_duplicates() {
        for list in [&COUNTRIES[..], &US_STATES[..], &HOME_ADDRESSES[..], &INDUSTRIES[..]] {
            let unique: HashSet<_> = list.iter().collect();
            assert_eq!(unique.len(), list.len());
        }
    }

    #[test]
    fn test_membership_at_list_edges() {
        assert!(Vocabulary::Country.contains("United States"));
        assert!(Vocabulary::Country.contains("Sweden"));
        assert!(Vocabulary::State.contains("Alabama"));
        assert!(Vocabulary::State.contains("Wyoming"));
        assert!(Vocabulary::HomeAddress.contains("5555 Broadway Avenue, Columbus, OH 43201"));

        assert!(!Vocabulary::Country.contains("Norway"));
        assert!(!Vocabulary::State.contains("alabama"));
        assert!(!Vocabulary::State.contains(""));
    }

    #[test]
    fn test_only_closed_kinds_have_vocabulary() {
        assert_eq!(Vocabulary::for_kind(FieldKind::Country), Some(Vocabulary::Country));
        assert_eq!(Vocabulary::for_kind(FieldKind::HomeAddress), Some(Vocabulary::HomeAddress));
        assert_eq!(Vocabulary::for_kind(FieldKind::Address), None);
        assert_eq!(Vocabulary::for_kind(FieldKind::Select), None);
    }
}
