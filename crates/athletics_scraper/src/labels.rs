//! Label-anchored field recovery for cards that render every field as one run
//! of text, e.g. `Jersey Number 23Jane DoePosition OF Academic Year So.`.
//!
//! A field's value is whatever follows its label up to the first of the labels
//! that may follow it. Rules are data: if the site reorders its fields only the
//! tables below change.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonField {
    JerseyNumber,
    Position,
    Year,
    Height,
    Hometown,
    HighSchool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Text,
    /// Leading ASCII digits only; the card name follows the number unlabelled.
    Digits,
}

#[derive(Debug)]
pub struct LabelRule {
    pub field: PersonField,
    /// Alternative spellings of the label, tried in order.
    pub labels: &'static [&'static str],
    /// Labels that may follow this field, any of which ends the capture.
    pub until: &'static [&'static str],
    pub capture: Capture,
}

/// Person card rules, in the order the card emits them.
pub const PERSON_CARD_RULES: &[LabelRule] = &[
    LabelRule {
        field: PersonField::JerseyNumber,
        labels: &["Jersey Number"],
        until: &["Position", "Academic Year", "Height", "Weight", "Hometown", "Last School", "High School", "Previous School"],
        capture: Capture::Digits,
    },
    LabelRule {
        field: PersonField::Position,
        labels: &["Position"],
        until: &["Academic Year", "Height", "Weight", "Hometown", "Last School", "High School", "Previous School"],
        capture: Capture::Text,
    },
    LabelRule {
        field: PersonField::Year,
        labels: &["Academic Year"],
        until: &["Height", "Weight", "Hometown", "Last School", "High School", "Previous School"],
        capture: Capture::Text,
    },
    LabelRule {
        field: PersonField::Height,
        labels: &["Height"],
        until: &["Weight", "Hometown", "Last School", "High School", "Previous School"],
        capture: Capture::Text,
    },
    LabelRule {
        field: PersonField::Hometown,
        labels: &["Hometown"],
        until: &["Last School", "High School", "Previous School"],
        capture: Capture::Text,
    },
    LabelRule {
        field: PersonField::HighSchool,
        labels: &["Last School", "High School", "Previous School"],
        until: &[],
        capture: Capture::Text,
    },
];

/// Link and button captions that close a card after its last field. They end
/// every capture, so the final field never swallows them.
pub const CARD_TRAILERS: &[&str] = &["Full Bio", "View Bio", "Bio Page"];

/// Applies `rules` to `text`. Fields whose label is missing, or whose capture
/// is empty, are left out of the map.
pub fn extract_labeled(text: &str, rules: &[LabelRule]) -> HashMap<PersonField, String> {
    let mut out = HashMap::new();

    for rule in rules {
        if let Some(value) = capture_after_label(text, rule) {
            out.insert(rule.field, value);
        }
    }

    out
}

fn capture_after_label(text: &str, rule: &LabelRule) -> Option<String> {
    let (pos, label) = rule
        .labels
        .iter()
        .find_map(|label| text.find(label).map(|pos| (pos, *label)))?;

    let rest = &text[pos + label.len()..];
    let end = rule
        .until
        .iter()
        .chain(CARD_TRAILERS)
        .filter_map(|next| rest.find(next))
        .min()
        .unwrap_or(rest.len());

    let raw = rest[..end].trim();
    let value = match rule.capture {
        Capture::Text => raw.to_string(),
        Capture::Digits => raw.chars().take_while(|c| c.is_ascii_digit()).collect(),
    };

    (!value.is_empty()).then_some(value)
}

/// Collapses every whitespace run to one space and trims the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
