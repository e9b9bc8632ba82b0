use std::collections::HashMap;

use tracing::debug;

/// Line separators as pasted from chat clients: `\n`, a bare `\r`, and the
/// Unicode line and paragraph separators. `\r\n` yields an extra blank line,
/// which is skipped.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Normalize a raw value: trim it, and treat a lone `-` as "not filled in".
pub fn clean_value(value: &str) -> &str {
    let value = value.trim();
    if value == "-" { "" } else { value }
}

/// `label -> value` pairs extracted from one submission.
///
/// Values are already cleaned. A label whose value was empty or `-` is still present
/// (with an empty value), so a later blank duplicate hides an earlier filled one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: HashMap<String, String>,
}

impl FieldMap {
    /// Split raw text into `label: value` pairs, one per line.
    ///
    /// Only lines containing a colon count. The split happens at the first colon, so
    /// values may contain colons but labels may not. Later duplicates win.
    pub fn parse(raw_text: &str) -> Self {
        let mut fields = HashMap::new();
        for raw_line in raw_text.split(LINE_BREAKS) {
            let line = raw_line.trim();
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            fields.insert(label.trim().to_string(), clean_value(value).to_string());
        }
        debug!(fields = fields.len(), "extracted labelled fields");
        Self { fields }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    /// First non-empty value among `labels`, checked in order.
    pub fn first_non_empty(&self, labels: &[&str]) -> Option<&str> {
        labels
            .iter()
            .filter_map(|label| self.get(label))
            .map(clean_value)
            .find(|value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
