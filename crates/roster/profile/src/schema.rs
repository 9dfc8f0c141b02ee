use crate::resolver::Resolution;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Submission schema: required field names plus fields discarded after
/// parsing.
///
/// The line grammar is `Key: Value`, one pair per line. Blank lines and
/// lines without a colon are skipped, keys are trimmed and case-folded,
/// values are trimmed, and a repeated key overwrites the earlier value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileSchema {
    pub required: Vec<String>,
    pub filter: Vec<String>,
}

impl ProfileSchema {
    pub fn new(required: &[&str], filter: &[&str]) -> Self {
        Self {
            required: required.iter().map(|f| f.to_string()).collect(),
            filter: filter.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Parse raw submission text into a candidate record.
    ///
    /// Always succeeds; missing required fields are reported on the
    /// candidate rather than as an error, since an incomplete submission is
    /// an expected classification outcome.
    pub fn parse(&self, text: &str) -> Candidate {
        let mut fields = BTreeMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            fields.insert(key, value.trim().to_string());
        }
        for field in &self.filter {
            fields.remove(field);
        }
        let missing = self
            .required
            .iter()
            .filter(|f| fields.get(*f).map_or(true, String::is_empty))
            .cloned()
            .collect();
        Candidate {
            fields,
            missing,
            resolution: None,
        }
    }
}

/// A parsed candidate profile: field values, the required fields it lacks,
/// and the identity-resolution result once attached.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub fields: BTreeMap<String, String>,
    pub missing: Vec<String>,
    pub resolution: Option<Resolution>,
}

impl Candidate {
    /// Value of a parsed field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The submitted player handle, if present.
    pub fn ign(&self) -> Option<&str> {
        self.get("ign")
    }

    /// Complete iff every required field is present and non-empty and the
    /// identity resolution succeeded.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.resolution.as_ref().is_some_and(|r| r.valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn schema() -> ProfileSchema {
        ProfileSchema::new(&["ign", "age"], &[])
    }

    #[test]
    fn parses_key_value_lines() {
        let candidate = schema().parse("IGN: Steve\nAge: 20");
        assert_eq!(candidate.get("ign"), Some("Steve"));
        assert_eq!(candidate.get("age"), Some("20"));
        assert!(candidate.missing.is_empty());
    }

    #[test]
    fn skips_blank_and_colonless_lines() {
        let candidate = schema().parse("hello there\n\nIGN: Steve\n   \nAge: 20\nrandom chatter");
        assert_eq!(candidate.fields.len(), 2);
        assert!(candidate.missing.is_empty());
    }

    #[test]
    fn keys_are_case_folded_and_trimmed() {
        let candidate = schema().parse("  iGn  :  Steve  ");
        assert_eq!(candidate.get("ign"), Some("Steve"));
    }

    #[test]
    fn value_keeps_text_after_first_colon() {
        let candidate = schema().parse("ign: Steve: the second");
        assert_eq!(candidate.get("ign"), Some("Steve: the second"));
    }

    #[test]
    fn repeated_key_overwrites() {
        let candidate = schema().parse("ign: Steve\nign: Alex");
        assert_eq!(candidate.get("ign"), Some("Alex"));
    }

    #[test]
    fn missing_and_empty_required_fields_are_reported() {
        let candidate = schema().parse("ign:\nother: x");
        assert_eq!(candidate.missing, vec!["ign".to_string(), "age".to_string()]);
        assert!(!candidate.is_complete());
    }

    #[test]
    fn filter_fields_are_discarded() {
        let schema = ProfileSchema::new(&["ign"], &["discord"]);
        let candidate = schema.parse("ign: Steve\ndiscord: steve#0001");
        assert_eq!(candidate.get("discord"), None);
    }

    #[test]
    fn completeness_requires_valid_resolution() {
        let mut candidate = schema().parse("ign: Steve\nage: 20");
        assert!(!candidate.is_complete());

        candidate.resolution = Some(Resolution::invalid());
        assert!(!candidate.is_complete());

        candidate.resolution = Some(Resolution::valid(Uuid::nil(), "Steve"));
        assert!(candidate.is_complete());
    }
}
