/// Required fields, in the order they are reported.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "question"];

/// A validated form submission. Every field has non-whitespace content and is
/// kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub question: String,
}

/// Validation failure listing every offending field in [`REQUIRED_FIELDS`] order
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing or empty fields: {}", .missing.join(", "))]
pub struct InvalidSubmission {
    pub missing: Vec<&'static str>,
}

impl Submission {
    /// Build a submission from a decoded JSON object.
    ///
    /// A field is rejected when it is absent, not a string, or blank after trimming.
    pub fn from_json(
        body: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, InvalidSubmission> {
        let mut missing = Vec::new();
        let mut take = |field: &'static str| {
            let value = body
                .get(field)
                .and_then(|v| v.as_str())
                .filter(|v| !v.trim().is_empty());
            if value.is_none() {
                missing.push(field);
            }
            value.unwrap_or_default().to_string()
        };

        let [name, email, question] = REQUIRED_FIELDS.map(&mut take);

        if !missing.is_empty() {
            return Err(InvalidSubmission { missing });
        }

        Ok(Self {
            name,
            email,
            question,
        })
    }

    /// Look up a field value by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "question" => Some(&self.question),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<Submission, InvalidSubmission> {
        Submission::from_json(value.as_object().unwrap())
    }

    #[test]
    fn test_valid_submission() {
        let submission = parse(json!({
            "name": "Jo",
            "email": "jo@x.com",
            "question": "Help?"
        }))
        .unwrap();

        assert_eq!(submission.name, "Jo");
        assert_eq!(submission.email, "jo@x.com");
        assert_eq!(submission.question, "Help?");
    }

    #[test]
    fn test_values_are_kept_untrimmed() {
        let question = "    fn main() {\n        run();\n    }\n";
        let submission = parse(json!({
            "name": "  Jo ",
            "email": "jo@x.com\n",
            "question": question
        }))
        .unwrap();

        assert_eq!(submission.name, "  Jo ");
        assert_eq!(submission.email, "jo@x.com\n");
        assert_eq!(submission.question, question);
    }

    #[test]
    fn test_empty_name_is_reported() {
        let err = parse(json!({"name": "", "email": "jo@x.com", "question": "Help?"})).unwrap_err();
        assert_eq!(err.missing, vec!["name"]);
        assert_eq!(err.to_string(), "Missing or empty fields: name");
    }

    #[test]
    fn test_all_offending_fields_in_required_order() {
        let err = parse(json!({"question": "   ", "name": null})).unwrap_err();
        assert_eq!(err.missing, vec!["name", "email", "question"]);
        assert_eq!(
            err.to_string(),
            "Missing or empty fields: name, email, question"
        );
    }

    #[test]
    fn test_non_string_values_are_rejected() {
        let err = parse(json!({"name": 42, "email": ["jo@x.com"], "question": "Help?"}))
            .unwrap_err();
        assert_eq!(err.missing, vec!["name", "email"]);
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let submission = parse(json!({
            "name": "Jo",
            "email": "jo@x.com",
            "question": "Help?",
            "phone": "+15550100"
        }))
        .unwrap();
        assert_eq!(submission.field("phone"), None);
        assert_eq!(submission.field("email"), Some("jo@x.com"));
    }
}
