use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /api/ask`. Field names follow the browser client's wire format.
#[derive(Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AskRequest {
    #[serde(rename = "formText", default, deserialize_with = "null_as_empty")]
    pub form_text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
}

/// `null` reads as an empty field, so it fails as missing input rather than
/// as a malformed body.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl AskRequest {
    /// Both the document and the question must carry something besides whitespace.
    pub fn is_complete(&self) -> bool {
        !self.form_text.trim().is_empty() && !self.question.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let req: AskRequest =
            serde_json::from_str(r#"{"formText":"doc","question":"q?"}"#).unwrap();
        assert_eq!(req.form_text, "doc");
        assert_eq!(req.question, "q?");
        assert!(req.is_complete());
    }

    #[test]
    fn test_missing_fields_are_incomplete() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"q?"}"#).unwrap();
        assert!(!req.is_complete());

        let req: AskRequest = serde_json::from_str(r#"{"formText":"doc","question":"  "}"#).unwrap();
        assert!(!req.is_complete());
    }

    #[test]
    fn test_null_fields_are_incomplete() {
        let req: AskRequest =
            serde_json::from_str(r#"{"formText":null,"question":"q?"}"#).unwrap();
        assert_eq!(req.form_text, "");
        assert!(!req.is_complete());

        let req: AskRequest =
            serde_json::from_str(r#"{"formText":"doc","question":null}"#).unwrap();
        assert!(!req.is_complete());
    }
}
