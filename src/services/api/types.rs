use serde::{Deserialize, Serialize};

use super::error::ApiError;

const META_DOC_NUMBER: &str = "doc:docNumber";
const META_SECTION_ID: &str = "section:id";
const META_DOC_TITLE: &str = "doc:title";

/// Reply from `/chatbot` and `/doc_chatbot`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub think: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Registration form, sent to `/register` as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    #[serde(rename = "termsAndCondition")]
    pub terms_and_condition: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UploadReceipt {
    #[serde(rename = "requestId")]
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SavedDocument {
    pub indexid: String,
    pub username: String,
    pub filepath: String,
    #[serde(rename = "isIndexed")]
    pub is_indexed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawSearchHit {
    pub(super) doc: RawSearchDoc,
    pub(super) htm: String,
    pub(super) pdf: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawSearchDoc {
    pub(super) metadata: serde_json::Map<String, serde_json::Value>,
    pub(super) page_content: String,
}

/// One decoded search hit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResultItem {
    pub doc_id: String,
    pub section_id: Option<String>,
    pub title: String,
    pub section: String,
    pub html: String,
    pub pdf: String,
}

fn metadata_string(
    metadata: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<String> {
    match metadata.get(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl TryFrom<RawSearchHit> for SearchResultItem {
    type Error = ApiError;

    fn try_from(hit: RawSearchHit) -> Result<Self, Self::Error> {
        let metadata = &hit.doc.metadata;
        let doc_id = metadata_string(metadata, META_DOC_NUMBER)
            .ok_or_else(|| ApiError::malformed(format!("search hit missing `{META_DOC_NUMBER}`")))?;
        let title = metadata_string(metadata, META_DOC_TITLE)
            .ok_or_else(|| ApiError::malformed(format!("search hit missing `{META_DOC_TITLE}`")))?;

        Ok(Self {
            doc_id,
            section_id: metadata_string(metadata, META_SECTION_ID),
            title,
            section: hit.doc.page_content,
            html: hit.htm,
            pdf: hit.pdf,
        })
    }
}

/// Decode a `/search` body. Hits without a document number or title are
/// skipped; only a body that is not a hit list is malformed.
pub(super) fn decode_search_hits(body: &[u8]) -> Result<Vec<SearchResultItem>, ApiError> {
    let raw: Vec<RawSearchHit> = serde_json::from_slice(body)?;
    let items = raw
        .into_iter()
        .filter_map(|hit| match SearchResultItem::try_from(hit) {
            Ok(item) => Some(item),
            Err(err) => {
                log::warn!("Skipping search hit: {}", err.message());
                None
            }
        })
        .collect();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_reply_think_is_optional() {
        let reply: ChatReply = serde_json::from_str(r#"{"answer":"Hi!"}"#).unwrap();
        assert_eq!(reply.answer, "Hi!");
        assert!(reply.think.is_none());

        let reply: ChatReply =
            serde_json::from_str(r#"{"answer":"Yes","think":"because"}"#).unwrap();
        assert_eq!(reply.think.as_deref(), Some("because"));
    }

    #[test]
    fn test_chat_reply_without_answer_is_rejected() {
        assert!(serde_json::from_str::<ChatReply>(r#"{"think":"x"}"#).is_err());
    }

    #[test]
    fn test_decode_search_hits() {
        let body = serde_json::json!([
            {
                "doc": {
                    "metadata": {
                        "doc:docNumber": 42,
                        "section:id": "s-3",
                        "doc:title": "Tenancy Act"
                    },
                    "page_content": "A landlord shall..."
                },
                "htm": "/docs/42.htm",
                "pdf": "/docs/42.pdf"
            }
        ]);
        let hits = decode_search_hits(body.to_string().as_bytes()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "42");
        assert_eq!(hits[0].section_id.as_deref(), Some("s-3"));
        assert_eq!(hits[0].title, "Tenancy Act");
        assert_eq!(hits[0].pdf, "/docs/42.pdf");
    }

    #[test]
    fn test_decode_search_hits_skips_incomplete_hits() {
        let body = serde_json::json!([
            {
                "doc": { "metadata": { "doc:docNumber": "7" }, "page_content": "" },
                "htm": "",
                "pdf": ""
            },
            {
                "doc": {
                    "metadata": { "doc:docNumber": "8", "doc:title": "Wills Act" },
                    "page_content": "A will shall..."
                },
                "htm": "/docs/8.htm",
                "pdf": "/docs/8.pdf"
            }
        ]);
        let hits = decode_search_hits(body.to_string().as_bytes()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "8");
        assert!(hits[0].section_id.is_none());
    }

    #[test]
    fn test_decode_search_hits_non_list_is_malformed() {
        let err = decode_search_hits(br#"{"detail":"oops"}"#).unwrap_err();
        assert!(matches!(err, ApiError::MalformedResponse { .. }));
    }

    #[test]
    fn test_signup_form_uses_wire_keys() {
        let form = SignupForm {
            username: "jdoe".to_string(),
            confirm_password: "secret123".to_string(),
            terms_and_condition: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["confirmPassword"], "secret123");
        assert_eq!(value["termsAndCondition"], true);
        assert_eq!(value["username"], "jdoe");
    }

    #[test]
    fn test_saved_document_wire_keys() {
        let doc: SavedDocument = serde_json::from_str(
            r#"{"indexid":"ix1","username":"jdoe","filepath":"lease.pdf","isIndexed":true}"#,
        )
        .unwrap();
        assert!(doc.is_indexed);
        assert_eq!(doc.filepath, "lease.pdf");
    }
}
