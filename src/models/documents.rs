use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single e-CF document as listed by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentItem {
    pub file_name: String,
    pub ncf: String,
    pub document_type: String,
    pub internal_track_id: String,
    pub status: String,
    #[serde(default)]
    pub dgii_response: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub security_code: String,
    pub created_at: i64,
    pub update_at: i64,
    pub signed_xml: String,
    pub customer_id: String,
    #[serde(rename = "qr_url")]
    pub qr_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_signed_xml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_approval_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_approval_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commercial_approval_received_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub total_items: u64,
    pub items_per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

/// One page of the gateway's document listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    #[serde(default)]
    pub items: Vec<DocumentItem>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Filter parameters for the document listing.
#[derive(Debug, Clone, Default)]
pub struct DocumentsParams {
    pub document_type: Option<String>,
    pub status: Option<String>,
    pub internal_track_id: Option<String>,
    pub from_date: Option<i64>,
    pub to_date: Option<i64>,
    pub limit: Option<u64>,
    pub next_token: Option<String>,
    pub show_data: Option<bool>,
    pub ecf: Option<String>,
}

impl DocumentsParams {
    /// Render as a query string, skipping unset filters.
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());

        if let Some(v) = &self.document_type {
            serializer.append_pair("documentType", v);
        }
        if let Some(v) = &self.status {
            serializer.append_pair("status", v);
        }
        if let Some(v) = &self.internal_track_id {
            serializer.append_pair("internalTrackId", v);
        }
        if let Some(v) = self.from_date {
            serializer.append_pair("fromDate", &v.to_string());
        }
        if let Some(v) = self.to_date {
            serializer.append_pair("toDate", &v.to_string());
        }
        if let Some(v) = self.limit {
            serializer.append_pair("limit", &v.to_string());
        }
        if let Some(v) = &self.next_token {
            serializer.append_pair("nextToken", v);
        }
        if let Some(v) = self.show_data {
            serializer.append_pair("showData", if v { "true" } else { "false" });
        }
        if let Some(v) = &self.ecf {
            serializer.append_pair("ecf", v);
        }

        serializer.finish()
    }
}
