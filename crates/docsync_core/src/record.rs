use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Text,
    Parameter,
}

/// One flattened unit of page content, serialized as a search backend object.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchRecord {
    pub title: String,
    pub permalink: String,
    pub section: Option<String>,
    pub content: String,
    pub breadcrumbs: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub depth: u32,
}
