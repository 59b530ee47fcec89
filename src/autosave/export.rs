//! Draft export/import file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{AutoSaveError, FormState, Result};

/// Version written into exported files. Imports accept any `1.x`.
pub const EXPORT_VERSION: &str = "1.0";

const APPLICATION: &str = "dfd-api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub form_data: FormState,
    pub export_info: ExportInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportInfo {
    pub application: String,
    pub export_id: Uuid,
    /// Number of non-empty text fields, nested alternatives included.
    pub field_count: usize,
}

impl ExportDocument {
    pub fn new(form: FormState) -> Self {
        let field_count = count_filled(&form);
        Self {
            version: EXPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            form_data: form,
            export_info: ExportInfo {
                application: APPLICATION.to_string(),
                export_id: Uuid::new_v4(),
                field_count,
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an exported file, rejecting unknown major versions.
    pub fn from_json(content: &str) -> Result<Self> {
        let document: ExportDocument = serde_json::from_str(content)?;
        let major = document.version.split('.').next().unwrap_or_default();
        if major != "1" {
            return Err(AutoSaveError::Format(format!(
                "unsupported export version '{}'",
                document.version
            )));
        }
        Ok(document)
    }
}

fn count_filled(form: &FormState) -> usize {
    form.values().map(count_value).sum()
}

fn count_value(value: &Value) -> usize {
    match value {
        Value::String(s) if !s.trim().is_empty() => 1,
        Value::Object(map) => count_filled(map),
        Value::Array(items) => items.iter().map(count_value).sum(),
        _ => 0,
    }
}
