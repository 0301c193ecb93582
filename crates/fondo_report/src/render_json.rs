//! JSON renderer for the report model. Section order follows the struct layout:
//! cover → weights → allocation → band → totals → warnings → integrity.

use crate::structure::ReportModel;
use crate::ReportError;

/// Pretty JSON, trailing newline.
pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    let mut s = serde_json::to_string_pretty(model).map_err(|_| ReportError::Template("json_serialize"))?;
    s.push('\n');
    Ok(s)
}

/// Same content as a `serde_json::Value`, for callers that write canonical JSON.
pub fn render_value(model: &ReportModel) -> Result<serde_json::Value, ReportError> {
    serde_json::to_value(model).map_err(|_| ReportError::Template("json_serialize"))
}
