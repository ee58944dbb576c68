//! STH response envelope
//!
//! Shape of `GET /STH/v1/contextEntities/...`:
//!
//! ```text
//! { "contextResponses": [ { "contextElement": { "attributes": [ { "values": [
//!     { "attrValue": "12.5", "recvTime": "2024-01-01T10:00:00.000Z" }, ...
//! ] } ] } } ] }
//! ```
//!
//! Every level is optional in the types so that a missing key is reported as
//! [`SthError::MissingKey`] instead of a generic decode failure.

use serde::{Deserialize, Serialize};

use super::client::SthError;

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(rename = "contextResponses")]
    pub context_responses: Option<Vec<ContextResponse>>,
}

#[derive(Debug, Deserialize)]
pub struct ContextResponse {
    #[serde(rename = "contextElement")]
    pub context_element: Option<ContextElement>,
}

#[derive(Debug, Deserialize)]
pub struct ContextElement {
    pub attributes: Option<Vec<Attribute>>,
}

#[derive(Debug, Deserialize)]
pub struct Attribute {
    pub values: Option<Vec<AttrValue>>,
}

/// One historical attribute value as stored by STH
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrValue {
    /// STH stores values as strings; numbers are accepted too
    #[serde(rename = "attrValue")]
    pub attr_value: serde_json::Value,

    #[serde(rename = "recvTime")]
    pub recv_time: String,
}

impl AttrValue {
    pub fn new(attr_value: impl Into<serde_json::Value>, recv_time: impl Into<String>) -> Self {
        Self {
            attr_value: attr_value.into(),
            recv_time: recv_time.into(),
        }
    }

    /// Numeric reading, if the value is a number or a numeric string
    pub fn value(&self) -> Option<f64> {
        match &self.attr_value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl HistoryResponse {
    /// Walk `contextResponses[0].contextElement.attributes[0].values`
    pub fn into_values(self) -> Result<Vec<AttrValue>, SthError> {
        let response = self
            .context_responses
            .ok_or(SthError::MissingKey("contextResponses"))?
            .into_iter()
            .next()
            .ok_or(SthError::MissingKey("contextResponses[0]"))?;

        let attribute = response
            .context_element
            .ok_or(SthError::MissingKey("contextElement"))?
            .attributes
            .ok_or(SthError::MissingKey("attributes"))?
            .into_iter()
            .next()
            .ok_or(SthError::MissingKey("attributes[0]"))?;

        attribute.values.ok_or(SthError::MissingKey("values"))
    }
}
