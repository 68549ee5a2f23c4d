//! Record types returned by the ITDB2 API.
//!
//! The API serves loosely-schemaed rows; only the fields the pipeline keys
//! on are named, everything else passes through untouched via
//! `#[serde(flatten)]` so exported sheets keep every column the API sent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope wrapping every JSON endpoint: `{"result": [...]}`.
///
/// A missing `result` key deserializes as an empty list.
#[derive(Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

/// One row of the government-wide agency tiles endpoint.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Agency {
    /// Agency identity key (e.g. "007").
    pub agency_code: String,

    /// Human-readable agency name.
    pub agency_name: String,

    /// All remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One row of an agency's investments table.
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    /// Owning agency code.
    pub agency_code: String,

    /// Unique Investment Identifier, the key for the business-case PDF.
    #[serde(rename = "UII")]
    pub uii: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_case_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_projects: Option<Value>,

    /// All remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Investment {
    /// Whether this investment qualifies for PDF enrichment.
    ///
    /// Both `businessCaseId` and `numberOfProjects` must be truthy; zero
    /// projects deliberately counts as "no business case to scrape".
    pub fn has_business_case(&self) -> bool {
        is_truthy(self.business_case_id.as_ref()) && is_truthy(self.number_of_projects.as_ref())
    }

    /// Merges extracted PDF fields into the record in place.
    pub fn merge_fields(&mut self, fields: impl IntoIterator<Item = (String, String)>) {
        for (name, value) in fields {
            self.extra.insert(name, Value::String(value));
        }
    }
}

/// Python-style truthiness for a loosely-typed JSON field.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn investment(business_case_id: Value, number_of_projects: Value) -> Investment {
        serde_json::from_value(json!({
            "agencyCode": "007",
            "UII": "007-000000001",
            "businessCaseId": business_case_id,
            "numberOfProjects": number_of_projects,
        }))
        .unwrap()
    }

    #[test]
    fn enrichment_requires_both_fields_truthy() {
        assert!(investment(json!(123), json!(4)).has_business_case());
        assert!(!investment(json!(null), json!(4)).has_business_case());
        assert!(!investment(json!(123), json!(0)).has_business_case());
        assert!(!investment(json!(123), json!(null)).has_business_case());
        assert!(!investment(json!(""), json!(4)).has_business_case());
    }

    #[test]
    fn merge_fields_lands_in_extra() {
        let mut inv = investment(json!(123), json!(4));
        inv.merge_fields([("PDF Investment".to_string(), "Foo".to_string())]);
        assert_eq!(inv.extra["PDF Investment"], json!("Foo"));
    }
}
