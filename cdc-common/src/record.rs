use serde::Serialize;
use serde_json::{Map, Value};

use crate::change_event::ChangeType;

/// Name of the field carrying the change type on every record written to the output stream.
pub const CHANGE_TYPE_FIELD: &str = "UIND";

/// A record as returned by a Salesforce query: field names mapped to values, in the order
/// Salesforce returned them.
pub type SourceRecord = Map<String, Value>;

/// A source record tagged with the change type of the notification that triggered its fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    fields: SourceRecord,
    #[serde(rename = "UIND")]
    change_type: ChangeType,
}

impl EnrichedRecord {
    /// Any `UIND` field already present on the source record is replaced, so the output carries exactly one.
    /// `UIND` always comes last; the other fields keep their order.
    pub fn new(mut fields: SourceRecord, change_type: ChangeType) -> Self {
        fields.shift_remove(CHANGE_TYPE_FIELD);

        Self {
            fields,
            change_type,
        }
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn fields(&self) -> &SourceRecord {
        &self.fields
    }

    /// The Salesforce record Id, if the query selected it.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("Id").and_then(Value::as_str)
    }

    /// UTF-8 JSON bytes, as written to the output stream.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
