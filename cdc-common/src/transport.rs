//! Transport envelopes carrying Salesforce change notifications, as delivered by a Kinesis stream.
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::change_event::ChangeEventHeader;
use crate::error::DecodeError;

/// A batch of change notifications, in the order the transport delivered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransportBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<TransportRecord>,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransportRecord {
    pub kinesis: KinesisData,
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisData {
    /// Base64 encoded change event JSON.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

impl TransportRecord {
    /// Wrap a raw change event JSON into a transport record, encoding it the way the transport does.
    pub fn from_change_event(event: &str) -> Self {
        TransportRecord {
            kinesis: KinesisData {
                data: base64::engine::general_purpose::STANDARD.encode(event),
                partition_key: None,
                sequence_number: None,
            },
            event_id: None,
        }
    }

    /// Recover the change event text carried by this record.
    pub fn payload_text(&self) -> Result<String, DecodeError> {
        let bytes = base64::engine::general_purpose::STANDARD.decode(self.kinesis.data.trim())?;

        Ok(String::from_utf8(bytes)?)
    }

    /// Decode this record all the way down to its `ChangeEventHeader`.
    pub fn decode(&self) -> Result<ChangeEventHeader, DecodeError> {
        ChangeEventHeader::from_json(&self.payload_text()?)
    }
}
