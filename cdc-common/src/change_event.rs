use std::fmt;
use std::str::FromStr;

use serde::{de::Visitor, Deserialize, Serialize};

use crate::error::DecodeError;

/// The nature of a change, as reported in a Salesforce `ChangeEventHeader`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    Undelete,
    GapCreate,
    GapUpdate,
    GapDelete,
    GapUndelete,
    GapOverflow,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::Delete => "DELETE",
            ChangeType::Undelete => "UNDELETE",
            ChangeType::GapCreate => "GAP_CREATE",
            ChangeType::GapUpdate => "GAP_UPDATE",
            ChangeType::GapDelete => "GAP_DELETE",
            ChangeType::GapUndelete => "GAP_UNDELETE",
            ChangeType::GapOverflow => "GAP_OVERFLOW",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseChangeTypeError(pub String);

impl fmt::Display for ParseChangeTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} is not a valid change type", self.0)
    }
}

/// Allow casting `ChangeType` from strings.
impl FromStr for ChangeType {
    type Err = ParseChangeTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(ChangeType::Create),
            "UPDATE" => Ok(ChangeType::Update),
            "DELETE" => Ok(ChangeType::Delete),
            "UNDELETE" => Ok(ChangeType::Undelete),
            "GAP_CREATE" => Ok(ChangeType::GapCreate),
            "GAP_UPDATE" => Ok(ChangeType::GapUpdate),
            "GAP_DELETE" => Ok(ChangeType::GapDelete),
            "GAP_UNDELETE" => Ok(ChangeType::GapUndelete),
            "GAP_OVERFLOW" => Ok(ChangeType::GapOverflow),
            invalid => Err(ParseChangeTypeError(invalid.to_owned())),
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct ChangeTypeVisitor;

impl<'de> Visitor<'de> for ChangeTypeVisitor {
    type Value = ChangeType;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "the string representation of ChangeType")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        ChangeType::from_str(s)
            .map_err(|_| serde::de::Error::invalid_value(serde::de::Unexpected::Str(s), &self))
    }
}

impl<'de> Deserialize<'de> for ChangeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(ChangeTypeVisitor)
    }
}

impl Serialize for ChangeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The header of a Salesforce change event: which records of which entity changed, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEventHeader {
    pub entity_name: String,
    pub change_type: ChangeType,
    /// Identifiers of the changed records, in the order Salesforce reported them. May contain duplicates.
    pub record_ids: Vec<String>,
    pub commit_timestamp: Option<i64>,
    pub transaction_key: Option<String>,
}

// The wire shapes keep every field optional so a missing one can be reported by name.
#[derive(Deserialize)]
struct RawChangeEvent {
    payload: Option<RawPayload>,
}

#[derive(Deserialize)]
struct RawPayload {
    #[serde(rename = "ChangeEventHeader")]
    change_event_header: Option<RawChangeEventHeader>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChangeEventHeader {
    entity_name: Option<String>,
    change_type: Option<ChangeType>,
    record_ids: Option<Vec<String>>,
    commit_timestamp: Option<i64>,
    transaction_key: Option<String>,
}

impl ChangeEventHeader {
    /// Parse a JSON change event and extract its `payload.ChangeEventHeader`.
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let event: RawChangeEvent = serde_json::from_str(text)?;

        let header = event
            .payload
            .ok_or(DecodeError::MissingField("payload"))?
            .change_event_header
            .ok_or(DecodeError::MissingField("payload.ChangeEventHeader"))?;

        Ok(ChangeEventHeader {
            entity_name: header
                .entity_name
                .ok_or(DecodeError::MissingField("entityName"))?,
            change_type: header
                .change_type
                .ok_or(DecodeError::MissingField("changeType"))?,
            record_ids: header
                .record_ids
                .ok_or(DecodeError::MissingField("recordIds"))?,
            commit_timestamp: header.commit_timestamp,
            transaction_key: header.transaction_key,
        })
    }
}
