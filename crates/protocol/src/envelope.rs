use serde::{Deserialize, Serialize};

use crate::functions::FunctionName;

/// Error details in a function-call reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallError {
    pub code: i32,
    pub message: String,
}

/// Envelope for every entry-point call and reply.
///
/// The `payload` field uses `serde_json::value::RawValue` so the
/// dispatcher can route on `function` without deserializing the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub function: FunctionName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Box<serde_json::value::RawValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CallError>,
}

impl Message {
    /// Creates a new message with the given function and payload.
    pub fn new<T: Serialize>(
        id: impl Into<String>,
        function: FunctionName,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = match payload {
            Some(p) => {
                let json = serde_json::to_string(p)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            id: id.into(),
            function,
            payload: raw,
            error: None,
        })
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.payload {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Creates an error message.
    pub fn error(id: impl Into<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            function: FunctionName::Error,
            payload: None,
            error: Some(CallError {
                code,
                message: message.into(),
            }),
        }
    }

    /// Creates a reply to this call, preserving its id.
    pub fn reply<T: Serialize>(
        &self,
        function: FunctionName,
        payload: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        Message::new(&self.id, function, payload)
    }

    /// Creates an error reply to this call.
    pub fn reply_error(&self, code: i32, message: impl Into<String>) -> Self {
        Message::error(&self.id, code, message)
    }
}
