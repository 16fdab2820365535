//! Wire envelope shared by both directions of the channel.
//!
//! Every frame is a JSON object `{ "type": ..., "data": ... }`. Replies also
//! carry `result` (`SUCCESS` / `ERROR`) and, on failure, an `error` reason.
//! Decoding is deliberately two-phase: the envelope is parsed first, and the
//! `data` payload is only decoded once the `type` is known, so an unknown
//! type never fails the whole frame.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::record::Record;

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// Message types of the gateway protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // client -> server
    LoginRequest,
    LogOut,
    LoginRequiredQuestion,
    GetServerFilter,
    SetServerFilter,
    UploadRecords,
    // server -> client
    LoginResponse,
    LoginRequiredResponse,
    ServerFilter,
    Records,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::LoginRequest => "LOGIN_REQUEST",
            MessageType::LogOut => "LOG_OUT",
            MessageType::LoginRequiredQuestion => "LOGIN_REQUIRED_QUESTION",
            MessageType::GetServerFilter => "GET_SERVER_FILTER",
            MessageType::SetServerFilter => "SET_SERVER_FILTER",
            MessageType::UploadRecords => "UPLOAD_RECORDS",
            MessageType::LoginResponse => "LOGIN_RESPONSE",
            MessageType::LoginRequiredResponse => "LOGIN_REQUIRED_RESPONSE",
            MessageType::ServerFilter => "SERVER_FILTER",
            MessageType::Records => "RECORDS",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "LOGIN_REQUEST" => MessageType::LoginRequest,
            "LOG_OUT" => MessageType::LogOut,
            "LOGIN_REQUIRED_QUESTION" => MessageType::LoginRequiredQuestion,
            "GET_SERVER_FILTER" => MessageType::GetServerFilter,
            "SET_SERVER_FILTER" => MessageType::SetServerFilter,
            "UPLOAD_RECORDS" => MessageType::UploadRecords,
            "LOGIN_RESPONSE" => MessageType::LoginResponse,
            "LOGIN_REQUIRED_RESPONSE" => MessageType::LoginRequiredResponse,
            "SERVER_FILTER" => MessageType::ServerFilter,
            "RECORDS" => MessageType::Records,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome flag carried by replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    Error,
}

/// A single wire frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// Create an envelope without a result flag.
    pub fn new(kind: MessageType, data: Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            result: None,
            error: None,
            data,
        }
    }

    /// Create a successful reply.
    pub fn success<T: Serialize>(kind: MessageType, data: &T) -> Result<Self, GatewayError> {
        Ok(Self {
            result: Some(ResultCode::Success),
            ..Self::new(kind, serde_json::to_value(data)?)
        })
    }

    /// Create a failed reply.
    pub fn failure(kind: MessageType, reason: impl Into<String>) -> Self {
        Self {
            result: Some(ResultCode::Error),
            error: Some(reason.into()),
            ..Self::new(kind, Value::Null)
        }
    }

    /// The `RECORDS` broadcast frame.
    pub fn records(records: Vec<Record>) -> Self {
        let data = Value::Array(records.into_iter().map(Record::into_inner).collect());
        Self::new(MessageType::Records, data)
    }

    /// Parse a frame received from a client.
    pub fn from_json(text: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(text).map_err(|e| GatewayError::MalformedEnvelope(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Known message type, if any.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::from_tag(&self.kind)
    }

    pub fn is_success(&self) -> bool {
        self.result == Some(ResultCode::Success)
    }

    /// Decode the `data` payload into a typed value.
    pub fn decode_data<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.data.clone()).map_err(|e| GatewayError::InvalidPayload {
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }
}

/// `LOGIN_RESPONSE` payload on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponseData {
    pub login: String,
    #[serde(rename = "bufferedRecords")]
    pub buffered_records: Vec<Record>,
}

/// `LOGIN_REQUIRED_RESPONSE` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequiredData {
    #[serde(rename = "fLoginRequired")]
    pub login_required: bool,
}

/// `SERVER_FILTER` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFilterData {
    pub filter: String,
}
