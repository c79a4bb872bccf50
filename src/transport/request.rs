use serde::Serialize;

use crate::error::{Error, Result};

pub const TYPE_JSON: &str = "application/json";
pub const TYPE_FORM_URLENCODED: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// The two request/response conventions of the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// JSON/REST on the open API base URL
    Standard,
    /// Form-encoded RPC on the shared legacy router
    LegacySigned,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Standard => "standard",
            Dialect::LegacySigned => "legacy_signed",
        }
    }
}

/// Ordered query / form parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends, keeping any previous value for the key
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Replaces every previous value for the key
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        self.0.retain(|(k, _)| *k != key);
        self.0.push((key, value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

/// A single named file for a multipart upload
#[derive(Debug, Clone, Default)]
pub struct UploadFile {
    pub field_name: String,
    pub file_name: String,
    pub source: Option<Vec<u8>>,
}

impl UploadFile {
    pub fn new(field_name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self { field_name: field_name.into(), file_name: file_name.into(), source: None }
    }

    pub fn with_source(mut self, source: impl Into<Vec<u8>>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    None,
    /// Serialized JSON document
    Json(Vec<u8>),
    Upload(UploadFile),
}

/// Standard dialect call: `base_url + path ? query`, optional body
#[derive(Debug, Clone)]
pub struct StandardRequest {
    pub path: String,
    pub params: Params,
    pub body: RequestBody,
}

impl StandardRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), params: Params::new(), body: RequestBody::None }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.add(key, value.to_string());
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_vec(body).map_err(Error::Encode)?);
        Ok(self)
    }

    pub fn upload(mut self, file: UploadFile) -> Self {
        self.body = RequestBody::Upload(file);
        self
    }
}

/// LegacySigned dialect call: a method name plus form parameters
#[derive(Debug, Clone)]
pub struct LegacyRequest {
    pub method: String,
    pub params: Params,
}

impl LegacyRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self { method: method.into(), params: Params::new() }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.add(key, value.to_string());
        self
    }
}

/// Request descriptor handed to the dispatcher
#[derive(Debug, Clone)]
pub enum RpcRequest {
    Standard(StandardRequest),
    LegacySigned(LegacyRequest),
}

impl RpcRequest {
    pub fn dialect(&self) -> Dialect {
        match self {
            RpcRequest::Standard(_) => Dialect::Standard,
            RpcRequest::LegacySigned(_) => Dialect::LegacySigned,
        }
    }

    /// Path or method name, for logs
    pub fn target(&self) -> &str {
        match self {
            RpcRequest::Standard(r) => &r.path,
            RpcRequest::LegacySigned(r) => &r.method,
        }
    }
}

impl From<StandardRequest> for RpcRequest {
    fn from(value: StandardRequest) -> Self {
        RpcRequest::Standard(value)
    }
}

impl From<LegacyRequest> for RpcRequest {
    fn from(value: LegacyRequest) -> Self {
        RpcRequest::LegacySigned(value)
    }
}
