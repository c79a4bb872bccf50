//! Response contract shared by both dialects.
//!
//! Every payload handed to the dispatcher embeds one of the two envelopes
//! (`#[serde(flatten)]`) and implements [`ResponseContract`] by pointing at it.
//! The dispatcher calls [`ResponseContract::check_error`] exactly once per
//! call, which turns a non-zero envelope into `Error::Remote`.

use std::io::Write;

use serde::Deserialize;

use crate::error::{Error, RemoteError, Result};

/// Error indicator carried inside a decoded payload
pub trait Envelope {
    fn check(&self) -> Result<()>;
}

/// Standard dialect envelope: `{errcode, errmsg}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OapiEnvelope {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
}

impl Envelope for OapiEnvelope {
    fn check(&self) -> Result<()> {
        if self.errcode != 0 {
            return Err(Error::Remote(RemoteError::Standard {
                code: self.errcode,
                message: self.errmsg.clone(),
            }));
        }
        Ok(())
    }
}

/// LegacySigned dialect envelope: `{error_response: {sub_msg, code, sub_code, msg}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaobaoEnvelope {
    #[serde(default)]
    pub error_response: TaobaoErrorResponse,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaobaoErrorResponse {
    #[serde(default)]
    pub sub_msg: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub sub_code: String,
    #[serde(default)]
    pub msg: String,
}

impl Envelope for TaobaoEnvelope {
    fn check(&self) -> Result<()> {
        let e = &self.error_response;
        if e.code != 0 {
            return Err(Error::Remote(RemoteError::Legacy {
                code: e.code,
                msg: e.msg.clone(),
                sub_code: e.sub_code.clone(),
                sub_msg: e.sub_msg.clone(),
            }));
        }
        Ok(())
    }
}

/// Destination of one dispatched call
pub trait ResponseContract {
    fn envelope(&self) -> &dyn Envelope;

    fn check_error(&self) -> Result<()> {
        self.envelope().check()
    }

    /// Receives the raw body of non-JSON responses (file downloads)
    fn response_sink(&mut self) -> Option<&mut (dyn Write + Send)> {
        None
    }
}

impl ResponseContract for OapiEnvelope {
    fn envelope(&self) -> &dyn Envelope {
        self
    }
}

impl ResponseContract for TaobaoEnvelope {
    fn envelope(&self) -> &dyn Envelope {
        self
    }
}

/// Raw file content, or the Standard error envelope when the platform answers with JSON
#[derive(Debug, Default, Deserialize)]
pub struct MediaDownload {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl ResponseContract for MediaDownload {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }

    fn response_sink(&mut self) -> Option<&mut (dyn Write + Send)> {
        Some(&mut self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct ChatCreated {
        #[serde(flatten)]
        envelope: OapiEnvelope,
        #[serde(default)]
        chatid: String,
    }

    impl ResponseContract for ChatCreated {
        fn envelope(&self) -> &dyn Envelope {
            &self.envelope
        }
    }

    #[test]
    fn composed_payload_reports_standard_error() {
        let ok: ChatCreated = serde_json::from_value(json!({"errcode": 0, "errmsg": "ok", "chatid": "c1"})).unwrap();
        assert!(ok.check_error().is_ok());
        assert_eq!(ok.chatid, "c1");

        let failed: ChatCreated = serde_json::from_value(json!({"errcode": 60011, "errmsg": "no permission"})).unwrap();
        match failed.check_error() {
            Err(Error::Remote(RemoteError::Standard { code, message })) => {
                assert_eq!(code, 60011);
                assert_eq!(message, "no permission");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn legacy_envelope_reads_nested_error_object() {
        let env: TaobaoEnvelope = serde_json::from_value(json!({
            "error_response": {"code": 15, "msg": "Remote service error", "sub_code": "isv.x", "sub_msg": "boom"}
        }))
        .unwrap();
        assert_eq!(
            env.check_error().unwrap_err().to_string(),
            "remote error: code: 15, msg: Remote service error, sub_code: isv.x, sub_msg: boom"
        );

        let ok: TaobaoEnvelope = serde_json::from_value(json!({"result": "[]"})).unwrap();
        assert!(ok.check_error().is_ok());
    }

    #[test]
    fn only_downloads_expose_a_sink() {
        let mut env = OapiEnvelope::default();
        assert!(env.response_sink().is_none());

        let mut download = MediaDownload::default();
        download.response_sink().unwrap().write_all(b"abc").unwrap();
        assert_eq!(download.content, b"abc");
    }
}
