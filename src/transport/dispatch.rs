//! One outbound call per [`RpcRequest`]: encode, send, classify, decode, check.

use std::io::Write;

use http::header::CONTENT_TYPE;
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::{Error, Result};
use crate::helpers::time::{get_instant, legacy_timestamp};
use crate::observability::metrics::get_metrics;
use crate::transport::request::{LegacyRequest, RequestBody, RpcRequest, StandardRequest, TYPE_FORM_URLENCODED, TYPE_JSON};
use crate::transport::response::ResponseContract;

pub const LEGACY_PARTNER_ID: &str = "apidoc";
pub const LEGACY_API_VERSION: &str = "2.0";
/// Content type of every uploaded file part
pub const UPLOAD_MIME: &str = "application/octet-stream";

/// How a successful response body is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Stream,
}

impl BodyKind {
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type.starts_with(TYPE_JSON) {
            true => BodyKind::Json,
            false => BodyKind::Stream,
        }
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    /// Sends one request and decodes the answer into `response`.
    ///
    /// Every call that reaches a 200 response ends with exactly one
    /// `response.check_error()`, whatever the dialect or body kind.
    pub async fn dispatch<R>(&self, request: impl Into<RpcRequest>, response: &mut R) -> Result<()>
    where
        R: ResponseContract + DeserializeOwned,
    {
        let request = request.into();
        let dialect = request.dialect();
        let target = request.target().to_owned();
        let metrics = get_metrics().await;
        let start = get_instant();

        metrics.dispatch_requests.with_label_values(&[dialect.as_str()]).inc();
        let result = self.execute(request, response).await;
        metrics
            .dispatch_duration
            .with_label_values(&[dialect.as_str()])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(()) => debug!("{} call '{}' succeeded", dialect.as_str(), target),
            Err(err) => {
                metrics.dispatch_failures.with_label_values(&[dialect.as_str(), err.reason()]).inc();
                warn!("{} call '{}' failed: {}", dialect.as_str(), target, err);
            }
        }
        result
    }

    async fn execute<R>(&self, request: RpcRequest, response: &mut R) -> Result<()>
    where
        R: ResponseContract + DeserializeOwned,
    {
        let builder = match request {
            RpcRequest::Standard(req) => self.build_standard(req).await?,
            RpcRequest::LegacySigned(req) => self.build_legacy(req).await,
        };

        let mut http_response = builder.send().await?;
        let status = http_response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpStatus(status));
        }

        let content_type = http_response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        debug!("response content type: {}", content_type);

        match BodyKind::from_content_type(&content_type) {
            BodyKind::Json => {
                let body = http_response.bytes().await?;
                *response = serde_json::from_slice(&body).map_err(Error::Decode)?;
            }
            BodyKind::Stream => copy_to_sink(&mut http_response, response).await?,
        }

        response.check_error()
    }

    async fn build_standard(&self, req: StandardRequest) -> Result<RequestBuilder> {
        let StandardRequest { path, mut params, body } = req;

        let token = self.current_token().await;
        if !token.is_empty() && params.get("access_token").is_none() {
            params.set("access_token", token);
        }
        let url = join_url(&self.config().base_url, &path);

        let builder = match body {
            RequestBody::Upload(file) => {
                let source = file.source.ok_or(Error::EmptyUpload)?;
                let part = Part::bytes(source).file_name(file.file_name).mime_str(UPLOAD_MIME)?;
                let form = Form::new().part(file.field_name, part);
                self.http().post(url).query(params.pairs()).multipart(form)
            }
            RequestBody::Json(bytes) => self
                .http()
                .post(url)
                .query(params.pairs())
                .header(CONTENT_TYPE, TYPE_JSON)
                .body(bytes),
            RequestBody::None => self.http().get(url).query(params.pairs()),
        };
        Ok(builder)
    }

    async fn build_legacy(&self, req: LegacyRequest) -> RequestBuilder {
        let LegacyRequest { method, mut params } = req;

        params.set("format", "json");
        params.set("method", method);
        params.set("partner_id", LEGACY_PARTNER_ID);
        params.set("session", self.current_token().await);
        params.set("timestamp", legacy_timestamp());
        params.set("v", LEGACY_API_VERSION);
        params.set("simplify", "true");

        self.http()
            .post(&self.config().legacy_url)
            .header(CONTENT_TYPE, TYPE_FORM_URLENCODED)
            .form(params.pairs())
    }
}

async fn copy_to_sink<R: ResponseContract>(http_response: &mut Response, response: &mut R) -> Result<()> {
    let Some(sink) = response.response_sink() else {
        debug!("response has no byte sink, discarding non-JSON body");
        return Ok(());
    };

    let mut copied = 0usize;
    while let Some(chunk) = http_response.chunk().await? {
        sink.write_all(&chunk).map_err(|source| Error::Storage { name: "response_sink".to_owned(), source })?;
        copied += chunk.len();
    }
    sink.flush().map_err(|source| Error::Storage { name: "response_sink".to_owned(), source })?;
    debug!("copied {} bytes into response sink", copied);
    Ok(())
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_prefix_selects_json_decoding() {
        assert_eq!(BodyKind::from_content_type("application/json"), BodyKind::Json);
        assert_eq!(BodyKind::from_content_type("application/json;charset=UTF-8"), BodyKind::Json);
        assert_eq!(BodyKind::from_content_type("image/png"), BodyKind::Stream);
        assert_eq!(BodyKind::from_content_type(""), BodyKind::Stream);
    }

    #[test]
    fn urls_join_with_single_slash() {
        assert_eq!(join_url("https://oapi.dingtalk.com/", "gettoken"), "https://oapi.dingtalk.com/gettoken");
        assert_eq!(join_url("http://127.0.0.1:1", "/user/get"), "http://127.0.0.1:1/user/get");
    }
}
