use std::collections::BTreeMap;

use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info, warn};

use crate::cache::credential::{ttl_or_floor, Credential, JSAPI_TICKET_CACHE_NAME};
use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::Result;
use crate::observability::metrics::get_metrics;
use crate::transport::request::StandardRequest;
use crate::transport::response::{Envelope, OapiEnvelope, ResponseContract};

pub const TICKET_PATH: &str = "get_jsapi_ticket";

/// `get_jsapi_ticket` payload
#[derive(Debug, Default, Deserialize)]
pub struct JsApiTicketResponse {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(default)]
    pub ticket: String,
    #[serde(default)]
    pub expires_in: u64,
}

impl ResponseContract for JsApiTicketResponse {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    /// Returns a valid JS-API ticket, from cache when possible.
    ///
    /// The cache write after a refresh is best-effort: a failure is logged and
    /// the fresh ticket is still returned.
    pub async fn get_jsapi_ticket(&self) -> Result<String> {
        if let Some(ticket) = self.cached_ticket().await {
            return Ok(ticket);
        }

        let _guard = self.token_state().ticket_guard.lock().await;
        if let Some(ticket) = self.cached_ticket().await {
            return Ok(ticket);
        }

        self.refresh_access_token().await?;
        let mut data = JsApiTicketResponse::default();
        self.dispatch(StandardRequest::new(TICKET_PATH), &mut data).await?;

        let credential = Credential::issued_now(data.ticket, ttl_or_floor(data.expires_in));
        if let Err(err) = self.cache().set(JSAPI_TICKET_CACHE_NAME, &credential).await {
            warn!("failed to cache jsapi ticket: {}", err);
        }

        let metrics = get_metrics().await;
        metrics.credential_refreshes.with_label_values(&[JSAPI_TICKET_CACHE_NAME]).inc();
        metrics.credential_expiry_unix.with_label_values(&[JSAPI_TICKET_CACHE_NAME]).set(credential.expires_at());
        info!("jsapi ticket refreshed (expires in {}s)", credential.ttl_seconds);
        Ok(credential.value)
    }

    /// Handshake mapping for the client-side JS-API `config` call
    pub async fn get_config(&self, nonce: &str, timestamp: &str, url: &str) -> Result<BTreeMap<String, String>> {
        let ticket = self.get_jsapi_ticket().await?;

        Ok(BTreeMap::from([
            ("nonceStr".to_owned(), nonce.to_owned()),
            ("agentId".to_owned(), self.config().agent_id.clone()),
            ("timeStamp".to_owned(), timestamp.to_owned()),
            ("corpId".to_owned(), self.config().corp_id.clone()),
            ("signature".to_owned(), sign(&ticket, nonce, timestamp, url)),
        ]))
    }

    async fn cached_ticket(&self) -> Option<String> {
        match self.cache().get(JSAPI_TICKET_CACHE_NAME).await {
            Ok(credential) => {
                get_metrics().await.credential_cache_hits.with_label_values(&[JSAPI_TICKET_CACHE_NAME]).inc();
                Some(credential.value)
            }
            Err(err) => {
                debug!("cached jsapi ticket unusable: {}", err);
                None
            }
        }
    }
}

/// SHA-1 hex signature over the ticket handshake fields
pub fn sign(ticket: &str, nonce: &str, timestamp: &str, url: &str) -> String {
    let plain = format!("jsapi_ticket={}&noncestr={}&timestamp={}&url={}", ticket, nonce, timestamp, url);
    hex::encode(Sha1::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_sha1_of_the_canonical_string() {
        let expected = hex::encode(Sha1::digest(
            b"jsapi_ticket=T&noncestr=abc&timestamp=1500000000&url=http://example.com/page",
        ));
        let got = sign("T", "abc", "1500000000", "http://example.com/page");
        assert_eq!(got, expected);
        assert_eq!(got.len(), 40);
        assert_ne!(got, sign("T2", "abc", "1500000000", "http://example.com/page"));
    }
}
