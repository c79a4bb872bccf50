use serde::Deserialize;
use tracing::{debug, info};

use crate::cache::credential::{ttl_or_floor, Credential, AUTH_CACHE_NAME};
use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::Result;
use crate::observability::metrics::get_metrics;
use crate::transport::request::StandardRequest;
use crate::transport::response::{Envelope, OapiEnvelope, ResponseContract};

pub const TOKEN_PATH: &str = "gettoken";

/// `gettoken` payload
#[derive(Debug, Default, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

impl ResponseContract for AccessTokenResponse {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    /// Makes sure the client holds a valid access token.
    ///
    /// A cached, unexpired token is used as is. Otherwise the check-then-refresh
    /// sequence runs under `refresh_guard`, so callers sharing this client never
    /// issue more than one `gettoken` call at a time; whoever waited on the
    /// guard finds the fresh entry in the cache and returns without a call.
    pub async fn refresh_access_token(&self) -> Result<()> {
        if self.load_cached_token().await {
            return Ok(());
        }

        let _guard = self.token_state().refresh_guard.lock().await;
        if self.load_cached_token().await {
            debug!("access token refreshed by a concurrent caller");
            return Ok(());
        }

        let request = StandardRequest::new(TOKEN_PATH)
            .param("corpid", &self.config().corp_id)
            .param("corpsecret", &self.config().corp_secret);
        let mut data = AccessTokenResponse::default();
        self.dispatch(request, &mut data).await?;

        let credential = Credential::issued_now(data.access_token, ttl_or_floor(data.expires_in));
        self.token_state().replace(credential.value.clone()).await;
        self.cache().set(AUTH_CACHE_NAME, &credential).await?;

        let metrics = get_metrics().await;
        metrics.credential_refreshes.with_label_values(&[AUTH_CACHE_NAME]).inc();
        metrics.credential_expiry_unix.with_label_values(&[AUTH_CACHE_NAME]).set(credential.expires_at());
        info!("access token refreshed (expires in {}s)", credential.ttl_seconds);
        Ok(())
    }

    /// Refreshes if needed and returns the current access token
    pub async fn access_token(&self) -> Result<String> {
        self.refresh_access_token().await?;
        Ok(self.current_token().await)
    }

    async fn load_cached_token(&self) -> bool {
        match self.cache().get(AUTH_CACHE_NAME).await {
            Ok(credential) => {
                self.token_state().replace(credential.value).await;
                get_metrics().await.credential_cache_hits.with_label_values(&[AUTH_CACHE_NAME]).inc();
                true
            }
            Err(err) => {
                debug!("cached access token unusable: {}", err);
                false
            }
        }
    }
}
