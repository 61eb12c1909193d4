//! Anonymous bearer-token issuance and share redemption.

use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::form_urlencoded;

use super::headers::HeaderSet;
use super::{ProviderEndpoints, ShareError, ShareSession};
use crate::http::{HttpSession, RequestSpec};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const REDEEM_BODY: &str = "%24select=id%2CparentReference";

/// Token issued by the provider's anonymous token endpoint.
#[derive(Clone, Deserialize)]
pub struct BearerToken {
    #[serde(rename = "authScheme")]
    pub auth_scheme: String,
    pub token: String,
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("auth_scheme", &self.auth_scheme)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BearerToken {
    /// `Authorization` header value: scheme with its first letter upper-cased.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{} {}", capitalize(&self.auth_scheme), self.token)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Issues tokens and redeems shares. Neither call is ever retried.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    http: HttpSession,
    endpoints: ProviderEndpoints,
}

impl TokenExchange {
    #[must_use]
    pub fn new(http: HttpSession, endpoints: ProviderEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Requests an anonymous bearer token for the configured application id.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Auth`] on a non-2xx status or an unparsable or
    /// incomplete body, and [`ShareError::Transport`] when the endpoint is
    /// unreachable.
    #[instrument(skip(self), fields(token_url = %self.endpoints.token_url))]
    pub async fn issue(&self) -> Result<BearerToken, ShareError> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("appId", &self.endpoints.app_id)
            .finish();
        let spec = RequestSpec::post(&self.endpoints.token_url)
            .headers(HeaderSet::api().content_type(FORM_CONTENT_TYPE).build())
            .body(body);

        let response = self.http.request(&spec).await?;
        if !response.is_success() {
            return Err(ShareError::auth(format!(
                "token endpoint answered HTTP {}",
                response.status
            )));
        }
        let token: BearerToken = response
            .json()
            .map_err(|e| ShareError::auth(format!("token response is not valid: {e}")))?;
        if token.auth_scheme.trim().is_empty() || token.token.trim().is_empty() {
            return Err(ShareError::auth("token response has an empty scheme or token"));
        }
        debug!(auth_scheme = %token.auth_scheme, "bearer token issued");
        Ok(token)
    }

    /// Redeems the share for the session's token so listings are authorized.
    ///
    /// # Errors
    ///
    /// - [`ShareError::Auth`] when the provider rejects the token (401/403)
    /// - [`ShareError::Resolution`] for any other error status, typically an
    ///   expired or revoked share
    /// - [`ShareError::Transport`] when the provider is unreachable
    #[instrument(skip(self, session), fields(drive_id = %session.drive_id()))]
    pub async fn redeem(&self, session: &ShareSession) -> Result<(), ShareError> {
        let headers = HeaderSet::api()
            .authorization(&session.authorization())
            .map_err(|_| ShareError::auth("token contains characters not allowed in a header"))?
            .prefer("autoredeem")
            .build();
        let spec = RequestSpec::post(self.endpoints.redeem_url(session.redeem_token()))
            .headers(headers)
            .body(REDEEM_BODY);

        let response = self.http.request(&spec).await?;
        match StatusCode::from_u16(response.status) {
            Ok(status) if status.is_success() => {
                info!("share redeemed");
                Ok(())
            }
            Ok(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Err(ShareError::auth(format!(
                "share redemption rejected the token (HTTP {})",
                response.status
            ))),
            _ => Err(ShareError::resolution(
                session.base_redirect_url(),
                format!("share redemption answered HTTP {}", response.status),
                "The share may have expired or been revoked; ask the owner for a new link",
            )),
        }
    }
}
