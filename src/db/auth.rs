

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::client::StoreError;

type HmacSha256 = Hmac<Sha256>;

/// Resource type segment of the signed payload for document operations.
pub const DOCS_RESOURCE: &str = "docs";

/// Signs requests with the account master key (`type=master&ver=1.0`).
#[derive(Clone)]
pub struct MasterKeySigner {
    key: Vec<u8>,
}

impl MasterKeySigner {

    pub fn new(account_key: &str) -> Result<Self, StoreError> {
        let key = STANDARD
            .decode(account_key.trim())
            .map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        if key.is_empty() {
            return Err(StoreError::InvalidKey("account key is empty".to_string()));
        }
        Ok(Self { key })
    }

    /// Value of the `authorization` header, already URL-encoded.
    pub fn authorization(
        &self,
        verb: &reqwest::Method,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, StoreError> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.as_str().to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| StoreError::InvalidKey(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }
}

impl fmt::Debug for MasterKeySigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKeySigner").finish_non_exhaustive()
    }
}

/// `x-ms-date` format, e.g. `Thu, 27 Apr 2017 00:51:12 GMT`.
pub fn rfc1123_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
