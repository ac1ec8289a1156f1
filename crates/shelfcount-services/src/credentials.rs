//! Delegated credential store
//!
//! Holds the access token a caller handed over for the direct channel. Only one credential
//! is kept; installing a new one replaces the old.

use chrono::{DateTime, Utc};
use shelfcount_core::models::DriveStatusResponse;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct DelegatedCredential {
    pub access_token: String,
    pub authorized_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct CredentialStore {
    current: RwLock<Option<DelegatedCredential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a token. Blank tokens are rejected and leave the store unchanged.
    pub async fn install(&self, access_token: &str) -> bool {
        let token = access_token.trim();
        if token.is_empty() {
            return false;
        }
        *self.current.write().await = Some(DelegatedCredential {
            access_token: token.to_string(),
            authorized_at: Utc::now(),
        });
        tracing::info!("Delegated storage credential installed");
        true
    }

    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    pub async fn current(&self) -> Option<DelegatedCredential> {
        self.current.read().await.clone()
    }

    pub async fn status(&self) -> DriveStatusResponse {
        match self.current().await {
            Some(credential) => DriveStatusResponse {
                authorized: true,
                message: format!(
                    "Direct storage access authorized since {}",
                    credential.authorized_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            },
            None => DriveStatusResponse {
                authorized: false,
                message: "Direct storage access not authorized".to_string(),
            },
        }
    }
}
