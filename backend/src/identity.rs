//! Best-effort "who is acting" lookup used for audit attribution.

use crate::error::AppResult;
use crate::platform::PlatformClient;
use crate::warehouse::{current_user, Warehouse};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::sync::Arc;

pub const UNKNOWN_USER: &str = "unknown@databricks.com";
pub const FORWARDED_EMAIL_HEADER: &str = "X-Forwarded-Email";

const SCIM_ME_PATH: &str = "/api/2.0/preview/scim/v2/Me";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct UserProfile {
    #[serde(rename = "userName", default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<ProfileEmail>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProfileEmail {
    #[serde(default)]
    pub value: Option<String>,
}

impl UserProfile {
    /// userName, first email, displayName (each only when it looks like an
    /// address), then the bare id.
    pub fn best_identity(&self) -> Option<String> {
        let email_like = |v: &Option<String>| v.as_deref().filter(|s| s.contains('@')).map(str::to_string);
        email_like(&self.user_name)
            .or_else(|| self.emails.first().and_then(|e| email_like(&e.value)))
            .or_else(|| email_like(&self.display_name))
            .or_else(|| self.id.clone().filter(|id| !id.is_empty()))
    }
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn me(&self) -> AppResult<UserProfile>;
}

pub struct ScimIdentityService {
    client: PlatformClient,
}

impl ScimIdentityService {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityService for ScimIdentityService {
    async fn me(&self) -> AppResult<UserProfile> {
        self.client.get_json(SCIM_ME_PATH, &[]).await
    }
}

/// Local runs have no directory; the profile is whatever was configured.
pub struct StaticIdentityService {
    profile: UserProfile,
}

impl StaticIdentityService {
    pub fn new(user: Option<String>) -> Self {
        Self {
            profile: UserProfile {
                user_name: user,
                ..UserProfile::default()
            },
        }
    }
}

#[async_trait]
impl IdentityService for StaticIdentityService {
    async fn me(&self) -> AppResult<UserProfile> {
        Ok(self.profile.clone())
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    warehouse: Arc<dyn Warehouse>,
    directory: Arc<dyn IdentityService>,
}

impl IdentityResolver {
    pub fn new(warehouse: Arc<dyn Warehouse>, directory: Arc<dyn IdentityService>) -> Self {
        Self {
            warehouse,
            directory,
        }
    }

    /// Never fails; falls back to [`UNKNOWN_USER`].
    pub async fn resolve(&self, host_claim: Option<&str>) -> String {
        match current_user(self.warehouse.as_ref()).await {
            Ok(Some(user)) if user.contains('@') => return user,
            Ok(other) => debug!("warehouse user not usable: {:?}", other),
            Err(e) => debug!("current_user() failed: {}", e),
        }

        if let Some(claim) = host_claim.map(str::trim).filter(|c| c.contains('@')) {
            return claim.to_string();
        }

        match self.directory.me().await {
            Ok(profile) => {
                if let Some(identity) = profile.best_identity() {
                    return identity;
                }
                warn!("identity service returned an empty profile");
            }
            Err(e) => warn!("identity service lookup failed: {}", e),
        }
        UNKNOWN_USER.to_string()
    }
}
