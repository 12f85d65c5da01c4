use crate::error::AppResult;
use crate::identity::UserProfile;
use crate::platform::PlatformClient;
use crate::warehouse::identifier::VolumeName;
use async_trait::async_trait;
use common::model::upload::PermissionCheck;
use log::warn;
use serde::Deserialize;

const WRITE_PRIVILEGES: [&str; 2] = ["ALL_PRIVILEGES", "WRITE_VOLUME"];

/// Answers "may the caller write to this volume". Never blocks an upload;
/// callers only log and report the outcome.
#[async_trait]
pub trait AccessProbe: Send + Sync {
    async fn check_volume(&self, volume: &VolumeName) -> PermissionCheck;
}

/// Local volumes have no grants model.
pub struct UnrestrictedProbe;

#[async_trait]
impl AccessProbe for UnrestrictedProbe {
    async fn check_volume(&self, _volume: &VolumeName) -> PermissionCheck {
        PermissionCheck::Valid
    }
}

pub struct UnityCatalogProbe {
    client: PlatformClient,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    catalog_name: String,
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogInfo {
    #[serde(default)]
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct EffectivePermissions {
    #[serde(default)]
    privilege_assignments: Vec<PrivilegeAssignment>,
}

#[derive(Debug, Deserialize)]
struct PrivilegeAssignment {
    #[serde(default)]
    privileges: Vec<EffectivePrivilege>,
}

#[derive(Debug, Deserialize)]
struct EffectivePrivilege {
    privilege: String,
}

fn evaluate(user: Option<&str>, catalog_owner: Option<&str>, grants: &EffectivePermissions) -> PermissionCheck {
    if user.is_some() && catalog_owner == user {
        return PermissionCheck::Valid;
    }
    if grants.privilege_assignments.is_empty() {
        return PermissionCheck::NoGrants;
    }
    let writable = grants
        .privilege_assignments
        .iter()
        .flat_map(|a| a.privileges.iter())
        .any(|p| WRITE_PRIVILEGES.contains(&p.privilege.as_str()));
    if writable {
        PermissionCheck::Valid
    } else {
        PermissionCheck::MissingPrivileges
    }
}

impl UnityCatalogProbe {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }

    async fn probe(&self, volume: &VolumeName) -> AppResult<PermissionCheck> {
        let info: VolumeInfo = self
            .client
            .get_json(&format!("/api/2.1/unity-catalog/volumes/{}", volume), &[])
            .await?;
        let me: UserProfile = self
            .client
            .get_json("/api/2.0/preview/scim/v2/Me", &[])
            .await?;
        let catalog: CatalogInfo = self
            .client
            .get_json(
                &format!("/api/2.1/unity-catalog/catalogs/{}", info.catalog_name),
                &[],
            )
            .await?;
        let user = me.user_name.as_deref();
        let grants: EffectivePermissions = self
            .client
            .get_json(
                &format!(
                    "/api/2.1/unity-catalog/effective-permissions/volume/{}",
                    info.full_name
                ),
                &[("principal", user.unwrap_or_default())],
            )
            .await?;
        Ok(evaluate(user, catalog.owner.as_deref(), &grants))
    }
}

#[async_trait]
impl AccessProbe for UnityCatalogProbe {
    async fn check_volume(&self, volume: &VolumeName) -> PermissionCheck {
        match self.probe(volume).await {
            Ok(check) => check,
            Err(e) => {
                warn!("permission probe on {} failed: {}", volume, e);
                PermissionCheck::Error(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(json: serde_json::Value) -> EffectivePermissions {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn catalog_owner_is_always_valid() {
        let none = EffectivePermissions::default();
        assert_eq!(
            evaluate(Some("ana@corp.com"), Some("ana@corp.com"), &none),
            PermissionCheck::Valid
        );
        assert_eq!(
            evaluate(Some("ana@corp.com"), Some("admins"), &none),
            PermissionCheck::NoGrants
        );
    }

    #[test]
    fn write_volume_or_all_privileges_grant_access() {
        let read_only = grants(serde_json::json!({"privilege_assignments": [
            {"principal": "ana@corp.com", "privileges": [{"privilege": "READ_VOLUME"}]}
        ]}));
        assert_eq!(
            evaluate(Some("ana@corp.com"), None, &read_only),
            PermissionCheck::MissingPrivileges
        );

        let writer = grants(serde_json::json!({"privilege_assignments": [
            {"principal": "data-eng", "privileges": [
                {"privilege": "READ_VOLUME", "inherited_from_type": "SCHEMA"},
                {"privilege": "WRITE_VOLUME"}
            ]}
        ]}));
        assert_eq!(evaluate(Some("ana@corp.com"), None, &writer), PermissionCheck::Valid);
    }

    #[tokio::test]
    async fn local_probe_never_objects() {
        let volume = VolumeName::parse("dg_dev.sandbox.csv_uploads").unwrap();
        assert!(UnrestrictedProbe.check_volume(&volume).await.is_valid());
    }
}
