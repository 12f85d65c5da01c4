use crate::error::{AppError, AppResult};
use crate::platform::PlatformClient;
use crate::warehouse::identifier::VolumeName;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDateTime;
use log::info;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;

const FILES_API_PATH: &str = "/api/2.0/fs/files";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[async_trait]
pub trait VolumeStore: Send + Sync {
    /// Writes `data` at an absolute `/Volumes/...` path.
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()>;
}

/// `/Volumes/<catalog>/<schema>/<volume>`
pub fn volume_root(volume: &VolumeName) -> String {
    let [catalog, schema, name] = volume.parts();
    format!("/Volumes/{}/{}/{}", catalog, schema, name)
}

/// `<stem>_<YYYY-MM-DD_HH-MM-SS>.<ext>`; files without an extension get `csv`.
pub fn backup_file_name(original: &str, at: NaiveDateTime) -> String {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original);
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, ext),
        Some((stem, _)) => (stem, "csv"),
        None => (base, "csv"),
    };
    format!("{}_{}.{}", stem, at.format(BACKUP_TIMESTAMP_FORMAT), extension)
}

pub fn backup_path(volume: &VolumeName, original: &str, at: NaiveDateTime) -> String {
    format!("{}/{}", volume_root(volume), backup_file_name(original, at))
}

/// Any `object_store` backend; the `/Volumes/...` path becomes the object key.
#[derive(Clone)]
pub struct ObjectStoreVolume {
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreVolume {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn local(root: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(root)?;
        let store = LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store)))
    }

    fn object_path(path: &str) -> ObjectPath {
        ObjectPath::from(path.trim_start_matches('/'))
    }

    pub async fn read(&self, path: &str) -> AppResult<Bytes> {
        let result = self.store.get(&Self::object_path(path)).await?;
        Ok(result.bytes().await?)
    }
}

#[async_trait]
impl VolumeStore for ObjectStoreVolume {
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()> {
        let options = PutOptions {
            mode: if overwrite {
                PutMode::Overwrite
            } else {
                PutMode::Create
            },
            ..PutOptions::default()
        };
        let size = data.len();
        self.store
            .put_opts(&Self::object_path(path), PutPayload::from(data), options)
            .await?;
        info!("stored {} bytes at {}", size, path);
        Ok(())
    }
}

/// The platform Files API, `PUT /api/2.0/fs/files/Volumes/...`.
#[derive(Clone)]
pub struct FilesApiVolume {
    client: PlatformClient,
}

impl FilesApiVolume {
    pub fn new(client: PlatformClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VolumeStore for FilesApiVolume {
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> AppResult<()> {
        if !path.starts_with("/Volumes/") {
            return Err(AppError::storage(format!(
                "'{}' is not a volume path",
                path
            )));
        }
        let size = data.len();
        let overwrite = if overwrite { "true" } else { "false" };
        self.client
            .put_bytes(
                &format!("{}{}", FILES_API_PATH, path),
                &[("overwrite", overwrite)],
                data,
            )
            .await
            .map_err(|e| AppError::storage(format!("upload to {} failed: {}", path, e)))?;
        info!("stored {} bytes at {}", size, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
    }

    #[test]
    fn backup_names_carry_a_timestamp_before_the_extension() {
        assert_eq!(
            backup_file_name("merchants.csv", at()),
            "merchants_2024-03-09_14-05-07.csv"
        );
        assert_eq!(
            backup_file_name("archive.tar.gz", at()),
            "archive.tar_2024-03-09_14-05-07.gz"
        );
        assert_eq!(
            backup_file_name("no_extension", at()),
            "no_extension_2024-03-09_14-05-07.csv"
        );
    }

    #[test]
    fn backup_path_lives_under_the_volume_root() {
        let volume = VolumeName::parse("dg_dev.sandbox.csv_uploads").unwrap();
        assert_eq!(
            backup_path(&volume, "C:\\Users\\ana\\merchants.csv", at()),
            "/Volumes/dg_dev/sandbox/csv_uploads/merchants_2024-03-09_14-05-07.csv"
        );
    }

    #[tokio::test]
    async fn overwrite_replaces_and_create_refuses_existing_objects() {
        let volume = ObjectStoreVolume::in_memory();
        let path = "/Volumes/dg_dev/sandbox/csv_uploads/a.csv";
        volume.upload(path, Bytes::from_static(b"v1"), true).await.unwrap();
        volume.upload(path, Bytes::from_static(b"v2"), true).await.unwrap();
        assert_eq!(volume.read(path).await.unwrap(), Bytes::from_static(b"v2"));

        assert!(volume
            .upload(path, Bytes::from_static(b"v3"), false)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn local_volumes_write_under_their_root() {
        let dir = tempfile::tempdir().unwrap();
        let volume = ObjectStoreVolume::local(dir.path()).unwrap();
        volume
            .upload("/Volumes/c/s/v/x.csv", Bytes::from_static(b"a,b\n"), true)
            .await
            .unwrap();
        let on_disk = std::fs::read(dir.path().join("Volumes/c/s/v/x.csv")).unwrap();
        assert_eq!(on_disk, b"a,b\n");
    }
}
