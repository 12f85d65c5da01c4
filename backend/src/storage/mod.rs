//! Object-storage volume used as the audit trail for uploaded source files.

pub mod access;
pub mod volume;

pub use access::{AccessProbe, UnityCatalogProbe, UnrestrictedProbe};
pub use volume::{backup_path, FilesApiVolume, ObjectStoreVolume, VolumeStore};
