use crate::config::{AppConfig, WarehouseBackend};
use crate::error::{AppError, AppResult};
use crate::identity::{IdentityResolver, IdentityService, ScimIdentityService, StaticIdentityService};
use crate::platform::PlatformClient;
use crate::services;
use crate::session::SessionsState;
use crate::storage::{
    AccessProbe, FilesApiVolume, ObjectStoreVolume, UnityCatalogProbe, UnrestrictedProbe,
    VolumeStore,
};
use crate::warehouse::databricks::DatabricksWarehouse;
use crate::warehouse::sqlite::SqliteWarehouse;
use crate::warehouse::Warehouse;
use actix_web::web;
use log::info;
use std::sync::Arc;

/// Everything a handler needs, shared across workers as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub warehouse: Arc<dyn Warehouse>,
    pub volume: Arc<dyn VolumeStore>,
    pub access: Arc<dyn AccessProbe>,
    pub identity: IdentityResolver,
    pub sessions: SessionsState,
}

impl AppState {
    /// Wires the collaborators selected by `config.warehouse`.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        match &config.warehouse {
            WarehouseBackend::Sqlite { path, user } => {
                info!("using local SQLite warehouse at {}", path.display());
                let warehouse = Arc::new(SqliteWarehouse::open(path, user.clone())?);
                let volume = Arc::new(ObjectStoreVolume::local(&config.volume_root)?);
                let directory = Arc::new(StaticIdentityService::new(user.clone()));
                Ok(Self::new(
                    config,
                    warehouse,
                    volume,
                    Arc::new(UnrestrictedProbe),
                    directory,
                ))
            }
            WarehouseBackend::Databricks => {
                let settings = config
                    .databricks
                    .clone()
                    .ok_or_else(|| AppError::config("Databricks settings are missing"))?;
                info!(
                    "using Databricks warehouse {} on {}",
                    settings.warehouse_id, settings.host
                );
                let client = PlatformClient::new(&settings)?;
                let warehouse = Arc::new(DatabricksWarehouse::new(
                    client.clone(),
                    settings.warehouse_id.clone(),
                ));
                Ok(Self::new(
                    config,
                    warehouse,
                    Arc::new(FilesApiVolume::new(client.clone())),
                    Arc::new(UnityCatalogProbe::new(client.clone())),
                    Arc::new(ScimIdentityService::new(client)),
                ))
            }
        }
    }

    pub fn new(
        config: AppConfig,
        warehouse: Arc<dyn Warehouse>,
        volume: Arc<dyn VolumeStore>,
        access: Arc<dyn AccessProbe>,
        directory: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            identity: IdentityResolver::new(warehouse.clone(), directory),
            warehouse,
            volume,
            access,
            sessions: SessionsState::default(),
        }
    }
}

/// Registers every API scope. Shared by `main` and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(services::session::configure_routes())
        .service(services::settings::configure_routes())
        .service(services::uploads::configure_routes())
        .service(services::reviews::configure_routes());
}
