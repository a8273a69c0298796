use anyhow::Context;

use bursary_config::BursaryConfig;
use bursary_db::service::BursaryService;

use crate::cli::GlobalFlags;

/// Load layered configuration and apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<BursaryConfig> {
    let mut config = BursaryConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(path) = &flags.db {
        config.database.path.clone_from(path);
    }
    Ok(config)
}

/// Everything a command handler needs.
pub struct AppContext {
    pub config: BursaryConfig,
    pub service: BursaryService,
}

impl AppContext {
    pub async fn init(config: BursaryConfig) -> anyhow::Result<Self> {
        let service = BursaryService::from_config(&config).await?;
        tracing::debug!(path = config.database.path.as_str(), "database opened");
        Ok(Self { config, service })
    }
}
