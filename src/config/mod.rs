pub mod error;
pub mod load;
pub mod paths;
pub mod settings;

pub use crate::memory::MemoryConfig;
pub use error::ConfigError;
pub use load::{load_global_settings, load_settings};
pub use paths::{
    database_path, default_global_config_path, default_state_root, DATABASE_FILE_NAME,
    GLOBAL_SETTINGS_FILE_NAME, GLOBAL_STATE_DIR,
};
pub use settings::{BackendConfig, BackendsConfig, Settings, BASE_URL_ENV_OVERRIDE};
