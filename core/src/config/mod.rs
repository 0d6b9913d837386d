mod load;
mod types;

pub use load::{get_dbagent_data_dir, load_default, load_from_path};
pub use types::{
    AppConfig, DataStoreConfig, DataStoreKind, LoggingConfig, MothershipConfig, RunnerConfig,
};
