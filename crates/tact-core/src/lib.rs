pub mod app_config;
pub mod config;
pub mod lead;
pub mod processing;
pub mod quiz;
pub mod wizard;

pub use app_config::{AppConfig, Environment, MetaConfig, StoreConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use lead::{
    clean_phone, validate_local_phone, ContactForm, LeadFields, LeadId, LeadSource,
    DEFAULT_GOVERNORATE,
};
pub use processing::{run_processing, ProcessingSequence};
pub use quiz::{Category, Dimensions, KitchenShape, Material};
pub use wizard::{advance, reduce, Step, WizardAction, WizardError, WizardState, MAX_DESIGNS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
