use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the classifieds module (`modules.classifieds` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClassifiedsConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_username_length")]
    pub max_username_length: usize,
    #[serde(default = "default_max_email_length")]
    pub max_email_length: usize,
    #[serde(default = "default_max_text_length")]
    pub max_title_length: usize,
    #[serde(default = "default_max_text_length")]
    pub max_description_length: usize,
}

impl Default for ClassifiedsConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            max_username_length: default_max_username_length(),
            max_email_length: default_max_email_length(),
            max_title_length: default_max_text_length(),
            max_description_length: default_max_text_length(),
        }
    }
}

impl From<ClassifiedsConfig> for ServiceConfig {
    fn from(cfg: ClassifiedsConfig) -> Self {
        Self {
            min_password_length: cfg.min_password_length,
            max_username_length: cfg.max_username_length,
            max_email_length: cfg.max_email_length,
            max_title_length: cfg.max_title_length,
            max_description_length: cfg.max_description_length,
        }
    }
}

fn default_min_password_length() -> usize {
    8
}

fn default_max_username_length() -> usize {
    100
}

fn default_max_email_length() -> usize {
    50
}

fn default_max_text_length() -> usize {
    100
}
