use serde::Deserialize;
use thiserror::Error;

use crate::mosaiq::siteconfig::SiteExclusion;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    JsonParseError(#[from] serde_json::Error),

    #[error("key '{0}' not found")]
    NameNotFoundError(String),

    #[error("name '{0}' is already defined")]
    DuplicateNameError(String),

    #[error(transparent)]
    SiteExcluded(#[from] SiteExclusion),

    #[error("the appropriate configuration items for this tool have not been provided")]
    NoSitesConfigured
}

pub fn parse_json_value<T>(json_value: serde_json::Value) -> Result<T, ManagerError>
    where T: for<'a> Deserialize<'a> {
    Ok(serde_json::from_value(json_value)?)
}
