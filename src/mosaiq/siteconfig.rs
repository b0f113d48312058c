use serde::{
    Deserialize,
    Serialize
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::manager::managererror::ManagerError;

pub const UNNAMED_SITE: &str = "<unnamed>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaiqConfig {
    physics_qcl_location: String,
    hostname: String,
    port: u16,
    alias: String
}

impl MosaiqConfig {
    pub fn new(physics_qcl_location: String, hostname: String, port: u16, alias: String) -> MosaiqConfig {
        MosaiqConfig { physics_qcl_location, hostname, port, alias }
    }

    /// QCL 負責人（Staff.Last_Name）欄位要比對的名稱。
    pub fn physics_qcl_location(&self) -> &str {
        &self.physics_qcl_location
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    name: String,
    mosaiq: MosaiqConfig
}

impl SiteConfig {
    pub fn new(name: String, mosaiq: MosaiqConfig) -> SiteConfig {
        SiteConfig { name, mosaiq }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mosaiq(&self) -> &MosaiqConfig {
        &self.mosaiq
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExclusionReason {
    #[error("site entry has no name")]
    MissingName,

    #[error("another site already uses this name")]
    DuplicateName,

    #[error("no 'mosaiq' block")]
    MissingMosaiqBlock,

    #[error("missing 'mosaiq.{0}'")]
    MissingField(&'static str),

    #[error("invalid 'mosaiq.{field}': {message}")]
    InvalidField { field: &'static str, message: String }
}

/// 設定檔中不完整、因此不列入候選清單的站點。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("site '{site}' excluded: {reason}")]
pub struct SiteExclusion {
    pub site: String,
    pub reason: ExclusionReason
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON → SiteConfig
// ─────────────────────────────────────────────────────────────────────────────

fn invalid(field: &'static str, message: &str) -> ExclusionReason {
    ExclusionReason::InvalidField { field, message: message.to_owned() }
}

fn required_text(mosaiq: &Map<String, Value>, field: &'static str) -> Result<String, ExclusionReason> {
    match mosaiq.get(field) {
        None | Some(Value::Null) => Err(ExclusionReason::MissingField(field)),
        Some(Value::String(text)) if text.trim().is_empty() => Err(invalid(field, "must not be empty")),
        Some(Value::String(text)) => Ok(text.trim().to_owned()),
        Some(_) => Err(invalid(field, "expected a string"))
    }
}

fn required_port(mosaiq: &Map<String, Value>) -> Result<u16, ExclusionReason> {
    let field = "port";
    match mosaiq.get(field) {
        None | Some(Value::Null) => Err(ExclusionReason::MissingField(field)),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|port| u16::try_from(port).ok())
            .ok_or_else(|| invalid(field, "expected an integer between 0 and 65535")),
        Some(_) => Err(invalid(field, "expected an integer"))
    }
}

fn validate_site(json_value: &Value) -> Result<SiteConfig, SiteExclusion> {
    let name = json_value
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty());
    let Some(name) = name else {
        return Err(SiteExclusion { site: UNNAMED_SITE.to_owned(), reason: ExclusionReason::MissingName });
    };
    let exclude = |reason: ExclusionReason| SiteExclusion { site: name.to_owned(), reason };

    let mosaiq = json_value
        .get("mosaiq")
        .and_then(Value::as_object)
        .ok_or_else(|| exclude(ExclusionReason::MissingMosaiqBlock))?;

    let physics_qcl_location = required_text(mosaiq, "physics_qcl_location").map_err(exclude)?;
    let hostname = required_text(mosaiq, "hostname").map_err(exclude)?;
    let port = required_port(mosaiq).map_err(exclude)?;
    let alias = required_text(mosaiq, "alias").map_err(exclude)?;

    Ok(SiteConfig::new(
        name.to_owned(),
        MosaiqConfig::new(physics_qcl_location, hostname, port, alias)
    ))
}

pub fn site_config_from_json(json_value: Value) -> Result<SiteConfig, ManagerError> {
    Ok(validate_site(&json_value)?)
}
