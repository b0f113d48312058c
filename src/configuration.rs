use std::cell::{
    RefCell,
    RefMut
};
use std::fs::File;
use std::io::{
    BufReader,
    Read
};

use serde::Deserialize;

use crate::manager::managererror::ManagerError;
use crate::manager::manager::{
    IManager,
    Manager
};
use crate::mosaiq::siteconfig::{
    ExclusionReason,
    SiteConfig,
    SiteExclusion,
    site_config_from_json
};


#[derive(Deserialize)]
struct ConfigurationJsonProp {
    #[serde(default)]
    site: Vec<serde_json::Value>
}

/// QCL 報表工具的設定：目前只有各站點的 Mosaiq 連線資訊。
pub struct Configuration {
    site_manager_cell: RefCell<Manager<SiteConfig>>
}


impl Configuration {
    pub fn new() -> Configuration {
        Configuration {
            site_manager_cell: RefCell::new(Manager::new(site_config_from_json))
        }
    }

    pub fn site_manager(&self) -> RefMut<'_, Manager<SiteConfig>> {
        self.site_manager_cell.borrow_mut()
    }

    /// 讀取 JSON 設定檔，回傳被排除的站點清單。
    pub fn from_reader(&self, file_path: &str) -> Result<Vec<SiteExclusion>, ManagerError> {
        let file = File::open(file_path)?;
        self.load(BufReader::new(file))
    }

    pub fn from_json_str(&self, json: &str) -> Result<Vec<SiteExclusion>, ManagerError> {
        self.load(json.as_bytes())
    }

    fn load<R: Read>(&self, reader: R) -> Result<Vec<SiteExclusion>, ManagerError> {
        let json_prop: ConfigurationJsonProp = serde_json::from_reader(reader)?;
        let site_manager = self.site_manager();
        let mut exclusions = Vec::new();
        for site_json in json_prop.site {
            match site_manager.insert_obj_from_json(site_json) {
                Ok(name) => log::debug!("site '{}' configured", name),
                Err(ManagerError::SiteExcluded(exclusion)) => {
                    log::warn!("{}", exclusion);
                    exclusions.push(exclusion);
                },
                // 同名站點只保留第一個
                Err(ManagerError::DuplicateNameError(site)) => {
                    let exclusion = SiteExclusion { site, reason: ExclusionReason::DuplicateName };
                    log::warn!("{}", exclusion);
                    exclusions.push(exclusion);
                },
                Err(error) => return Err(error)
            }
        }
        Ok(exclusions)
    }

    /// 設定完整的站點，依設定檔順序。
    pub fn candidate_sites(&self) -> Vec<SiteConfig> {
        self.site_manager().values()
    }

    /// 同 `candidate_sites`，但沒有任何可用站點時回傳 `NoSitesConfigured`。
    pub fn require_candidate_sites(&self) -> Result<Vec<SiteConfig>, ManagerError> {
        let sites = self.candidate_sites();
        if sites.is_empty() {
            Err(ManagerError::NoSitesConfigured)
        } else {
            Ok(sites)
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::new()
    }
}
