use serde::{
    Serialize,
    Deserialize
};

/// 只讀取 JSON 物件的 `name` 欄位，作為 manager 的 key。
#[derive(Clone, Serialize, Deserialize)]
pub struct NamedJsonObject {
    #[serde(default)]
    name: Option<String>
}


impl NamedJsonObject {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
