use std::cell::{
    Ref,
    RefCell,
    RefMut
};
use std::collections::HashMap;

use super::managererror::{
    ManagerError,
    parse_json_value
};
use super::namedobject::NamedJsonObject;


pub trait IManager<V> where
    V: Clone {
    fn map(&self) -> RefMut<'_, HashMap<String, V>>;

    /// 依插入順序排列的名稱。
    fn names(&self) -> Ref<'_, Vec<String>>;

    /// 解析一個 JSON 物件並以其 `name` 存入，回傳該名稱。
    fn insert_obj_from_json(&self, json_value: serde_json::Value) -> Result<String, ManagerError>;

    fn get(&self, name: &str) -> Result<V, ManagerError> {
        let map = self.map();
        map.get(name).map_or(
            Err(ManagerError::NameNotFoundError(name.to_owned())),
            |elem| Ok(elem.clone())
        )
    }

    fn len(&self) -> usize {
        self.names().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 依插入順序取出所有物件。
    fn values(&self) -> Vec<V> {
        let map = self.map();
        self.names()
            .iter()
            .filter_map(|name| map.get(name).cloned())
            .collect()
    }
}


pub struct Manager<V> {
    map_cell: RefCell<HashMap<String, V>>,
    names_cell: RefCell<Vec<String>>,
    get_obj_from_json: fn(serde_json::Value) -> Result<V, ManagerError>
}


impl <V> Manager<V> where
    V: Clone {
    pub fn new(get_obj_from_json: fn(serde_json::Value) -> Result<V, ManagerError>) -> Manager<V> {
        Manager {
            map_cell: RefCell::new(HashMap::new()),
            names_cell: RefCell::new(Vec::new()),
            get_obj_from_json
        }
    }
}

impl <V> IManager<V> for Manager<V> where
    V: Clone {
    fn map(&self) -> RefMut<'_, HashMap<String, V>> {
        self.map_cell.borrow_mut()
    }

    fn names(&self) -> Ref<'_, Vec<String>> {
        self.names_cell.borrow()
    }

    fn insert_obj_from_json(&self, json_value: serde_json::Value) -> Result<String, ManagerError> {
        let v = (self.get_obj_from_json)(json_value.clone())?;
        let named_object: NamedJsonObject = parse_json_value(json_value)?;
        let name = named_object
            .name()
            .ok_or_else(|| ManagerError::NameNotFoundError("name".to_owned()))?
            .to_owned();
        let mut map = self.map();
        if map.contains_key(&name) {
            return Err(ManagerError::DuplicateNameError(name));
        }
        map.insert(name.clone(), v);
        self.names_cell.borrow_mut().push(name.clone());
        Ok(name)
    }
}
