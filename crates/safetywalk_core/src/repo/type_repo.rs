//! POI type directory contract and SQLite implementation.

use crate::model::poi_type::PoiType;
use crate::repo::record_repo::{load_types, RepoError, RepoResult, SqlitePoiStore};
use log::info;
use rusqlite::params;
use uuid::Uuid;

/// Host directory of POI types.
pub trait PoiTypeDirectory: Send + Sync {
    fn find_all(&self) -> RepoResult<Vec<PoiType>>;
}

impl PoiTypeDirectory for SqlitePoiStore {
    fn find_all(&self) -> RepoResult<Vec<PoiType>> {
        let conn = self.lock()?;
        let mut types: Vec<PoiType> = load_types(&conn)?.into_values().collect();
        let mut order = conn.prepare("SELECT id FROM poi_types ORDER BY seq ASC;")?;
        let ids = order
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        types.sort_by_key(|poi_type| ids.iter().position(|id| *id == poi_type.id));
        Ok(types)
    }
}

impl SqlitePoiStore {
    /// Registers a type with one localized name and returns its handle.
    ///
    /// Returns the existing handle when the name is already registered for
    /// `locale`.
    pub fn ensure_type(&self, locale: &str, name: &str) -> RepoResult<PoiType> {
        if name.trim().is_empty() {
            return Err(RepoError::InvalidData("poi type name must not be empty".into()));
        }

        let existing = PoiTypeDirectory::find_all(self)?
            .into_iter()
            .find(|poi_type| poi_type.name(locale) == Some(name));
        if let Some(poi_type) = existing {
            return Ok(poi_type);
        }

        let id = Uuid::new_v4().to_string();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("INSERT INTO poi_types (id) VALUES (?1);", [id.as_str()])?;
        tx.execute(
            "INSERT INTO poi_type_names (type_id, locale, name) VALUES (?1, ?2, ?3);",
            params![id.as_str(), locale, name],
        )?;
        tx.commit()?;
        info!("event=poi_type_register module=repo status=ok type_id={id} locale={locale}");

        let mut poi_type = PoiType {
            id,
            names: Default::default(),
        };
        poi_type.names.insert(locale.to_string(), name.to_string());
        Ok(poi_type)
    }
}
