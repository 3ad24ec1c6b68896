//! Record repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/save/remove/list APIs over POI records.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Saving an unsaved record assigns a fresh id.
//! - Listing preserves insertion order; no other sort is imposed.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::poi_type::PoiType;
use crate::model::record::{IssueStatus, Placement, Record, RecordFields, RecordId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const POI_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    category,
    priority,
    poi_type_id,
    status,
    notified,
    icon,
    placement,
    point_of_view
FROM pois";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record and type persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(RecordId),
    /// Operation needs a repository-assigned id.
    Unsaved,
    /// The repository accepted a save but returned no record.
    EmptySaveResult,
    InvalidData(String),
    /// Host repository refused the request.
    Rejected(String),
    LockPoisoned,
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "poi not found: {id}"),
            Self::Unsaved => write!(f, "poi has not been saved yet"),
            Self::EmptySaveResult => write!(f, "repository returned no poi after save"),
            Self::InvalidData(message) => write!(f, "invalid persisted poi data: {message}"),
            Self::Rejected(message) => write!(f, "repository rejected request: {message}"),
            Self::LockPoisoned => write!(f, "poi store lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Host record repository.
pub trait RecordRepository: Send + Sync {
    /// Returns a blank, unsaved record of the given type.
    fn create(&self, poi_type: &PoiType) -> Record {
        Record::draft(poi_type.clone(), &RecordFields::default())
    }

    /// Persists `record`; the saved record is the first element.
    ///
    /// A stored `notified` flag is never lowered: saving a copy that still
    /// carries `notified = false` keeps the stored `true`, and the returned
    /// record reflects the stored value.
    fn save(&self, record: &Record) -> RepoResult<Vec<Record>>;

    fn remove(&self, record: &Record) -> RepoResult<()>;

    fn find_all(&self) -> RepoResult<Vec<Record>>;

    /// Flips `notified` from `false` to `true`.
    ///
    /// Returns `Ok(true)` only for the caller that performed the flip.
    fn mark_notified(&self, id: RecordId) -> RepoResult<bool>;
}

/// SQLite-backed POI store implementing the record and type contracts.
pub struct SqlitePoiStore {
    conn: Mutex<Connection>,
}

impl SqlitePoiStore {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub(crate) fn lock(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepoError::LockPoisoned)
    }
}

impl RecordRepository for SqlitePoiStore {
    fn save(&self, record: &Record) -> RepoResult<Vec<Record>> {
        let conn = self.lock()?;
        let placement = encode_placement(record.placement.as_ref())?;
        let point_of_view = encode_placement(record.point_of_view.as_ref())?;

        let id = match record.id {
            Some(id) => {
                let changed = conn.execute(
                    "UPDATE pois
                     SET
                        title = ?1,
                        description = ?2,
                        category = ?3,
                        priority = ?4,
                        poi_type_id = ?5,
                        status = ?6,
                        notified = MAX(notified, ?7),
                        icon = ?8,
                        placement = ?9,
                        point_of_view = ?10,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?11;",
                    params![
                        record.title.as_str(),
                        record.description.as_deref(),
                        record.category.as_deref(),
                        record.priority.as_deref(),
                        record.poi_type.id.as_str(),
                        record.status.map(IssueStatus::code),
                        record.notified,
                        record.icon.as_deref(),
                        placement,
                        point_of_view,
                        id.to_string(),
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound(id));
                }
                id
            }
            None => {
                let id = Uuid::new_v4();
                conn.execute(
                    "INSERT INTO pois (
                        id,
                        title,
                        description,
                        category,
                        priority,
                        poi_type_id,
                        status,
                        notified,
                        icon,
                        placement,
                        point_of_view
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                    params![
                        id.to_string(),
                        record.title.as_str(),
                        record.description.as_deref(),
                        record.category.as_deref(),
                        record.priority.as_deref(),
                        record.poi_type.id.as_str(),
                        record.status.map(IssueStatus::code),
                        record.notified,
                        record.icon.as_deref(),
                        placement,
                        point_of_view,
                    ],
                )?;
                id
            }
        };

        let types = load_types(&conn)?;
        let saved = conn
            .query_row(
                &format!("{POI_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_poi_row(row, &types)),
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))??;
        Ok(vec![saved])
    }

    fn remove(&self, record: &Record) -> RepoResult<()> {
        let id = record.id.ok_or(RepoError::Unsaved)?;
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM pois WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_all(&self) -> RepoResult<Vec<Record>> {
        let conn = self.lock()?;
        let types = load_types(&conn)?;
        let mut stmt = conn.prepare(&format!("{POI_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_poi_row(row, &types)?);
        }
        Ok(records)
    }

    fn mark_notified(&self, id: RecordId) -> RepoResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE pois
             SET
                notified = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1 AND notified = 0;",
            [id.to_string()],
        )?;
        if changed == 1 {
            return Ok(true);
        }

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM pois WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if exists {
            Ok(false)
        } else {
            Err(RepoError::NotFound(id))
        }
    }
}

/// Loads every type with its localized names, keyed by type id.
pub(crate) fn load_types(conn: &Connection) -> RepoResult<HashMap<String, PoiType>> {
    let mut types: HashMap<String, PoiType> = HashMap::new();
    let mut stmt = conn.prepare(
        "SELECT t.id, n.locale, n.name
         FROM poi_types t
         LEFT JOIN poi_type_names n ON n.type_id = t.id
         ORDER BY t.seq ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let entry = types.entry(id.clone()).or_insert_with(|| PoiType {
            id,
            names: Default::default(),
        });
        if let (Some(locale), Some(name)) = (
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
        ) {
            entry.names.insert(locale, name);
        }
    }
    Ok(types)
}

fn parse_poi_row(row: &Row<'_>, types: &HashMap<String, PoiType>) -> RepoResult<Record> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in pois.id")))?;

    let type_id: String = row.get("poi_type_id")?;
    let poi_type = types.get(&type_id).cloned().ok_or_else(|| {
        RepoError::InvalidData(format!("unknown poi type `{type_id}` in pois.poi_type_id"))
    })?;

    let status = match row.get::<_, Option<i64>>("status")? {
        Some(code) => Some(
            IssueStatus::from_code(code).map_err(|err| RepoError::InvalidData(err.to_string()))?,
        ),
        None => None,
    };

    Ok(Record {
        id: Some(id),
        title: row.get("title")?,
        description: row.get("description")?,
        category: row.get("category")?,
        priority: row.get("priority")?,
        poi_type,
        status,
        notified: row.get("notified")?,
        icon: row.get("icon")?,
        placement: decode_placement(row.get("placement")?, "placement")?,
        point_of_view: decode_placement(row.get("point_of_view")?, "point_of_view")?,
    })
}

fn encode_placement(placement: Option<&Placement>) -> RepoResult<Option<String>> {
    placement
        .map(|value| {
            serde_json::to_string(value)
                .map_err(|err| RepoError::InvalidData(format!("placement encode failed: {err}")))
        })
        .transpose()
}

fn decode_placement(raw: Option<String>, column: &str) -> RepoResult<Option<Placement>> {
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|err| RepoError::InvalidData(format!("invalid json in pois.{column}: {err}")))
    })
    .transpose()
}
