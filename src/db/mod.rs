//! SQLite-backed catalog storage: switch records and the keyword vocabulary.

mod keyword;
mod switch;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::snowflake::IdWorker;

/// Set busy_timeout on every connection handed out by the pool.
#[derive(Debug)]
struct BusyTimeoutCustomizer;
impl r2d2::CustomizeConnection<rusqlite::Connection, rusqlite::Error> for BusyTimeoutCustomizer {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(())
    }
}

type PooledConn = r2d2::PooledConnection<SqliteConnectionManager>;

/// Keyword type that switch studios are registered under.
pub const STUDIO_KEYWORD_TYPE: &str = "studio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rank: i64,
    pub deleted: bool,
    pub memo: Option<String>,
    pub create_time: i64,
    pub update_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeywordInput {
    #[serde(default)]
    pub word: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub memo: Option<String>,
}

impl KeywordInput {
    pub fn new(word: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn rank(mut self, r: i64) -> Self {
        self.rank = r;
        self
    }

    pub fn memo(mut self, m: impl Into<String>) -> Self {
        self.memo = Some(m.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    pub id: String,
    pub name: String,
    pub studio: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pic: String,
    pub tag: String,
    pub quantity: i64,
    pub price: f64,
    pub desc: String,
    pub specs: serde_json::Value,
    pub stash: bool,
    pub create_time: i64,
    pub update_time: i64,
}

/// A switch as submitted by a client. An empty or missing `id` means create.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SwitchInput {
    pub id: Option<String>,
    pub name: String,
    pub studio: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub pic: String,
    pub tag: String,
    pub quantity: i64,
    pub price: f64,
    pub desc: String,
    pub specs: Option<serde_json::Value>,
    pub stash: bool,
}

impl SwitchInput {
    pub fn new(name: impl Into<String>, studio: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            studio: studio.into(),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn manufacturer(mut self, m: impl Into<String>) -> Self {
        self.manufacturer = m.into();
        self
    }

    pub fn kind(mut self, k: impl Into<String>) -> Self {
        self.kind = k.into();
        self
    }

    pub fn tag(mut self, t: impl Into<String>) -> Self {
        self.tag = t.into();
        self
    }

    pub fn price(mut self, p: f64) -> Self {
        self.price = p;
        self
    }

    pub fn quantity(mut self, q: i64) -> Self {
        self.quantity = q;
        self
    }

    pub fn specs(mut self, s: serde_json::Value) -> Self {
        self.specs = Some(s);
        self
    }

    /// The client-supplied id, if any. Only an absent or exactly empty id
    /// means create; the id is otherwise used verbatim.
    pub fn existing_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Result of a successful switch upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    pub id: String,
    pub created: bool,
}

/// One page of a filtered listing, plus the number of rows matching the filter.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct Stats {
    pub switches: usize,
    pub keywords: usize,
    pub deleted_keywords: usize,
}

pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn validate_keyword(word: &str, kind: &str) -> Result<(), CatalogError> {
    // any non-empty string, same as a switch studio
    if word.is_empty() {
        return Err(CatalogError::Validation("keyword word must not be empty".into()));
    }
    if kind.is_empty() {
        return Err(CatalogError::Validation("keyword type must not be empty".into()));
    }
    Ok(())
}

/// SQLite reads a negative LIMIT as "no limit".
fn sql_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(-1)
}

fn sql_offset(offset: i64) -> i64 {
    offset.max(0)
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS switches (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    studio TEXT NOT NULL,
    manufacturer TEXT NOT NULL DEFAULT '',
    type TEXT NOT NULL DEFAULT '',
    pic TEXT NOT NULL DEFAULT '',
    tag TEXT NOT NULL DEFAULT '',
    quantity INTEGER NOT NULL DEFAULT 0,
    price REAL NOT NULL DEFAULT 0,
    "desc" TEXT NOT NULL DEFAULT '',
    specs TEXT NOT NULL DEFAULT '{}',
    stash INTEGER NOT NULL DEFAULT 0,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_switches_name ON switches(name);
CREATE INDEX IF NOT EXISTS idx_switches_update_time ON switches(update_time);

CREATE TABLE IF NOT EXISTS keywords (
    word TEXT NOT NULL,
    type TEXT NOT NULL,
    rank INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    memo TEXT,
    create_time INTEGER NOT NULL,
    update_time INTEGER NOT NULL,
    PRIMARY KEY (word, type)
);
CREATE INDEX IF NOT EXISTS idx_keywords_type ON keywords(type, deleted, create_time);
"#;

/// SQLite-backed switch catalog and keyword store.
pub struct CatalogDB {
    pool: Pool<SqliteConnectionManager>,
    ids: IdWorker,
}

impl CatalogDB {
    fn conn(&self) -> Result<PooledConn, CatalogError> {
        self.pool.get().map_err(|e| CatalogError::Internal(format!("pool: {e}")))
    }

    /// Open (or create) a database at the given path.
    /// `:memory:` gives each call its own private in-memory database.
    pub fn open(path: &str) -> Result<Self, CatalogError> {
        let pool_size = if path == ":memory:" { 2 } else { 8 };
        let manager = if path == ":memory:" {
            // Shared cache so all pool connections see the same in-memory DB.
            let name = uuid::Uuid::new_v4().to_string();
            SqliteConnectionManager::file(format!("file:{name}?mode=memory&cache=shared"))
        } else {
            SqliteConnectionManager::file(path)
        };
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(BusyTimeoutCustomizer))
            .build(manager)
            .map_err(|e| CatalogError::Internal(format!("pool: {e}")))?;

        let conn = pool.get().map_err(|e| CatalogError::Internal(e.to_string()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        drop(conn);

        Ok(Self { pool, ids: IdWorker::default() })
    }

    /// Replace the id worker, e.g. to give each instance its own worker id.
    pub fn with_id_worker(mut self, ids: IdWorker) -> Self {
        self.ids = ids;
        self
    }

    pub fn stats(&self) -> Result<Stats, CatalogError> {
        let c = self.conn()?;
        let switches: i64 = c.query_row("SELECT COUNT(*) FROM switches", [], |r| r.get(0))?;
        let (keywords, deleted): (i64, i64) = c.query_row(
            "SELECT COALESCE(SUM(deleted = 0), 0), COALESCE(SUM(deleted != 0), 0) FROM keywords",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        Ok(Stats {
            switches: switches as usize,
            keywords: keywords as usize,
            deleted_keywords: deleted as usize,
        })
    }
}

fn row_to_keyword(row: &rusqlite::Row) -> rusqlite::Result<Keyword> {
    Ok(Keyword {
        word: row.get("word")?,
        kind: row.get("type")?,
        rank: row.get("rank")?,
        deleted: row.get::<_, i64>("deleted")? != 0,
        memo: row.get("memo")?,
        create_time: row.get("create_time")?,
        update_time: row.get("update_time")?,
    })
}

fn row_to_switch(row: &rusqlite::Row) -> rusqlite::Result<Switch> {
    let specs_raw: String = row.get("specs")?;
    let specs = serde_json::from_str(&specs_raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index("specs").unwrap_or(0),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    Ok(Switch {
        id: row.get("id")?,
        name: row.get("name")?,
        studio: row.get("studio")?,
        manufacturer: row.get("manufacturer")?,
        kind: row.get("type")?,
        pic: row.get("pic")?,
        tag: row.get("tag")?,
        quantity: row.get("quantity")?,
        price: row.get("price")?,
        desc: row.get("desc")?,
        specs,
        stash: row.get::<_, i64>("stash")? != 0,
        create_time: row.get("create_time")?,
        update_time: row.get("update_time")?,
    })
}
