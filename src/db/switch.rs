//! Switch catalog: upsert with name uniqueness, search and pagination.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, warn};

use super::keyword::ensure_keyword_in;
use super::*;

const SEARCH_CLAUSE: &str = "(?1 IS NULL OR instr(name, ?1) > 0 OR instr(studio, ?1) > 0 \
     OR instr(manufacturer, ?1) > 0 OR instr(tag, ?1) > 0)";

/// Id of the record that currently owns `name`, if any.
fn name_owner_in(conn: &Connection, name: &str) -> Result<Option<String>, CatalogError> {
    let id = conn
        .query_row("SELECT id FROM switches WHERE name = ?1", params![name], |r| r.get(0))
        .optional()?;
    Ok(id)
}

/// Map a unique-index rejection on `name` to the domain error for this path.
fn conflict_or(e: rusqlite::Error, conflict: CatalogError) -> CatalogError {
    if is_unique_violation(&e) {
        conflict
    } else {
        CatalogError::Database(e)
    }
}

impl CatalogDB {
    /// Create or update a switch.
    ///
    /// The studio keyword is registered before the name check and is kept
    /// even when the write is then rejected. The name check and the write
    /// share one immediate transaction, and a unique index on `name` catches
    /// anything that slips between concurrent writers.
    pub fn upsert_switch(&self, input: SwitchInput) -> Result<UpsertOutcome, CatalogError> {
        if input.studio.is_empty() {
            return Err(CatalogError::EmptyStudio);
        }
        let specs = match &input.specs {
            Some(v) => serde_json::to_string(v).map_err(|e| CatalogError::Validation(format!("specs: {e}")))?,
            None => "{}".to_string(),
        };

        let mut conn = self.conn()?;
        if ensure_keyword_in(&conn, &input.studio, STUDIO_KEYWORD_TYPE)? {
            debug!(studio = %input.studio, "studio keyword registered");
        }

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let owner = name_owner_in(&tx, &input.name)?;
        let now = now_ms();

        let outcome = match input.existing_id() {
            Some(id) => {
                if owner.as_deref().is_some_and(|o| o != id) {
                    return Err(CatalogError::DuplicateName);
                }
                let n = tx
                    .execute(
                        "UPDATE switches SET name = ?1, studio = ?2, manufacturer = ?3, type = ?4, \
                         pic = ?5, tag = ?6, quantity = ?7, price = ?8, \"desc\" = ?9, specs = ?10, \
                         stash = ?11, update_time = ?12 WHERE id = ?13",
                        params![
                            input.name,
                            input.studio,
                            input.manufacturer,
                            input.kind,
                            input.pic,
                            input.tag,
                            input.quantity,
                            input.price,
                            input.desc,
                            specs,
                            input.stash,
                            now,
                            id,
                        ],
                    )
                    .map_err(|e| conflict_or(e, CatalogError::DuplicateName))?;
                if n == 0 {
                    warn!(id, "update matched no switch");
                } else {
                    debug!(id, name = %input.name, "switch updated");
                }
                UpsertOutcome { id: id.to_string(), created: false }
            }
            None => {
                if owner.is_some() {
                    return Err(CatalogError::NameExists);
                }
                let id = self.ids.next_id().to_string();
                tx.execute(
                    "INSERT INTO switches \
                     (id, name, studio, manufacturer, type, pic, tag, quantity, price, \"desc\", \
                      specs, stash, create_time, update_time) \
                     VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?13)",
                    params![
                        id,
                        input.name,
                        input.studio,
                        input.manufacturer,
                        input.kind,
                        input.pic,
                        input.tag,
                        input.quantity,
                        input.price,
                        input.desc,
                        specs,
                        input.stash,
                        now,
                    ],
                )
                .map_err(|e| conflict_or(e, CatalogError::NameExists))?;
                debug!(id = %id, name = %input.name, "switch created");
                UpsertOutcome { id, created: true }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn get_switch(&self, id: &str) -> Result<Option<Switch>, CatalogError> {
        let sw = self
            .conn()?
            .query_row("SELECT * FROM switches WHERE id = ?1", params![id], row_to_switch)
            .optional()?;
        Ok(sw)
    }

    /// Most recently updated first. `search` is a case-sensitive substring
    /// matched against name, studio, manufacturer and tag. `total` counts every
    /// match, ignoring `offset` and `limit`.
    pub fn list_switches(
        &self,
        offset: i64,
        limit: i64,
        search: Option<&str>,
    ) -> Result<Page<Switch>, CatalogError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM switches WHERE {SEARCH_CLAUSE} \
             ORDER BY update_time DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))?;
        let items = stmt
            .query_map(params![search, limit, sql_offset(offset)], row_to_switch)?
            .collect::<Result<Vec<_>, _>>()?;
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM switches WHERE {SEARCH_CLAUSE}"),
            params![search],
            |r| r.get(0),
        )?;
        Ok(Page { items, total: total as usize })
    }
}
