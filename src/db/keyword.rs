//! Keyword vocabulary: typed words with rank, soft delete and resurrection.

use rusqlite::{params, Connection, OptionalExtension};

use super::*;

/// Insert `(word, kind)` with rank 0 unless a row for it already exists.
/// An existing soft-deleted row is left alone. Returns whether a row was created.
pub(super) fn ensure_keyword_in(conn: &Connection, word: &str, kind: &str) -> Result<bool, CatalogError> {
    let now = now_ms();
    let n = conn.execute(
        "INSERT OR IGNORE INTO keywords (word, type, rank, deleted, memo, create_time, update_time) \
         VALUES (?1, ?2, 0, 0, NULL, ?3, ?3)",
        params![word, kind, now],
    )?;
    Ok(n > 0)
}

fn get_keyword_in(conn: &Connection, word: &str, kind: &str) -> Result<Option<Keyword>, CatalogError> {
    let kw = conn
        .query_row(
            "SELECT * FROM keywords WHERE word = ?1 AND type = ?2",
            params![word, kind],
            row_to_keyword,
        )
        .optional()?;
    Ok(kw)
}

impl CatalogDB {
    pub fn ensure_keyword(&self, word: &str, kind: &str) -> Result<bool, CatalogError> {
        validate_keyword(word, kind)?;
        let created = ensure_keyword_in(&*self.conn()?, word, kind)?;
        if created {
            tracing::debug!(word, kind, "keyword registered");
        }
        Ok(created)
    }

    /// Fetch a keyword regardless of its deleted flag.
    pub fn get_keyword(&self, word: &str, kind: &str) -> Result<Option<Keyword>, CatalogError> {
        get_keyword_in(&*self.conn()?, word, kind)
    }

    /// Create the keyword, or overwrite rank/memo and clear `deleted` if it exists.
    pub fn upsert_keyword(&self, input: KeywordInput) -> Result<Keyword, CatalogError> {
        validate_keyword(&input.word, &input.kind)?;
        let conn = self.conn()?;
        let now = now_ms();
        conn.execute(
            "INSERT INTO keywords (word, type, rank, deleted, memo, create_time, update_time) \
             VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5) \
             ON CONFLICT(word, type) DO UPDATE SET \
             rank = excluded.rank, memo = excluded.memo, deleted = 0, update_time = excluded.update_time",
            params![input.word, input.kind, input.rank, input.memo, now],
        )?;
        get_keyword_in(&conn, &input.word, &input.kind)?
            .ok_or_else(|| CatalogError::Internal("keyword vanished after upsert".into()))
    }

    /// Mark every row for `(word, kind)` deleted. Zero matches is not an error.
    pub fn soft_delete_keyword(&self, word: &str, kind: &str) -> Result<usize, CatalogError> {
        let n = self.conn()?.execute(
            "UPDATE keywords SET deleted = 1 WHERE word = ?1 AND type = ?2",
            params![word, kind],
        )?;
        Ok(n)
    }

    /// Live words of one type, newest first.
    pub fn list_keyword_words(&self, kind: &str, search: Option<&str>) -> Result<Vec<String>, CatalogError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT word FROM keywords \
             WHERE type = ?1 AND deleted = 0 AND (?2 IS NULL OR instr(word, ?2) > 0) \
             ORDER BY create_time DESC, rowid DESC",
        )?;
        let words = stmt
            .query_map(params![kind, search], |r| r.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(words)
    }

    /// One page of live keywords of one type plus the total match count.
    /// A `None` or negative limit returns everything after `offset`.
    pub fn page_keywords(
        &self,
        kind: &str,
        search: Option<&str>,
        offset: i64,
        limit: Option<i64>,
    ) -> Result<Page<Keyword>, CatalogError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM keywords \
             WHERE type = ?1 AND deleted = 0 AND (?2 IS NULL OR instr(word, ?2) > 0) \
             ORDER BY create_time DESC, rowid DESC LIMIT ?3 OFFSET ?4",
        )?;
        let items = stmt
            .query_map(
                params![kind, search, sql_limit(limit), sql_offset(offset)],
                row_to_keyword,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM keywords \
             WHERE type = ?1 AND deleted = 0 AND (?2 IS NULL OR instr(word, ?2) > 0)",
            params![kind, search],
            |r| r.get(0),
        )?;
        Ok(Page { items, total: total as usize })
    }
}
