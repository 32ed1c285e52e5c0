use crate::database::models::{ActivityAction, ActivityEntry};
use crate::database::{Database, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row, ToSql};

/// Filter for ledger queries. All fields are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub session_id: Option<String>,
    pub identity_id: Option<i64>,
    pub action: Option<ActivityAction>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ActivityRepository {
    db: Database,
}

impl ActivityRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Append one audit entry. The ledger records history and never
    /// deduplicates: rapid or repeated entries are all kept.
    pub fn append(
        &self,
        session_id: &str,
        identity_id: i64,
        action: ActivityAction,
        details: Option<serde_json::Value>,
    ) -> Result<ActivityEntry, StoreError> {
        let now = Utc::now().to_rfc3339();
        let details_json = details
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let conn = self.db.conn()?;

        let known: i64 = conn.query_row(
            "SELECT COUNT(*) FROM identities WHERE id = ?1",
            params![identity_id],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(StoreError::UnknownIdentity(identity_id));
        }

        conn.execute(
            "INSERT INTO activity_entries (session_id, identity_id, action, occurred_at, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                identity_id,
                String::from(action),
                now,
                details_json,
            ],
        )?;

        Ok(ActivityEntry {
            id: conn.last_insert_rowid(),
            session_id: session_id.to_string(),
            identity_id,
            action,
            occurred_at: now,
            details,
        })
    }

    /// Query the ledger, ordered by `occurred_at` ascending with the entry id
    /// as tie-break so same-session entries come back in submission order.
    /// Each call re-reads current state.
    pub fn query(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEntry>, StoreError> {
        let mut sql = String::from(
            "SELECT id, session_id, identity_id, action, occurred_at, details
             FROM activity_entries",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(session_id) = &filter.session_id {
            values.push(Box::new(session_id.clone()));
            clauses.push(format!("session_id = ?{}", values.len()));
        }
        if let Some(identity_id) = filter.identity_id {
            values.push(Box::new(identity_id));
            clauses.push(format!("identity_id = ?{}", values.len()));
        }
        if let Some(action) = filter.action {
            values.push(Box::new(String::from(action)));
            clauses.push(format!("action = ?{}", values.len()));
        }
        if let Some(since) = &filter.since {
            values.push(Box::new(since.to_rfc3339()));
            clauses.push(format!("occurred_at >= ?{}", values.len()));
        }
        if let Some(until) = &filter.until {
            values.push(Box::new(until.to_rfc3339()));
            clauses.push(format!("occurred_at <= ?{}", values.len()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY occurred_at ASC, id ASC");

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let raw: Vec<(i64, String, i64, String, String, Option<String>)> = stmt
            .query_map(&param_refs[..], row_to_raw)?
            .collect::<rusqlite::Result<_>>()?;

        let mut entries = Vec::with_capacity(raw.len());
        for (id, session_id, identity_id, action, occurred_at, details) in raw {
            entries.push(ActivityEntry {
                id,
                session_id,
                identity_id,
                action: ActivityAction::from(action),
                occurred_at,
                details: details
                    .map(|json| serde_json::from_str(&json))
                    .transpose()?,
            });
        }

        Ok(entries)
    }
}

#[allow(clippy::type_complexity)]
fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<(i64, String, i64, String, String, Option<String>)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}
