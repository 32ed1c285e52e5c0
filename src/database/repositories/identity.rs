use crate::database::models::{ContentIdentity, ContentKind};
use crate::database::{Database, StoreError};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};

const IDENTITY_COLUMNS: &str = "id, fingerprint, source_name, content_kind, byte_size, \
     width, height, first_seen_at, last_seen_at, seen_count";

#[derive(Clone)]
pub struct IdentityRepository {
    db: Database,
}

impl IdentityRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Look up the identity for `fingerprint`, creating it on first sight.
    ///
    /// Returns the identity plus `created = true` when this call inserted the
    /// row. A repeat upload bumps `seen_count` and `last_seen_at` but leaves
    /// `source_name` and `content_kind` from the first sighting untouched.
    ///
    /// Runs as a single conditional insert against the UNIQUE fingerprint
    /// constraint, so two concurrent first uploads of the same content cannot
    /// both create a row; the loser observes `created = false`.
    pub fn get_or_create(
        &self,
        fingerprint: &str,
        source_name: &str,
        content_kind: ContentKind,
        byte_size: i64,
        dimensions: Option<(u32, u32)>,
    ) -> Result<(ContentIdentity, bool), StoreError> {
        if fingerprint.is_empty() {
            return Err(StoreError::MalformedInput("empty fingerprint".to_string()));
        }
        if byte_size < 0 {
            return Err(StoreError::MalformedInput(format!(
                "negative byte size: {}",
                byte_size
            )));
        }

        let now = Utc::now().to_rfc3339();
        let (width, height) = match dimensions {
            Some((w, h)) => (Some(w), Some(h)),
            None => (None, None),
        };

        let conn = self.db.conn()?;
        let identity = conn.query_row(
            &format!(
                "INSERT INTO identities
                     (fingerprint, source_name, content_kind, byte_size,
                      width, height, first_seen_at, last_seen_at, seen_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 1)
                 ON CONFLICT(fingerprint) DO UPDATE SET
                     last_seen_at = excluded.last_seen_at,
                     seen_count = seen_count + 1
                 RETURNING {IDENTITY_COLUMNS}"
            ),
            params![
                fingerprint,
                source_name,
                String::from(content_kind),
                byte_size,
                width,
                height,
                now,
            ],
            row_to_identity,
        )?;

        // A freshly inserted row is the only way to observe seen_count == 1.
        let created = identity.seen_count == 1;
        Ok((identity, created))
    }

    pub fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<ContentIdentity>, StoreError> {
        let conn = self.db.conn()?;

        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE fingerprint = ?1"),
            params![fingerprint],
            row_to_identity,
        )
        .optional()
        .map_err(StoreError::Database)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<ContentIdentity>, StoreError> {
        let conn = self.db.conn()?;

        conn.query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
            params![id],
            row_to_identity,
        )
        .optional()
        .map_err(StoreError::Database)
    }

    pub fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.db.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM identities WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }
}

fn row_to_identity(row: &Row<'_>) -> rusqlite::Result<ContentIdentity> {
    Ok(ContentIdentity {
        id: row.get(0)?,
        fingerprint: row.get(1)?,
        source_name: row.get(2)?,
        content_kind: ContentKind::from(row.get::<_, String>(3)?),
        byte_size: row.get(4)?,
        width: row.get(5)?,
        height: row.get(6)?,
        first_seen_at: row.get(7)?,
        last_seen_at: row.get(8)?,
        seen_count: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> IdentityRepository {
        IdentityRepository::new(Database::open_in_memory().unwrap())
    }

    #[test]
    fn test_first_upload_creates_identity() {
        let repo = test_repo();

        let (identity, created) = repo
            .get_or_create("abc123", "sheet-01.jpg", ContentKind::Face, 2048, Some((1920, 1080)))
            .unwrap();

        assert!(created);
        assert_eq!(identity.fingerprint, "abc123");
        assert_eq!(identity.seen_count, 1);
        assert_eq!(identity.width, Some(1920));
        assert_eq!(identity.height, Some(1080));
        assert_eq!(identity.first_seen_at, identity.last_seen_at);
    }

    #[test]
    fn test_repeat_upload_returns_same_identity() {
        let repo = test_repo();

        let (first, created) = repo
            .get_or_create("abc123", "sheet-01.jpg", ContentKind::Face, 2048, None)
            .unwrap();
        assert!(created);

        let (second, created) = repo
            .get_or_create("abc123", "sheet-01-copy.jpg", ContentKind::Face, 2048, None)
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.seen_count, 2);
        // First sighting wins the display label.
        assert_eq!(second.source_name, "sheet-01.jpg");
    }

    #[test]
    fn test_unknown_dimensions_stay_unknown() {
        let repo = test_repo();

        let (identity, _) = repo
            .get_or_create("abc123", "sheet-01.jpg", ContentKind::Generic, 2048, None)
            .unwrap();
        assert_eq!(identity.width, None);
        assert_eq!(identity.height, None);

        let found = repo.find_by_fingerprint("abc123").unwrap().unwrap();
        assert_eq!(found.width, None);
        assert_eq!(found.height, None);
    }

    #[test]
    fn test_empty_fingerprint_rejected() {
        let repo = test_repo();

        let result = repo.get_or_create("", "sheet.jpg", ContentKind::Face, 100, None);
        assert!(matches!(result, Err(StoreError::MalformedInput(_))));
    }

    #[test]
    fn test_negative_byte_size_rejected() {
        let repo = test_repo();

        let result = repo.get_or_create("abc123", "sheet.jpg", ContentKind::Face, -1, None);
        assert!(matches!(result, Err(StoreError::MalformedInput(_))));
    }

    #[test]
    fn test_find_by_fingerprint_missing() {
        let repo = test_repo();
        assert!(repo.find_by_fingerprint("nope").unwrap().is_none());
    }

    #[test]
    fn test_content_kind_round_trip() {
        let repo = test_repo();

        let (identity, _) = repo
            .get_or_create("abc123", "sheet.jpg", ContentKind::Verso, 100, None)
            .unwrap();
        assert_eq!(identity.content_kind, ContentKind::Verso);

        let found = repo.find_by_id(identity.id).unwrap().unwrap();
        assert_eq!(found.content_kind, ContentKind::Verso);
    }
}
