use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use registrar_core::audit::AuditOperation;
use registrar_core::domain::registration::{
    NewRegistration, Registration, RegistrationId, RegistrationPatch,
};
use registrar_core::store::{RegistrationStore, StoreError};

use crate::DbPool;

const REGISTRATION_COLUMNS: &str =
    "id, full_name, email, phone_number, date_of_birth, address, created_at, updated_at";

/// SQLite-backed registration store. Every operation that touches a record
/// also writes an `audit_log` row; the unique index on `email` is the
/// authority on duplicates.
pub struct SqlRegistrationStore {
    pool: DbPool,
}

impl SqlRegistrationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Best-effort audit write. Audit failure never fails the operation
    /// being audited; it is logged and dropped.
    async fn record_audit(
        &self,
        operation: AuditOperation,
        registration_id: Option<RegistrationId>,
        details: serde_json::Value,
    ) {
        let result = sqlx::query(
            "INSERT INTO audit_log (registration_id, operation, operation_details) \
             VALUES (?, ?, ?)",
        )
        .bind(registration_id.map(|id| id.0))
        .bind(operation.as_str())
        .bind(details.to_string())
        .execute(&self.pool)
        .await;

        if let Err(error) = result {
            tracing::warn!(
                event_name = "store.audit_write_failed",
                operation = operation.as_str(),
                error = %error,
                "audit log write failed; primary operation unaffected"
            );
        }
    }
}

#[async_trait]
impl RegistrationStore for SqlRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations \
             (full_name, email, phone_number, date_of_birth, address, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.phone_number)
        .bind(registration.date_of_birth)
        .bind(&registration.address)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, &registration.email))?;

        let created = Registration::from(row);
        self.record_audit(
            AuditOperation::Create,
            Some(created.id),
            json!({ "email": &created.email }),
        )
        .await;
        tracing::info!(
            event_name = "store.registration_created",
            registration_id = created.id.0,
            "created registration"
        );

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>, StoreError> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let found = Registration::from(row);
        self.record_audit(AuditOperation::Read, Some(found.id), json!({ "email": email })).await;

        Ok(Some(found))
    }

    async fn update(
        &self,
        email: &str,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>, StoreError> {
        if patch.is_empty() {
            tracing::warn!(event_name = "store.empty_update", "no fields to update");
            return self.find_by_email(email).await;
        }

        let mut assignments = Vec::new();
        let mut updated_fields = Vec::new();
        if patch.full_name.is_some() {
            assignments.push("full_name = ?");
            updated_fields.push("full_name");
        }
        if patch.email.is_some() {
            assignments.push("email = ?");
            updated_fields.push("email");
        }
        if patch.phone_number.is_some() {
            assignments.push("phone_number = ?");
            updated_fields.push("phone_number");
        }
        if patch.date_of_birth.is_some() {
            assignments.push("date_of_birth = ?");
            updated_fields.push("date_of_birth");
        }
        if patch.address.is_some() {
            assignments.push("address = ?");
            updated_fields.push("address");
        }
        assignments.push("updated_at = ?");

        let sql = format!(
            "UPDATE registrations SET {} WHERE email = ? RETURNING {REGISTRATION_COLUMNS}",
            assignments.join(", ")
        );

        let mut query = sqlx::query_as::<_, RegistrationRow>(&sql);
        if let Some(full_name) = &patch.full_name {
            query = query.bind(full_name);
        }
        if let Some(new_email) = &patch.email {
            query = query.bind(new_email);
        }
        if let Some(phone_number) = &patch.phone_number {
            query = query.bind(phone_number);
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            query = query.bind(date_of_birth);
        }
        if let Some(address) = &patch.address {
            query = query.bind(address);
        }
        query = query.bind(Utc::now()).bind(email);

        let conflicting_email = patch.email.as_deref().unwrap_or(email);
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| map_sqlx_error(error, conflicting_email))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let updated = Registration::from(row);
        self.record_audit(
            AuditOperation::Update,
            Some(updated.id),
            json!({ "updated_fields": updated_fields }),
        )
        .await;
        tracing::info!(
            event_name = "store.registration_updated",
            registration_id = updated.id.0,
            "updated registration"
        );

        Ok(Some(updated))
    }

    async fn delete(&self, email: &str) -> Result<bool, StoreError> {
        // Resolve the id first so the audit entry can reference it.
        let existing = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| StoreError::Backend(error.to_string()))?;

        let Some(existing) = existing else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM registrations WHERE email = ?")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|error| StoreError::Backend(error.to_string()))?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            self.record_audit(
                AuditOperation::Delete,
                Some(RegistrationId(existing.id)),
                json!({ "email": email }),
            )
            .await;
            tracing::info!(
                event_name = "store.registration_deleted",
                registration_id = existing.id,
                "deleted registration"
            );
        }

        Ok(deleted)
    }
}

fn map_sqlx_error(error: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        let message = db_error.message();
        if message.contains("UNIQUE constraint failed") && message.contains("registrations.email") {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::Backend(error.to_string())
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: i64,
    full_name: String,
    email: String,
    phone_number: String,
    date_of_birth: NaiveDate,
    address: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: RegistrationId(row.id),
            full_name: row.full_name,
            email: row.email,
            phone_number: row.phone_number,
            date_of_birth: row.date_of_birth,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sqlx::Row;

    use registrar_core::domain::registration::{NewRegistration, RegistrationPatch};
    use registrar_core::store::{RegistrationStore, StoreError};

    use super::SqlRegistrationStore;
    use crate::{connect_with_settings, migrations};

    async fn store_fixture() -> SqlRegistrationStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlRegistrationStore::new(pool)
    }

    fn alice() -> NewRegistration {
        NewRegistration {
            full_name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: "+14155551234".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1995, 3, 20).expect("valid date"),
            address: "456 Oak Ave".to_string(),
        }
    }

    async fn audit_operations(store: &SqlRegistrationStore) -> Vec<String> {
        sqlx::query("SELECT operation FROM audit_log ORDER BY id")
            .fetch_all(&store.pool)
            .await
            .expect("load audit rows")
            .into_iter()
            .map(|row| row.get::<String, _>("operation"))
            .collect()
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamps() {
        let store = store_fixture().await;

        let created = store.create(alice()).await.expect("create registration");

        assert!(created.id.0 >= 1);
        assert_eq!(created.email, "alice@example.com");
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_conflict_error() {
        let store = store_fixture().await;
        store.create(alice()).await.expect("first create");

        let error = store.create(alice()).await.expect_err("second create must conflict");

        assert_eq!(error, StoreError::DuplicateEmail("alice@example.com".to_string()));
    }

    #[tokio::test]
    async fn find_returns_none_for_unknown_email() {
        let store = store_fixture().await;
        let found = store.find_by_email("nobody@example.com").await.expect("find");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn partial_update_touches_only_the_given_field() {
        let store = store_fixture().await;
        let created = store.create(alice()).await.expect("create");

        let patch = RegistrationPatch {
            phone_number: Some("+14155559999".to_string()),
            ..Default::default()
        };
        let updated = store
            .update("alice@example.com", patch)
            .await
            .expect("update")
            .expect("record exists");

        assert_eq!(updated.phone_number, "+14155559999");
        assert_eq!(updated.full_name, created.full_name);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_of_missing_record_returns_none() {
        let store = store_fixture().await;
        let patch =
            RegistrationPatch { address: Some("1 Elm St, Springfield".to_string()), ..Default::default() };

        let updated = store.update("nobody@example.com", patch).await.expect("update");

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn empty_patch_returns_current_record_unchanged() {
        let store = store_fixture().await;
        let created = store.create(alice()).await.expect("create");

        let updated = store
            .update("alice@example.com", RegistrationPatch::default())
            .await
            .expect("update")
            .expect("record exists");

        assert_eq!(updated, created);
    }

    #[tokio::test]
    async fn delete_then_find_reports_not_found() {
        let store = store_fixture().await;
        store.create(alice()).await.expect("create");

        assert!(store.delete("alice@example.com").await.expect("delete"));
        assert!(store.find_by_email("alice@example.com").await.expect("find").is_none());
        assert!(!store.delete("alice@example.com").await.expect("second delete"));
    }

    #[tokio::test]
    async fn every_operation_leaves_an_audit_trail() {
        let store = store_fixture().await;
        store.create(alice()).await.expect("create");
        store.find_by_email("alice@example.com").await.expect("find");
        store
            .update(
                "alice@example.com",
                RegistrationPatch {
                    address: Some("789 Pine Rd, Oakland".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update");
        store.delete("alice@example.com").await.expect("delete");

        assert_eq!(audit_operations(&store).await, vec!["CREATE", "READ", "UPDATE", "DELETE"]);
    }
}
