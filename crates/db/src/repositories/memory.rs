use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use registrar_core::audit::{AuditEvent, AuditOperation, AuditOutcome, AuditSink};
use registrar_core::domain::registration::{
    NewRegistration, Registration, RegistrationId, RegistrationPatch,
};
use registrar_core::store::{RegistrationStore, StoreError};

/// In-memory store used by tests and the demo path. Mirrors the SQL store's
/// observable behavior, including the unique-email constraint and audit
/// emission.
#[derive(Default)]
pub struct InMemoryRegistrationStore {
    registrations: RwLock<HashMap<String, Registration>>,
    next_id: AtomicI64,
    audit: Option<Arc<dyn AuditSink>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audit_sink(sink: Arc<dyn AuditSink>) -> Self {
        Self { audit: Some(sink), ..Self::default() }
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit {
            sink.emit(event);
        }
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, registration: NewRegistration) -> Result<Registration, StoreError> {
        let mut registrations = self.registrations.write().await;
        if registrations.contains_key(&registration.email) {
            return Err(StoreError::DuplicateEmail(registration.email));
        }

        let now = Utc::now();
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let record = Registration {
            id,
            full_name: registration.full_name,
            email: registration.email,
            phone_number: registration.phone_number,
            date_of_birth: registration.date_of_birth,
            address: registration.address,
            created_at: now,
            updated_at: now,
        };
        registrations.insert(record.email.clone(), record.clone());

        self.emit(
            AuditEvent::new(AuditOperation::Create, Some(id), AuditOutcome::Success)
                .with_detail("email", record.email.clone()),
        );

        Ok(record)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>, StoreError> {
        let registrations = self.registrations.read().await;
        let found = registrations.get(email).cloned();

        if let Some(record) = &found {
            self.emit(
                AuditEvent::new(AuditOperation::Read, Some(record.id), AuditOutcome::Success)
                    .with_detail("email", email),
            );
        }

        Ok(found)
    }

    async fn update(
        &self,
        email: &str,
        patch: RegistrationPatch,
    ) -> Result<Option<Registration>, StoreError> {
        let mut registrations = self.registrations.write().await;
        let Some(mut record) = registrations.get(email).cloned() else {
            return Ok(None);
        };

        if let Some(new_email) = &patch.email {
            if new_email != email && registrations.contains_key(new_email) {
                return Err(StoreError::DuplicateEmail(new_email.clone()));
            }
        }

        let mut updated_fields = Vec::new();
        if let Some(full_name) = patch.full_name {
            record.full_name = full_name;
            updated_fields.push("full_name");
        }
        if let Some(new_email) = patch.email {
            record.email = new_email;
            updated_fields.push("email");
        }
        if let Some(phone_number) = patch.phone_number {
            record.phone_number = phone_number;
            updated_fields.push("phone_number");
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            record.date_of_birth = date_of_birth;
            updated_fields.push("date_of_birth");
        }
        if let Some(address) = patch.address {
            record.address = address;
            updated_fields.push("address");
        }

        if !updated_fields.is_empty() {
            record.updated_at = Utc::now();
        }

        // Re-key when the email itself changed.
        registrations.remove(email);
        registrations.insert(record.email.clone(), record.clone());

        self.emit(
            AuditEvent::new(AuditOperation::Update, Some(record.id), AuditOutcome::Success)
                .with_detail("updated_fields", updated_fields.join(",")),
        );

        Ok(Some(record))
    }

    async fn delete(&self, email: &str) -> Result<bool, StoreError> {
        let mut registrations = self.registrations.write().await;
        let removed = registrations.remove(email);

        if let Some(record) = &removed {
            self.emit(
                AuditEvent::new(AuditOperation::Delete, Some(record.id), AuditOutcome::Success)
                    .with_detail("email", email),
            );
        }

        Ok(removed.is_some())
    }
}
