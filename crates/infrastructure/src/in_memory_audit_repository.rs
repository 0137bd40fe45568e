use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use custodia_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
};
use custodia_core::AppResult;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory audit log used by the memory storage backend.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.entries.write().await.push(AuditLogEntry {
            event_id: Uuid::new_v4().to_string(),
            subject: event.subject,
            action: event.action.as_str().to_owned(),
            resource_type: event.resource_type,
            resource_id: event.resource_id,
            detail: event.detail,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let action = query.action.map(|action| action.as_str());
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|entry| action.is_none_or(|action| entry.action == action))
            .filter(|entry| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| entry.subject == subject)
            })
            .skip(query.offset)
            .take(query.limit.clamp(1, 200))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use custodia_application::{
        AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository,
    };
    use custodia_domain::AuditAction;

    use super::InMemoryAuditRepository;

    #[tokio::test]
    async fn newest_entries_come_first() {
        let repository = InMemoryAuditRepository::new();
        for (resource_id, action) in [
            ("role-1", AuditAction::RoleCreated),
            ("role-1", AuditAction::RoleEdited),
        ] {
            let appended = repository
                .append_event(AuditEvent {
                    subject: "admin".to_owned(),
                    action,
                    resource_type: "role".to_owned(),
                    resource_id: resource_id.to_owned(),
                    detail: None,
                })
                .await;
            assert!(appended.is_ok());
        }

        let entries = repository
            .list_recent_entries(AuditLogQuery {
                limit: 10,
                offset: 0,
                action: None,
                subject: Some("admin".to_owned()),
            })
            .await
            .unwrap_or_else(|_| unreachable!());

        let actions: Vec<&str> = entries.iter().map(|entry| entry.action.as_str()).collect();
        assert_eq!(
            actions,
            vec!["permissions.role_edited", "permissions.role_created"]
        );
    }
}
