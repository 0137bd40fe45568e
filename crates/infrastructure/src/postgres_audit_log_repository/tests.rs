use custodia_application::{
    AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository,
};
use custodia_domain::AuditAction;

use crate::PostgresAuditRepository;
use crate::postgres_test_support::{test_pool, unique};

use super::PostgresAuditLogRepository;

#[tokio::test]
async fn recent_entries_filter_by_subject_and_action() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let writer = PostgresAuditRepository::new(pool.clone());
    let reader = PostgresAuditLogRepository::new(pool);
    let subject = unique("auditor");

    for action in [AuditAction::AclCreated, AuditAction::AclDeleted] {
        let appended = writer
            .append_event(AuditEvent {
                subject: subject.clone(),
                action,
                resource_type: "access_control_list".to_owned(),
                resource_id: unique("acl"),
                detail: None,
            })
            .await;
        assert!(appended.is_ok());
    }

    let all = reader
        .list_recent_entries(AuditLogQuery {
            limit: 10,
            offset: 0,
            action: None,
            subject: Some(subject.clone()),
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|entry| entry.created_at.ends_with('Z')));

    let deleted = reader
        .list_recent_entries(AuditLogQuery {
            limit: 10,
            offset: 0,
            action: Some(AuditAction::AclDeleted),
            subject: Some(subject),
        })
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].action, "acls.acl_deleted");
}
