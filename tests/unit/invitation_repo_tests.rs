//! Unit tests for invitation persistence.

use std::sync::Arc;

use chrono::{Duration, Utc};

use lesson_admin::models::invitation::{Invitation, InvitationStatus};
use lesson_admin::models::user::Role;
use lesson_admin::models::PageRequest;
use lesson_admin::persistence::db;
use lesson_admin::persistence::invitation_repo::InvitationRepo;
use lesson_admin::AppError;

async fn repo() -> InvitationRepo {
    let db = Arc::new(db::connect_memory().await.expect("db connect"));
    InvitationRepo::new(db)
}

fn invitation(email: &str, hash: &str) -> Invitation {
    Invitation::new(
        email.into(),
        Role::Reviewer,
        Some("school-1".into()),
        "admin-1".into(),
        hash.into(),
        7,
    )
}

#[tokio::test]
async fn create_and_lookup_by_id_and_token() {
    let repo = repo().await;
    let created = repo
        .create(&invitation("a@example.org", "hash-a"))
        .await
        .expect("create");

    let by_id = repo.get_by_id(&created.id).await.expect("get").expect("row");
    assert_eq!(by_id, created);

    let by_token = repo
        .get_by_token_hash("hash-a")
        .await
        .expect("get")
        .expect("row");
    assert_eq!(by_token.id, created.id);
    assert!(repo.get_by_token_hash("other").await.expect("get").is_none());
}

#[tokio::test]
async fn pending_lookup_ignores_closed_invitations() {
    let repo = repo().await;
    let created = repo
        .create(&invitation("a@example.org", "hash-a"))
        .await
        .expect("create");
    assert!(repo
        .get_pending_for_email("a@example.org")
        .await
        .expect("get")
        .is_some());

    repo.update_status(&created.id, InvitationStatus::Revoked)
        .await
        .expect("revoke");
    assert!(repo
        .get_pending_for_email("a@example.org")
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn mark_accepted_only_once() {
    let repo = repo().await;
    let created = repo
        .create(&invitation("a@example.org", "hash-a"))
        .await
        .expect("create");

    repo.mark_accepted(&created.id, Utc::now())
        .await
        .expect("accept");
    let stored = repo.get_by_id(&created.id).await.expect("get").expect("row");
    assert_eq!(stored.status, InvitationStatus::Accepted);
    assert!(stored.accepted_at.is_some());

    let err = repo
        .mark_accepted(&created.id, Utc::now())
        .await
        .expect_err("second accept");
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn renew_replaces_token_and_expiry() {
    let repo = repo().await;
    let created = repo
        .create(&invitation("a@example.org", "hash-a"))
        .await
        .expect("create");
    let expires_at = Utc::now() + Duration::days(14);

    repo.renew(&created.id, "hash-b", expires_at)
        .await
        .expect("renew");

    assert!(repo.get_by_token_hash("hash-a").await.expect("get").is_none());
    let stored = repo
        .get_by_token_hash("hash-b")
        .await
        .expect("get")
        .expect("row");
    assert_eq!(stored.expires_at, expires_at);
}

#[tokio::test]
async fn list_pages_newest_first() {
    let repo = repo().await;
    for (i, email) in ["a@example.org", "b@example.org", "c@example.org"]
        .iter()
        .enumerate()
    {
        let mut inv = invitation(email, &format!("hash-{i}"));
        inv.created_at = Utc::now() - Duration::hours(10 - i64::try_from(i).expect("small"));
        repo.create(&inv).await.expect("create");
    }

    let page = repo
        .list(None, PageRequest::new(Some(1), Some(2)))
        .await
        .expect("list");
    assert_eq!(page.total, 3);
    let emails: Vec<_> = page.items.iter().map(|i| i.email.as_str()).collect();
    assert_eq!(emails, ["c@example.org", "b@example.org"]);

    let revoked = repo
        .list(Some(InvitationStatus::Revoked), PageRequest::default())
        .await
        .expect("list");
    assert_eq!(revoked.total, 0);
    assert!(revoked.items.is_empty());
}
