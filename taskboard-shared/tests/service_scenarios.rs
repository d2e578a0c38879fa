/// Service-level scenarios against the in-memory store
///
/// These exercise the lifecycle controllers end to end: accounts, visibility,
/// admin authority, membership changes and attachment payload cleanup.
///
/// Run with: cargo test --test service_scenarios

use bytes::Bytes;
use std::sync::Arc;
use taskboard_shared::auth::context::AuthContext;
use taskboard_shared::auth::jwt::TokenSettings;
use taskboard_shared::blob::MemoryBlobStore;
use taskboard_shared::error::ServiceError;
use taskboard_shared::models::membership::ParticipantKind;
use taskboard_shared::models::ListOptions;
use taskboard_shared::services::{
    accounts, attachments, boards, cards, comments, lists, members, tags, ServiceContext,
};
use taskboard_shared::slug::Slug;
use taskboard_shared::store::memory::MemoryStore;
use taskboard_shared::store::Store;
use taskboard_shared::visibility::ParentResolution;

const SECRET: &str = "scenario-test-secret-at-least-32-bytes";

struct Harness {
    ctx: ServiceContext,
    blobs: Arc<MemoryBlobStore>,
}

fn harness(policy: ParentResolution) -> Harness {
    let blobs = Arc::new(MemoryBlobStore::new());
    let ctx = ServiceContext::new(
        Arc::new(MemoryStore::new()),
        blobs.clone(),
        TokenSettings::new(SECRET),
    )
    .with_parent_resolution(policy)
    .with_max_upload_bytes(1024);
    Harness { ctx, blobs }
}

async fn signup(ctx: &ServiceContext, first_name: &str) -> AuthContext {
    let email = format!("{}@example.com", first_name.to_lowercase());
    accounts::register(
        ctx,
        accounts::RegisterInput {
            email: email.clone(),
            password: "correct-horse".to_string(),
            password2: "correct-horse".to_string(),
            first_name: first_name.to_string(),
            sur_name: "Tester".to_string(),
        },
    )
    .await
    .expect("registration failed");

    let login = accounts::login(
        ctx,
        accounts::LoginInput {
            email,
            password: "correct-horse".to_string(),
        },
    )
    .await
    .expect("login failed");

    accounts::authenticate(ctx, &login.access_token)
        .await
        .expect("authentication failed")
}

async fn board(ctx: &ServiceContext, auth: &AuthContext, name: &str) -> Slug {
    boards::create(
        ctx,
        auth,
        boards::CreateBoardInput {
            name: name.to_string(),
            description: String::new(),
        },
    )
    .await
    .expect("board creation failed")
    .slug
}

async fn list(ctx: &ServiceContext, auth: &AuthContext, board: &Slug, name: &str) -> Slug {
    lists::create(
        ctx,
        auth,
        lists::CreateListInput {
            board: board.clone(),
            name: name.to_string(),
            description: String::new(),
        },
    )
    .await
    .expect("list creation failed")
    .slug
}

async fn card(ctx: &ServiceContext, auth: &AuthContext, list: &Slug, name: &str) -> Slug {
    cards::create(
        ctx,
        auth,
        cards::CreateCardInput {
            list: list.clone(),
            name: name.to_string(),
            description: String::new(),
        },
    )
    .await
    .expect("card creation failed")
    .slug
}

async fn add_member(ctx: &ServiceContext, admin: &AuthContext, board: &Slug, user: &AuthContext) {
    members::grant_board_member(
        ctx,
        admin,
        board,
        members::GrantMemberInput {
            user: Some(user.user_slug.clone()),
            email: None,
            is_admin: false,
        },
    )
    .await
    .expect("grant failed");
}

#[tokio::test]
async fn test_sprint_scenario_scoped() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;

    // Creator is the first participant of the list
    let participants = members::participants(&ctx, &alice, ParticipantKind::List, &todo)
        .await
        .unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].user, alice.user_slug);

    let result = lists::get(&ctx, &bob, &todo).await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));

    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;
    assert!(cards::get(&ctx, &bob, &fix_bug).await.is_err());

    let result = lists::create(
        &ctx,
        &bob,
        lists::CreateListInput {
            board: sprint.clone(),
            name: "Intruder".to_string(),
            description: String::new(),
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

#[tokio::test]
async fn test_sprint_scenario_global() {
    let Harness { ctx, .. } = harness(ParentResolution::Global);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;

    let result = lists::create(
        &ctx,
        &bob,
        lists::CreateListInput {
            board: sprint.clone(),
            name: "Intruder".to_string(),
            description: String::new(),
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));

    // Outsiders cannot comment through an unscoped parent lookup either
    let result = comments::create(
        &ctx,
        &bob,
        comments::CreateCommentInput {
            card: fix_bug,
            body: "drive-by".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_member_reads_but_cannot_administer() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;
    add_member(&ctx, &alice, &sprint, &bob).await;

    let visible = boards::list(&ctx, &bob, &ListOptions::default()).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].slug, sprint);

    let result = cards::create(
        &ctx,
        &bob,
        cards::CreateCardInput {
            list: todo.clone(),
            name: "Nope".to_string(),
            description: String::new(),
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));

    let result = boards::update(
        &ctx,
        &bob,
        &sprint,
        boards::UpdateBoardInput {
            name: Some("Mine now".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));

    let comment = comments::create(
        &ctx,
        &bob,
        comments::CreateCommentInput {
            card: fix_bug.clone(),
            body: "On it".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(comment.author, Some(bob.user_slug.clone()));
    assert_eq!(comment.card, fix_bug);

    let tag = tags::create(
        &ctx,
        &bob,
        tags::CreateTagInput {
            card: fix_bug.clone(),
            label: "  urgent ".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(tag.label, "urgent");
}

#[tokio::test]
async fn test_comment_mutation_author_or_admin() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;
    let carol = signup(&ctx, "Carol").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;
    add_member(&ctx, &alice, &sprint, &bob).await;
    add_member(&ctx, &alice, &sprint, &carol).await;

    let comment = comments::create(
        &ctx,
        &bob,
        comments::CreateCommentInput {
            card: fix_bug,
            body: "First".to_string(),
        },
    )
    .await
    .unwrap();

    let result = comments::update(
        &ctx,
        &carol,
        &comment.slug,
        comments::UpdateCommentInput {
            body: Some("Hijacked".to_string()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));

    let edited = comments::update(
        &ctx,
        &bob,
        &comment.slug,
        comments::UpdateCommentInput {
            body: Some("Edited".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(edited.body, "Edited");
    assert_eq!(edited.slug, comment.slug);

    comments::delete(&ctx, &alice, &comment.slug).await.unwrap();
    assert!(comments::get(&ctx, &bob, &comment.slug).await.is_err());
}

#[tokio::test]
async fn test_revoked_member_loses_visibility() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;
    let note = comments::create(
        &ctx,
        &alice,
        comments::CreateCommentInput {
            card: fix_bug.clone(),
            body: "Repro attached".to_string(),
        },
    )
    .await
    .unwrap();
    let log = attachments::create(
        &ctx,
        &alice,
        attachments::NewUpload {
            card: fix_bug.clone(),
            file_name: "crash.log".to_string(),
            content_type: None,
            payload: Bytes::from_static(b"panic"),
        },
    )
    .await
    .unwrap();
    let urgent = tags::create(
        &ctx,
        &alice,
        tags::CreateTagInput {
            card: fix_bug.clone(),
            label: "urgent".to_string(),
        },
    )
    .await
    .unwrap();

    add_member(&ctx, &alice, &sprint, &bob).await;
    assert!(lists::get(&ctx, &bob, &todo).await.is_ok());
    assert!(comments::get(&ctx, &bob, &note.slug).await.is_ok());
    assert!(attachments::get(&ctx, &bob, &log.slug).await.is_ok());
    assert!(tags::get(&ctx, &bob, &urgent.slug).await.is_ok());

    members::update_board_member(
        &ctx,
        &alice,
        &sprint,
        &bob.user_slug,
        members::UpdateMemberInput {
            is_active: Some(false),
            is_admin: None,
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        lists::get(&ctx, &bob, &todo).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        cards::get(&ctx, &bob, &fix_bug).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        comments::get(&ctx, &bob, &note.slug).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        attachments::get(&ctx, &bob, &log.slug).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        attachments::content(&ctx, &bob, &log.slug).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        tags::get(&ctx, &bob, &urgent.slug).await,
        Err(ServiceError::NotFound(_))
    ));

    let everything = ListOptions::default();
    let on_card = ListOptions {
        parent: Some(fix_bug.clone()),
        ..Default::default()
    };
    for options in [&everything, &on_card] {
        assert!(comments::list(&ctx, &bob, options).await.unwrap().is_empty());
        assert!(attachments::list(&ctx, &bob, options).await.unwrap().is_empty());
        assert!(tags::list(&ctx, &bob, options).await.unwrap().is_empty());
    }
    assert!(boards::list(&ctx, &bob, &everything)
        .await
        .unwrap()
        .is_empty());

    // The rows survive; the admin still sees the revoked membership
    let roster = members::board_members(&ctx, &alice, &sprint).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(roster.iter().any(|m| m.user == bob.user_slug && !m.is_active));
    assert_eq!(comments::list(&ctx, &alice, &on_card).await.unwrap().len(), 1);

    // Granting again reactivates
    add_member(&ctx, &alice, &sprint, &bob).await;
    assert!(lists::get(&ctx, &bob, &todo).await.is_ok());
    assert!(tags::get(&ctx, &bob, &urgent.slug).await.is_ok());
}

#[tokio::test]
async fn test_regrant_does_not_demote_admin() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let sprint = board(&ctx, &alice, "Sprint").await;

    // Re-granting herself without the admin flag must not strip her authority
    let regranted = members::grant_board_member(
        &ctx,
        &alice,
        &sprint,
        members::GrantMemberInput {
            user: Some(alice.user_slug.clone()),
            email: None,
            is_admin: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(regranted.is_admin, Some(true));
    let board_id = ctx.store().board_by_slug(&sprint).await.unwrap().unwrap().id;
    assert_eq!(ctx.store().count_board_admins(board_id).await.unwrap(), 1);

    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    assert!(lists::get(&ctx, &alice, &todo).await.is_ok());
}

#[tokio::test]
async fn test_last_admin_is_kept() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;
    let sprint = board(&ctx, &alice, "Sprint").await;

    let result = members::update_board_member(
        &ctx,
        &alice,
        &sprint,
        &alice.user_slug,
        members::UpdateMemberInput {
            is_active: None,
            is_admin: Some(false),
        },
    )
    .await;
    match result {
        Err(ServiceError::Validation(errors)) => assert_eq!(errors[0].field, "is_admin"),
        other => panic!("expected validation error, got {:?}", other),
    }

    // With a second admin the first may step down
    members::grant_board_member(
        &ctx,
        &alice,
        &sprint,
        members::GrantMemberInput {
            user: None,
            email: Some("BOB@example.com".to_string()),
            is_admin: true,
        },
    )
    .await
    .unwrap();

    let updated = members::update_board_member(
        &ctx,
        &alice,
        &sprint,
        &alice.user_slug,
        members::UpdateMemberInput {
            is_active: None,
            is_admin: Some(false),
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.is_admin, Some(false));

    // Alice is no longer an admin, so Bob holds the board
    let result = boards::delete(&ctx, &alice, &sprint).await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
    boards::delete(&ctx, &bob, &sprint).await.unwrap();
}

#[tokio::test]
async fn test_participants_must_be_board_members() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let bob = signup(&ctx, "Bob").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;

    let grant = members::GrantParticipantInput {
        user: Some(bob.user_slug.clone()),
        email: None,
    };
    let result =
        members::grant_participant(&ctx, &alice, ParticipantKind::Card, &fix_bug, grant.clone())
            .await;
    assert!(matches!(result, Err(ServiceError::Validation(_))));

    add_member(&ctx, &alice, &sprint, &bob).await;
    let added = members::grant_participant(&ctx, &alice, ParticipantKind::Card, &fix_bug, grant)
        .await
        .unwrap();
    assert!(added.is_active);
    assert_eq!(added.is_admin, None);

    let changed = members::update_participant(
        &ctx,
        &alice,
        ParticipantKind::Card,
        &fix_bug,
        &bob.user_slug,
        members::UpdateParticipantInput { is_active: false },
    )
    .await
    .unwrap();
    assert!(!changed.is_active);

    let result = members::grant_participant(
        &ctx,
        &bob,
        ParticipantKind::Card,
        &fix_bug,
        members::GrantParticipantInput {
            user: Some(alice.user_slug.clone()),
            email: None,
        },
    )
    .await;
    assert!(matches!(result, Err(ServiceError::PermissionDenied(_))));
}

#[tokio::test]
async fn test_attachment_payloads_follow_rows() {
    let Harness { ctx, blobs } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;

    let upload = |name: &str, body: &'static [u8]| attachments::NewUpload {
        card: fix_bug.clone(),
        file_name: name.to_string(),
        content_type: Some("text/plain".to_string()),
        payload: Bytes::from_static(body),
    };

    let first = attachments::create(&ctx, &alice, upload("notes.txt", b"hello"))
        .await
        .unwrap();
    attachments::create(&ctx, &alice, upload("notes.txt", b"hello"))
        .await
        .unwrap();
    assert_eq!(first.size_bytes, 5);
    assert_eq!(blobs.len().await, 2);

    let content = attachments::content(&ctx, &alice, &first.slug).await.unwrap();
    assert_eq!(content.payload, Bytes::from_static(b"hello"));
    assert_eq!(content.content_type, "text/plain");

    let too_big = attachments::NewUpload {
        payload: Bytes::from(vec![0u8; 2048]),
        ..upload("big.bin", b"")
    };
    assert!(matches!(
        attachments::create(&ctx, &alice, too_big).await,
        Err(ServiceError::Validation(_))
    ));
    assert!(matches!(
        attachments::create(&ctx, &alice, upload("empty.txt", b"")).await,
        Err(ServiceError::Validation(_))
    ));

    attachments::delete(&ctx, &alice, &first.slug).await.unwrap();
    assert_eq!(blobs.len().await, 1);

    // Deleting the board removes the remaining payload with its subtree
    boards::delete(&ctx, &alice, &sprint).await.unwrap();
    assert!(blobs.is_empty().await);
    assert!(cards::get(&ctx, &alice, &fix_bug).await.is_err());
}

#[tokio::test]
async fn test_inactive_resources_hidden_from_listings() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;

    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let done = list(&ctx, &alice, &sprint, "Done").await;

    lists::update(
        &ctx,
        &alice,
        &done,
        lists::UpdateListInput {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let by_board = ListOptions {
        parent: Some(sprint.clone()),
        ..Default::default()
    };
    let active = lists::list(&ctx, &alice, &by_board).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].slug, todo);

    let everything = lists::list(
        &ctx,
        &alice,
        &ListOptions {
            include_inactive: true,
            ..by_board
        },
    )
    .await
    .unwrap();
    assert_eq!(everything.len(), 2);
    // Newest first
    assert_eq!(everything[0].slug, done);

    // Still retrievable by slug so it can be reactivated
    let fetched = lists::get(&ctx, &alice, &done).await.unwrap();
    assert!(!fetched.is_active);
}

#[tokio::test]
async fn test_slugs_are_stable_across_updates() {
    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let sprint = board(&ctx, &alice, "Sprint").await;

    let updated = boards::update(
        &ctx,
        &alice,
        &sprint,
        boards::ReplaceBoardInput {
            name: "Sprint 2".to_string(),
            description: "Second pass".to_string(),
            is_active: true,
        }
        .into(),
    )
    .await
    .unwrap();
    assert_eq!(updated.slug, sprint);
    assert_eq!(updated.name, "Sprint 2");
    assert_eq!(updated.created_by, Some(alice.user_slug.clone()));
}

/// Buffer that the fmt layer writes formatted events into
#[derive(Clone, Default)]
struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[tokio::test]
async fn test_comment_and_attachment_updates_are_logged() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let Harness { ctx, .. } = harness(ParentResolution::Scoped);
    let alice = signup(&ctx, "Alice").await;
    let sprint = board(&ctx, &alice, "Sprint").await;
    let todo = list(&ctx, &alice, &sprint, "Todo").await;
    let fix_bug = card(&ctx, &alice, &todo, "Fix bug").await;

    let comment = comments::create(
        &ctx,
        &alice,
        comments::CreateCommentInput {
            card: fix_bug.clone(),
            body: "First".to_string(),
        },
    )
    .await
    .unwrap();
    comments::update(
        &ctx,
        &alice,
        &comment.slug,
        comments::UpdateCommentInput {
            body: Some("Edited".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let attachment = attachments::create(
        &ctx,
        &alice,
        attachments::NewUpload {
            card: fix_bug,
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            payload: Bytes::from_static(b"hello"),
        },
    )
    .await
    .unwrap();
    attachments::update(
        &ctx,
        &alice,
        &attachment.slug,
        attachments::UpdateAttachmentInput {
            file_name: Some("renamed.txt".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let output = logs.contents();
    let line = |message: &str| {
        output
            .lines()
            .find(|line| line.contains(message))
            .unwrap_or_else(|| panic!("no `{message}` event in:\n{output}"))
            .to_string()
    };

    let updated_comment = line("comment updated");
    assert!(updated_comment.contains(comment.slug.as_str()));
    assert!(updated_comment.contains(alice.user_slug.as_str()));

    let updated_attachment = line("attachment updated");
    assert!(updated_attachment.contains(attachment.slug.as_str()));
    assert!(updated_attachment.contains(alice.user_slug.as_str()));
}
