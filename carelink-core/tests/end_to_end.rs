//! End-to-end flows over the in-memory adapters and scripted tag
//! platform: registration through tag write and scan, sign-in role
//! enforcement, and access gating against live snapshots.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use carelink_core::domain::auth::Registration;
use carelink_core::domain::error::AuthError;
use carelink_core::domain::identity::{subject_id_from_profile_url, Identity, SubjectId};
use carelink_core::nfc::codec::{TagMessage, TagRecordKind};
use carelink_core::nfc::scan::{PayloadHandler, ScanSession, ScanState};
use carelink_core::nfc::write::{WriteSession, WriteState};
use carelink_core::outbound::{InMemoryCredentialProvider, InMemoryUserDirectory};
use carelink_core::test_support::{init_tracing, ScriptedTagPlatform};
use carelink_core::{
    AccessDecision, AccessPolicy, Destination, PortalConfig, Role, SessionService,
};

fn config() -> PortalConfig {
    PortalConfig::new(Url::parse("https://portal.example").expect("valid url"))
        .expect("valid origin")
}

fn portal() -> (
    Arc<InMemoryCredentialProvider>,
    Arc<InMemoryUserDirectory>,
    SessionService,
) {
    init_tracing();
    let provider = Arc::new(InMemoryCredentialProvider::new());
    let directory = Arc::new(InMemoryUserDirectory::new());
    let service = SessionService::start(provider.clone(), directory.clone(), config());
    (provider, directory, service)
}

fn jane() -> Registration {
    Registration::try_from_parts("jane.doe@example.com", "secret1", "Jane Doe")
        .expect("valid registration")
}

fn destination(path: &str) -> Destination {
    Destination::new(path).expect("valid destination")
}

async fn register_and_sign_out(service: &SessionService) -> SubjectId {
    let subject_id = service
        .register_new_identity(&jane())
        .await
        .expect("registration succeeds");
    service.sign_out().await.expect("sign-out succeeds");
    subject_id
}

fn collecting_handler() -> (PayloadHandler, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: PayloadHandler = Arc::new(move |payload| {
        let _ = tx.send(payload.into_text());
    });
    (handler, rx)
}

#[tokio::test]
async fn registered_profile_round_trips_through_a_tag() {
    let (_provider, directory, service) = portal();

    let subject_id = service
        .register_new_identity(&jane())
        .await
        .expect("registration succeeds");

    let profile = directory
        .patient_profile(&subject_id)
        .expect("profile persisted");
    assert_eq!(
        profile.nfc_profile_url.as_str(),
        format!("https://portal.example/login/patient?id={subject_id}"),
    );

    // Push the profile URL onto a card.
    let writer_platform = Arc::new(ScriptedTagPlatform::supported());
    let mut writer = WriteSession::new(writer_platform.clone());
    writer
        .write(profile.nfc_profile_url.as_str())
        .await
        .expect("write succeeds");
    assert_eq!(writer.state(), WriteState::Success);

    let written = writer_platform.written();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].kind(), TagRecordKind::Url);

    // Scan the card back and recover the subject id.
    let scanner_platform = Arc::new(ScriptedTagPlatform::supported());
    scanner_platform.queue_message(TagMessage::new(written));
    let mut scanner = ScanSession::new(scanner_platform);
    let (handler, mut payloads) = collecting_handler();
    scanner.start(handler).await.expect("scan starts");
    assert_eq!(scanner.state(), ScanState::Active);

    let text = tokio::time::timeout(Duration::from_secs(1), payloads.recv())
        .await
        .expect("payload delivered in time")
        .expect("handler channel open");
    let scanned = subject_id_from_profile_url(&text).expect("payload is a profile url");
    assert_eq!(scanned, subject_id);
    scanner.stop();
}

#[tokio::test]
async fn credential_sign_in_resolves_the_snapshot_role() {
    let (_provider, _directory, service) = portal();
    register_and_sign_out(&service).await;

    let assignment = service
        .sign_in_with_credentials(&jane().credentials().clone(), Role::Patient)
        .await
        .expect("patient sign-in succeeds");
    assert_eq!(assignment.role(), Role::Patient);

    let mut snapshots = service.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(1),
        snapshots.wait_for(|s| s.role() == Some(Role::Patient)),
    )
    .await
    .expect("snapshot resolves in time")
    .expect("watch stays open");

    // Gate staff and patient views against the live snapshot.
    let staff_view = AccessPolicy::for_roles(
        [Role::Doctor, Role::Nurse],
        destination("/login/staff"),
    )
    .with_fallback(Role::Patient, destination("/dashboard/patient"));
    assert_eq!(
        staff_view.evaluate(&snapshot),
        AccessDecision::Redirect(destination("/dashboard/patient")),
    );

    let patient_view = AccessPolicy::for_roles([Role::Patient], destination("/login/patient"));
    assert_eq!(patient_view.evaluate(&snapshot), AccessDecision::Allow);
}

#[tokio::test]
async fn role_mismatch_leaves_nobody_signed_in() {
    let (provider, _directory, service) = portal();
    register_and_sign_out(&service).await;

    let err = service
        .sign_in_with_credentials(&jane().credentials().clone(), Role::Doctor)
        .await
        .expect_err("patient account must not pass the staff door");
    assert_eq!(
        err,
        AuthError::UnauthorizedRole {
            expected: Role::Doctor,
            actual: Role::Patient,
        }
    );

    let mut snapshots = service.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(1),
        snapshots.wait_for(|s| !s.is_authenticated() && !s.is_resolving()),
    )
    .await
    .expect("snapshot resolves in time")
    .expect("watch stays open");
    assert_eq!(snapshot.role(), None);
    assert_eq!(provider.current_identity(), None);
}

#[tokio::test]
async fn external_sign_in_provisions_a_staff_account_on_first_touch() {
    let (provider, directory, service) = portal();

    let subject_id = SubjectId::random();
    provider.set_external_identity(Identity::new(
        subject_id.clone(),
        Some("dr.roe@clinic.example".to_owned()),
        Some("Dr. Roe".to_owned()),
    ));

    let assignment = service
        .sign_in_with_external_provider(Role::Doctor)
        .await
        .expect("first-touch staff sign-in succeeds");
    assert_eq!(assignment.role(), Role::Doctor);
    assert_eq!(assignment.subject_id(), &subject_id);

    let record = directory.user(&subject_id).expect("record provisioned");
    assert_eq!(record.role, Role::Doctor);
    assert_eq!(record.display_name.as_deref(), Some("Dr. Roe"));
}

#[tokio::test]
async fn unsupported_platform_blocks_both_tag_directions() {
    let platform = Arc::new(ScriptedTagPlatform::unsupported());

    let mut writer = WriteSession::new(platform.clone());
    writer
        .write("https://portal.example/login/patient?id=p-1")
        .await
        .expect_err("write must fail without support");

    let mut scanner = ScanSession::new(platform.clone());
    let (handler, _rx) = collecting_handler();
    scanner.start(handler).await.expect_err("scan must fail without support");

    assert_eq!(platform.listen_calls(), 0);
    assert_eq!(platform.write_calls(), 0);
}
