//! End-to-end tests of the assembled worker over in-memory ports

use std::sync::Arc;

use core_kernel::RemoteId;
use domain_events::{AuditTrailPort, InMemoryAuditTrail};
use domain_mandate::{InMemorySyncStore, ProductPort, ProductState};
use interface_worker::{Ports, Worker, WorkerConfig};
use test_utils::{
    seeded_store, MandateFixtures, ProductBuilder, RecordingErrorReporter, RecordingNotifier,
    RemoteIds, ResponseFixtures, ScriptedTransport,
};

const CONFIG: &str = r#"
    [rpc]
    endpoint = "https://portfolio.example/api/jsonrpc"
    username = "broker"
    password = "secret"

    [transfer]
    custody_pool = "fondsfinanz"

    [events]
    actor = "sync-worker-test"
    terminal_transaction_types = ["BESTANDSUEBERTRAGUNG_ABGESCHLOSSEN", "VERTRAG_GEKUENDIGT"]
"#;

struct Setup {
    worker: Worker,
    store: Arc<InMemorySyncStore>,
    audit: Arc<InMemoryAuditTrail>,
    notifier: Arc<RecordingNotifier>,
    product_id: core_kernel::ProductId,
}

async fn setup(transport: ScriptedTransport) -> Setup {
    let config = WorkerConfig::from_toml(CONFIG).unwrap();
    let mandate = MandateFixtures::person();
    let product = ProductBuilder::new(mandate.id).build();
    let store = seeded_store(&mandate, &product).await;
    let audit = Arc::new(InMemoryAuditTrail::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let ports = Ports {
        mandates: store.clone(),
        products: store.clone(),
        locks: store.clone(),
        audit_trail: audit.clone(),
    };
    let worker = Worker::assemble(
        &config,
        Arc::new(transport),
        ports,
        Arc::new(RecordingErrorReporter::new()),
        notifier.clone(),
    )
    .unwrap();

    Setup {
        worker,
        store,
        audit,
        notifier,
        product_id: product.id,
    }
}

fn event(event_id: i64, transaction_type: &str) -> serde_json::Value {
    ResponseFixtures::event(event_id, transaction_type, RemoteIds::CONTRACT)
}

#[tokio::test]
async fn test_transfer_then_catch_up_completes_the_product() {
    let transport = ScriptedTransport::happy_path().with_event_stream(vec![
        event(1, "VERTRAG_GEAENDERT"),
        event(2, "BESTANDSUEBERTRAGUNG_ABGESCHLOSSEN"),
    ]);
    let s = setup(transport).await;

    let report = s.worker.transfer(s.product_id).await.unwrap();
    assert_eq!(report.actions_for(s.product_id).len(), 6);

    let product = s.store.get_product(s.product_id).await.unwrap();
    assert_eq!(product.remote_id, Some(RemoteId::from(RemoteIds::CONTRACT)));
    assert_eq!(product.state, ProductState::TransferRequested);
    assert_eq!(product.managed_by_pool.as_deref(), Some("fondsfinanz"));

    let cursors = s.worker.catch_up(s.product_id).await.unwrap();
    assert_eq!(cursors, vec![1, 2]);

    let product = s.store.get_product(s.product_id).await.unwrap();
    assert_eq!(product.state, ProductState::UnderManagement);

    let entries = s.audit.entries_for(s.product_id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry.actor == "sync-worker-test"));
}

#[tokio::test]
async fn test_configured_terminal_type_stops_catch_up() {
    let transport = ScriptedTransport::happy_path().with_event_stream(vec![
        event(1, "VERTRAG_GEKUENDIGT"),
        event(2, "VERTRAG_GEAENDERT"),
    ]);
    let s = setup(transport).await;
    s.worker.transfer(s.product_id).await.unwrap();

    assert_eq!(s.worker.catch_up(s.product_id).await.unwrap(), vec![1]);
    assert_eq!(
        s.store.get_product(s.product_id).await.unwrap().state,
        ProductState::Terminated
    );

    assert_eq!(s.worker.pull(s.product_id, None).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_denied_transfer_notifies_operations() {
    let transport = ScriptedTransport::happy_path()
        .with_event_stream(vec![event(7, "BESTANDSUEBERTRAGUNG_ABGELEHNT")]);
    let s = setup(transport).await;
    s.worker.transfer(s.product_id).await.unwrap();

    assert_eq!(s.worker.pull(s.product_id, Some(0)).await.unwrap(), Some(7));
    assert_eq!(
        s.store.get_product(s.product_id).await.unwrap().state,
        ProductState::TransferDenied
    );
    assert_eq!(s.notifier.count(), 1);
}

#[tokio::test]
async fn test_pull_before_transfer_is_rejected() {
    let s = setup(ScriptedTransport::happy_path()).await;

    assert!(s.worker.pull(s.product_id, None).await.is_err());
    assert!(s.audit.is_empty().await);
}
