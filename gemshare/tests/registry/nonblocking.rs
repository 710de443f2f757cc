use super::helpers::new_registry;
use gemshare::ExternalHandle;
use gemshare::nonblocking::{acquire_async, release_async};
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_acquire_deduplicates() {
    let (transport, registry) = new_registry();
    let key = ExternalHandle::new(3);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            acquire_async(&registry, key, 4096).await.unwrap()
        }));
    }
    let mut allocations = Vec::new();
    for h in handles {
        allocations.push(h.await.unwrap());
    }

    assert_eq!(transport.imports_of(key), 1);
    assert_eq!(registry.reference_count(key), Some(10));

    for a in allocations {
        release_async(&registry, a).await.unwrap();
    }
    assert_eq!(transport.closes(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn async_acquire_propagates_transport_error() {
    let (transport, registry) = new_registry();
    transport
        .fail_imports
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let err = acquire_async(&registry, ExternalHandle::new(3), 4096)
        .await
        .unwrap_err();
    assert!(err.is_import_failure());
    assert!(registry.is_empty());
}
