use super::helpers::{MockTransport, new_registry, registry_with};
use gemshare::{BoRegistry, ExternalHandle, ShareConfig, ShareError, TransportErrorKind};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;

#[test]
fn last_release_closes_exactly_once_and_reimport_is_fresh() {
    let (transport, registry) = new_registry();
    let key = ExternalHandle::new(3);

    let a = registry.acquire(key, 4096).unwrap();
    let first_generation = a.generation();
    registry.release(a);

    assert_eq!(transport.closes(), 1);
    assert!(!registry.contains(key));

    let b = registry.acquire(key, 4096).unwrap();
    assert_eq!(transport.imports_of(key), 2);
    assert_ne!(b.generation(), first_generation);
    assert_eq!(transport.closes(), 1);
}

#[test]
fn partial_release_keeps_buffer_alive() {
    let (transport, registry) = new_registry();
    let key = ExternalHandle::new(3);

    let allocations: Vec<_> = (0..3)
        .map(|_| registry.acquire(key, 4096).unwrap())
        .collect();
    let mut allocations = allocations.into_iter();

    registry.release(allocations.next().unwrap());
    assert_eq!(registry.reference_count(key), Some(2));
    assert_eq!(transport.closes(), 0);

    drop(allocations);
    assert_eq!(registry.reference_count(key), None);
    assert_eq!(transport.closes(), 1);
}

#[test]
fn failed_import_leaves_registry_unchanged() {
    let (transport, registry) = new_registry();
    let live = registry.acquire(ExternalHandle::new(1), 4096).unwrap();
    let before = registry.snapshot();

    transport.fail_imports.store(true, Ordering::SeqCst);
    let err = registry.acquire(ExternalHandle::new(3), 4096).unwrap_err();

    let source = err.transport_error().expect("transport error");
    assert_eq!(source.kind(), TransportErrorKind::Unavailable);
    assert_eq!(source.errno(), Some(9));
    assert_eq!(registry.snapshot(), before);
    assert_eq!(registry.stats().import_failures, 1);

    // A hit never reaches the transport, so it still succeeds.
    let hit = registry.acquire(ExternalHandle::new(1), 4096).unwrap();
    assert!(hit.shares_buffer_with(&live));

    transport.fail_imports.store(false, Ordering::SeqCst);
    let ok = registry.acquire(ExternalHandle::new(3), 4096).unwrap();
    assert_eq!(registry.reference_count(ok.key()), Some(1));
}

#[test]
fn unsupported_transport_surfaces_as_unsupported() {
    let (transport, registry) = new_registry();
    transport.unsupported.store(true, Ordering::SeqCst);

    let err = registry.acquire(ExternalHandle::new(3), 4096).unwrap_err();
    assert!(matches!(err, ShareError::Unsupported { .. }));
    assert!(err.is_import_failure());
    assert!(registry.is_empty());
}

#[test]
fn disabled_sharing_never_reaches_transport() {
    let transport = MockTransport::new();
    let config = ShareConfig {
        shared_import_enabled: false,
        ..ShareConfig::default()
    };
    let registry = BoRegistry::new(transport.clone(), config);

    let err = registry.acquire(ExternalHandle::new(3), 4096).unwrap_err();
    assert!(matches!(err, ShareError::Unsupported { .. }));
    assert_eq!(transport.imports(), 0);
}

#[test]
fn release_into_foreign_registry_is_ignored_there() {
    let (transport_a, registry_a) = new_registry();
    let (transport_b, registry_b) = new_registry();
    let key = ExternalHandle::new(3);

    let a1 = registry_a.acquire(key, 4096).unwrap();
    let _a2 = registry_a.acquire(key, 4096).unwrap();
    let _b1 = registry_b.acquire(key, 4096).unwrap();
    let before_b = registry_b.snapshot();

    registry_b.release(a1);

    assert_eq!(registry_b.snapshot(), before_b);
    assert_eq!(registry_b.stats().untracked_releases, 1);
    assert_eq!(transport_b.closes(), 0);
    // The allocation still gave its reference back to its own registry.
    assert_eq!(registry_a.reference_count(key), Some(1));
    assert_eq!(transport_a.closes(), 0);
}

#[test]
fn release_after_shutdown_is_untracked() {
    let (transport, registry) = new_registry();
    let a = registry.acquire(ExternalHandle::new(3), 4096).unwrap();
    let b = registry.acquire(ExternalHandle::new(4), 4096).unwrap();

    assert_eq!(registry.shutdown(), 2);
    assert_eq!(transport.closes(), 2);
    assert!(registry.is_shut_down());

    registry.release(a);
    drop(b);
    assert_eq!(transport.closes(), 2);
    assert_eq!(registry.stats().untracked_releases, 2);
    assert!(registry.is_empty());

    let err = registry.acquire(ExternalHandle::new(3), 4096).unwrap_err();
    assert!(matches!(err, ShareError::RegistryClosed));
    assert_eq!(registry.shutdown(), 0);
}

#[test]
fn release_after_registry_dropped_is_ignored() {
    let (transport, registry) = new_registry();
    let key = ExternalHandle::new(3);

    let old = registry.acquire(key, 4096).unwrap();
    registry.shutdown();
    drop(registry);

    let registry = registry_with(&transport);
    let fresh = registry.acquire(key, 4096).unwrap();
    // `old` points at a registry that no longer exists.
    drop(old);
    assert_eq!(registry.reference_count(key), Some(1));
    assert_eq!(fresh.key(), key);
}

#[test]
fn close_failure_still_removes_entry() {
    let (transport, registry) = new_registry();
    let key = ExternalHandle::new(3);
    transport.fail_closes.store(true, Ordering::SeqCst);

    drop(registry.acquire(key, 4096).unwrap());
    assert!(!registry.contains(key));
    assert_eq!(registry.stats().close_failures, 1);
    assert_eq!(registry.stats().closes, 0);

    transport.fail_closes.store(false, Ordering::SeqCst);
    let _again = registry.acquire(key, 4096).unwrap();
    assert_eq!(transport.imports_of(key), 2);
}

#[test]
fn size_resolution() {
    let (transport, registry) = new_registry();
    transport.size.store(1 << 20, Ordering::SeqCst);

    let queried = registry.acquire(ExternalHandle::new(3), 0).unwrap();
    assert_eq!(queried.size(), 1 << 20);
    assert_eq!(queried.buffer_object().size(), 1 << 20);

    // A hint sizes the allocation; the buffer keeps its imported size.
    let hinted = registry.acquire(ExternalHandle::new(3), 4096).unwrap();
    assert_eq!(hinted.size(), 4096);
    assert_eq!(hinted.buffer_object().size(), 1 << 20);

    // Size query unsupported: fall back to zero.
    transport.size.store(0, Ordering::SeqCst);
    let unknown = registry.acquire(ExternalHandle::new(4), 0).unwrap();
    assert_eq!(unknown.size(), 0);
}

#[test]
fn snapshot_is_ordered_by_key() {
    let (_transport, registry) = new_registry();
    let _c = registry.acquire(ExternalHandle::new(30), 4096).unwrap();
    let _a = registry.acquire(ExternalHandle::new(10), 4096).unwrap();
    let _b1 = registry.acquire(ExternalHandle::new(20), 4096).unwrap();
    let _b2 = registry.acquire(ExternalHandle::new(20), 4096).unwrap();

    let snap = registry.snapshot();
    let keys: Vec<i32> = snap.iter().map(|e| e.key.raw()).collect();
    assert_eq!(keys, vec![10, 20, 30]);
    assert_eq!(snap[1].refs, 2);
}

#[test]
fn poisoned_lock_fails_acquire_leaks_release_and_teardown_recovers() {
    let (transport, registry) = new_registry();
    let live = registry.acquire(ExternalHandle::new(1), 4096).unwrap();

    // A transport panic while the registry lock is held poisons it.
    transport.panic_imports.store(true, Ordering::SeqCst);
    let panicking = Arc::clone(&registry);
    let outcome = thread::spawn(move || panicking.acquire(ExternalHandle::new(2), 4096)).join();
    assert!(outcome.is_err());
    transport.panic_imports.store(false, Ordering::SeqCst);

    let err = registry.acquire(ExternalHandle::new(3), 4096).unwrap_err();
    assert!(matches!(err, ShareError::LockPoisoned("bo registry")));

    // Release cannot safely touch the map: the reference is leaked.
    drop(live);
    assert_eq!(transport.closes(), 0);

    // Teardown recovers the guard and still closes the kernel handle.
    assert_eq!(registry.shutdown(), 1);
    assert_eq!(transport.closes(), 1);
    assert!(registry.is_empty());
}

#[test]
fn sub_allocations_share_one_buffer_at_their_offsets() {
    let (transport, registry) = new_registry();
    transport.size.store(16384, Ordering::SeqCst);
    let key = ExternalHandle::new(3);

    let whole = registry.acquire(key, 0).unwrap();
    let tail = registry.acquire_at(key, 4096, 0).unwrap();
    let middle = registry.acquire_at(key, 4096, 8192).unwrap();
    assert_eq!(transport.imports(), 1);
    assert_eq!(registry.reference_count(key), Some(3));
    assert!(tail.shares_buffer_with(&whole));

    assert_eq!((whole.offset(), whole.size()), (0, 16384));
    // Zero size runs to the end of the buffer.
    assert_eq!((tail.offset(), tail.size()), (4096, 12288));
    assert_eq!((middle.offset(), middle.size()), (4096, 8192));
    assert_eq!(middle.view(1024, 1024).unwrap().offset(), 5120);
}

#[test]
fn out_of_bounds_sub_allocation_gives_its_reference_back() {
    let (transport, registry) = new_registry();
    transport.size.store(4096, Ordering::SeqCst);

    // Fresh import: the only reference goes back, so the buffer is closed.
    let err = registry
        .acquire_at(ExternalHandle::new(3), 8192, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        ShareError::OutOfBounds {
            offset: 8192,
            capacity: 4096,
            ..
        }
    ));
    assert_eq!((transport.imports(), transport.closes()), (1, 1));
    assert!(registry.is_empty());

    // Existing entry: the count returns to what it was.
    let live = registry.acquire(ExternalHandle::new(4), 0).unwrap();
    let err = registry
        .acquire_at(ExternalHandle::new(4), 2048, 4096)
        .unwrap_err();
    assert!(matches!(err, ShareError::OutOfBounds { .. }));
    assert_eq!(registry.reference_count(ExternalHandle::new(4)), Some(1));
    assert_eq!(transport.closes(), 1);
    drop(live);

    // An overflowing range never reaches the transport.
    let err = registry
        .acquire_at(ExternalHandle::new(5), u64::MAX, 2)
        .unwrap_err();
    assert!(matches!(err, ShareError::OutOfBounds { .. }));
    assert_eq!(transport.imports(), 2);
}
