//! Credentials driven through the boundary, as a host would.

use std::sync::Arc;

use rpc_embed::boundary::{BoundaryError, BoundaryHandle, BoundaryValue, CredentialsWrapper, CREDENTIAL_TYPE_TAG};
use rpc_embed::config::RuntimeConfig;
use rpc_embed::credentials::{Credential, CredentialKind};
use rpc_embed::observability::Telemetry;
use rpc_embed::Runtime;

mod common;

use common::{counting_factory, CountingBackend};

fn wrapper() -> (CredentialsWrapper, Arc<CountingBackend>) {
    let (factory, backend) = counting_factory();
    (CredentialsWrapper::new(factory, Telemetry::detached()), backend)
}

fn holders(wrapper: &CredentialsWrapper, handle: &BoundaryHandle) -> usize {
    // The temporary from unwrap counts as one holder.
    wrapper.unwrap(handle).unwrap().unwrap().holders() - 1
}

#[test]
fn test_create_ssl_with_key_only_is_invalid_value() {
    let (wrapper, backend) = wrapper();
    let err = wrapper
        .create_ssl(
            &BoundaryValue::Null,
            &BoundaryValue::from(b"pk".to_vec()),
            &BoundaryValue::Null,
        )
        .unwrap_err();

    assert!(matches!(err, BoundaryError::InvalidArgumentValue(_)));
    assert_eq!(backend.created(), 0);
    assert_eq!(wrapper.live_handles(), 0);
}

#[test]
fn test_create_ssl_both_or_neither() {
    let (wrapper, _) = wrapper();
    let pk = BoundaryValue::from(b"pk".to_vec());
    let chain = BoundaryValue::from(b"chain".to_vec());

    let both = wrapper.create_ssl(&BoundaryValue::Undefined, &pk, &chain).unwrap();
    let neither = wrapper
        .create_ssl(&BoundaryValue::Undefined, &BoundaryValue::Undefined, &BoundaryValue::Undefined)
        .unwrap();

    for handle in [both, neither] {
        let credential = wrapper.unwrap(&handle).unwrap().unwrap();
        assert_eq!(credential.kind(), CredentialKind::TransportSecurity);
    }
}

#[test]
fn test_create_composite_with_invalid_leaves_first_untouched() {
    let (wrapper, backend) = wrapper();
    let a = wrapper.create_fake().unwrap();
    let before = holders(&wrapper, &a);
    let created = backend.created();

    let forged = BoundaryHandle::from_raw_parts(CREDENTIAL_TYPE_TAG.id(), 42, 42);
    let err = wrapper
        .create_composite(&BoundaryValue::from(a), &BoundaryValue::from(forged))
        .unwrap_err();

    assert!(matches!(err, BoundaryError::InvalidArgumentType { .. }));
    assert_eq!(holders(&wrapper, &a), before);
    assert_eq!(backend.created(), created);
    assert_eq!(wrapper.live_handles(), 1);

    let err = wrapper
        .create_composite(&BoundaryValue::Null, &BoundaryValue::from(a))
        .unwrap_err();
    assert!(matches!(err, BoundaryError::InvalidArgumentType { position: "first", .. }));
}

#[test]
fn test_create_iam_then_unwrap() {
    let (wrapper, _) = wrapper();
    let handle = wrapper
        .create_iam(&BoundaryValue::from("tok"), &BoundaryValue::from("sel"))
        .unwrap();

    let credential = wrapper.unwrap(&handle).unwrap().unwrap();
    assert_eq!(credential.kind(), CredentialKind::CallToken);
    let opts = credential.call_token().unwrap();
    assert_eq!(opts.auth_token, "tok");
    assert_eq!(opts.auth_selector, "sel");
}

#[test]
fn test_wrap_round_trips() {
    let (wrapper, _) = wrapper();

    let none = wrapper.wrap(None);
    assert!(wrapper.unwrap(&none).unwrap().is_none());

    let credential = wrapper.factory().create_default().unwrap();
    let handle = wrapper.wrap(Some(credential.clone()));
    let unwrapped = wrapper.unwrap(&handle).unwrap().unwrap();
    assert!(Credential::ptr_eq(&credential, &unwrapped));
    assert_eq!(unwrapped.id(), credential.id());
}

#[test]
fn test_shared_child_released_once_through_handles() {
    let (wrapper, backend) = wrapper();
    let shared = wrapper.create_fake().unwrap();
    let token = wrapper
        .create_iam(&BoundaryValue::from("tok"), &BoundaryValue::from("sel"))
        .unwrap();
    let left = wrapper
        .create_composite(&BoundaryValue::from(shared), &BoundaryValue::from(token))
        .unwrap();
    let right = wrapper
        .create_composite(&BoundaryValue::from(token), &BoundaryValue::from(shared))
        .unwrap();
    let top = wrapper
        .create_composite(&BoundaryValue::from(left), &BoundaryValue::from(right))
        .unwrap();

    for handle in [shared, token, left, right] {
        wrapper.release(&handle).unwrap();
    }
    assert_eq!(backend.drops(), 0);
    assert_eq!(wrapper.live_handles(), 1);

    wrapper.release(&top).unwrap();
    assert_eq!(backend.drops(), 2);
    assert_eq!(wrapper.live_handles(), 0);
}

#[test]
fn test_double_release_is_stale() {
    let (wrapper, backend) = wrapper();
    let handle = wrapper.create_gce().unwrap();
    wrapper.release(&handle).unwrap();
    assert_eq!(backend.drops(), 1);

    assert!(matches!(wrapper.release(&handle), Err(BoundaryError::StaleHandle)));
    assert_eq!(backend.drops(), 1);
}

#[test]
fn test_runtime_end_to_end() {
    let mut config = RuntimeConfig::default();
    config.io.worker_threads = 1;
    let backend = Arc::new(CountingBackend::default());
    let runtime = Runtime::new(&config, backend.clone());

    runtime.init().unwrap();
    let io = runtime.io_handle().unwrap();
    assert_eq!(io.block_on(async { 40 + 2 }), 42);

    let credentials = runtime.credentials();
    let handle = credentials.create_default().unwrap();
    assert_eq!(runtime.stats().handles_wrapped, 1);
    credentials.release(&handle).unwrap();

    runtime.shutdown();
    assert_eq!(backend.drops(), 1);
    assert!(runtime.io_handle().is_none());
}
