//! Tests for the shared error taxonomy

use core_kernel::error::ErrorCategory;

#[test]
fn test_only_store_unavailable_is_retryable() {
    assert!(ErrorCategory::StoreUnavailable.is_retryable());
    assert!(!ErrorCategory::Validation.is_retryable());
    assert!(!ErrorCategory::NotFound.is_retryable());
    assert!(!ErrorCategory::Conflict.is_retryable());
    assert!(!ErrorCategory::Internal.is_retryable());
}

#[test]
fn test_category_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorCategory::StoreUnavailable).unwrap();
    assert_eq!(json, "\"store_unavailable\"");
}
