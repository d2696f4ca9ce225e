use accessgov_core::errors::{AccessError, ExError, ExErrorKind};
use accessgov_core::{GrantStatus, RequestStatus};

#[test]
fn test_request_not_found_verifiable_by_kind() {
    let err = AccessError::RequestNotFound {
        request_id: "r-404".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_eq!(ex_err.code(), "ERR_NOT_FOUND");
    assert_eq!(ex_err.entity_id(), Some("r-404"));
}

#[test]
fn test_no_items_is_not_found() {
    let ex_err: ExError = AccessError::NoItems.into();
    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::ValidationFailed, "ERR_VALIDATION_FAILED"),
        (ExErrorKind::InactiveGrant, "ERR_INACTIVE_GRANT"),
        (ExErrorKind::InvalidStatus, "ERR_INVALID_STATUS"),
        (ExErrorKind::EntityTooLarge, "ERR_ENTITY_TOO_LARGE"),
        (ExErrorKind::PartialBatchWrite, "ERR_PARTIAL_BATCH_WRITE"),
        (ExErrorKind::InvalidCursor, "ERR_INVALID_CURSOR"),
        (ExErrorKind::InvalidInput, "ERR_INVALID_INPUT"),
        (ExErrorKind::ConstraintViolation, "ERR_CONSTRAINT_VIOLATION"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::ExternalService, "ERR_EXTERNAL_SERVICE"),
        (ExErrorKind::ProviderNotFound, "ERR_PROVIDER_NOT_FOUND"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_assembly_errors_classified() {
    let orphan: ExError = AccessError::OrphanItem {
        sort_key: "REQUEST#r1#GROUP#g1#TARGET#t1#".to_string(),
    }
    .into();
    assert_eq!(orphan.kind(), ExErrorKind::InvalidInput);

    let mismatch: ExError = AccessError::GroupTargetCountMismatch {
        request_id: "r1".to_string(),
        expected: 3,
        actual: 2,
    }
    .into();
    assert_eq!(mismatch.kind(), ExErrorKind::ConstraintViolation);
    assert!(mismatch.message().contains("Expected 3"));

    let too_large: ExError = AccessError::EntityTooLarge {
        request_id: "r1".to_string(),
        page_size: 100,
    }
    .into();
    assert_eq!(too_large.kind(), ExErrorKind::EntityTooLarge);
    assert_eq!(too_large.entity_id(), Some("r1"));
}

#[test]
fn test_lifecycle_errors_classified() {
    let inactive: ExError = AccessError::InactiveGrant {
        subject: "alice".to_string(),
        status: GrantStatus::Expired,
        reason: "expired".to_string(),
    }
    .into();
    assert_eq!(inactive.kind(), ExErrorKind::InactiveGrant);

    let transition: ExError = AccessError::InvalidStatusTransition {
        request_id: "r1".to_string(),
        from: RequestStatus::Cancelled.to_string(),
        to: RequestStatus::Approved.to_string(),
    }
    .into();
    assert_eq!(transition.kind(), ExErrorKind::InvalidStatus);
    assert!(transition.message().contains("CANCELLED"));

    let validation: ExError = AccessError::GrantValidationFailed {
        reason: "account is suspended".to_string(),
    }
    .into();
    assert_eq!(validation.kind(), ExErrorKind::ValidationFailed);
    assert_eq!(validation.message(), "account is suspended");
}

#[test]
fn test_partial_write_progress_in_display() {
    let cause = ExError::new(ExErrorKind::Persistence).with_message("disk full");
    let err = ExError::new(ExErrorKind::PartialBatchWrite)
        .with_op("put_batch")
        .with_progress(25, 60)
        .with_source(cause);

    assert_eq!(err.progress(), Some((25, 60)));
    assert_eq!(
        err.source_error().map(|e| e.kind()),
        Some(ExErrorKind::Persistence)
    );
    let rendered = err.to_string();
    assert!(rendered.contains("ERR_PARTIAL_BATCH_WRITE"));
    assert!(rendered.contains("25 of 60"));
}
