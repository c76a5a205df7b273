//! Tests for the error system.

use pretty_assertions::assert_eq;

use sessiongate::auth::{
    CredentialRejection, FlowError, FlowOperation, ProviderError, ProviderErrorCode,
};
use sessiongate::error::unified::*;
use sessiongate::error::*;

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: GateError,
        expected_category: ErrorCategory,
        expected_user_facing: bool,
        expected_recovery: RecoverySuggestion,
    }

    let cases = vec![
        Case {
            error: GateError::DoubleSubscription,
            expected_category: ErrorCategory::Programming,
            expected_user_facing: false,
            expected_recovery: RecoverySuggestion::FixCallSite,
        },
        Case {
            error: FlowError::EmailNotVerified.into(),
            expected_category: ErrorCategory::Verification,
            expected_user_facing: true,
            expected_recovery: RecoverySuggestion::VerifyEmail,
        },
        Case {
            error: FlowError::InvalidCredentials {
                reason: CredentialRejection::WrongPassword,
            }
            .into(),
            expected_category: ErrorCategory::Credentials,
            expected_user_facing: true,
            expected_recovery: RecoverySuggestion::CorrectCredentials,
        },
        Case {
            error: ProviderError::new(ProviderErrorCode::Network, "offline").into(),
            expected_category: ErrorCategory::Provider,
            expected_user_facing: true,
            expected_recovery: RecoverySuggestion::RetryLater,
        },
        Case {
            error: GateError::Configuration("bad route".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_user_facing: false,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into(),
            expected_category: ErrorCategory::Io,
            expected_user_facing: false,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: GateError::Timeout(5_000),
            expected_category: ErrorCategory::Timeout,
            expected_user_facing: true,
            expected_recovery: RecoverySuggestion::RetryLater,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(case.error.is_user_facing(), case.expected_user_facing, "{}", case.error);
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "{}",
            case.error
        );
    }
}

#[test]
fn flow_errors_display_transparently() {
    let err: GateError = FlowError::WeakPassword.into();
    assert_eq!(err.to_string(), FlowError::WeakPassword.to_string());
}

#[test]
fn provider_codes_round_trip_through_their_wire_names() {
    let err = ProviderError::from_code("auth/wrong-password", "The password is invalid.");
    assert_eq!(err.code, ProviderErrorCode::WrongPassword);
    assert_eq!(err.code.as_str(), "auth/wrong-password");

    let other = ProviderError::from_code("auth/too-many-requests", "slow down");
    assert_eq!(
        other.code,
        ProviderErrorCode::Other("auth/too-many-requests".to_string())
    );
}

#[test]
fn classification_depends_on_the_operation() {
    let wrong = ProviderError::new(ProviderErrorCode::WrongPassword, "The password is invalid.");
    assert_eq!(
        FlowError::classify(FlowOperation::Credentials, wrong.clone()),
        FlowError::InvalidCredentials {
            reason: CredentialRejection::WrongPassword
        }
    );
    assert_eq!(
        FlowError::classify(FlowOperation::Reset, wrong),
        FlowError::FlowFailed("The password is invalid.".to_string())
    );

    let taken = ProviderError::new(ProviderErrorCode::EmailAlreadyInUse, "taken");
    assert_eq!(
        FlowError::classify(FlowOperation::Register, taken.clone()),
        FlowError::EmailAlreadyInUse
    );
    assert!(matches!(
        FlowError::classify(FlowOperation::Federated, taken),
        FlowError::FederatedSignInFailed { .. }
    ));
}

#[test]
fn user_messages_are_distinct() {
    let errors = [
        FlowError::FederatedSignInFailed {
            reason: "closed".to_string(),
        },
        FlowError::InvalidCredentials {
            reason: CredentialRejection::WrongPassword,
        },
        FlowError::InvalidCredentials {
            reason: CredentialRejection::UnknownUser,
        },
        FlowError::InvalidCredentials {
            reason: CredentialRejection::Rejected,
        },
        FlowError::EmailNotVerified,
        FlowError::EmailAlreadyInUse,
        FlowError::WeakPassword,
        FlowError::FlowFailed("offline".to_string()),
    ];
    let mut messages: Vec<String> = errors.iter().map(FlowError::user_message).collect();
    messages.sort();
    messages.dedup();
    assert_eq!(messages.len(), errors.len());
}

#[test]
fn error_category_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorCategory::Verification).unwrap();
    assert_eq!(json, "\"verification\"");
}
