//! Post-condition verification.
//!
//! A record's `check` names a predicate; a [`Verifier`] evaluates it against
//! the live services. [`check_and_update`] applies the strict success rule: a
//! step succeeds only when the predicate returned exactly
//! `CheckValue::Bool(expect_from_check)`.

use tracing::{debug, warn};

use crate::error::{RescueError, Result};
use crate::operation::{CheckArgs, CheckKind, CheckValue, OperationRecord};

/// Dispatches a check kind to the predicate that evaluates it.
pub trait Verifier {
    fn verify(&mut self, check: CheckKind, args: &CheckArgs) -> Result<CheckValue>;
}

/// Run the record's check and set its status from the outcome.
///
/// # Errors
///
/// - `State` if the record has no args, or args of the wrong shape
/// - `VerificationMismatch` if the check returned anything but the expected boolean
/// - whatever the verifier itself returned (timeouts, aborts, service errors)
///
/// The record is marked failed in every error case.
pub fn check_and_update(verifier: &mut dyn Verifier, record: &mut OperationRecord) -> Result<()> {
    let outcome = evaluate(verifier, record);
    match &outcome {
        Ok(()) => record.mark_success(),
        Err(err) => record.mark_failed(err),
    }
    outcome
}

fn evaluate(verifier: &mut dyn Verifier, record: &OperationRecord) -> Result<()> {
    let args = record.args.as_ref().ok_or_else(|| {
        RescueError::state(format!(
            "'{}' has no check arguments",
            record.operation_name
        ))
    })?;
    if !args.fits(record.check) {
        return Err(RescueError::state(format!(
            "'{}' cannot check {} with {:?}",
            record.operation_name, record.check, args
        )));
    }

    let actual = verifier.verify(record.check, args)?;
    debug!(operation = %record.operation_name, check = %record.check, %actual, "check returned");

    if actual == CheckValue::Bool(record.expect_from_check) {
        Ok(())
    } else {
        warn!(
            operation = %record.operation_name,
            expected = record.expect_from_check,
            %actual,
            "verification mismatch"
        );
        Err(RescueError::VerificationMismatch {
            operation: record.operation_name.clone(),
            expected: record.expect_from_check,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{OpKind, OpStatus};

    /// Returns a canned value for every check.
    struct Fixed(Result<CheckValue>);

    impl Verifier for Fixed {
        fn verify(&mut self, _check: CheckKind, _args: &CheckArgs) -> Result<CheckValue> {
            match &self.0 {
                Ok(value) => Ok(value.clone()),
                Err(_) => Err(RescueError::external("DescribeTable", "throttled")),
            }
        }
    }

    fn protection_record() -> OperationRecord {
        let mut record = OpKind::EnableDeletionProtection.new_record();
        record.args = Some(CheckArgs::Target {
            table: "parks".into(),
        });
        record
    }

    #[test]
    fn test_true_when_true_expected_succeeds() {
        let mut record = protection_record();
        check_and_update(&mut Fixed(Ok(CheckValue::Bool(true))), &mut record).unwrap();
        assert_eq!(record.status, OpStatus::Success);
    }

    #[test]
    fn test_false_when_true_expected_fails() {
        let mut record = protection_record();
        let err = check_and_update(&mut Fixed(Ok(CheckValue::Bool(false))), &mut record).unwrap_err();
        assert!(matches!(
            err,
            RescueError::VerificationMismatch {
                expected: true,
                actual: CheckValue::Bool(false),
                ..
            }
        ));
        assert_eq!(record.status, OpStatus::Failed);
        assert!(record.error_message.is_some());
    }

    #[test]
    fn test_truthy_text_is_not_true() {
        let mut record = protection_record();
        let err = check_and_update(
            &mut Fixed(Ok(CheckValue::Text("ACTIVE".into()))),
            &mut record,
        )
        .unwrap_err();
        assert!(matches!(err, RescueError::VerificationMismatch { .. }));
        assert!(record.is_failed());
    }

    #[test]
    fn test_missing_args_is_state_error() {
        let mut record = OpKind::EnablePitr.new_record();
        let err = check_and_update(&mut Fixed(Ok(CheckValue::Bool(true))), &mut record).unwrap_err();
        assert!(matches!(err, RescueError::State(_)));
        assert!(record.is_failed());
    }

    #[test]
    fn test_verifier_error_marks_failed() {
        let mut record = protection_record();
        let err = check_and_update(
            &mut Fixed(Err(RescueError::state("unused"))),
            &mut record,
        )
        .unwrap_err();
        assert!(matches!(err, RescueError::ExternalAction { .. }));
        assert_eq!(
            record.error_message.as_deref(),
            Some("DescribeTable failed: throttled")
        );
    }
}
