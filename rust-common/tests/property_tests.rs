//! Property-based tests for rust-common crate.
//!
//! These tests verify universal properties of the retry policy using proptest.

use proptest::prelude::*;
use rust_common::{Attempt, RetryConfig, RetryError, RetryPolicy};
use std::{cell::RefCell, future::ready, time::Duration};

fn run_script(
    policy: &RetryPolicy,
    transient_failures: u32,
) -> (Result<u32, RetryError<String>>, u32, Vec<Duration>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let calls = RefCell::new(0u32);
    let slept = RefCell::new(Vec::new());

    let result = rt.block_on(policy.execute_with_sleep(
        |attempt| {
            *calls.borrow_mut() += 1;
            if attempt < transient_failures {
                ready(Attempt::Retryable(format!("attempt {attempt}")))
            } else {
                ready(Attempt::Success(attempt))
            }
        },
        |delay| {
            slept.borrow_mut().push(delay);
            ready(())
        },
    ));

    (result, calls.into_inner(), slept.into_inner())
}

// Property: Bounded Attempts
// *For any* number of consecutive transient failures, the policy SHALL issue at
// most `max_retries` attempts and sleep once between each pair of attempts.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_attempts_are_bounded(
        max_retries in 1u32..10,
        transient_failures in 0u32..15,
    ) {
        let policy = RetryPolicy::new(RetryConfig::default().with_max_retries(max_retries));
        let (result, calls, slept) = run_script(&policy, transient_failures);

        prop_assert!(calls <= max_retries);
        prop_assert_eq!(slept.len() as u32, calls.saturating_sub(1));

        if transient_failures < max_retries {
            prop_assert_eq!(result.ok(), Some(transient_failures));
            prop_assert_eq!(calls, transient_failures + 1);
        } else {
            match result {
                Err(RetryError::Exhausted { attempts, last }) => {
                    prop_assert_eq!(attempts, max_retries);
                    prop_assert_eq!(last, format!("attempt {}", max_retries - 1));
                }
                other => prop_assert!(false, "expected exhaustion, got {:?}", other),
            }
        }
    }

    #[test]
    fn prop_backoff_is_linear(
        factor in 1u32..10,
        unit_ms in 1u64..1000,
        attempt in 0u32..20,
    ) {
        let policy = RetryPolicy::new(
            RetryConfig::default()
                .with_backoff_factor(factor)
                .with_backoff_unit(Duration::from_millis(unit_ms)),
        );

        prop_assert_eq!(
            policy.delay_for_attempt(attempt),
            Duration::from_millis(unit_ms * u64::from(factor * attempt))
        );
    }
}

#[test]
fn test_default_policy_sleeps_two_four_six_eight() {
    let policy = RetryPolicy::default();
    let (result, calls, slept) = run_script(&policy, 10);

    assert!(matches!(result, Err(RetryError::Exhausted { attempts: 5, .. })));
    assert_eq!(calls, 5);
    assert_eq!(
        slept,
        [2, 4, 6, 8].map(Duration::from_secs).to_vec()
    );
}
