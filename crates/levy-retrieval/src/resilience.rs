//! Timeout, bounded retry with exponential backoff, and cancellation for
//! every external call.

use std::future::Future;

use levy_core::config::ResilienceConfig;
use levy_core::{CancellationToken, LevyError, LevyResult};
use tracing::{debug, warn};

use crate::ledger::{CallKind, CallLedger};

/// Wraps external calls with the configured resilience policy.
///
/// Each attempt races the caller's cancellation token and a per-call
/// timeout. Transient failures are retried up to `max_retries` times;
/// permanent failures and cancellation return immediately.
#[derive(Clone, Copy)]
pub struct ResilientCaller<'a> {
    policy: &'a ResilienceConfig,
    cancel: &'a CancellationToken,
    ledger: &'a CallLedger,
}

impl<'a> ResilientCaller<'a> {
    pub fn new(
        policy: &'a ResilienceConfig,
        cancel: &'a CancellationToken,
        ledger: &'a CallLedger,
    ) -> Self {
        Self {
            policy,
            cancel,
            ledger,
        }
    }

    pub fn ledger(&self) -> &'a CallLedger {
        self.ledger
    }

    pub fn check_cancelled(&self) -> LevyResult<()> {
        if self.cancel.is_cancelled() {
            Err(LevyError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Single attempt under the call timeout, raced against cancellation.
    /// Not recorded in the ledger: used for the engine's store lookups.
    pub async fn once<T, Fut>(&self, operation: &str, fut: Fut) -> LevyResult<T>
    where
        Fut: Future<Output = LevyResult<T>>,
    {
        self.check_cancelled()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LevyError::Cancelled),
            result = tokio::time::timeout(self.policy.timeout(), fut) => match result {
                Ok(result) => result,
                Err(_) => Err(LevyError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms: self.policy.timeout_ms,
                }),
            },
        }
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    pub async fn call<T, F, Fut>(&self, kind: CallKind, mut op: F) -> LevyResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LevyResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.check_cancelled()?;
            self.ledger.record(kind);

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(LevyError::Cancelled),
                result = tokio::time::timeout(self.policy.timeout(), op()) => result,
            };

            let err = match outcome {
                Ok(Ok(value)) => {
                    if attempt > 0 {
                        debug!(call = %kind, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Ok(Err(err)) => err,
                Err(_) => LevyError::Timeout {
                    operation: kind.as_str().to_string(),
                    timeout_ms: self.policy.timeout_ms,
                },
            };

            if matches!(err, LevyError::Cancelled) || !err.is_transient() {
                return Err(err);
            }
            if attempt >= self.policy.max_retries {
                warn!(call = %kind, attempts = attempt + 1, error = %err, "retries exhausted");
                return Err(err);
            }

            let backoff = self.policy.backoff(attempt);
            debug!(call = %kind, attempt, ?backoff, error = %err, "transient failure, backing off");
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(LevyError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
            attempt += 1;
        }
    }
}
