//! Quota enforcement: statement counters, wall-clock timeouts, recursion
//! depth and a coarse memory estimate. See spec.md §4.5 ("Quotas") and §5
//! ("Cancellation and timeouts").
//!
//! Checks fire at loop iterations, function entries and property accesses,
//! polled every [`Quotas::POLL_INTERVAL`] statements rather than on every
//! single one, to keep the check cheap on the hot path.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, thiserror::Error)]
pub enum QuotaError {
    #[error("script exceeded the maximum of {0} statements")]
    MaxStatements(u64),
    #[error("script exceeded the {0:?} timeout")]
    Timeout(Duration),
    #[error("call stack exceeded the maximum depth of {0}")]
    MaxRecursionDepth(usize),
    #[error("engine exceeded the memory budget of {0} bytes")]
    MemoryLimit(usize),
}

/// Caps configured on a [`crate::Options`] and enforced for the lifetime of
/// one `execute`/`evaluate`/`invoke` call.
#[derive(Debug, Clone, Default)]
pub struct QuotaLimits {
    pub max_statements: Option<u64>,
    pub timeout: Option<Duration>,
    pub max_recursion_depth: Option<usize>,
    pub memory_limit_bytes: Option<usize>,
}

/// Mutable tracking state, reset at the start of every top-level call into
/// the engine facade.
#[derive(Debug)]
pub struct QuotaTracker {
    limits: QuotaLimits,
    started_at: Option<Instant>,
    statements_executed: u64,
    current_depth: usize,
    estimated_bytes: usize,
    /// Set the moment any check below trips. `exec` threads the triggering
    /// `QuotaError` out through the ordinary `JsError`/`?` plumbing (so no
    /// call site's signature has to change), but a pending fault here marks
    /// that error as host-fatal: `execute_try` must not let a `catch` clause
    /// observe it, and the engine facade converts it to
    /// `EngineOutcome::Fatal` instead of `Thrown` once it escapes.
    fault: Option<QuotaError>,
}

impl QuotaTracker {
    pub const POLL_INTERVAL: u64 = 256;

    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            started_at: None,
            statements_executed: 0,
            current_depth: 0,
            estimated_bytes: 0,
            fault: None,
        }
    }

    /// Marks the start of a new top-level evaluation; (re)starts the clock.
    pub fn begin(&mut self) {
        self.started_at = Some(Instant::now());
        self.statements_executed = 0;
        self.current_depth = 0;
        self.estimated_bytes = 0;
        self.fault = None;
    }

    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }

    /// Consumes the pending fault, if any; called once by the facade after
    /// a top-level call returns an error, to tell a quota trip apart from an
    /// ordinary `throw`.
    pub fn take_fault(&mut self) -> Option<QuotaError> {
        self.fault.take()
    }

    fn fail(&mut self, err: QuotaError) -> Result<(), QuotaError> {
        self.fault = Some(err.clone());
        Err(err)
    }

    /// Called by the statement-list evaluator on each statement.
    pub fn tick_statement(&mut self) -> Result<(), QuotaError> {
        self.statements_executed += 1;
        if self.statements_executed % Self::POLL_INTERVAL != 0 {
            return Ok(());
        }
        self.poll()
    }

    /// Called at loop-iteration boundaries, since a single statement
    /// (a `for`/`while` body) can iterate far more often than it is
    /// re-entered as a "statement" in the outer list.
    pub fn tick_loop_iteration(&mut self) -> Result<(), QuotaError> {
        self.tick_statement()
    }

    fn poll(&mut self) -> Result<(), QuotaError> {
        if let Some(max) = self.limits.max_statements {
            if self.statements_executed > max {
                return self.fail(QuotaError::MaxStatements(max));
            }
        }
        if let (Some(timeout), Some(started)) = (self.limits.timeout, self.started_at) {
            if started.elapsed() > timeout {
                return self.fail(QuotaError::Timeout(timeout));
            }
        }
        Ok(())
    }

    /// Called on function entry, before pushing a new execution context.
    pub fn enter_call(&mut self) -> Result<(), QuotaError> {
        self.current_depth += 1;
        if let Some(max) = self.limits.max_recursion_depth {
            if self.current_depth > max {
                self.current_depth -= 1;
                return self.fail(QuotaError::MaxRecursionDepth(max));
            }
        }
        Ok(())
    }

    /// Called on function return/throw unwind, after popping the context.
    pub fn exit_call(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Records an allocation for the coarse memory estimate (object
    /// creation, string allocation); not a precise heap accounting, just
    /// enough to bound runaway allocation loops.
    pub fn record_allocation(&mut self, bytes: usize) -> Result<(), QuotaError> {
        self.estimated_bytes += bytes;
        if let Some(max) = self.limits.memory_limit_bytes {
            if self.estimated_bytes > max {
                return self.fail(QuotaError::MemoryLimit(max));
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.current_depth
    }
}
