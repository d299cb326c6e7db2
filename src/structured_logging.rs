//! Structured logging and operation context

use uuid::Uuid;

/// Structured logger for one chain access operation
///
/// Every event carries the same `context_id`, so the lines of one transfer can
/// be grepped out of an interleaved log.
#[derive(Debug, Clone)]
pub struct OperationLogger {
    context_id: String,
    operation: &'static str,
}

impl OperationLogger {
    pub fn new(operation: &'static str) -> Self {
        Self {
            context_id: Uuid::new_v4().to_string(),
            operation,
        }
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn log_start(&self, detail: &str) {
        tracing::debug!(
            context_id = %self.context_id,
            operation = self.operation,
            detail = %detail,
            "Operation started"
        );
    }

    pub fn log_built(&self, signature: &str, creates_account: bool, priority_fee: u64, latency_ms: u64) {
        tracing::debug!(
            context_id = %self.context_id,
            operation = self.operation,
            signature = %signature,
            creates_account = %creates_account,
            priority_fee = %priority_fee,
            latency_ms = %latency_ms,
            "Transaction built"
        );
    }

    pub fn log_submitted(&self, signature: &str, confirmed: bool, latency_ms: u64) {
        tracing::info!(
            context_id = %self.context_id,
            operation = self.operation,
            signature = %signature,
            confirmed = %confirmed,
            latency_ms = %latency_ms,
            "Transaction submitted"
        );
    }

    pub fn log_failure(&self, category: &str, error: &str, latency_ms: u64) {
        tracing::warn!(
            context_id = %self.context_id,
            operation = self.operation,
            category = %category,
            error = %error,
            latency_ms = %latency_ms,
            "Operation failed"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            context_id = %self.context_id,
            operation = self.operation,
            message = %message,
            "Warning"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_ids_are_unique() {
        let first = OperationLogger::new("transfer_coin");
        let second = OperationLogger::new("transfer_coin");
        assert_ne!(first.context_id(), second.context_id());
        assert_eq!(first.operation(), "transfer_coin");
        assert!(Uuid::parse_str(first.context_id()).is_ok());
    }
}
