use tracing::warn;

use super::{ChatBackend, ChatRequest, Message, Retries};
use crate::error::BackendError;

/// Sends `request`, sleeping for the backend's `retry_after` and retrying
/// while rate limited and the budget allows. Other failures return at once.
pub(crate) async fn send_with_retries(
    backend: &dyn ChatBackend,
    request: &ChatRequest,
    retries: Retries,
) -> Result<Message, BackendError> {
    let mut budget = retries;
    let mut attempt: u32 = 0;

    loop {
        match backend.send(request).await {
            Ok(reply) => return Ok(reply),
            Err(BackendError::RateLimited { retry_after }) if budget.allows_retry() => {
                attempt += 1;
                warn!(
                    model = %request.model,
                    attempt,
                    delay_ms = retry_after.as_millis() as u64,
                    "rate limited, retrying"
                );
                tokio::time::sleep(retry_after).await;
                budget = budget.spend();
            }
            Err(err) => {
                if matches!(err, BackendError::RateLimited { .. }) {
                    warn!(model = %request.model, attempts = attempt + 1, "retry budget exhausted");
                }
                return Err(err);
            }
        }
    }
}
