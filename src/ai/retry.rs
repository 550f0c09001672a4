use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::client::{ChatMessage, Completion, CompletionClient, CompletionError, CompletionOptions};
use super::cost::{estimate_cost, estimate_tokens};

/// Delay after failed attempt `attempt` (1-based): 2s, 4s, 8s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Calls the completion API up to `options.retries` times.
///
/// Each attempt is raced against `options.timeout`. Non-retryable errors are
/// returned immediately; other failures back off exponentially and the last
/// error is returned once attempts run out.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> Result<Completion, CompletionError> {
    let mut last_error = None;
    debug!(
        estimated_prompt_tokens = messages
            .iter()
            .map(|message| estimate_tokens(&message.content))
            .sum::<u32>(),
        "Sending completion request"
    );

    for attempt in 1..=options.retries {
        let outcome = match tokio::time::timeout(options.timeout, client.complete(messages, options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout),
        };

        match outcome {
            Ok(completion) => {
                info!(
                    attempt,
                    model = %completion.model,
                    prompt_tokens = completion.usage.prompt_tokens,
                    completion_tokens = completion.usage.completion_tokens,
                    total_tokens = completion.usage.total_tokens,
                    cost = estimate_cost(
                        completion.usage.prompt_tokens,
                        completion.usage.completion_tokens
                    ),
                    "Completion API call succeeded"
                );
                return Ok(completion);
            }
            Err(e) => {
                error!(attempt, error = %e, "Completion API call failed");

                if !e.is_retryable() {
                    return Err(e);
                }
                last_error = Some(e);

                if attempt < options.retries {
                    let delay = backoff_delay(attempt);
                    warn!(attempt, delay_secs = delay.as_secs(), "Retrying completion API call");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or(CompletionError::RetriesExhausted))
}
