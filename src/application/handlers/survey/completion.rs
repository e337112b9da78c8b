//! Shared model-call wrapper for the generator and the reconciler.

use tracing::{debug, warn};

use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo};

/// Sends `request`, logging the context budget before the call and token
/// usage after it.
pub(super) async fn complete(
    provider: &dyn AIProvider,
    request: CompletionRequest,
) -> Result<CompletionResponse, AIError> {
    let info = provider.provider_info();
    let prompt_tokens = provider.estimate_tokens(&request.prompt_text());
    let reply_tokens = request.max_tokens.unwrap_or(0);
    let purpose = request.metadata.purpose;
    let session_id = request.metadata.session_id;

    if exceeds_context(prompt_tokens, reply_tokens, &info) {
        warn!(
            session_id = %session_id,
            %purpose,
            provider = %info.name,
            prompt_tokens,
            reply_tokens,
            max_context_tokens = info.max_context_tokens,
            "Prompt may not fit the model context window"
        );
    }

    let response = provider.complete(request).await?;
    debug!(
        session_id = %session_id,
        %purpose,
        model = %response.model,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        total_tokens = response.usage.total_tokens,
        finish_reason = ?response.finish_reason,
        response_chars = response.content.len(),
        "Model response received"
    );
    if response.finish_reason == FinishReason::Length {
        warn!(session_id = %session_id, %purpose, "Model output was cut off at the token limit");
    }
    Ok(response)
}

fn exceeds_context(prompt_tokens: u32, reply_tokens: u32, info: &ProviderInfo) -> bool {
    prompt_tokens.saturating_add(reply_tokens) > info.max_context_tokens
}
