//! Chat endpoint - relays a message to the configured agent.

use actix_web::{HttpResponse, web};
use tracing::Instrument;

use globe_core::chat::{ChatRequest, HistoryTurn};
use globe_shared::dto;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// A history entry with no role counts as a user turn.
fn history_turn(entry: dto::HistoryEntry) -> HistoryTurn {
    HistoryTurn {
        role: entry
            .role
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| "user".to_string()),
        content: entry.content.unwrap_or_default(),
    }
}

/// POST /chat
///
/// The exchange runs on its own task so a slow agent run does not hold the
/// worker's thread.
pub async fn chat(
    state: web::Data<AppState>,
    body: web::Json<dto::ChatRequest>,
) -> AppResult<HttpResponse> {
    let Some(service) = state.chat.clone() else {
        return Err(AppError::Upstream(
            "AZURE_AI_ENDPOINT or PROJECT_ENDPOINT must be set".to_string(),
        ));
    };

    let body = body.into_inner();
    let request = ChatRequest {
        message: body.message,
        history: body
            .conversation_history
            .unwrap_or_default()
            .into_iter()
            .map(history_turn)
            .collect(),
        conversation_id: body.conversation_id.filter(|c| !c.is_empty()),
    };

    let reply = tokio::spawn(
        async move { service.chat(request).await }.instrument(tracing::Span::current()),
    )
    .await
    .map_err(|e| AppError::Internal(format!("chat task failed: {e}")))??;

    Ok(HttpResponse::Ok().json(dto::ChatResponse {
        response: reply.response,
        conversation_id: reply.conversation_id,
    }))
}
