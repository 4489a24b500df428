//! services/api/src/web/navigation.rs
//!
//! Tells the client who is logged in and which page to show.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json},
};
use classmate_core::navigation::Page;
use classmate_core::SessionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::web::middleware::resolve_session;
use crate::web::state::AppState;

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// `home`, `auth`, `upload_lecture`, `view_lectures` or `ai_chat`.
    pub page: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionView {
    pub logged_in: bool,
    pub user: Option<String>,
    pub role: Option<String>,
    pub current_page: String,
    pub menu: Vec<String>,
}

fn page_name(page: Page) -> String {
    match page {
        Page::Home => "home",
        Page::Auth => "auth",
        Page::UploadLecture => "upload_lecture",
        Page::ViewLectures => "view_lectures",
        Page::AiChat => "ai_chat",
    }
    .to_string()
}

impl From<SessionContext> for SessionView {
    fn from(context: SessionContext) -> Self {
        Self {
            menu: context.menu().into_iter().map(page_name).collect(),
            logged_in: context.logged_in,
            user: context.user,
            role: context.role.map(|role| role.to_string()),
            current_page: page_name(context.current_page),
        }
    }
}

/// Resolve the page to show for the current visitor.
///
/// Unknown page names are ignored, as if no page was requested.
#[utoipa::path(
    get,
    path = "/session",
    params(PageQuery),
    responses(
        (status = 200, description = "Session context and menu", body = SessionView),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    uri: Uri,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let requested = query.page.as_deref().and_then(|raw| {
        raw.parse::<Page>()
            .map_err(|e| warn!("Ignoring requested page: {}", e))
            .ok()
    });

    let session = resolve_session(&state, &headers, &uri)
        .await
        .map_err(|status| (status, "Failed to load session".to_string()))?;

    let context = match session {
        Some(session) => SessionContext::logged_in(&session.username, session.role, requested),
        None => SessionContext::anonymous(requested),
    };
    Ok(Json(SessionView::from(context)))
}
