use axum::extract::{Path, State};
use axum::routing::delete;
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::http::{AdminCtx, AppState};
use crate::services::users::DeletedUserData;
use crate::Result;

pub fn router() -> Router<AppState> {
    Router::new().route("/users/:id", delete(delete_user))
}

async fn delete_user(State(s): State<AppState>, AdminCtx(admin): AdminCtx, Path(id): Path<Uuid>) -> Result<Json<DeletedUserData>> {
    info!(%admin, user_id = %id, "user deletion requested");
    s.users.delete_user_cascade(id).await.map(Json)
}
