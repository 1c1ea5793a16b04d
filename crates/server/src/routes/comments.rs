use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Json,
};
use service::comment::domain::{Comment, CommentInput};
use uuid::Uuid;

use crate::envelope::{Empty, Envelope, WithStatus};
use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::state::ServerState;

#[utoipa::path(
    get, path = "/posts/{post_id}/comments", tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses((status = 200, description = "Comments, newest first", body = crate::openapi::CommentListDoc))
)]
pub async fn list(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<Vec<Comment>>, ApiError> {
    let Path(post_id) = id?;
    Ok(Envelope::list(state.comments.list_for_post(post_id).await?))
}

#[utoipa::path(
    post, path = "/posts/{post_id}/comments", tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body = crate::openapi::CommentInputDoc,
    responses((status = 201, description = "Created", body = crate::openapi::CommentDoc), (status = 404, description = "Post not found")),
    security(("bearer" = []))
)]
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<CommentInput>, JsonRejection>,
) -> Result<WithStatus<Comment>, ApiError> {
    let Path(post_id) = id?;
    let Json(input) = body?;
    let comment = state.comments.add(&user.actor(), post_id, input).await?;
    Ok(WithStatus(StatusCode::CREATED, Envelope::data(comment)))
}

#[utoipa::path(
    put, path = "/posts/{post_id}/comments/{comment_id}", tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post id"), ("comment_id" = Uuid, Path, description = "Comment id")),
    request_body = crate::openapi::CommentInputDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::CommentDoc), (status = 401, description = "Not author"), (status = 404, description = "Not found")),
    security(("bearer" = []))
)]
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
    body: Result<Json<CommentInput>, JsonRejection>,
) -> Result<Envelope<Comment>, ApiError> {
    let Path((post_id, comment_id)) = ids?;
    let Json(input) = body?;
    Ok(Envelope::data(state.comments.update(&user.actor(), post_id, comment_id, input).await?))
}

#[utoipa::path(
    delete, path = "/posts/{post_id}/comments/{comment_id}", tag = "comments",
    params(("post_id" = Uuid, Path, description = "Post id"), ("comment_id" = Uuid, Path, description = "Comment id")),
    responses((status = 200, description = "Deleted"), (status = 401, description = "Not author"), (status = 404, description = "Not found")),
    security(("bearer" = []))
)]
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Envelope<Empty>, ApiError> {
    let Path((post_id, comment_id)) = ids?;
    state.comments.delete(&user.actor(), post_id, comment_id).await?;
    Ok(Envelope::data(Empty::default()))
}
