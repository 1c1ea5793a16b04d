use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service::post::{domain::{Post, PostInput}, query::ListParams};
use uuid::Uuid;

use crate::envelope::{Empty, Envelope, WithStatus};
use crate::errors::ApiError;
use crate::extract::CurrentUser;
use crate::state::ServerState;

#[utoipa::path(
    get, path = "/posts", tag = "posts",
    params(
        ("select" = Option<String>, Query, description = "Comma-separated fields to return"),
        ("sort" = Option<String>, Query, description = "Comma-separated sort keys, '-' for descending"),
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("limit" = Option<u64>, Query, description = "Page size"),
    ),
    responses((status = 200, description = "Posts", body = crate::openapi::PostListDoc), (status = 400, description = "Bad filter"))
)]
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Envelope<Vec<Value>>, ApiError> {
    let Query(pairs) = query?;
    let page = state.posts.list(&ListParams::from_pairs(pairs)).await?;
    Ok(Envelope::page(page.render()?, page.total, page.pagination))
}

#[utoipa::path(
    get, path = "/posts/{post_id}", tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses((status = 200, description = "Post", body = crate::openapi::PostDoc), (status = 404, description = "Not found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<Post>, ApiError> {
    let Path(id) = id?;
    Ok(Envelope::data(state.posts.get(id).await?))
}

#[utoipa::path(
    post, path = "/posts", tag = "posts",
    request_body = crate::openapi::PostInputDoc,
    responses((status = 201, description = "Created", body = crate::openapi::PostDoc), (status = 400, description = "Invalid"), (status = 401, description = "Unauthorized")),
    security(("bearer" = []))
)]
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    body: Result<Json<PostInput>, JsonRejection>,
) -> Result<WithStatus<Post>, ApiError> {
    let Json(input) = body?;
    let post = state.posts.create(&user.actor(), input).await?;
    Ok(WithStatus(StatusCode::CREATED, Envelope::data(post)))
}

#[utoipa::path(
    put, path = "/posts/{post_id}", tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    request_body = crate::openapi::PostInputDoc,
    responses((status = 200, description = "Updated", body = crate::openapi::PostDoc), (status = 401, description = "Not owner"), (status = 404, description = "Not found")),
    security(("bearer" = []))
)]
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<PostInput>, JsonRejection>,
) -> Result<Envelope<Post>, ApiError> {
    let Path(id) = id?;
    let Json(input) = body?;
    Ok(Envelope::data(state.posts.update(&user.actor(), id, input).await?))
}

#[utoipa::path(
    delete, path = "/posts/{post_id}", tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post id")),
    responses((status = 200, description = "Deleted with its comments"), (status = 401, description = "Not owner"), (status = 404, description = "Not found")),
    security(("bearer" = []))
)]
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<Empty>, ApiError> {
    let Path(id) = id?;
    state.posts.delete(&user.actor(), id).await?;
    Ok(Envelope::data(Empty::default()))
}

#[utoipa::path(
    get, path = "/posts/user/{user_id}", tag = "posts",
    params(("user_id" = Uuid, Path, description = "Owner id")),
    responses((status = 200, description = "The user's posts, newest first", body = crate::openapi::PostListDoc))
)]
pub async fn list_by_user(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Envelope<Vec<Post>>, ApiError> {
    let Path(user_id) = id?;
    Ok(Envelope::list(state.posts.list_by_user(user_id).await?))
}
