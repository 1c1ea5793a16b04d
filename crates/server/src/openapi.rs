use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use serde::Serialize;
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest { pub name: String, pub email: String, pub password: String, pub phone: Option<String> }

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

/// Any subset of the fields; a blank phone removes it.
#[derive(ToSchema)]
pub struct UpdateDetailsRequest { pub name: Option<String>, pub email: Option<String>, pub phone: Option<String> }

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest { pub current_password: String, pub new_password: String }

/// Create/update body. Job posts need company, jobType, salary and requirements;
/// service posts need provider.
#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInputDoc {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    #[schema(example = "job")]
    pub post_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[schema(example = "email")]
    pub display_contact: Option<String>,
    pub company: Option<String>,
    #[schema(example = "Full-time")]
    pub job_type: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    pub provider: Option<String>,
    pub rating: Option<f64>,
    pub rating_count: Option<i32>,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDoc {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub category: String,
    pub location: String,
    pub contact_email: String,
    pub display_contact: String,
    pub user: Uuid,
    pub user_name: Option<String>,
    pub created_at: String,
}

#[derive(ToSchema)]
pub struct PostListDoc {
    pub success: bool,
    pub count: usize,
    pub total: u64,
    pub data: Vec<PostDoc>,
}

#[derive(ToSchema)]
pub struct CommentInputDoc { pub text: String }

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDoc {
    pub id: Uuid,
    pub text: String,
    pub post: Uuid,
    pub user: Uuid,
    pub user_name: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(ToSchema)]
pub struct CommentListDoc {
    pub success: bool,
    pub count: usize,
    pub data: Vec<CommentDoc>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::update_details,
        crate::routes::auth::update_password,
        crate::routes::posts::list,
        crate::routes::posts::get,
        crate::routes::posts::create,
        crate::routes::posts::update,
        crate::routes::posts::delete,
        crate::routes::posts::list_by_user,
        crate::routes::comments::list,
        crate::routes::comments::add,
        crate::routes::comments::update,
        crate::routes::comments::delete,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            UpdateDetailsRequest,
            UpdatePasswordRequest,
            PostInputDoc,
            PostDoc,
            PostListDoc,
            CommentInputDoc,
            CommentDoc,
            CommentListDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "posts"),
        (name = "comments")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/posts", "/posts/{post_id}", "/posts/{post_id}/comments/{comment_id}", "/auth/login", "/auth/updatedetails", "/auth/updatepassword"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
