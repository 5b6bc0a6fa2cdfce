use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::db::users::{get_user, insert_user};
use crate::db::MemoryStore;
use crate::handlers::{error_response, store_error_status};
use crate::models::common::ApiResponse;
use crate::models::user::CreateUserRequest;

#[tracing::instrument(
    name = "Adding a new user",
    skip(user_form, store),
    fields(user = %user_form)
)]
pub async fn create_user(
    user_form: web::Json<CreateUserRequest>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    let user = match user_form.into_inner().into_user() {
        Ok(user) => user,
        Err(e) => {
            tracing::info!("Rejected user registration: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Missing required fields", e);
        }
    };

    match insert_user(&store, user).await {
        Ok(user) => {
            tracing::info!("User {} created", user.user_name);
            HttpResponse::Created().json(ApiResponse::success("User created", user))
        }
        Err(e) => {
            tracing::info!("Failed to create user: {}", e);
            error_response(store_error_status(&e), "Failed to create user", e)
        }
    }
}

#[tracing::instrument(name = "Get user", skip(store))]
pub async fn get_user_by_name(user_name: String, store: web::Data<MemoryStore>) -> HttpResponse {
    match get_user(&store, &user_name).await {
        Ok(user) => HttpResponse::Ok().json(ApiResponse::success("User found", user)),
        Err(e) => error_response(store_error_status(&e), "User not found", e),
    }
}
