use actix_web::{get, post, web, HttpResponse};

use crate::db::MemoryStore;
use crate::handlers::user_handler::{create_user as create_user_handler, get_user_by_name};
use crate::models::user::CreateUserRequest;

#[post("/users")]
async fn create_user(
    user_form: web::Json<CreateUserRequest>,
    store: web::Data<MemoryStore>,
) -> HttpResponse {
    create_user_handler(user_form, store).await
}

#[get("/users/{user_name}")]
async fn get_user(path: web::Path<String>, store: web::Data<MemoryStore>) -> HttpResponse {
    get_user_by_name(path.into_inner(), store).await
}
