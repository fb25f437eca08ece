//! Session authentication / 会话认证
//!
//! Sessions live in the `sessions` table and are referenced by the
//! `SESSION_COOKIE_NAME` cookie. Login and registration are handled elsewhere,
//! this module only resolves the calling user.

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_cookies::Cookies;

use crate::models::User;

pub const SESSION_COOKIE_NAME: &str = "figbox_session";

/// Resolve the logged-in user from the session cookie / 从 Cookie 获取当前用户
pub async fn current_user(
    pool: &SqlitePool,
    cookies: &Cookies,
) -> Result<User, (StatusCode, Json<Value>)> {
    let session_id = cookies.get(SESSION_COOKIE_NAME)
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "未登录"}))))?
        .value()
        .to_string();

    let user: Option<User> = sqlx::query_as(
        "SELECT u.id, u.username, u.password_hash, u.email, u.enabled, u.created_at, u.updated_at
         FROM users u
         JOIN sessions s ON u.id = s.user_id
         WHERE s.id = ? AND s.expires_at > datetime('now') AND u.enabled = 1"
    )
    .bind(&session_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        tracing::error!("Session lookup failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"})))
    })?;

    user.ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "会话无效"}))))
}
