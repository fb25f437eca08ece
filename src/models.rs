use serde::{Deserialize, Serialize};

/// Collectible figure record / 收藏手办记录
///
/// Owned by exactly one user. Written by the CRUD layer, read-only for search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Figure {
    pub id: String,
    pub user_id: String,
    pub manufacturer: String,
    pub name: String,
    pub scale: String,
    /// External reference link / 外部参考链接
    pub link: String,
    pub location: String,
    /// Box identifier / 收纳箱编号
    pub box_number: String,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}
