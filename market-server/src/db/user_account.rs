//! User Account Repository

use crate::error::ServiceResult;
use shared::models::{Role, UserAccount, UserSummary};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> ServiceResult<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>("SELECT * FROM user_account WHERE id = ?")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn summary(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Option<UserSummary>> {
    let user = sqlx::query_as::<_, UserSummary>(
        "SELECT id, email, first_name FROM user_account WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

/// All users holding a given role (manager fan-out)
pub async fn ids_by_role(pool: &SqlitePool, role: Role) -> ServiceResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM user_account WHERE role = ?")
        .bind(role)
        .fetch_all(pool)
        .await?;
    Ok(ids)
}

pub async fn insert(conn: &mut SqliteConnection, user: &UserAccount) -> ServiceResult<()> {
    sqlx::query("INSERT INTO user_account (id, email, first_name, role) VALUES (?, ?, ?, ?)")
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(user.role)
        .execute(conn)
        .await?;
    Ok(())
}
