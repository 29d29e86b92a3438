//! Member commands - add, list and check logins.

use crate::{cli::AppContext, core::user, errors::Result};
use std::fmt::Write;

/// Adds a member. With a password the member logs in with it, otherwise
/// through OpenID Connect.
pub async fn add(
    ctx: &AppContext,
    email: &str,
    first_name: &str,
    last_name: &str,
    is_admin: bool,
    password: Option<&str>,
) -> Result<String> {
    let created = match password {
        Some(password) => {
            user::create_user_with_password(
                &ctx.database,
                email,
                first_name,
                last_name,
                is_admin,
                password,
            )
            .await?
        }
        None => user::create_user(&ctx.database, email, first_name, last_name, is_admin).await?,
    };
    Ok(format!(
        "Created user {}: {} ({})",
        created.id, created.email, created.method
    ))
}

/// Checks a password login.
pub async fn login(ctx: &AppContext, email: &str, password: &str) -> Result<String> {
    let member = user::authenticate(&ctx.database, email, password).await?;
    Ok(format!(
        "Authenticated {} {} <{}>",
        member.first_name, member.last_name, member.email
    ))
}

/// Lists every member, one per line.
pub async fn list(ctx: &AppContext) -> Result<String> {
    let users = user::get_all_users(&ctx.database).await?;
    if users.is_empty() {
        return Ok("No users yet.".to_string());
    }

    let mut out = String::new();
    for u in users {
        writeln!(
            out,
            "{:>4}  {} {} <{}>{}",
            u.id,
            u.first_name,
            u.last_name,
            u.email,
            if u.is_admin { " (admin)" } else { "" }
        )
        .ok();
    }
    Ok(out)
}
