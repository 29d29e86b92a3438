//! Member records and password login.
//!
//! A user is the profile that consumptions, comments and invoices hang off.
//! Members created through an OpenID Connect provider carry no password hash
//! and can never pass [`authenticate`].

use crate::{
    entities::{User, user},
    errors::{Error, FieldErrors, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use std::fmt;
use tracing::{debug, info};

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

/// How a member signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMethod {
    /// bcrypt-hashed password stored with the user
    Password,
    /// External provider, no password stored
    OpenIdConnect,
}

impl LoginMethod {
    /// Value stored in the `method` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::OpenIdConnect => "openidconnect",
        }
    }
}

impl fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates a member who signs in through OpenID Connect, trimming the name fields.
///
/// # Errors
/// Returns `Error::Validation` if the email is empty, or a database error
/// (including a duplicate email).
pub async fn create_user<C>(
    db: &C,
    email: &str,
    first_name: &str,
    last_name: &str,
    is_admin: bool,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    insert_user(
        db,
        email,
        first_name,
        last_name,
        is_admin,
        LoginMethod::OpenIdConnect,
        None,
    )
    .await
}

/// Creates a member who signs in with `password`, stored as a bcrypt hash.
///
/// # Errors
/// Returns `Error::Validation` if the email or the password is empty, a
/// hashing error, or a database error (including a duplicate email).
pub async fn create_user_with_password<C>(
    db: &C,
    email: &str,
    first_name: &str,
    last_name: &str,
    is_admin: bool,
    password: &str,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    if password.is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("password", "password must not be empty");
        return Err(Error::Validation(errors));
    }
    let hashed = bcrypt::hash(password, HASH_COST)?;
    insert_user(
        db,
        email,
        first_name,
        last_name,
        is_admin,
        LoginMethod::Password,
        Some(hashed),
    )
    .await
}

async fn insert_user<C>(
    db: &C,
    email: &str,
    first_name: &str,
    last_name: &str,
    is_admin: bool,
    method: LoginMethod,
    hashed_password: Option<String>,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let email = email.trim();
    if email.is_empty() {
        let mut errors = FieldErrors::new();
        errors.add("email", "email must not be empty");
        return Err(Error::Validation(errors));
    }

    let new_user = user::ActiveModel {
        email: Set(email.to_string()),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        is_admin: Set(is_admin),
        method: Set(method.as_str().to_string()),
        hashed_password: Set(hashed_password),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let user = new_user.insert(db).await?;
    info!("Created user {} <{}> ({})", user.id, user.email, method);
    Ok(user)
}

/// Checks an email and password pair and returns the matching member.
///
/// # Errors
/// Returns `Error::InvalidCredentials` for an unknown email, a member without a
/// password login, or a wrong password. Hashing and database failures are
/// returned as such.
pub async fn authenticate<C>(db: &C, email: &str, password: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let Some(user) = get_user_by_email(db, email).await? else {
        debug!("Login attempt for unknown email");
        return Err(Error::InvalidCredentials);
    };
    let Some(hashed) = user.hashed_password.as_deref() else {
        debug!("User {} has no password login", user.id);
        return Err(Error::InvalidCredentials);
    };
    if !bcrypt::verify(password, hashed)? {
        debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }
    Ok(user)
}

/// Retrieves a member by id.
///
/// # Errors
/// Returns `Error::UserNotFound` if there is no such member.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.to_string(),
        })
}

/// Looks a member up by email, ignoring surrounding whitespace.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All members ordered by id.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_users<C>(db: &C) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
