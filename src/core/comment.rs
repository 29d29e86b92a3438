//! Day comments - at most one free-text note per member and date.

use crate::{
    entities::{Comment, comment},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::HashMap;

/// Writes `text` as the member's comment for `date`, replacing any existing one.
///
/// Runs on whatever connection it is given, so a submission can write the
/// comment inside the same transaction as the day's consumptions.
///
/// # Errors
/// Returns an error if the database operation fails.
pub async fn upsert_comment<C>(
    db: &C,
    user_id: i64,
    date: NaiveDate,
    text: &str,
) -> Result<comment::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    let existing = Comment::find()
        .filter(comment::Column::UserId.eq(user_id))
        .filter(comment::Column::Date.eq(date))
        .one(db)
        .await?;

    if let Some(row) = existing {
        let mut active_model: comment::ActiveModel = row.into();
        active_model.comment = Set(text.to_string());
        active_model.updated_at = Set(now);
        Ok(active_model.update(db).await?)
    } else {
        let new_comment = comment::ActiveModel {
            user_id: Set(user_id),
            date: Set(date),
            comment: Set(text.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(new_comment.insert(db).await?)
    }
}

/// Removes the member's comment for `date`. Returns whether one existed.
///
/// # Errors
/// Returns an error if the database operation fails.
pub async fn delete_comment<C>(db: &C, user_id: i64, date: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Comment::delete_many()
        .filter(comment::Column::UserId.eq(user_id))
        .filter(comment::Column::Date.eq(date))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// The member's comment for `date`, if one is stored.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_comment<C>(db: &C, user_id: i64, date: NaiveDate) -> Result<Option<comment::Model>>
where
    C: ConnectionTrait,
{
    Comment::find()
        .filter(comment::Column::UserId.eq(user_id))
        .filter(comment::Column::Date.eq(date))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All of the member's comments keyed by date.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_comments_for_user<C>(db: &C, user_id: i64) -> Result<HashMap<NaiveDate, String>>
where
    C: ConnectionTrait,
{
    let rows = Comment::find()
        .filter(comment::Column::UserId.eq(user_id))
        .order_by_desc(comment::Column::Date)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|c| (c.date, c.comment)).collect())
}
