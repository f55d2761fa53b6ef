use crate::dispatch::{Arguments, Reply};
use crate::error::{ApiError, AppError};
use crate::handlers::{check_admin, deleted, paged};
use crate::models::{Blog, Comment};
use crate::orm::Record;
use crate::service::validation::require_text;
use serde_json::Value;

pub async fn api_comments(args: Arguments) -> Result<Reply, AppError> {
    paged::<Comment>(&args, "comments", |c| c).await
}

/// Signed-in users only; the blog must exist.
pub async fn api_create_comment(args: Arguments) -> Result<Reply, AppError> {
    let Some(user) = args.user() else {
        return Err(ApiError::permission("Please signin first.").into());
    };
    let content = args.text("content");
    require_text("content", &content, "content cannot be empty.")?;

    let state = args.state();
    let blogs = state.schemas.get::<Blog>()?;
    let Some(blog) = Record::find(&state.db, &blogs, &Value::from(args.text("id"))).await? else {
        return Err(ApiError::not_found("Blog", "Blog not found.").into());
    };
    let mut comment = Record::new(state.schemas.get::<Comment>()?)
        .with("blog_id", blog.get("id").cloned().unwrap_or(Value::Null))?
        .with("user_id", user.get("id").cloned().unwrap_or(Value::Null))?
        .with("user_name", user.get("name").cloned().unwrap_or(Value::Null))?
        .with("user_image", user.get("image").cloned().unwrap_or(Value::Null))?
        .with("content", content.trim())?;
    comment.save(&state.db).await?;
    Reply::json(&comment)
}

pub async fn api_delete_comments(args: Arguments) -> Result<Reply, AppError> {
    check_admin(&args)?;
    let id = args.text("id");
    let state = args.state();
    let schema = state.schemas.get::<Comment>()?;
    let Some(comment) = Record::find(&state.db, &schema, &Value::from(id.as_str())).await? else {
        return Err(ApiError::not_found("Comment", "Comment not found.").into());
    };
    comment.remove(&state.db).await?;
    Ok(deleted(&id))
}
