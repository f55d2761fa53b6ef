use crate::dispatch::{Arguments, Reply};
use crate::error::{ApiError, AppError};
use crate::handlers::{check_admin, deleted, paged};
use crate::models::Blog;
use crate::orm::Record;
use crate::service::validation::require_text;
use serde_json::Value;

fn validated(args: &Arguments) -> Result<(String, String, String), AppError> {
    let name = args.text("name");
    let summary = args.text("summary");
    let content = args.text("content");
    require_text("name", &name, "name cannot be empty.")?;
    require_text("summary", &summary, "summary cannot be empty.")?;
    require_text("content", &content, "content cannot be empty.")?;
    Ok((name.trim().to_string(), summary.trim().to_string(), content.trim().to_string()))
}

async fn find_blog(args: &Arguments, id: &str) -> Result<Record, AppError> {
    let state = args.state();
    let schema = state.schemas.get::<Blog>()?;
    Record::find(&state.db, &schema, &Value::from(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Blog", "Blog not found.").into())
}

pub async fn api_blogs(args: Arguments) -> Result<Reply, AppError> {
    paged::<Blog>(&args, "blogs", |b| b).await
}

pub async fn api_get_blog(args: Arguments) -> Result<Reply, AppError> {
    let blog = find_blog(&args, &args.text("id")).await?;
    Reply::json(&blog)
}

pub async fn api_create_blog(args: Arguments) -> Result<Reply, AppError> {
    check_admin(&args)?;
    let (name, summary, content) = validated(&args)?;
    let state = args.state();
    let Some(user) = args.user() else {
        return Err(ApiError::permission("Please signin first.").into());
    };
    let mut blog = Record::new(state.schemas.get::<Blog>()?)
        .with("user_id", user.get("id").cloned().unwrap_or(Value::Null))?
        .with("user_name", user.get("name").cloned().unwrap_or(Value::Null))?
        .with("user_image", user.get("image").cloned().unwrap_or(Value::Null))?
        .with("name", name)?
        .with("summary", summary)?
        .with("content", content)?;
    blog.save(&state.db).await?;
    Reply::json(&blog)
}

pub async fn api_update_blog(args: Arguments) -> Result<Reply, AppError> {
    check_admin(&args)?;
    let mut blog = find_blog(&args, &args.text("id")).await?;
    let (name, summary, content) = validated(&args)?;
    blog.set("name", name)?;
    blog.set("summary", summary)?;
    blog.set("content", content)?;
    blog.update(&args.state().db).await?;
    Reply::json(&blog)
}

pub async fn api_delete_blog(args: Arguments) -> Result<Reply, AppError> {
    check_admin(&args)?;
    let id = args.text("id");
    let blog = find_blog(&args, &id).await?;
    blog.remove(&args.state().db).await?;
    Ok(deleted(&id))
}
