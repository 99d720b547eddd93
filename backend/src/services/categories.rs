use crate::db::repository::FullRepository;
use crate::models::{Category, CategoryId, NewCategory};

use super::ServiceResult;

pub async fn list(repo: &dyn FullRepository) -> ServiceResult<Vec<Category>> {
    Ok(repo.list_categories().await?)
}

pub async fn create(repo: &dyn FullRepository, category: &NewCategory) -> ServiceResult<Category> {
    Ok(repo.create_category(category).await?)
}

pub async fn rename(
    repo: &dyn FullRepository,
    id: CategoryId,
    category: &NewCategory,
) -> ServiceResult<Category> {
    Ok(repo.rename_category(id, category).await?)
}

/// Refused with a foreign-key error while books still use the category.
pub async fn delete(repo: &dyn FullRepository, id: CategoryId) -> ServiceResult<()> {
    repo.delete_category(id).await?;
    tracing::info!(category_id = %id, "category deleted");
    Ok(())
}
