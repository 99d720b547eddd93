use crate::cache::{get_list, ListCache, AUTHOR_MENU_KEY, BOOK_MENU_KEY};
use crate::db::repository::FullRepository;
use crate::models::{Author, AuthorId, AuthorPatch, AuthorSummary, NewAuthor, Page, PageRequest};
use crate::validation::Validate;

use super::{ServiceError, ServiceResult};

pub async fn list(repo: &dyn FullRepository, page: PageRequest) -> ServiceResult<Page<Author>> {
    Ok(repo.list_authors(page).await?)
}

/// Cached list of every author.
pub async fn menu(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
) -> ServiceResult<Vec<AuthorSummary>> {
    get_list(cache, AUTHOR_MENU_KEY, || async {
        Ok::<_, ServiceError>(repo.list_author_summaries().await?)
    })
    .await
}

pub async fn get(repo: &dyn FullRepository, id: AuthorId) -> ServiceResult<Author> {
    Ok(repo.get_author(id).await?)
}

pub async fn create(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    author: &NewAuthor,
) -> ServiceResult<Author> {
    let created = repo.create_author(author).await?;
    tracing::info!(author_id = %created.id, "author created");
    cache.invalidate(AUTHOR_MENU_KEY).await?;
    Ok(created)
}

/// Apply `patch` to the stored author; the merged row must still be valid.
pub async fn update(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    id: AuthorId,
    patch: AuthorPatch,
) -> ServiceResult<Author> {
    let mut author = repo.get_author(id).await?;
    patch.apply_to(&mut author);
    author.validate()?;

    let updated = repo.update_author(&author).await?;
    // Book menu entries embed author names.
    cache.invalidate(AUTHOR_MENU_KEY).await?;
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(updated)
}

pub async fn delete(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    id: AuthorId,
) -> ServiceResult<()> {
    repo.delete_author(id).await?;
    tracing::info!(author_id = %id, "author deleted");
    cache.invalidate(AUTHOR_MENU_KEY).await?;
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryListCache;
    use crate::db::repositories::LocalRepository;
    use crate::models::Sex;

    fn new_author(name: &str, birth: i32, death: Option<i32>) -> NewAuthor {
        NewAuthor {
            name: name.to_string(),
            sex: Sex::Female,
            avatar: None,
            birth_year: birth,
            death_year: death,
            story: None,
        }
    }

    #[tokio::test]
    async fn test_create_invalidates_menu() {
        let repo = LocalRepository::new();
        let cache = MemoryListCache::new();
        menu(&repo, &cache).await.unwrap();
        create(&repo, &cache, &new_author("Octavia Butler", 1947, Some(2006)))
            .await
            .unwrap();

        assert!(cache.snapshot(AUTHOR_MENU_KEY).is_none());
        let names: Vec<String> = menu(&repo, &cache)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Octavia Butler"]);
    }

    #[tokio::test]
    async fn test_update_rejects_merged_lifespan() {
        let repo = LocalRepository::new();
        let cache = MemoryListCache::new();
        let author = create(&repo, &cache, &new_author("Mary Shelley", 1797, Some(1851)))
            .await
            .unwrap();

        let patch = AuthorPatch {
            birth_year: Some(1900),
            ..Default::default()
        };
        let err = update(&repo, &cache, author.id, patch).await.unwrap_err();

        match err {
            ServiceError::Validation(errors) => assert_eq!(errors[0].field, "death_year"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(get(&repo, author.id).await.unwrap().birth_year, 1797);
    }
}
