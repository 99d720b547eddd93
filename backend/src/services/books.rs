use crate::cache::{get_list, ListCache, BOOK_MENU_KEY};
use crate::db::repository::FullRepository;
use crate::models::{
    AuthorLinks, Book, BookDetail, BookFilter, BookId, BookPatch, BookSummary, NewBook, Page,
    PageRequest, PdfUpdate,
};
use crate::validation::Validate;

use super::{ServiceError, ServiceResult};

pub async fn list(
    repo: &dyn FullRepository,
    filter: BookFilter,
    page: PageRequest,
) -> ServiceResult<Page<Book>> {
    Ok(repo.list_books(filter, page).await?)
}

/// Cached list of books that have at least one author.
pub async fn menu(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
) -> ServiceResult<Vec<BookSummary>> {
    get_list(cache, BOOK_MENU_KEY, || async {
        Ok::<_, ServiceError>(repo.list_book_menu().await?)
    })
    .await
}

pub async fn detail(repo: &dyn FullRepository, id: BookId) -> ServiceResult<BookDetail> {
    Ok(repo.get_book_detail(id).await?)
}

/// Store the book's own fields. The PDF and author links are set by
/// separate calls; nothing is rolled back if those later calls fail.
pub async fn create(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    book: &NewBook,
) -> ServiceResult<Book> {
    let created = repo.create_book(book).await?;
    tracing::info!(book_id = %created.id, "book created");
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(created)
}

pub async fn update(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    id: BookId,
    patch: BookPatch,
) -> ServiceResult<Book> {
    let mut book = repo.get_book(id).await?;
    patch.apply_to(&mut book);
    book.validate()?;

    let updated = repo.update_book(&book).await?;
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(updated)
}

pub async fn set_pdf(
    repo: &dyn FullRepository,
    id: BookId,
    update: &PdfUpdate,
) -> ServiceResult<Book> {
    Ok(repo.set_book_pdf(id, update.path()).await?)
}

pub async fn set_authors(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    id: BookId,
    links: &AuthorLinks,
) -> ServiceResult<BookDetail> {
    let detail = repo.set_book_authors(id, &links.author_ids).await?;
    tracing::info!(book_id = %id, authors = links.author_ids.len(), "book authors replaced");
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(detail)
}

pub async fn delete(
    repo: &dyn FullRepository,
    cache: &dyn ListCache,
    id: BookId,
) -> ServiceResult<()> {
    repo.delete_book(id).await?;
    tracing::info!(book_id = %id, "book deleted");
    cache.invalidate(BOOK_MENU_KEY).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryListCache;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{AuthorRepository, RepositoryError};
    use crate::models::{AuthorId, NewAuthor, Sex};

    fn new_book(name: &str) -> NewBook {
        NewBook {
            name: name.to_string(),
            avatar: None,
            published_day: None,
            category_id: None,
            introduce: None,
            images: vec!["covers/a.png".to_string()],
        }
    }

    #[tokio::test]
    async fn test_relinking_authors_refreshes_menu() {
        let repo = LocalRepository::new();
        let cache = MemoryListCache::new();
        let author = repo
            .create_author(&NewAuthor {
                name: "Stanislaw Lem".to_string(),
                sex: Sex::Male,
                avatar: None,
                birth_year: 1921,
                death_year: Some(2006),
                story: None,
            })
            .await
            .unwrap();
        let book = create(&repo, &cache, &new_book("Solaris")).await.unwrap();

        assert!(menu(&repo, &cache).await.unwrap().is_empty());

        set_authors(
            &repo,
            &cache,
            book.id,
            &AuthorLinks {
                author_ids: vec![author.id],
            },
        )
        .await
        .unwrap();

        let menu = menu(&repo, &cache).await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].authors[0].name, "Stanislaw Lem");
    }

    #[tokio::test]
    async fn test_unknown_author_is_foreign_key_error() {
        let repo = LocalRepository::new();
        let cache = MemoryListCache::new();
        let book = create(&repo, &cache, &new_book("Solaris")).await.unwrap();

        let err = set_authors(
            &repo,
            &cache,
            book.id,
            &AuthorLinks {
                author_ids: vec![AuthorId::new(999)],
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Repository(RepositoryError::ForeignKey { .. })
        ));
    }

    #[tokio::test]
    async fn test_patch_replaces_images() {
        let repo = LocalRepository::new();
        let cache = MemoryListCache::new();
        let book = create(&repo, &cache, &new_book("Solaris")).await.unwrap();

        let patch = BookPatch {
            images: Some(vec!["covers/b.png".to_string(), "covers/c.png".to_string()]),
            ..Default::default()
        };
        let updated = update(&repo, &cache, book.id, patch).await.unwrap();

        assert_eq!(updated.images, vec!["covers/b.png", "covers/c.png"]);
        assert_eq!(updated.name, "Solaris");
    }
}
