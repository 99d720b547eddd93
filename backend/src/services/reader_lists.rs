//! Reader lists (favorites, read-late, used-read).
//!
//! Every successful add or remove re-reads the reader's whole list of that
//! kind and publishes it. The store change is already committed when the
//! publish runs, so a publish failure is reported to the caller without
//! undoing the change.

use crate::db::repository::FullRepository;
use crate::events::{EventPublisher, ListEvent};
use crate::models::{BookId, ListKind, ReaderId, ReaderList};

use super::ServiceResult;

pub async fn get(
    repo: &dyn FullRepository,
    reader: ReaderId,
    kind: ListKind,
) -> ServiceResult<ReaderList> {
    Ok(repo.list_entries(reader, kind).await?)
}

pub async fn add(
    repo: &dyn FullRepository,
    events: &dyn EventPublisher,
    reader: ReaderId,
    kind: ListKind,
    book: BookId,
) -> ServiceResult<ReaderList> {
    repo.add_list_entry(reader, kind, book).await?;
    publish_current(repo, events, reader, kind).await
}

/// Not-found when the book is not on the list; nothing is published then.
pub async fn remove(
    repo: &dyn FullRepository,
    events: &dyn EventPublisher,
    reader: ReaderId,
    kind: ListKind,
    book: BookId,
) -> ServiceResult<ReaderList> {
    repo.remove_list_entry(reader, kind, book).await?;
    publish_current(repo, events, reader, kind).await
}

async fn publish_current(
    repo: &dyn FullRepository,
    events: &dyn EventPublisher,
    reader: ReaderId,
    kind: ListKind,
) -> ServiceResult<ReaderList> {
    let list = repo.list_entries(reader, kind).await?;
    let event = ListEvent::from_list(list.clone());
    if let Err(err) = events.publish(&event).await {
        tracing::error!(
            reader_id = %reader,
            event = event.channel(),
            error = %err,
            "list changed but event was not published"
        );
        return Err(err.into());
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::db::repository::{BookRepository, ReaderRepository, RepositoryError};
    use crate::events::{FailingPublisher, InMemoryPublisher};
    use crate::models::{NewBook, NewReader};
    use crate::services::ServiceError;

    async fn seed(repo: &LocalRepository) -> (ReaderId, BookId) {
        let reader = repo
            .create_reader(&NewReader {
                name: "Ada".to_string(),
                email: "ada@example.org".to_string(),
            })
            .await
            .unwrap();
        let book = repo
            .create_book(&NewBook {
                name: "Kindred".to_string(),
                avatar: None,
                published_day: None,
                category_id: None,
                introduce: None,
                images: vec![],
            })
            .await
            .unwrap();
        (reader.id, book.id)
    }

    #[tokio::test]
    async fn test_add_publishes_full_list() {
        let repo = LocalRepository::new();
        let events = InMemoryPublisher::new();
        let (reader, book) = seed(&repo).await;

        let list = add(&repo, &events, reader, ListKind::Favorites, book)
            .await
            .unwrap();

        let published = events.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].event, "favorite_books");
        assert_eq!(published[0].reader_id, reader);
        assert_eq!(published[0].books, list.books);
    }

    #[tokio::test]
    async fn test_remove_missing_entry_publishes_nothing() {
        let repo = LocalRepository::new();
        let events = InMemoryPublisher::new();
        let (reader, book) = seed(&repo).await;

        let err = remove(&repo, &events, reader, ListKind::Favorites, book)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Repository(RepositoryError::NotFound { .. })
        ));
        assert!(events.published().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_committed_entry() {
        let repo = LocalRepository::new();
        let (reader, book) = seed(&repo).await;

        let err = add(&repo, &FailingPublisher, reader, ListKind::ReadLate, book)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Publish(_)));
        let list = get(&repo, reader, ListKind::ReadLate).await.unwrap();
        assert_eq!(list.books.len(), 1);
    }
}
