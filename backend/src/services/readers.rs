use crate::db::repository::FullRepository;
use crate::models::{NewReader, Reader, ReaderId};

use super::ServiceResult;

pub async fn create(repo: &dyn FullRepository, reader: &NewReader) -> ServiceResult<Reader> {
    let created = repo.create_reader(reader).await?;
    tracing::info!(reader_id = %created.id, "reader created");
    Ok(created)
}

pub async fn get(repo: &dyn FullRepository, id: ReaderId) -> ServiceResult<Reader> {
    Ok(repo.get_reader(id).await?)
}
