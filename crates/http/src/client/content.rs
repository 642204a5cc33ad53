//! Blog, project and skill management
//!
//! All three resources share one shape on the backend: a collection at
//! `/<name>` and items at `/<name>/{id}`.

use super::{FolioClient, PendingRequest, error::ClientError};
use folio_core::{Blog, Envelope, Project, Skill};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// CRUD access to one backend collection
pub struct Resource<'a, T> {
    client: &'a FolioClient,
    path: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T> Resource<'_, T> {
    /// Collection path, e.g. `/blog`
    pub const fn path(&self) -> &'static str {
        self.path
    }

    fn item_path(&self, id: &str) -> String {
        format!("{}/{id}", self.path)
    }
}

impl<T: DeserializeOwned> Resource<'_, T> {
    pub async fn create<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> Result<Envelope<T>, ClientError> {
        self.client
            .call(PendingRequest::post(self.path).json(payload)?)
            .await
    }

    pub async fn list(&self) -> Result<Envelope<Vec<T>>, ClientError> {
        self.client.call(PendingRequest::get(self.path)).await
    }

    /// Replace fields of one item; `payload` may be partial
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        id: &str,
        payload: &P,
    ) -> Result<Envelope<T>, ClientError> {
        self.client
            .call(PendingRequest::put(self.item_path(id)).json(payload)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.client
            .send(PendingRequest::delete(self.item_path(id)))
            .await?;
        info!(path = self.path, id, "Deleted item");
        Ok(())
    }
}

impl FolioClient {
    fn resource<T>(&self, path: &'static str) -> Resource<'_, T> {
        Resource {
            client: self,
            path,
            _item: PhantomData,
        }
    }

    /// Blog posts
    pub fn blogs(&self) -> Resource<'_, Blog> {
        self.resource("/blog")
    }

    /// Portfolio projects
    pub fn projects(&self) -> Resource<'_, Project> {
        self.resource("/project")
    }

    pub fn skills(&self) -> Resource<'_, Skill> {
        self.resource("/skill")
    }
}
