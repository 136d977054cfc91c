//! Generic CRUD over one resource kind.

use std::marker::PhantomData;

use hoe_core::Validate;
use hoe_storefront::api::{ApiClient, ApiError, envelope};
use serde::de::IgnoredAny;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::AdminError;
use crate::portal::Portal;
use crate::resource::Resource;

/// CRUD routes for `R` through one portal.
pub struct Collection<R> {
    api: ApiClient,
    portal: Portal,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            portal: self.portal,
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Collection<R> {
    /// Open the collection, refusing portals without access.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotPermitted` when `portal` may not manage `R`.
    pub fn new(api: ApiClient, portal: Portal) -> Result<Self, AdminError> {
        if !R::permitted(portal) {
            return Err(AdminError::NotPermitted {
                portal,
                resource: R::PATH,
            });
        }
        Ok(Self {
            api,
            portal,
            _resource: PhantomData,
        })
    }

    fn collection_path(&self) -> String {
        self.portal.path(R::PATH)
    }

    fn item_path(&self, id: &R::Id) -> String {
        self.portal.path(&format!("{}/{id}", R::PATH))
    }

    /// Every document visible to the portal.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(portal = %self.portal, resource = R::PATH))]
    pub async fn list(&self) -> Result<Vec<R>, AdminError> {
        Ok(self
            .api
            .get_list(&self.collection_path(), self.portal.auth())
            .await?)
    }

    /// One document.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` (wrapped) for unknown IDs.
    #[instrument(skip(self, id), fields(portal = %self.portal, resource = R::PATH, id = %id))]
    pub async fn get(&self, id: &R::Id) -> Result<R, AdminError> {
        let value = self
            .api
            .get::<Value>(&self.item_path(id), self.portal.auth())
            .await?;
        Self::document(value)
    }

    /// Validate and create a document.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` without sending anything when the form
    /// fails validation.
    #[instrument(skip(self, input), fields(portal = %self.portal, resource = R::PATH))]
    pub async fn create(&self, input: &R::Input) -> Result<R, AdminError> {
        input.validate()?;
        let value = self
            .api
            .post::<Value, _>(&self.collection_path(), input, self.portal.auth())
            .await?;
        let created = Self::document(value)?;
        info!("document created");
        Ok(created)
    }

    /// Validate and replace a document.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Invalid` without sending anything when the form
    /// fails validation.
    #[instrument(skip(self, id, input), fields(portal = %self.portal, resource = R::PATH, id = %id))]
    pub async fn update(&self, id: &R::Id, input: &R::Input) -> Result<R, AdminError> {
        input.validate()?;
        let value = self
            .api
            .put::<Value, _>(&self.item_path(id), input, self.portal.auth())
            .await?;
        let updated = Self::document(value)?;
        info!("document updated");
        Ok(updated)
    }

    /// Delete a document.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, id), fields(portal = %self.portal, resource = R::PATH, id = %id))]
    pub async fn delete(&self, id: &R::Id) -> Result<(), AdminError> {
        self.api
            .delete::<IgnoredAny>(&self.item_path(id), self.portal.auth())
            .await?;
        info!("document deleted");
        Ok(())
    }

    fn document(value: Value) -> Result<R, AdminError> {
        serde_json::from_value(envelope::unnest(value, R::NAME))
            .map_err(|e| AdminError::Api(ApiError::from(e)))
    }
}
