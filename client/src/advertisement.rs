//! Advertisement operations named after the API's catalog relations.

use crate::client::{ApiClient, Target};
use crate::error::ApiResult;
use crate::model::{Advertisement, AdvertisementSummary, Logo, PatchOperation, ProcessingStatus, Template};
use crate::resource::{Page, Resource};
use reqwest::Method;
use tracing::instrument;

/// Relation and embedded collection names.
pub mod relations {
    /// Advertisement collection; templated with `{?advertiserId}`
    pub const ADVERTISEMENTS: &str = "advertisements";
    /// Single advertisement; templated with `{advertisementId}`
    pub const ADVERTISEMENT: &str = "advertisement";
    /// Templates of an advertiser
    pub const TEMPLATES: &str = "templates";
    /// Logos of an advertiser
    pub const LOGOS: &str = "logos";
}

impl Target {
    /// The advertisement with `id`.
    #[must_use]
    pub fn advertisement(id: impl Into<String>) -> Self {
        Self::id(relations::ADVERTISEMENT, id)
    }
}

fn collection(relation: &str, advertiser_id: Option<&str>) -> Target {
    let target = Target::relation(relation);
    match advertiser_id {
        Some(id) => target.with_param("advertiserId", id),
        None => target,
    }
}

impl ApiClient {
    /// Post a new advertisement.
    ///
    /// # Errors
    ///
    /// [`ApiError::Validation`](crate::ApiError::Validation) for a rejected
    /// payload and [`ApiError::Conflict`](crate::ApiError::Conflict) when the
    /// `creationId` was already used.
    #[instrument(skip_all)]
    pub async fn create_advertisement(
        &self,
        advertisement: &Advertisement,
    ) -> ApiResult<Resource<Advertisement>> {
        let media = &self.config().media_types;
        self.send_json(
            Method::POST,
            Target::relation(relations::ADVERTISEMENTS),
            Some(media.accept_advertisement()),
            &media.advertisement,
            advertisement,
        )
        .await
    }

    /// Fetch an advertisement by [`Target::advertisement`] or its `self` URI.
    ///
    /// # Errors
    ///
    /// [`ApiError::NotFound`](crate::ApiError::NotFound) for an unknown id.
    #[instrument(skip_all)]
    pub async fn get_advertisement(
        &self,
        target: impl Into<Target>,
    ) -> ApiResult<Resource<Advertisement>> {
        let accept = self.config().media_types.accept_advertisement();
        let request = self.prepare(Method::GET, &target.into(), Some(accept)).await?;
        Resource::from_response(&self.execute(&request).await?)
    }

    /// Replace an advertisement.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::create_advertisement`].
    #[instrument(skip_all)]
    pub async fn update_advertisement(
        &self,
        target: impl Into<Target>,
        advertisement: &Advertisement,
    ) -> ApiResult<Resource<Advertisement>> {
        let media = &self.config().media_types;
        self.send_json(
            Method::PUT,
            target.into(),
            Some(media.accept_advertisement()),
            &media.advertisement,
            advertisement,
        )
        .await
    }

    /// Take an advertisement down.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_advertisement`].
    #[instrument(skip_all)]
    pub async fn expire_advertisement(
        &self,
        target: impl Into<Target>,
    ) -> ApiResult<Resource<Advertisement>> {
        let media = &self.config().media_types;
        self.send_json(
            Method::PATCH,
            target.into(),
            Some(media.accept_advertisement()),
            &media.advertisement_patch,
            &[PatchOperation::expire()],
        )
        .await
    }

    /// Processing state of an advertisement, read with `HEAD`.
    ///
    /// `None` when the server sent no recognised `Processing-Status`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_advertisement`].
    #[instrument(skip_all)]
    pub async fn advertisement_status(
        &self,
        target: impl Into<Target>,
    ) -> ApiResult<Option<ProcessingStatus>> {
        let accept = self.config().media_types.accept_advertisement();
        let request = self.prepare(Method::HEAD, &target.into(), Some(accept)).await?;
        let response = self.execute(&request).await?;
        Ok(Resource::<()>::from_response(&response)?.meta.processing_status)
    }

    /// First page of advertisements, optionally for one advertiser.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_page`].
    #[instrument(skip(self))]
    pub async fn list_advertisements(
        &self,
        advertiser_id: Option<&str>,
    ) -> ApiResult<Page<AdvertisementSummary>> {
        let accept = self.config().media_types.accept_advertisement_list();
        let target = collection(relations::ADVERTISEMENTS, advertiser_id);
        let request = self.prepare(Method::GET, &target, Some(accept)).await?;
        self.fetch_page(request, relations::ADVERTISEMENTS).await
    }

    /// First page of an advertiser's templates.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_page`].
    #[instrument(skip(self))]
    pub async fn list_templates(&self, advertiser_id: Option<&str>) -> ApiResult<Page<Template>> {
        self.get_page(collection(relations::TEMPLATES, advertiser_id), relations::TEMPLATES)
            .await
    }

    /// First page of an advertiser's logos.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get_page`].
    #[instrument(skip(self))]
    pub async fn list_logos(&self, advertiser_id: Option<&str>) -> ApiResult<Page<Logo>> {
        self.get_page(collection(relations::LOGOS, advertiser_id), relations::LOGOS)
            .await
    }
}
