//! Service listing catalog
//!
//! CRUD over the service offerings shown on the marketing site.

use std::sync::Arc;

use super::error::ContentServiceError;
use crate::db::repositories::ServiceRepository;
use crate::db::DbError;
use crate::models::{CreateServiceInput, Service, ServiceQuery, UpdateServiceInput};
use crate::validation::Validate;

/// Service listing catalog
pub struct CatalogService {
    repo: Arc<dyn ServiceRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn ServiceRepository>) -> Self {
        Self { repo }
    }

    /// List services, newest first. A slug filter yields zero or one entry;
    /// a blank slug is no filter.
    pub async fn list(&self, query: &ServiceQuery) -> Result<Vec<Service>, ContentServiceError> {
        match query.slug.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(slug) => Ok(self.repo.find_by_slug(slug).await?.into_iter().collect()),
            None => Ok(self.repo.list().await?),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Service, ContentServiceError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ContentServiceError::ServiceNotFound)
    }

    pub async fn create(&self, input: CreateServiceInput) -> Result<Service, ContentServiceError> {
        input.validate()?;

        let created = self.repo.create(&Service::from_input(input)).await?;
        tracing::info!(service_id = %created.id, slug = %created.slug, "Service created");
        Ok(created)
    }

    /// Apply a partial update. A missing id is `DbError::NotFound`.
    pub async fn update(
        &self,
        id: &str,
        input: UpdateServiceInput,
    ) -> Result<Service, ContentServiceError> {
        input.validate()?;

        let mut service = self.repo.find_by_id(id).await?.ok_or(DbError::NotFound)?;
        service.apply(input);

        let updated = self.repo.update(&service).await?;
        tracing::info!(service_id = %updated.id, "Service updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ContentServiceError> {
        self.repo.delete(id).await?;
        tracing::info!(service_id = %id, "Service deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxServiceRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_catalog() -> CatalogService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        CatalogService::new(SqlxServiceRepository::boxed(pool))
    }

    fn input(slug: &str) -> CreateServiceInput {
        CreateServiceInput {
            title: "Branding".into(),
            slug: slug.into(),
            category: "design".into(),
            summary: "Identity work".into(),
            description: "Logos and guidelines".into(),
            icon: "sparkles".into(),
            features: vec!["Logo".into(), "Palette".into()],
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_update_service() {
        let catalog = setup_catalog().await;
        let created = catalog.create(input("branding")).await.unwrap();

        let updated = catalog
            .update(
                &created.id,
                UpdateServiceInput {
                    title: Some("Brand strategy".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Brand strategy");
        assert_eq!(updated.slug, "branding");
    }

    #[tokio::test]
    async fn test_missing_service() {
        let catalog = setup_catalog().await;

        let err = catalog.get("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "Service not found");

        let err = catalog
            .update("missing", UpdateServiceInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Record not found");
    }

    #[tokio::test]
    async fn test_features_must_be_present() {
        let catalog = setup_catalog().await;
        let mut bad = input("empty-features");
        bad.features.clear();
        assert!(matches!(
            catalog.create(bad).await,
            Err(ContentServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_list_by_slug() {
        let catalog = setup_catalog().await;
        catalog.create(input("one")).await.unwrap();
        catalog.create(input("two")).await.unwrap();

        let all = catalog.list(&ServiceQuery::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let one = catalog
            .list(&ServiceQuery {
                slug: Some("one".into()),
            })
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].slug, "one");

        let blank = catalog
            .list(&ServiceQuery {
                slug: Some(" ".into()),
            })
            .await
            .unwrap();
        assert_eq!(blank.len(), 2);
    }
}
