use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::{NewProduct, Product, ProductPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::CatalogRepository;

/// Product catalog service. Reads are public; writes are wired to
/// admin-guarded routes at the API layer.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    #[instrument(name = "commerce.service.list_products", skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        debug!("Listing products");
        let products = self
            .repo
            .list()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Found {} products", products.len());
        Ok(products)
    }

    #[instrument(name = "commerce.service.get_product", skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: Uuid) -> Result<Product, DomainError> {
        debug!("Getting product");
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::product_not_found(id))
    }

    #[instrument(name = "commerce.service.create_product", skip(self, new_product), fields(name = %new_product.name))]
    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product, DomainError> {
        info!("Creating product");

        validate_name(&new_product.name)?;
        validate_price(new_product.price)?;
        validate_stock(new_product.stock)?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new_product.name.trim().to_string(),
            price: new_product.price,
            description: new_product.description,
            image_url: new_product.image_url,
            stock: new_product.stock,
            category: new_product.category,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(product.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!(product_id = %product.id, "Successfully created product");
        Ok(product)
    }

    /// Partial update. Absent fields keep their current values.
    #[instrument(name = "commerce.service.update_product", skip(self, patch), fields(product_id = %id))]
    pub async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, DomainError> {
        info!("Updating product");

        let mut product = self.get_product(id).await?;

        if let Some(name) = patch.name {
            validate_name(&name)?;
            product.name = name.trim().to_string();
        }
        if let Some(price) = patch.price {
            validate_price(price)?;
            product.price = price;
        }
        if let Some(stock) = patch.stock {
            validate_stock(stock)?;
            product.stock = stock;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = image_url;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        product.updated_at = Utc::now();

        self.repo
            .update(product.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Successfully updated product");
        Ok(product)
    }

    #[instrument(name = "commerce.service.delete_product", skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting product");

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::product_not_found(id));
        }

        info!("Successfully deleted product");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name", "name must not be empty"));
    }
    Ok(())
}

fn validate_price(price: Decimal) -> Result<(), DomainError> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price", "price must not be negative"));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> Result<(), DomainError> {
    if stock < 0 {
        return Err(DomainError::validation("stock", "stock must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemCatalogRepo {
        products: Mutex<HashMap<Uuid, Product>>,
    }

    #[async_trait]
    impl CatalogRepository for MemCatalogRepo {
        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
            Ok(self.products.lock().unwrap().get(&id).cloned())
        }

        async fn list(&self) -> anyhow::Result<Vec<Product>> {
            let mut products: Vec<_> = self.products.lock().unwrap().values().cloned().collect();
            products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(products)
        }

        async fn insert(&self, product: Product) -> anyhow::Result<()> {
            self.products.lock().unwrap().insert(product.id, product);
            Ok(())
        }

        async fn update(&self, product: Product) -> anyhow::Result<()> {
            self.products.lock().unwrap().insert(product.id, product);
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.products.lock().unwrap().remove(&id).is_some())
        }
    }

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemCatalogRepo::default()))
    }

    fn amigurumi(name: &str, price: i64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price: Decimal::from(price),
            description: "Hand-crocheted".to_string(),
            image_url: String::new(),
            stock,
            category: "animals".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let svc = service();
        let created = svc.create_product(amigurumi("Bear", 2500, 5)).await.unwrap();
        let fetched = svc.get_product(created.id).await.unwrap();
        assert_eq!(fetched.name, "Bear");
        assert_eq!(fetched.stock, 5);
    }

    #[tokio::test]
    async fn patch_only_touches_supplied_fields() {
        let svc = service();
        let created = svc.create_product(amigurumi("Bear", 2500, 5)).await.unwrap();

        let updated = svc
            .update_product(
                created.id,
                ProductPatch {
                    stock: Some(12),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.stock, 12);
        assert_eq!(updated.name, "Bear");
        assert_eq!(updated.price, Decimal::from(2500));
    }

    #[tokio::test]
    async fn negative_price_is_rejected() {
        let svc = service();
        let err = svc
            .create_product(amigurumi("Bear", -1, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn delete_missing_product_is_not_found() {
        let svc = service();
        let err = svc.delete_product(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DomainError::ProductNotFound { .. }));
    }
}
