use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ProductStore, StoreError};
use crate::entities::product::{self, Entity as ProductEntity, Tags};

pub const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub stock: i32,
    pub discount: f64,
    pub tags: Vec<String>,
    pub is_featured: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub discount: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Price,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Listing filters, straight from the query string.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, Validate)]
pub struct ProductQuery {
    pub featured: Option<bool>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub category: Option<String>,
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u64>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,
    pub sort_by: Option<SortBy>,
    pub order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductPage {
    pub products: Vec<product::Model>,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(Clone, Debug)]
pub struct ProductRepository {
    db: Arc<DatabaseConnection>,
}

impl ProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Conditional decrement shared with checkout, so both paths enforce the
/// same floor. Runs on whatever connection or transaction it is given.
pub(crate) async fn subtract_stock<C: ConnectionTrait>(
    db: &C,
    id: i32,
    quantity: u32,
) -> Result<(), StoreError> {
    let quantity = i64::from(quantity);

    let result = ProductEntity::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .filter(product::Column::Id.eq(id))
        .filter(product::Column::Deleted.eq(false))
        .filter(product::Column::Stock.gte(quantity))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        return Ok(());
    }

    let exists = ProductEntity::find_by_id(id)
        .filter(product::Column::Deleted.eq(false))
        .one(db)
        .await?
        .is_some();

    if exists {
        Err(StoreError::InsufficientStock { product_id: id })
    } else {
        Err(StoreError::NotFound("Product"))
    }
}

#[async_trait]
impl ProductStore for ProductRepository {
    async fn find_active(&self, id: i32) -> Result<Option<product::Model>, StoreError> {
        Ok(ProductEntity::find_by_id(id)
            .filter(product::Column::Deleted.eq(false))
            .one(&*self.db)
            .await?)
    }

    async fn find_active_many(&self, ids: &[i32]) -> Result<Vec<product::Model>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(ProductEntity::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .filter(product::Column::Deleted.eq(false))
            .all(&*self.db)
            .await?)
    }

    async fn list_active(&self, query: &ProductQuery) -> Result<ProductPage, StoreError> {
        let mut select = ProductEntity::find().filter(product::Column::Deleted.eq(false));

        if Some(true) == query.featured {
            select = select.filter(product::Column::IsFeatured.eq(true));
        }
        if let Some(min) = query.min {
            select = select.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = query.max {
            select = select.filter(product::Column::Price.lte(max));
        }
        if let Some(category) = &query.category {
            select = select.filter(product::Column::Category.eq(category.as_str()));
        }
        if let Some(search) = &query.search {
            select = select.filter(product::Column::Name.contains(search.as_str()));
        }

        let sort_column = match query.sort_by.unwrap_or_default() {
            SortBy::Name => product::Column::Name,
            SortBy::Price => product::Column::Price,
        };
        let order = match query.order.unwrap_or_default() {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        let paginator = select
            .order_by(sort_column, order)
            .order_by_asc(product::Column::Id)
            .paginate(&*self.db, query.limit());

        let total_pages = paginator.num_pages().await?;
        let current_page = query.page();
        let products = paginator.fetch_page(current_page - 1).await?;

        Ok(ProductPage {
            products,
            total_pages,
            current_page,
        })
    }

    async fn create(&self, new: NewProduct) -> Result<product::Model, StoreError> {
        product::ActiveModel {
            name: Set(new.name),
            description: Set(new.description),
            category: Set(new.category),
            price: Set(new.price),
            stock: Set(new.stock),
            discount: Set(new.discount),
            tags: Set(Tags(new.tags)),
            rating_average: Set(0.0),
            rating_count: Set(0),
            is_featured: Set(new.is_featured),
            deleted: Set(false),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|err| StoreError::from_write(err, "Product"))
    }

    async fn update(&self, id: i32, patch: ProductPatch) -> Result<product::Model, StoreError> {
        let existing = self
            .find_active(id)
            .await?
            .ok_or(StoreError::NotFound("Product"))?;

        let mut product: product::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            product.name = Set(name);
        }
        if let Some(description) = patch.description {
            product.description = Set(description);
        }
        if let Some(category) = patch.category {
            product.category = Set(category);
        }
        if let Some(price) = patch.price {
            product.price = Set(price);
        }
        if let Some(stock) = patch.stock {
            product.stock = Set(stock);
        }
        if let Some(discount) = patch.discount {
            product.discount = Set(discount);
        }
        if let Some(tags) = patch.tags {
            product.tags = Set(Tags(tags));
        }
        if let Some(is_featured) = patch.is_featured {
            product.is_featured = Set(is_featured);
        }

        product
            .update(&*self.db)
            .await
            .map_err(|err| StoreError::from_write(err, "Product"))
    }

    async fn soft_delete(&self, id: i32) -> Result<(), StoreError> {
        let result = ProductEntity::update_many()
            .col_expr(product::Column::Deleted, Expr::value(true))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Deleted.eq(false))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound("Product"));
        }
        Ok(())
    }

    async fn adjust_stock(&self, id: i32, quantity: u32) -> Result<product::Model, StoreError> {
        subtract_stock(&*self.db, id, quantity).await?;

        self.find_active(id)
            .await?
            .ok_or(StoreError::NotFound("Product"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::memory_db;

    fn new_product(name: &str, price: f64, stock: i32) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: format!("{name} description"),
            category: "bakery".into(),
            price,
            stock,
            discount: 0.0,
            tags: vec!["fresh".into()],
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn soft_deleted_products_are_invisible() {
        let repo = ProductRepository::new(memory_db().await);
        let kept = repo.create(new_product("Bagel", 1.5, 3)).await.unwrap();
        let gone = repo.create(new_product("Pretzel", 2.0, 3)).await.unwrap();

        repo.soft_delete(gone.id).await.unwrap();

        assert!(repo.find_active(gone.id).await.unwrap().is_none());
        let many = repo.find_active_many(&[kept.id, gone.id]).await.unwrap();
        assert_eq!(many, vec![kept]);

        let page = repo.list_active(&ProductQuery::default()).await.unwrap();
        assert_eq!(page.products.len(), 1);

        assert!(matches!(
            repo.soft_delete(gone.id).await,
            Err(StoreError::NotFound("Product"))
        ));
    }

    #[tokio::test]
    async fn duplicate_names_are_reported() {
        let repo = ProductRepository::new(memory_db().await);
        repo.create(new_product("Bagel", 1.5, 3)).await.unwrap();

        let result = repo.create(new_product("Bagel", 9.0, 1)).await;

        assert!(matches!(result, Err(StoreError::Duplicate("Product"))));
    }

    #[tokio::test]
    async fn stock_cannot_go_negative() {
        let repo = ProductRepository::new(memory_db().await);
        let bagel = repo.create(new_product("Bagel", 1.5, 3)).await.unwrap();

        let updated = repo.adjust_stock(bagel.id, 2).await.unwrap();
        assert_eq!(updated.stock, 1);

        let result = repo.adjust_stock(bagel.id, 2).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { product_id }) if product_id == bagel.id
        ));
        assert_eq!(repo.find_active(bagel.id).await.unwrap().unwrap().stock, 1);

        assert!(matches!(
            repo.adjust_stock(9999, 1).await,
            Err(StoreError::NotFound("Product"))
        ));
    }

    #[tokio::test]
    async fn listing_filters_sorts_and_paginates() {
        let repo = ProductRepository::new(memory_db().await);
        for (name, price) in [("Bagel", 1.5), ("Croissant", 3.0), ("Baguette", 2.5)] {
            repo.create(new_product(name, price, 5)).await.unwrap();
        }

        let query = ProductQuery {
            sort_by: Some(SortBy::Price),
            order: Some(SortOrder::Desc),
            limit: Some(2),
            ..Default::default()
        };
        let page = repo.list_active(&query).await.unwrap();
        let names: Vec<&str> = page.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Croissant", "Baguette"]);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 1);

        let query = ProductQuery {
            min: Some(2.0),
            search: Some("Ba".into()),
            ..Default::default()
        };
        let page = repo.list_active(&query).await.unwrap();
        let names: Vec<&str> = page.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Baguette"]);
    }

    #[tokio::test]
    async fn patch_only_touches_given_fields() {
        let repo = ProductRepository::new(memory_db().await);
        let bagel = repo.create(new_product("Bagel", 1.5, 3)).await.unwrap();

        let patched = repo
            .update(
                bagel.id,
                ProductPatch {
                    price: Some(2.25),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.price, 2.25);
        assert_eq!(patched.name, "Bagel");
        assert_eq!(patched.stock, 3);
        assert_eq!(patched.tags, Tags(vec!["fresh".into()]));

        let retagged = repo
            .update(
                bagel.id,
                ProductPatch {
                    tags: Some(vec!["sesame".into(), "savory".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(retagged.tags, Tags(vec!["sesame".into(), "savory".into()]));
        assert_eq!(retagged.price, 2.25);
    }
}
