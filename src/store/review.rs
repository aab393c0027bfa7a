use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{ReviewStore, StoreError};
use crate::entities::{
    product::{self, Entity as ProductEntity},
    review::{self, Entity as ReviewEntity},
};

#[derive(Clone, Debug, PartialEq)]
pub struct NewReview {
    pub product_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: String,
}

/// `(average, count)` over `ratings`; an empty slice averages to 0.
pub fn rating_summary(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() {
        return (0.0, 0);
    }

    let sum: i64 = ratings.iter().map(|&rating| i64::from(rating)).sum();
    let count = ratings.len();
    (sum as f64 / count as f64, count as i32)
}

/// Recomputes the product's rating columns from its current reviews.
async fn refresh_ratings<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<(), StoreError> {
    let ratings: Vec<i32> = ReviewEntity::find()
        .filter(review::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .into_iter()
        .map(|review| review.rating)
        .collect();

    let (average, count) = rating_summary(&ratings);

    ProductEntity::update_many()
        .col_expr(product::Column::RatingAverage, Expr::value(average))
        .col_expr(product::Column::RatingCount, Expr::value(count))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    Ok(())
}

async fn find_active_product<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<product::Model, StoreError> {
    ProductEntity::find_by_id(id)
        .filter(product::Column::Deleted.eq(false))
        .one(db)
        .await?
        .ok_or(StoreError::NotFound("Product"))
}

#[derive(Clone, Debug)]
pub struct ReviewRepository {
    db: Arc<DatabaseConnection>,
}

impl ReviewRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for ReviewRepository {
    async fn list_for_product(&self, product_id: i32) -> Result<Vec<review::Model>, StoreError> {
        Ok(ReviewEntity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .order_by_desc(review::Column::Id)
            .all(&*self.db)
            .await?)
    }

    async fn add(&self, new: NewReview) -> Result<product::Model, StoreError> {
        let txn = self.db.begin().await?;

        find_active_product(&txn, new.product_id).await?;

        review::ActiveModel {
            product_id: Set(new.product_id),
            user_id: Set(new.user_id),
            rating: Set(new.rating),
            comment: Set(new.comment),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        refresh_ratings(&txn, new.product_id).await?;
        let product = find_active_product(&txn, new.product_id).await?;

        txn.commit().await?;

        Ok(product)
    }

    async fn remove(
        &self,
        product_id: i32,
        review_id: i32,
        author: Option<i32>,
    ) -> Result<product::Model, StoreError> {
        let txn = self.db.begin().await?;

        find_active_product(&txn, product_id).await?;

        let mut select = ReviewEntity::find_by_id(review_id)
            .filter(review::Column::ProductId.eq(product_id));
        if let Some(user_id) = author {
            select = select.filter(review::Column::UserId.eq(user_id));
        }
        let existing = select
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound("Review"))?;

        existing.delete(&txn).await?;

        refresh_ratings(&txn, product_id).await?;
        let product = find_active_product(&txn, product_id).await?;

        txn.commit().await?;

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{testing::memory_db, NewProduct, ProductRepository, ProductStore};

    struct Fixture {
        products: ProductRepository,
        reviews: ReviewRepository,
    }

    async fn fixture() -> (Fixture, i32) {
        let db = memory_db().await;
        let products = ProductRepository::new(db.clone());
        let bagel = products
            .create(NewProduct {
                name: "Bagel".into(),
                description: "Plain".into(),
                category: "bakery".into(),
                price: 1.5,
                stock: 10,
                discount: 0.0,
                tags: Vec::new(),
                is_featured: false,
            })
            .await
            .unwrap()
            .id;

        (
            Fixture {
                products,
                reviews: ReviewRepository::new(db),
            },
            bagel,
        )
    }

    fn review(product_id: i32, user_id: i32, rating: i32) -> NewReview {
        NewReview {
            product_id,
            user_id,
            rating,
            comment: format!("{rating} stars"),
        }
    }

    #[test]
    fn summary_of_no_ratings_is_zero() {
        assert_eq!(rating_summary(&[]), (0.0, 0));
        assert_eq!(rating_summary(&[4, 5, 3]), (4.0, 3));
        assert_eq!(rating_summary(&[5, 4]), (4.5, 2));
    }

    #[tokio::test]
    async fn ratings_follow_added_and_removed_reviews() {
        let (fx, bagel) = fixture().await;

        fx.reviews.add(review(bagel, 7, 5)).await.unwrap();
        let product = fx.reviews.add(review(bagel, 8, 2)).await.unwrap();
        assert_eq!(product.rating_count, 2);
        assert_eq!(product.rating_average, 3.5);

        let listed = fx.reviews.list_for_product(bagel).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].user_id, 8);

        let product = fx.reviews.remove(bagel, listed[0].id, None).await.unwrap();
        assert_eq!(product.rating_count, 1);
        assert_eq!(product.rating_average, 5.0);

        let product = fx.reviews.remove(bagel, listed[1].id, None).await.unwrap();
        assert_eq!(product.rating_count, 0);
        assert_eq!(product.rating_average, 0.0);
    }

    #[tokio::test]
    async fn only_the_author_can_remove_with_author_check() {
        let (fx, bagel) = fixture().await;
        fx.reviews.add(review(bagel, 7, 5)).await.unwrap();
        let id = fx.reviews.list_for_product(bagel).await.unwrap()[0].id;

        assert!(matches!(
            fx.reviews.remove(bagel, id, Some(8)).await,
            Err(StoreError::NotFound("Review"))
        ));
        assert_eq!(fx.reviews.list_for_product(bagel).await.unwrap().len(), 1);

        fx.reviews.remove(bagel, id, Some(7)).await.unwrap();
        assert!(fx.reviews.list_for_product(bagel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reviews_need_an_active_product() {
        let (fx, bagel) = fixture().await;
        fx.products.soft_delete(bagel).await.unwrap();

        assert!(matches!(
            fx.reviews.add(review(bagel, 7, 4)).await,
            Err(StoreError::NotFound("Product"))
        ));
        assert!(matches!(
            fx.reviews.add(review(9999, 7, 4)).await,
            Err(StoreError::NotFound("Product"))
        ));
    }
}
