use async_trait::async_trait;

use crate::{
    application::repos::{ItemsRepo, RepoError},
    domain::items::{Item, Limit, MinRating},
};

use super::{PostgresRepositories, map_sqlx_error};

const ITEM_COLUMNS: &str = "name, primary_tag, secondary_tag, rating, rating_count";

#[derive(sqlx::FromRow)]
struct ItemRow {
    name: String,
    primary_tag: String,
    secondary_tag: String,
    rating: f64,
    rating_count: i64,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepoError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let rating_count = u32::try_from(row.rating_count).map_err(|_| {
            RepoError::from_persistence(format!(
                "rating_count {} of `{}` is out of range",
                row.rating_count, row.name
            ))
        })?;
        Ok(Self {
            name: row.name,
            primary_tag: row.primary_tag,
            secondary_tag: row.secondary_tag,
            rating: row.rating,
            rating_count,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> Result<Vec<Item>, RepoError> {
    rows.into_iter().map(Item::try_from).collect()
}

#[async_trait]
impl ItemsRepo for PostgresRepositories {
    async fn get(&self, name: &str) -> Result<Option<Item>, RepoError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE name = $1");
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Item::try_from).transpose()
    }

    async fn put(&self, item: &Item) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO items (name, primary_tag, secondary_tag, rating, rating_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
            SET primary_tag = EXCLUDED.primary_tag,
                secondary_tag = EXCLUDED.secondary_tag,
                rating = EXCLUDED.rating,
                rating_count = EXCLUDED.rating_count
            "#,
        )
        .bind(&item.name)
        .bind(&item.primary_tag)
        .bind(&item.secondary_tag)
        .bind(item.rating)
        .bind(i64::from(item.rating_count))
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn insert_if_absent(&self, item: &Item) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (name, primary_tag, secondary_tag, rating, rating_count)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&item.name)
        .bind(&item.primary_tag)
        .bind(&item.secondary_tag)
        .bind(item.rating)
        .bind(i64::from(item.rating_count))
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, name: &str) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM items WHERE name = $1")
            .bind(name)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_rating(
        &self,
        name: &str,
        rating: f64,
        rating_count: u32,
    ) -> Result<(), RepoError> {
        let result =
            sqlx::query("UPDATE items SET rating = $2, rating_count = $3 WHERE name = $1")
                .bind(name)
                .bind(rating)
                .bind(i64::from(rating_count))
                .execute(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn apply_rating(&self, name: &str, submitted: f64) -> Result<Option<Item>, RepoError> {
        // Every SET expression sees the pre-update row.
        let sql = format!(
            "UPDATE items \
             SET rating = (rating * rating_count + $2) / (rating_count + 1), \
                 rating_count = rating_count + 1 \
             WHERE name = $1 \
             RETURNING {ITEM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(name)
            .bind(submitted)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Item::try_from).transpose()
    }

    async fn query_by_secondary_tag(
        &self,
        secondary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE secondary_tag = $1 \
             ORDER BY rating DESC, name \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(secondary_tag)
            .bind(i64::from(limit.get()))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_items(rows)
    }

    async fn query_by_primary_tag(
        &self,
        primary_tag: &str,
        min_rating: MinRating,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE primary_tag = $1 AND rating >= $2 \
             ORDER BY rating DESC, name \
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(primary_tag)
            .bind(min_rating.as_f64())
            .bind(i64::from(limit.get()))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_items(rows)
    }

    async fn query_by_both_tags(
        &self,
        secondary_tag: &str,
        primary_tag: &str,
        limit: Limit,
    ) -> Result<Vec<Item>, RepoError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items \
             WHERE secondary_tag = $1 AND primary_tag = $2 \
             ORDER BY rating DESC, name \
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(secondary_tag)
            .bind(primary_tag)
            .bind(i64::from(limit.get()))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        into_items(rows)
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        self.ping().await.map_err(map_sqlx_error)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
