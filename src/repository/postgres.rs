use async_trait::async_trait;

use crate::{
    database::Database,
    models::{NewProduct, Product, User},
};

use super::{
    format_barcode, BarcodeSequence, ProductRepository, RepositoryError, RepositoryResult,
    UserRepository,
};

#[derive(Clone)]
pub struct PgStore {
    pool: Database,
}

impl PgStore {
    pub fn new(pool: Database) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn find_all_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE owner_user_id = $1 ORDER BY name ASC, id ASC"
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn insert(&self, product: NewProduct) -> RepositoryResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, unit_of_measure, total_quantity, total_value, unit_value,
                profit_margin_pct, unit_sale_price, tax_rate_pct, tax_value,
                total_value_with_tax, fixed_costs_pct, barcode, owner_user_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&product.name)
        .bind(&product.unit_of_measure)
        .bind(product.total_quantity)
        .bind(product.total_value)
        .bind(product.unit_value)
        .bind(product.profit_margin_pct)
        .bind(product.unit_sale_price)
        .bind(product.tax_rate_pct)
        .bind(product.tax_value)
        .bind(product.total_value_with_tax)
        .bind(product.fixed_costs_pct)
        .bind(&product.barcode)
        .bind(product.owner_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $2, unit_of_measure = $3, total_quantity = $4, total_value = $5,
                unit_value = $6, profit_margin_pct = $7, unit_sale_price = $8,
                tax_rate_pct = $9, tax_value = $10, total_value_with_tax = $11,
                fixed_costs_pct = $12, barcode = $13, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.unit_of_measure)
        .bind(product.total_quantity)
        .bind(product.total_value)
        .bind(product.unit_value)
        .bind(product.profit_margin_pct)
        .bind(product.unit_sale_price)
        .bind(product.tax_rate_pct)
        .bind(product.tax_value)
        .bind(product.total_value_with_tax)
        .bind(product.fixed_costs_pct)
        .bind(&product.barcode)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: i32) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl BarcodeSequence for PgStore {
    async fn next_barcode(&self) -> RepositoryResult<String> {
        let next = sqlx::query_scalar::<_, i64>("SELECT nextval('product_barcode_seq')")
            .fetch_one(&self.pool)
            .await?;

        Ok(format_barcode(next))
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn insert(&self, email: &str, password_hash: &str) -> RepositoryResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: i32) -> RepositoryResult<()> {
        // products rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
