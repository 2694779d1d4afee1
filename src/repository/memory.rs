use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::models::{NewProduct, Product, User};

use super::{
    format_barcode, BarcodeSequence, ProductRepository, RepositoryError, RepositoryResult,
    UserRepository, BARCODE_CONSTRAINT, EMAIL_CONSTRAINT,
};

/// In-process store with the same uniqueness and cascade rules as the
/// PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<i32, User>,
    emails: DashMap<String, i32>,
    products: DashMap<i32, Product>,
    barcodes: DashMap<String, i32>,
    next_user_id: AtomicI32,
    next_product_id: AtomicI32,
    barcode_seq: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn reserve_barcode(&self, barcode: &str, product_id: i32) -> RepositoryResult<()> {
        match self.barcodes.entry(barcode.to_string()) {
            Entry::Occupied(owner) if *owner.get() != product_id => {
                Err(RepositoryError::Conflict(BARCODE_CONSTRAINT.to_string()))
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(product_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
        Ok(self.products.get(&id).map(|p| p.clone()))
    }

    async fn find_all_for_owner(&self, owner_id: i32) -> RepositoryResult<Vec<Product>> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.owner_user_id == owner_id)
            .map(|p| p.clone())
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn insert(&self, product: NewProduct) -> RepositoryResult<Product> {
        let id = self.next_product_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.reserve_barcode(&product.barcode, id)?;

        let now = Utc::now();
        let stored = Product {
            id,
            name: product.name,
            unit_of_measure: product.unit_of_measure,
            total_quantity: product.total_quantity,
            total_value: product.total_value,
            unit_value: product.unit_value,
            profit_margin_pct: product.profit_margin_pct,
            unit_sale_price: product.unit_sale_price,
            tax_rate_pct: product.tax_rate_pct,
            tax_value: product.tax_value,
            total_value_with_tax: product.total_value_with_tax,
            fixed_costs_pct: product.fixed_costs_pct,
            barcode: product.barcode,
            owner_user_id: product.owner_user_id,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let previous_barcode = self
            .products
            .get(&product.id)
            .map(|p| p.barcode.clone())
            .ok_or(RepositoryError::NotFound)?;

        if previous_barcode != product.barcode {
            self.reserve_barcode(&product.barcode, product.id)?;
            self.barcodes.remove(&previous_barcode);
        }

        let mut stored = product.clone();
        stored.updated_at = Utc::now();
        self.products.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: i32) -> RepositoryResult<()> {
        let (_, product) = self.products.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.barcodes.remove(&product.barcode);
        Ok(())
    }
}

#[async_trait]
impl BarcodeSequence for MemoryStore {
    async fn next_barcode(&self) -> RepositoryResult<String> {
        let next = self.barcode_seq.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format_barcode(next))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<User>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn insert(&self, email: &str, password_hash: &str) -> RepositoryResult<User> {
        let id = match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => {
                return Err(RepositoryError::Conflict(EMAIL_CONSTRAINT.to_string()))
            }
            Entry::Vacant(slot) => {
                let id = self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
                slot.insert(id);
                id
            }
        };

        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i32) -> RepositoryResult<()> {
        let (_, user) = self.users.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.emails.remove(&user.email);

        let owned: Vec<i32> = self
            .products
            .iter()
            .filter(|p| p.owner_user_id == id)
            .map(|p| p.id)
            .collect();
        for product_id in owned {
            if let Some((_, product)) = self.products.remove(&product_id) {
                self.barcodes.remove(&product.barcode);
            }
        }
        Ok(())
    }
}
