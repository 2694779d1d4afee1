use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{
    error::AppError,
    models::{CostBreakdown, CreateProduct, NewProduct, Product, UpdateProduct},
    pricing::{self, DerivedPricing, MAX_PERCENT, MAX_TOTAL_VALUE},
    repository::{BarcodeSequence, ProductRepository, RepositoryError},
};

const MAX_NAME_LENGTH: usize = 255;
const MAX_BARCODE_LENGTH: usize = 20;
const MAX_UNIT_OF_MEASURE_LENGTH: usize = 32;
const AUTO_BARCODE_ATTEMPTS: usize = 5;

/// Owner-scoped product operations.
#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductRepository>,
    barcodes: Arc<dyn BarcodeSequence>,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductRepository>, barcodes: Arc<dyn BarcodeSequence>) -> Self {
        Self { products, barcodes }
    }

    pub async fn create_product(
        &self,
        mut request: CreateProduct,
        owner_id: i32,
    ) -> Result<Product, AppError> {
        // A blank barcode is treated as "assign one for me"
        request.barcode = request
            .barcode
            .take()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        validate_create(&request)?;

        let derived = pricing::derive(&request.pricing_inputs());
        let product = match request.barcode.clone() {
            Some(barcode) => {
                let draft = NewProduct::from_request(&request, barcode, owner_id, &derived);
                self.products.insert(draft).await?
            }
            None => self.insert_with_allocated_barcode(&request, owner_id, &derived).await?,
        };

        log::info!(
            "Created product {} ({}) for user {}",
            product.id,
            product.barcode,
            owner_id
        );
        Ok(product)
    }

    async fn insert_with_allocated_barcode(
        &self,
        request: &CreateProduct,
        owner_id: i32,
        derived: &DerivedPricing,
    ) -> Result<Product, AppError> {
        for attempt in 1..=AUTO_BARCODE_ATTEMPTS {
            let barcode = self.barcodes.next_barcode().await?;
            let draft = NewProduct::from_request(request, barcode.clone(), owner_id, derived);
            match self.products.insert(draft).await {
                Ok(product) => return Ok(product),
                Err(RepositoryError::Conflict(_)) => {
                    log::warn!(
                        "Allocated barcode {} is already taken (attempt {})",
                        barcode,
                        attempt
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Conflict("Could not allocate a free barcode".to_string()))
    }

    pub async fn list_products(&self, owner_id: i32) -> Result<Vec<Product>, AppError> {
        Ok(self.products.find_all_for_owner(owner_id).await?)
    }

    pub async fn get_product(&self, id: i32, owner_id: i32) -> Result<Product, AppError> {
        self.fetch_owned(id, owner_id).await
    }

    pub async fn update_product(
        &self,
        id: i32,
        patch: UpdateProduct,
        owner_id: i32,
    ) -> Result<Product, AppError> {
        let existing = self.fetch_owned(id, owner_id).await?;
        validate_update(&patch)?;

        let updated = pricing::recompute_on_update(&existing, &patch);
        log::debug!(
            "Recomputed product {}: unit_value={} unit_sale_price={} tax_value={} total_value_with_tax={}",
            id,
            updated.unit_value,
            updated.unit_sale_price,
            updated.tax_value,
            updated.total_value_with_tax
        );

        Ok(self.products.update(&updated).await?)
    }

    pub async fn delete_product(&self, id: i32, owner_id: i32) -> Result<(), AppError> {
        self.fetch_owned(id, owner_id).await?;
        self.products.delete(id).await?;
        log::info!("Deleted product {} for user {}", id, owner_id);
        Ok(())
    }

    pub async fn calculate_cost(
        &self,
        product_id: i32,
        quantity: i32,
        owner_id: i32,
    ) -> Result<CostBreakdown, AppError> {
        if quantity < 0 {
            return Err(AppError::Validation("Quantity cannot be negative".to_string()));
        }
        let product = self.fetch_owned(product_id, owner_id).await?;
        pricing::calculate_cost_for_quantity(&product, quantity).ok_or_else(|| {
            AppError::Validation("Quantity is too large to cost this product".to_string())
        })
    }

    async fn fetch_owned(&self, id: i32, owner_id: i32) -> Result<Product, AppError> {
        let product = self
            .products
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        if product.owner_user_id != owner_id {
            return Err(AppError::Forbidden(
                "Product belongs to another user".to_string(),
            ));
        }
        Ok(product)
    }
}

fn validate_create(request: &CreateProduct) -> Result<(), AppError> {
    validate_name(&request.name)?;
    validate_quantity(request.total_quantity)?;
    validate_total_value(request.total_value)?;
    validate_percent("Profit margin", request.profit_margin_pct)?;
    validate_percent("Tax rate", request.tax_rate_pct)?;
    validate_percent("Fixed costs", request.fixed_costs_pct)?;
    if let Some(unit) = &request.unit_of_measure {
        validate_unit_of_measure(unit)?;
    }
    if let Some(barcode) = &request.barcode {
        validate_barcode(barcode)?;
    }
    Ok(())
}

fn validate_update(patch: &UpdateProduct) -> Result<(), AppError> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(quantity) = patch.total_quantity {
        validate_quantity(quantity)?;
    }
    if let Some(value) = patch.total_value {
        validate_total_value(value)?;
    }
    if let Some(pct) = patch.profit_margin_pct {
        validate_percent("Profit margin", pct)?;
    }
    if let Some(pct) = patch.tax_rate_pct {
        validate_percent("Tax rate", pct)?;
    }
    if let Some(pct) = patch.fixed_costs_pct {
        validate_percent("Fixed costs", pct)?;
    }
    if let Some(unit) = &patch.unit_of_measure {
        validate_unit_of_measure(unit)?;
    }
    if let Some(barcode) = &patch.barcode {
        validate_barcode(barcode.trim())?;
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Product name cannot be empty".to_string()));
    }
    if name.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Product name must be at most {} characters",
            MAX_NAME_LENGTH
        )));
    }
    Ok(())
}

fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 0 {
        return Err(AppError::Validation("Total quantity cannot be negative".to_string()));
    }
    Ok(())
}

fn validate_total_value(value: Decimal) -> Result<(), AppError> {
    if value < Decimal::ZERO {
        return Err(AppError::Validation("Total value cannot be negative".to_string()));
    }
    if value > MAX_TOTAL_VALUE {
        return Err(AppError::Validation(format!(
            "Total value must be at most {}",
            MAX_TOTAL_VALUE
        )));
    }
    Ok(())
}

fn validate_percent(field: &str, pct: Decimal) -> Result<(), AppError> {
    if pct.abs() > MAX_PERCENT {
        return Err(AppError::Validation(format!(
            "{} must be between -{} and {} percent",
            field, MAX_PERCENT, MAX_PERCENT
        )));
    }
    Ok(())
}

fn validate_unit_of_measure(unit: &str) -> Result<(), AppError> {
    if unit.chars().count() > MAX_UNIT_OF_MEASURE_LENGTH {
        return Err(AppError::Validation(format!(
            "Unit of measure must be at most {} characters",
            MAX_UNIT_OF_MEASURE_LENGTH
        )));
    }
    Ok(())
}

fn validate_barcode(barcode: &str) -> Result<(), AppError> {
    if barcode.is_empty() {
        return Err(AppError::Validation("Barcode cannot be empty".to_string()));
    }
    if barcode.chars().count() > MAX_BARCODE_LENGTH {
        return Err(AppError::Validation(format!(
            "Barcode must be at most {} characters",
            MAX_BARCODE_LENGTH
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn catalog() -> CatalogService {
        catalog_with_store().0
    }

    fn catalog_with_store() -> (CatalogService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CatalogService::new(store.clone(), store.clone()), store)
    }

    fn request(name: &str, barcode: Option<&str>) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            unit_of_measure: Some("kg".to_string()),
            total_quantity: 100,
            total_value: dec("500"),
            profit_margin_pct: dec("20"),
            tax_rate_pct: dec("15"),
            fixed_costs_pct: Decimal::ZERO,
            barcode: barcode.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_stores_derived_fields() {
        let catalog = catalog();
        let product = catalog.create_product(request("Farinha", Some("789")), 1).await.unwrap();

        assert_eq!(product.owner_user_id, 1);
        assert_eq!(product.barcode, "789");
        assert_eq!(product.unit_value, dec("5"));
        assert_eq!(product.unit_sale_price, dec("6.75"));
        assert_eq!(product.tax_value, dec("75"));
        assert_eq!(product.total_value_with_tax, dec("575"));
    }

    #[tokio::test]
    async fn missing_or_blank_barcode_is_allocated() {
        let catalog = catalog();
        let first = catalog.create_product(request("A", None), 1).await.unwrap();
        let second = catalog.create_product(request("B", Some("   ")), 1).await.unwrap();

        assert_eq!(first.barcode, "0000000000001");
        assert_eq!(second.barcode, "0000000000002");
    }

    #[tokio::test]
    async fn allocation_skips_manually_taken_barcode() {
        let catalog = catalog();
        catalog.create_product(request("Manual", Some("0000000000001")), 1).await.unwrap();

        let auto = catalog.create_product(request("Auto", None), 1).await.unwrap();
        assert_eq!(auto.barcode, "0000000000002");
    }

    #[tokio::test]
    async fn duplicate_barcode_conflicts() {
        let catalog = catalog();
        catalog.create_product(request("Cafe", Some("123")), 1).await.unwrap();

        let err = catalog.create_product(request("Cha", Some("123")), 2).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_inputs() {
        let catalog = catalog();

        let mut negative = request("Cafe", None);
        negative.total_quantity = -1;
        assert!(matches!(
            catalog.create_product(negative, 1).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            catalog.create_product(request("  ", None), 1).await,
            Err(AppError::Validation(_))
        ));

        let long_barcode = "1".repeat(21);
        assert!(matches!(
            catalog.create_product(request("Cafe", Some(long_barcode.as_str())), 1).await,
            Err(AppError::Validation(_))
        ));

        let long_name = "a".repeat(256);
        assert!(matches!(
            catalog.create_product(request(&long_name, None), 1).await,
            Err(AppError::Validation(_))
        ));
        let longest_name = "a".repeat(255);
        assert!(catalog.create_product(request(&longest_name, None), 1).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_amounts_beyond_decimal_range() {
        let catalog = catalog();

        let mut huge_value = request("Ouro", None);
        huge_value.total_value = dec("5000000000000000000000000000");
        assert!(matches!(
            catalog.create_product(huge_value, 1).await,
            Err(AppError::Validation(_))
        ));

        let mut huge_margin = request("Ouro", None);
        huge_margin.profit_margin_pct = dec("10000.01");
        assert!(matches!(
            catalog.create_product(huge_margin, 1).await,
            Err(AppError::Validation(_))
        ));

        let mut huge_tax = request("Ouro", None);
        huge_tax.tax_rate_pct = dec("-20000");
        assert!(matches!(
            catalog.create_product(huge_tax, 1).await,
            Err(AppError::Validation(_))
        ));

        let mut at_limit = request("Ouro", None);
        at_limit.total_value = MAX_TOTAL_VALUE;
        at_limit.fixed_costs_pct = MAX_PERCENT;
        let product = catalog.create_product(at_limit, 1).await.unwrap();

        let patch = UpdateProduct {
            total_value: Some(dec("5000000000000000000000000000")),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, patch, 1).await,
            Err(AppError::Validation(_))
        ));
        let patch = UpdateProduct {
            fixed_costs_pct: Some(dec("99999")),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, patch, 1).await,
            Err(AppError::Validation(_))
        ));

        let long_name = UpdateProduct {
            name: Some("b".repeat(300)),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, long_name, 1).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn other_owner_is_forbidden() {
        let catalog = catalog();
        let product = catalog.create_product(request("Cafe", None), 1).await.unwrap();

        assert!(matches!(catalog.get_product(product.id, 2).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            catalog.update_product(product.id, UpdateProduct::default(), 2).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(catalog.delete_product(product.id, 2).await, Err(AppError::Forbidden(_))));
        assert!(matches!(
            catalog.calculate_cost(product.id, 5, 2).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(catalog.get_product(product.id, 1).await.is_ok());
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let catalog = catalog();

        assert!(matches!(catalog.calculate_cost(99, 1, 1).await, Err(AppError::NotFound(_))));
        assert!(matches!(catalog.delete_product(99, 1).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            catalog.update_product(99, UpdateProduct::default(), 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_recomputes_from_merged_inputs() {
        let catalog = catalog();
        let product = catalog.create_product(request("Cafe", None), 1).await.unwrap();

        let patch = UpdateProduct {
            total_value: Some(dec("1000")),
            fixed_costs_pct: Some(dec("10")),
            ..Default::default()
        };
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let updated = catalog.update_product(product.id, patch, 1).await.unwrap();

        assert_eq!(updated.total_quantity, 100);
        assert_eq!(updated.unit_value, dec("10"));
        // 10 + 1.5 tax + 1 fixed + 2 profit
        assert_eq!(updated.unit_sale_price, dec("14.5"));
        assert_eq!(updated.tax_value, dec("150"));
        assert_eq!(updated.total_value_with_tax, dec("1150"));

        assert_eq!(updated.created_at, product.created_at);
        assert!(updated.updated_at > product.updated_at);

        let listed = catalog.list_products(1).await.unwrap();
        assert_eq!(listed, vec![updated]);
    }

    #[tokio::test]
    async fn update_to_taken_barcode_conflicts() {
        let catalog = catalog();
        catalog.create_product(request("Cafe", Some("A")), 1).await.unwrap();
        let other = catalog.create_product(request("Cha", Some("B")), 1).await.unwrap();

        let patch = UpdateProduct {
            barcode: Some("A".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(other.id, patch, 1).await,
            Err(AppError::Conflict(_))
        ));

        let unchanged = catalog.get_product(other.id, 1).await.unwrap();
        assert_eq!(unchanged.barcode, "B");
    }

    #[tokio::test]
    async fn update_rejects_negative_quantity() {
        let catalog = catalog();
        let product = catalog.create_product(request("Cafe", None), 1).await.unwrap();

        let patch = UpdateProduct {
            total_quantity: Some(-5),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_product(product.id, patch, 1).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let catalog = catalog();
        let product = catalog.create_product(request("Cafe", None), 1).await.unwrap();

        catalog.delete_product(product.id, 1).await.unwrap();
        assert!(matches!(catalog.get_product(product.id, 1).await, Err(AppError::NotFound(_))));
        assert!(catalog.list_products(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn calculates_cost_for_quantity() {
        let catalog = catalog();
        let product = catalog.create_product(request("Cafe", None), 1).await.unwrap();

        let breakdown = catalog.calculate_cost(product.id, 3, 1).await.unwrap();
        assert_eq!(breakdown.total_cost, dec("15"));
        assert_eq!(breakdown.profit, dec("3"));
        assert_eq!(breakdown.tax, dec("2.25"));
        assert_eq!(breakdown.total_cost_with_tax, dec("17.25"));

        assert!(matches!(
            catalog.calculate_cost(product.id, -1, 1).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn oversized_cost_is_a_validation_error() {
        let (catalog, store) = catalog_with_store();
        let mut legacy = request("Legado", Some("L1"));
        legacy.total_value = dec("1000000000000000000000000000");
        legacy.total_quantity = 1;
        let derived = DerivedPricing {
            unit_value: legacy.total_value,
            ..Default::default()
        };
        let draft = NewProduct::from_request(&legacy, "L1".to_string(), 1, &derived);
        let product = ProductRepository::insert(store.as_ref(), draft).await.unwrap();

        assert!(matches!(
            catalog.calculate_cost(product.id, 1000, 1).await,
            Err(AppError::Validation(_))
        ));
    }
}
