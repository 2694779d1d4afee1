use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::pricing::{DerivedPricing, PricingInputs};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub unit_of_measure: Option<String>,
    pub total_quantity: i32,
    pub total_value: Decimal,
    pub unit_value: Decimal,
    pub profit_margin_pct: Decimal,
    pub unit_sale_price: Decimal,
    pub tax_rate_pct: Decimal,
    pub tax_value: Decimal,
    pub total_value_with_tax: Decimal,
    pub fixed_costs_pct: Decimal,
    pub barcode: String,
    pub owner_user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn pricing_inputs(&self) -> PricingInputs {
        PricingInputs {
            total_quantity: self.total_quantity,
            total_value: self.total_value,
            profit_margin_pct: self.profit_margin_pct,
            tax_rate_pct: self.tax_rate_pct,
            fixed_costs_pct: self.fixed_costs_pct,
        }
    }

    /// Overwrites every stored derived field.
    pub fn apply_pricing(&mut self, derived: &DerivedPricing) {
        self.unit_value = derived.unit_value;
        self.unit_sale_price = derived.unit_sale_price;
        self.tax_value = derived.tax_value;
        self.total_value_with_tax = derived.total_value_with_tax;
    }
}

/// A product that has not been saved yet and therefore has no id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub unit_of_measure: Option<String>,
    pub total_quantity: i32,
    pub total_value: Decimal,
    pub unit_value: Decimal,
    pub profit_margin_pct: Decimal,
    pub unit_sale_price: Decimal,
    pub tax_rate_pct: Decimal,
    pub tax_value: Decimal,
    pub total_value_with_tax: Decimal,
    pub fixed_costs_pct: Decimal,
    pub barcode: String,
    pub owner_user_id: i32,
}

impl NewProduct {
    pub fn from_request(
        request: &CreateProduct,
        barcode: String,
        owner_user_id: i32,
        derived: &DerivedPricing,
    ) -> Self {
        Self {
            name: request.name.trim().to_string(),
            unit_of_measure: request.unit_of_measure.clone(),
            total_quantity: request.total_quantity,
            total_value: request.total_value,
            unit_value: derived.unit_value,
            profit_margin_pct: request.profit_margin_pct,
            unit_sale_price: derived.unit_sale_price,
            tax_rate_pct: request.tax_rate_pct,
            tax_value: derived.tax_value,
            total_value_with_tax: derived.total_value_with_tax,
            fixed_costs_pct: request.fixed_costs_pct,
            barcode,
            owner_user_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub unit_of_measure: Option<String>,
    pub total_quantity: i32,
    pub total_value: Decimal,
    #[serde(default)]
    pub profit_margin_pct: Decimal,
    #[serde(default)]
    pub tax_rate_pct: Decimal,
    #[serde(default)]
    pub fixed_costs_pct: Decimal,
    // Assigned from the barcode sequence when absent
    #[serde(default)]
    pub barcode: Option<String>,
}

impl CreateProduct {
    pub fn pricing_inputs(&self) -> PricingInputs {
        PricingInputs {
            total_quantity: self.total_quantity,
            total_value: self.total_value,
            profit_margin_pct: self.profit_margin_pct,
            tax_rate_pct: self.tax_rate_pct,
            fixed_costs_pct: self.fixed_costs_pct,
        }
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub unit_of_measure: Option<String>,
    pub total_quantity: Option<i32>,
    pub total_value: Option<Decimal>,
    pub profit_margin_pct: Option<Decimal>,
    pub tax_rate_pct: Option<Decimal>,
    pub fixed_costs_pct: Option<Decimal>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub product: String,
    pub quantity: i32,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub tax: Decimal,
    pub total_cost_with_tax: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CostQuery {
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
