//! Pricing derivation for catalog products.
//!
//! Every function here is pure: raw product inputs go in, derived money
//! amounts come out. Derived amounts are rounded to [`MONEY_SCALE`] decimal
//! places, half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{CostBreakdown, Product, UpdateProduct};

pub const MONEY_SCALE: u32 = 4;

/// Largest accepted lot value. Together with [`MAX_PERCENT`] this keeps every
/// amount computed by [`derive`] well inside `Decimal`'s 96-bit mantissa.
pub const MAX_TOTAL_VALUE: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Largest accepted magnitude for margin, tax and fixed-cost percentages.
pub const MAX_PERCENT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// The user-supplied fields that drive every derived amount.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingInputs {
    pub total_quantity: i32,
    pub total_value: Decimal,
    pub profit_margin_pct: Decimal,
    pub tax_rate_pct: Decimal,
    pub fixed_costs_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DerivedPricing {
    pub unit_value: Decimal,
    pub unit_tax: Decimal,
    pub unit_fixed_cost: Decimal,
    pub unit_profit: Decimal,
    pub unit_sale_price: Decimal,
    /// Tax on the whole lot, not per unit.
    pub tax_value: Decimal,
    pub total_value_with_tax: Decimal,
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

fn percent_of(amount: Decimal, pct: Decimal) -> Decimal {
    amount * pct / Decimal::ONE_HUNDRED
}

/// Computes the derived pricing fields. Never fails: a quantity of zero or
/// less yields a zero unit value and a zero sale price.
pub fn derive(inputs: &PricingInputs) -> DerivedPricing {
    let unit_value = if inputs.total_quantity > 0 {
        round_money(inputs.total_value / Decimal::from(inputs.total_quantity))
    } else {
        Decimal::ZERO
    };

    // Rounded before summing so that with_tax - total == tax_value exactly
    let tax_value = round_money(percent_of(inputs.total_value, inputs.tax_rate_pct));
    let total_value_with_tax = inputs.total_value + tax_value;

    let unit_tax = round_money(percent_of(unit_value, inputs.tax_rate_pct));
    let unit_fixed_cost = if inputs.fixed_costs_pct.is_zero() {
        Decimal::ZERO
    } else {
        round_money(percent_of(unit_value, inputs.fixed_costs_pct))
    };
    let unit_profit = round_money(percent_of(unit_value, inputs.profit_margin_pct));

    DerivedPricing {
        unit_value,
        unit_tax,
        unit_fixed_cost,
        unit_profit,
        unit_sale_price: unit_value + unit_tax + unit_fixed_cost + unit_profit,
        tax_value,
        total_value_with_tax,
    }
}

/// Merges `patch` over `existing` and recomputes all derived fields from the
/// merged raw inputs, even when the patch touches none of them.
pub fn recompute_on_update(existing: &Product, patch: &UpdateProduct) -> Product {
    let mut product = existing.clone();

    if let Some(name) = &patch.name {
        product.name = name.trim().to_string();
    }
    if let Some(unit_of_measure) = &patch.unit_of_measure {
        product.unit_of_measure = Some(unit_of_measure.clone());
    }
    if let Some(total_quantity) = patch.total_quantity {
        product.total_quantity = total_quantity;
    }
    if let Some(total_value) = patch.total_value {
        product.total_value = total_value;
    }
    if let Some(profit_margin_pct) = patch.profit_margin_pct {
        product.profit_margin_pct = profit_margin_pct;
    }
    if let Some(tax_rate_pct) = patch.tax_rate_pct {
        product.tax_rate_pct = tax_rate_pct;
    }
    if let Some(fixed_costs_pct) = patch.fixed_costs_pct {
        product.fixed_costs_pct = fixed_costs_pct;
    }
    if let Some(barcode) = &patch.barcode {
        product.barcode = barcode.trim().to_string();
    }

    let derived = derive(&product.pricing_inputs());
    product.apply_pricing(&derived);
    product
}

fn checked_percent_of(amount: Decimal, pct: Decimal) -> Option<Decimal> {
    amount.checked_mul(pct)?.checked_div(Decimal::ONE_HUNDRED)
}

/// Costs an arbitrary quantity of `product` at its stored unit value.
///
/// Returns `None` when the amounts do not fit in a `Decimal`.
pub fn calculate_cost_for_quantity(product: &Product, quantity: i32) -> Option<CostBreakdown> {
    let total_cost = round_money(product.unit_value.checked_mul(Decimal::from(quantity))?);
    let profit = round_money(checked_percent_of(total_cost, product.profit_margin_pct)?);
    let tax = round_money(checked_percent_of(total_cost, product.tax_rate_pct)?);

    Some(CostBreakdown {
        product: product.name.clone(),
        quantity,
        total_cost,
        profit,
        tax,
        total_cost_with_tax: total_cost.checked_add(tax)?,
    })
}
