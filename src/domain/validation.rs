//! Field-shape checks applied before a payload reaches the store.

use super::entities::{NewDelivery, NewItem, NewPayment, OrderRecord};
use super::error::DomainError;

const MAX_SALE_PERCENT: i64 = 100;

pub trait Validate {
    fn validate(&self) -> Result<(), DomainError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be blank"));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::validation(
            field,
            format!("must not be negative (got {value})"),
        ));
    }
    Ok(())
}

impl Validate for NewDelivery {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("delivery.name", &self.name)
    }
}

impl Validate for NewPayment {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("payment.transaction", &self.transaction)?;
        require_text("payment.currency", &self.currency)?;
        require_non_negative("payment.amount", self.amount)?;
        require_non_negative("payment.delivery_cost", self.delivery_cost)?;
        require_non_negative("payment.goods_total", self.goods_total)?;
        require_non_negative("payment.custom_fee", self.custom_fee)
    }
}

impl Validate for NewItem {
    fn validate(&self) -> Result<(), DomainError> {
        require_non_negative("item.price", self.price)?;
        require_non_negative("item.total_price", self.total_price)?;
        if !(0..=MAX_SALE_PERCENT).contains(&self.sale) {
            return Err(DomainError::validation(
                "item.sale",
                format!("must be between 0 and {MAX_SALE_PERCENT} (got {})", self.sale),
            ));
        }
        Ok(())
    }
}

impl Validate for OrderRecord {
    fn validate(&self) -> Result<(), DomainError> {
        require_text("order.order_uid", &self.order_uid)
    }
}
