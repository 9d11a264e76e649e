//! Credit debit and product usage accounting after a generation

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::merchant::{MerchantId, MerchantRepository};
use crate::domain::product::{ProductId, ProductRepository};
use crate::domain::GenerationOutcome;
use crate::infrastructure::observability::record_bookkeeping_failure;

/// Result of the two bookkeeping writes; `None` where a write failed or did not apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettlementReport {
    pub remaining_credits: Option<i64>,
    pub usage_count: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Settlement {
    merchants: Arc<dyn MerchantRepository>,
    products: Arc<dyn ProductRepository>,
    credit_cost: i64,
    charge_placeholder: bool,
}

impl Settlement {
    pub fn new(
        merchants: Arc<dyn MerchantRepository>,
        products: Arc<dyn ProductRepository>,
    ) -> Self {
        Self {
            merchants,
            products,
            credit_cost: 1,
            charge_placeholder: false,
        }
    }

    pub fn with_credit_cost(mut self, credit_cost: i64) -> Self {
        self.credit_cost = credit_cost.max(0);
        self
    }

    pub fn with_charge_placeholder(mut self, charge_placeholder: bool) -> Self {
        self.charge_placeholder = charge_placeholder;
        self
    }

    pub fn credit_cost(&self) -> i64 {
        self.credit_cost
    }

    /// Whether `outcome` is charged under this settlement's rules
    pub fn is_billable(&self, outcome: &GenerationOutcome) -> bool {
        outcome.is_billable(self.charge_placeholder)
    }

    /// Debits the merchant and bumps the product counter for a billable outcome
    ///
    /// The two writes are independent; a failure in one neither rolls back nor
    /// skips the other. Returns `None` when the outcome is not billable.
    pub async fn settle(
        &self,
        merchant_id: &MerchantId,
        product_id: Option<&ProductId>,
        outcome: &GenerationOutcome,
    ) -> Option<SettlementReport> {
        if !self.is_billable(outcome) {
            return None;
        }

        let remaining_credits = match self
            .merchants
            .debit_credits(merchant_id, self.credit_cost)
            .await
        {
            Ok(Some(remaining)) => {
                debug!(merchant_id = %merchant_id, remaining, "Credits debited");
                Some(remaining)
            }
            Ok(None) => {
                warn!(merchant_id = %merchant_id, "Debit skipped, balance already at zero");
                None
            }
            Err(e) => {
                warn!(merchant_id = %merchant_id, error = %e, "Failed to debit credits");
                record_bookkeeping_failure("debit");
                None
            }
        };

        let usage_count = match product_id {
            Some(product_id) => match self.products.increment_usage(product_id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(product_id = %product_id, error = %e, "Failed to increment product usage");
                    record_bookkeeping_failure("usage_count");
                    None
                }
            },
            None => None,
        };

        Some(SettlementReport {
            remaining_credits,
            usage_count,
        })
    }
}
