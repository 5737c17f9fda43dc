//! Audit recorder - tamper-evident records of every execution

use crate::domain::entities::audit::{AuditActor, AuditDetails, TradeAudit, AUDIT_ACTION_CREATED};
use crate::domain::entities::trade::Trade;
use crate::domain::errors::TradeError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Builds the audit entry written alongside every trade.
///
/// The details payload captures every input to the pricing/validation
/// decision; its SHA-256 digest is stored next to it so an auditor can
/// later re-hash and compare. This defeats accidental or unprivileged
/// tampering; it is not a signature.
pub struct AuditRecorder;

impl AuditRecorder {
    /// Build the CREATED audit entry for a freshly executed trade.
    pub fn record_creation(trade: &Trade, actor_id: &str) -> Result<TradeAudit, TradeError> {
        let details = AuditDetails {
            account_id: trade.account_id.clone(),
            symbol: trade.symbol.clone(),
            side: trade.side.as_str().to_string(),
            order_type: trade.order_type.as_str().to_string(),
            quantity: trade.quantity.value(),
            price: trade.price.value(),
            fee: trade.fee,
            slippage: trade.slippage,
            actor_id: actor_id.to_string(),
            performed_at: Utc::now(),
        };

        let canonical = serde_json::to_string(&details).map_err(|e| TradeError::ExecutionFailed {
            reason: format!("Failed to serialize audit details: {}", e),
        })?;

        Ok(TradeAudit {
            id: Uuid::new_v4().to_string(),
            trade_id: trade.id.clone(),
            action: AUDIT_ACTION_CREATED.to_string(),
            actor: AuditActor::User,
            actor_id: actor_id.to_string(),
            hash: Self::hash_details(&canonical),
            details: canonical,
            created_at: Utc::now(),
        })
    }

    /// Re-hash a stored payload; a mismatch against the stored hash means
    /// the record was altered after the fact.
    pub fn verify(audit: &TradeAudit) -> bool {
        Self::hash_details(&audit.details) == audit.hash
    }

    fn hash_details(canonical: &str) -> String {
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::trade::{OrderType, TradeSide, TradeStatus};
    use crate::domain::value_objects::{price::Price, quantity::Quantity};
    use rust_decimal_macros::dec;

    fn sample_trade() -> Trade {
        Trade {
            id: "trade-1".to_string(),
            account_id: "acc-1".to_string(),
            symbol: "BTC".to_string(),
            side: TradeSide::Buy,
            order_type: OrderType::Market,
            quantity: Quantity::new(dec!(1)).unwrap(),
            price: Price::new(dec!(68136)).unwrap(),
            slippage: dec!(0.002),
            fee: dec!(68.136),
            total: dec!(68204.136),
            status: TradeStatus::Executed,
            signal_id: None,
            mentor_suggested: false,
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_audit_hash_is_reproducible() {
        let audit = AuditRecorder::record_creation(&sample_trade(), "user-1").unwrap();

        assert!(AuditRecorder::verify(&audit));
        assert_eq!(audit.hash.len(), 64);
        assert_eq!(audit.action, AUDIT_ACTION_CREATED);
        assert_eq!(audit.trade_id, "trade-1");
    }

    #[test]
    fn test_tampered_details_fail_verification() {
        let mut audit = AuditRecorder::record_creation(&sample_trade(), "user-1").unwrap();
        audit.details = audit.details.replace("68136", "1");

        assert!(!AuditRecorder::verify(&audit));
    }

    #[test]
    fn test_tampered_hash_fails_verification() {
        let mut audit = AuditRecorder::record_creation(&sample_trade(), "user-1").unwrap();
        audit.hash = "0".repeat(64);

        assert!(!AuditRecorder::verify(&audit));
    }

    #[test]
    fn test_details_capture_pricing_inputs() {
        let audit = AuditRecorder::record_creation(&sample_trade(), "user-1").unwrap();
        let details: crate::domain::entities::audit::AuditDetails =
            serde_json::from_str(&audit.details).unwrap();

        assert_eq!(details.account_id, "acc-1");
        assert_eq!(details.side, "BUY");
        assert_eq!(details.order_type, "MARKET");
        assert_eq!(details.price, dec!(68136));
        assert_eq!(details.slippage, dec!(0.002));
        assert_eq!(details.actor_id, "user-1");
    }
}
