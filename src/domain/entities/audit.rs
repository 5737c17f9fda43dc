use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who performed the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditActor {
    User,
    System,
}

impl AuditActor {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditActor::User => "USER",
            AuditActor::System => "SYSTEM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "USER" => Some(AuditActor::User),
            "SYSTEM" => Some(AuditActor::System),
            _ => None,
        }
    }
}

/// Every input to the pricing/validation decision for one trade.
///
/// This is an explicit typed payload, not a free-form map: the field set is
/// the audit schema, and its canonical JSON serialization is the exact byte
/// sequence the tamper-evidence hash covers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDetails {
    pub account_id: String,
    pub symbol: String,
    pub side: String,
    pub order_type: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    pub slippage: Decimal,
    pub actor_id: String,
    pub performed_at: DateTime<Utc>,
}

/// An append-only log entry bound to a trade.
///
/// `details` holds the canonical JSON of an [`AuditDetails`] payload and
/// `hash` its SHA-256 digest. Re-hashing `details` must reproduce `hash`;
/// a mismatch means the record was altered after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeAudit {
    pub id: String,
    pub trade_id: String,
    pub action: String,
    pub actor: AuditActor,
    pub actor_id: String,
    pub details: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

/// The only audit action emitted today; amendments would add more.
pub const AUDIT_ACTION_CREATED: &str = "CREATED";
