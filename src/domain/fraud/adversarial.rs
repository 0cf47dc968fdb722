//! Input-analysis heuristics for potentially adversarial inference requests.

use crate::domain::compliance::Severity;
use crate::domain::fraud::types::Transaction;
use chrono::Timelike;

pub const DETECTION_METHOD_INPUT_ANALYSIS: &str = "input_analysis";

const EXTREME_AMOUNT: f64 = 100_000.0;
const NIGHT_AMOUNT: f64 = 10_000.0;
const CRITICAL_AMOUNT: f64 = 1_000_000.0;
const NIGHT_HOURS: std::ops::RangeInclusive<u32> = 0..=4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackType {
    AmountManipulation,
    Unknown,
}

impl AttackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackType::AmountManipulation => "amount_manipulation",
            AttackType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdversarialAssessment {
    pub attack_type: AttackType,
    pub severity: Severity,
}

/// Flags extreme amounts, and large amounts between 00:00 and 04:59 UTC.
pub fn is_potential_adversarial(tx: &Transaction) -> bool {
    if tx.amount > EXTREME_AMOUNT {
        return true;
    }
    NIGHT_HOURS.contains(&tx.received_at.hour()) && tx.amount > NIGHT_AMOUNT
}

pub fn assess(tx: &Transaction) -> Option<AdversarialAssessment> {
    if !is_potential_adversarial(tx) {
        return None;
    }

    let attack_type = if tx.amount > EXTREME_AMOUNT {
        AttackType::AmountManipulation
    } else {
        AttackType::Unknown
    };
    let severity = if tx.amount > CRITICAL_AMOUNT {
        Severity::Critical
    } else {
        Severity::Medium
    };

    Some(AdversarialAssessment {
        attack_type,
        severity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fraud::types::{Channel, TransactionType};
    use chrono::{TimeZone, Utc};

    fn tx_at(amount: f64, hour: u32) -> Transaction {
        Transaction {
            transaction_id: "tx".to_string(),
            amount,
            channel: Channel::Pix,
            transaction_type: TransactionType::Transfer,
            received_at: Utc.with_ymd_and_hms(2026, 3, 10, hour, 15, 0).unwrap(),
        }
    }

    #[test]
    fn test_regular_transaction_is_not_flagged() {
        assert_eq!(assess(&tx_at(500.0, 14)), None);
        assert_eq!(assess(&tx_at(50_000.0, 14)), None);
    }

    #[test]
    fn test_extreme_amount_is_amount_manipulation() {
        let assessment = assess(&tx_at(150_000.0, 14)).unwrap();
        assert_eq!(assessment.attack_type, AttackType::AmountManipulation);
        assert_eq!(assessment.severity, Severity::Medium);

        let critical = assess(&tx_at(2_000_000.0, 14)).unwrap();
        assert_eq!(critical.severity, Severity::Critical);
    }

    #[test]
    fn test_night_time_large_amount() {
        let assessment = assess(&tx_at(20_000.0, 3)).unwrap();
        assert_eq!(assessment.attack_type, AttackType::Unknown);
        assert_eq!(assessment.severity, Severity::Medium);

        assert_eq!(assess(&tx_at(20_000.0, 5)), None);
        assert_eq!(assess(&tx_at(5_000.0, 2)), None);
    }
}
