use crate::domain::fraud::{Channel, FraudDecision, FraudType, Transaction, TransactionType};
use crate::domain::ports::FraudModel;
use anyhow::Result;
use chrono::Timelike;
use std::collections::BTreeMap;

pub const MODEL_NAME: &str = "pix_fraud_detector";
pub const MODEL_VERSION: &str = "1.0.0";

/// Amount at which the amount feature saturates.
const AMOUNT_SATURATION: f64 = 1_000_000.0;
const AMOUNT_WEIGHT: f64 = 0.6;
const AMOUNT_OUTLIER_WEIGHT: f64 = 0.25;
const NIGHT_WEIGHT: f64 = 0.2;
const WITHDRAWAL_WEIGHT: f64 = 0.1;
const UNKNOWN_CHANNEL_WEIGHT: f64 = 0.1;
const MANIPULATION_AMOUNT: f64 = 100_000.0;

/// Rule-based stand-in for the trained detector.
///
/// Scores are a weighted sum of interpretable features; the per-feature
/// contributions are returned as the explainability map.
pub struct HeuristicFraudModel {
    threshold: f64,
}

impl HeuristicFraudModel {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    fn amount_factor(amount: f64) -> f64 {
        ((1.0 + amount.max(0.0)).ln() / (1.0 + AMOUNT_SATURATION).ln()).clamp(0.0, 1.0)
    }
}

impl FraudModel for HeuristicFraudModel {
    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn version(&self) -> &str {
        MODEL_VERSION
    }

    fn predict(&self, tx: &Transaction) -> Result<FraudDecision> {
        if !tx.amount.is_finite() {
            anyhow::bail!("amount is not a finite number");
        }

        let amount_factor = Self::amount_factor(tx.amount);
        let night = tx.received_at.hour() <= 4;
        let withdrawal = tx.transaction_type == TransactionType::Withdrawal;
        let unknown_channel = tx.channel == Channel::Other;

        let mut explainability = BTreeMap::new();
        explainability.insert("amount".to_string(), AMOUNT_WEIGHT * amount_factor);
        explainability.insert(
            "amount_outlier".to_string(),
            if tx.amount > MANIPULATION_AMOUNT { AMOUNT_OUTLIER_WEIGHT } else { 0.0 },
        );
        explainability.insert("hour_of_day".to_string(), if night { NIGHT_WEIGHT } else { 0.0 });
        explainability.insert(
            "transaction_type".to_string(),
            if withdrawal { WITHDRAWAL_WEIGHT } else { 0.0 },
        );
        explainability.insert(
            "channel".to_string(),
            if unknown_channel { UNKNOWN_CHANNEL_WEIGHT } else { 0.0 },
        );

        let fraud_score = explainability.values().sum::<f64>().clamp(0.0, 1.0);
        let is_fraud = fraud_score >= self.threshold;

        let fraud_type = is_fraud.then(|| {
            if tx.amount > MANIPULATION_AMOUNT {
                FraudType::AmountManipulation
            } else if night {
                FraudType::AccountTakeover
            } else if withdrawal {
                FraudType::MuleAccount
            } else {
                FraudType::SocialEngineering
            }
        });

        Ok(FraudDecision {
            is_fraud,
            fraud_score,
            fraud_type,
            explainability,
            outlier_score: amount_factor,
        })
    }
}
