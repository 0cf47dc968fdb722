use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Payment rail. Free-form input is folded into this bounded set before it
/// is used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    #[serde(rename = "PIX")]
    Pix,
    #[serde(rename = "TED")]
    Ted,
    #[serde(rename = "DOC")]
    Doc,
    #[serde(rename = "BOLETO")]
    Boleto,
    #[serde(rename = "CARD")]
    Card,
    #[serde(rename = "OTHER")]
    Other,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Pix,
        Channel::Ted,
        Channel::Doc,
        Channel::Boleto,
        Channel::Card,
        Channel::Other,
    ];

    /// Unknown inputs map to `Other`; a missing channel defaults to Pix.
    pub fn parse(input: Option<&str>) -> Self {
        let Some(raw) = input else {
            return Channel::Pix;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "pix" => Channel::Pix,
            "ted" => Channel::Ted,
            "doc" => Channel::Doc,
            "boleto" => Channel::Boleto,
            "card" | "cartao" | "cartão" => Channel::Card,
            _ => Channel::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Pix => "PIX",
            Channel::Ted => "TED",
            Channel::Doc => "DOC",
            Channel::Boleto => "BOLETO",
            Channel::Card => "CARD",
            Channel::Other => "OTHER",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Transfer,
    Payment,
    Withdrawal,
    Other,
}

impl TransactionType {
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("transfer") | Some("transferencia") => TransactionType::Transfer,
            Some("payment") | Some("pagamento") => TransactionType::Payment,
            Some("withdrawal") | Some("saque") => TransactionType::Withdrawal,
            Some(_) => TransactionType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Transfer => "transfer",
            TransactionType::Payment => "payment",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudType {
    AccountTakeover,
    SocialEngineering,
    MuleAccount,
    AmountManipulation,
}

impl FraudType {
    pub const ALL: [FraudType; 4] = [
        FraudType::AccountTakeover,
        FraudType::SocialEngineering,
        FraudType::MuleAccount,
        FraudType::AmountManipulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FraudType::AccountTakeover => "account_takeover",
            FraudType::SocialEngineering => "social_engineering",
            FraudType::MuleAccount => "mule_account",
            FraudType::AmountManipulation => "amount_manipulation",
        }
    }
}

/// Body of a prediction request; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionRequest {
    pub transaction_id: Option<String>,
    pub amount: Option<f64>,
    pub channel: Option<String>,
    pub transaction_type: Option<String>,
}

/// Normalised transaction handed to the fraud model.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub amount: f64,
    pub channel: Channel,
    pub transaction_type: TransactionType,
    pub received_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_request(request: TransactionRequest, received_at: DateTime<Utc>) -> Self {
        Self {
            transaction_id: request
                .transaction_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            amount: request
                .amount
                .filter(|a| a.is_finite() && *a >= 0.0)
                .unwrap_or(0.0),
            channel: Channel::parse(request.channel.as_deref()),
            transaction_type: TransactionType::parse(request.transaction_type.as_deref()),
            received_at,
        }
    }
}

/// Output of the (opaque) fraud model.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudDecision {
    pub is_fraud: bool,
    pub fraud_score: f64,
    pub fraud_type: Option<FraudType>,
    /// Feature name to contribution.
    pub explainability: BTreeMap<String, f64>,
    /// Input outlier score in `[0, 1]`.
    pub outlier_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub transaction_id: String,
    pub is_fraud: bool,
    pub fraud_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fraud_type: Option<FraudType>,
    pub explainability: BTreeMap<String, f64>,
    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}
