pub mod adversarial;
pub mod types;

pub use types::{
    Channel, FraudDecision, FraudType, PredictionResponse, Transaction, TransactionRequest,
    TransactionType,
};
