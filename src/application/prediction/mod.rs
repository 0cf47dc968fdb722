pub mod heuristic_model;
pub mod service;

pub use heuristic_model::HeuristicFraudModel;
pub use service::PredictionService;
