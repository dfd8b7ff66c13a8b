//! `stockpilot-ai`
//!
//! **Responsibility:** the inventory decision engine.
//!
//! - Rolls raw sales into a 30-day demand signal ([`sales`]).
//! - Forecasts demand and classifies restock actions ([`predictor`]), either
//!   with the deterministic local heuristic or a remote model that always
//!   degrades to it.
//! - Derives per-SKU financial metrics ([`decision`]).
//!
//! This crate is storage- and transport-agnostic: inputs are provided by
//! callers (infra), and remote predictors plug in through [`RemotePredictor`].

pub mod decision;
pub mod predictor;
pub mod prompt;
pub mod result;
pub mod sales;
pub mod scope;
pub mod snapshot;

pub use decision::{DecisionRecord, evaluate, prediction_input};
pub use predictor::{
    Decision, LocalPredictor, PredictionInput, PredictionProvider, PredictionResult, RemotePredictor,
    WithLocalFallback,
};
pub use result::AiError;
pub use sales::{AggregatedDemand, DemandBySku, SalesAggregator};
pub use scope::TenantScope;
pub use snapshot::{InventorySnapshot, ProductRecord, SalesEvent};
