//! Core traits for the console
//!
//! ```text
//! Pricing:
//!   - CostCalculator: Selection + price source -> per-minute CostBreakdown
//!
//! Persistence:
//!   - AgentGateway: create/update/get agents with optional version check
//! ```

mod calculator;
mod gateway;

pub use calculator::{
    assumptions, llm_cost, synthesizer_cost, transcriber_cost, CostBreakdown, CostCalculator,
};
pub use gateway::AgentGateway;
