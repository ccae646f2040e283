//! Application layer - turn orchestration over the ports.

mod orchestrator;

pub use orchestrator::{
    ConversationOrchestrator, OrchestratorConfig, TurnOutcome, UiHints,
};
