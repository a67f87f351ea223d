//! Scenario model, local graph stores and backend synchronisation.

pub mod convert;
pub mod editor;
pub mod results;
pub mod store;
pub mod sync;
pub mod types;
pub mod validate;

pub use editor::{EditorPhase, EditorSession};
pub use results::AnalysisResult;
pub use store::{ConnectOutcome, ScenarioGraph, UpdateOutcome};
pub use types::{Component, ComponentKind, Connection, EdgeType, Position, Scenario};
