pub mod engine;
pub mod service;

pub use engine::{
    ChallengeCompletion, EngineEnvironment, EngineError, EngineInitConfig, EngineTransaction,
    ThreeDsEngine,
};
pub use service::{ThreeDsOutcome, ThreeDsService};
