pub mod engine;
pub mod states;

pub use engine::{route, FlowDefinition, FlowEngine, FlowTransitionError, SchedulingFlow};
pub use states::{DialogueAction, DialogueEvent, DialogueState, TransitionOutcome};
