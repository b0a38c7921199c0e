pub mod model;
pub mod reducer;

pub use model::{
    Answer, DiagnosticStep, DimensionScore, Evaluation, Recommendation, ResearchReference,
    ResultSnapshot, Statement,
};
pub use reducer::{reduce, Reduced, RunSignal};
