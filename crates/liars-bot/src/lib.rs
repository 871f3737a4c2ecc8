pub mod policy;

pub use policy::{Assessment, Decision, Policy, PolicyContext, ThresholdPolicy};
