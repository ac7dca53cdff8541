//! Resolution engine.
//!
//! Data flows one way: [`driver::ResolutionDriver`] walks the graph and hands
//! each unresolved node to [`node::NodeResolver`], which in turn asks
//! [`selector::CandidateSelector`] to pick one artifact among the providers.

pub mod context;
pub mod driver;
pub mod node;
pub mod selector;
