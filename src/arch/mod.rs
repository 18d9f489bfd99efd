//! # Architecture Abstraction Layer
//!
//! Hardware frequency back-ends implementing `freq::FrequencyControl`.
//! Currently implements the Cortex-M4 port; other architectures are added
//! as sibling modules.

pub mod cortex_m4;
