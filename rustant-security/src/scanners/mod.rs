//! Security scanners — SAST, SCA, secrets detection, container, IaC, supply chain.
//!
//! Phase 3 implementation: regex-based SAST rules, secrets detection via
//! SecretRedactor patterns, and SCA advisory matching.

pub mod container;
pub mod dockerfile;
pub mod iac;
pub mod sast;
pub mod sca;
pub mod secrets;
pub mod supply_chain;
