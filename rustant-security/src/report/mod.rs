//! Report generation — SARIF, OCSF, Markdown, HTML, PDF, analytics.
//!
//! SARIF 2.1.0 and Markdown report generators implemented.

pub mod analytics;
pub mod html;
pub mod markdown;
pub mod ocsf;
pub mod pdf;
pub mod sarif;
