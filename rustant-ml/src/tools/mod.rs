//! Tool wrappers implementing the rustant-tools `Tool` trait.

pub mod data_tools;
pub mod eval_tools;
pub mod feature_tools;
pub mod inference_tools;
pub mod interpretability_tools;
pub mod llm_tools;
pub mod rag_tools;
pub mod research_tools;
pub mod safety_tools;
pub mod security_tools;
pub mod training_tools;
pub mod transparency_tools;
pub mod zoo_tools;
