pub mod analytics;
pub mod database;
pub mod insight;
pub mod llm_client;
pub mod schema_context;
pub mod shaper;
pub mod translator;

pub use analytics::*;
pub use insight::*;
pub use llm_client::*;
pub use schema_context::*;
pub use shaper::*;
pub use translator::*;
