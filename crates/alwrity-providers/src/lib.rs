//! ALwrity Providers: the external collaborators the generation core talks to.
//!
//! `ContentProvider` produces outlines and section prose; `SearchAnalytics`
//! returns daily search-performance series. Concrete clients target
//! OpenAI / Gemini for content and Google Search Console for analytics.

pub mod config;
pub mod gsc;
pub mod llm;
pub mod prompts;
pub mod traits;
pub mod types;

pub use config::{AnalyticsConfig, LLMConfig};
pub use gsc::SearchConsoleClient;
pub use llm::LlmContentProvider;
pub use traits::{ContentProvider, SearchAnalytics};
pub use types::*;
