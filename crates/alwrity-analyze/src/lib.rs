//! ALwrity Analyze: text-statistics heuristics for generated sections.
//!
//! Everything here is pure and synchronous: word-set similarity, keyword and
//! n-gram theme extraction, connective-phrase detection, and the section
//! quality scorer that combines them into the five 0–100 sub-scores.

pub mod coherence;
pub mod flow;
pub mod quality;
pub mod text;
pub mod themes;

pub use coherence::calculate_coherence;
pub use flow::{
    calculate_narrative_flow, check_logical_progression, check_transitional_phrases, Direction,
};
pub use quality::{NeighborContext, SectionScorer};
pub use text::{extract_keywords, jaccard_similarity};
pub use themes::{calculate_thematic_connection, extract_themes, theme_similarity};
