pub mod key_patterns;
pub mod scripts;

pub use key_patterns::{
    CandidateExtractor, CandidateSet, KeyPattern, LiteralPattern, OpaqueTokenPattern,
};
pub use scripts::extract_script_urls;
