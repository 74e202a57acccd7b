//! URL handling module for Site-Audit
//!
//! This module provides URL normalization, exclusion pattern matching,
//! same-site checks and the private-network guard used before every fetch.

mod domain;
pub mod guard;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, parse_base_url, same_site};
pub use guard::{
    check_url, check_url_host, is_blocked_ip, resolve_public, BlockReason, ResolveError,
};
pub use matcher::{ExclusionPattern, ExclusionSet, COMPILE_BUDGET, MAX_PATTERN_LEN};
pub use normalize::normalize_url;
