//! URL handling module for Spider-Audit
//!
//! This module provides URL normalization, href resolution, host comparison and the
//! ordered pattern classifier that every policy decision goes through.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, is_same_host, root_url};
pub use matcher::{
    first_matching_pattern, substitute_root, PatternList, ROOT_TOKEN, ROOT_URL_TOKEN,
};
pub use normalize::{normalize_url, resolve_href, split_fragment};
