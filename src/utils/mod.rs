pub mod constants;
pub mod string_utils;
pub mod url_utils;

pub use constants::*;
pub use string_utils::{asset_file_stem, collapse_whitespace, safe_truncate_chars};
pub use url_utils::{absolutize, cookie_domain_matches, fill_keyword_template, host_of, next_page_url};
