//! URL manipulation utilities.
//!
//! Page-parameter rewriting for pagination, href absolutization for card
//! links and photos, and cookie-domain matching for the external asset fetch.

use anyhow::{Context, Result};
use url::Url;

/// Rewrite the page-number query parameter to `current_page + 1`.
///
/// The caller's page counter is authoritative: any `param` value already in
/// the URL is replaced, and the parameter is appended when absent. Every
/// other query pair is kept in its original order.
///
/// # Examples
/// ```
/// # use listing_harvest::utils::url_utils::next_page_url;
/// let next = next_page_url("https://example.com/jobs?keyword=rust&page=3", "page", 3).unwrap();
/// assert_eq!(next, "https://example.com/jobs?keyword=rust&page=4");
///
/// let next = next_page_url("https://example.com/jobs?keyword=rust", "page", 1).unwrap();
/// assert_eq!(next, "https://example.com/jobs?keyword=rust&page=2");
/// ```
pub fn next_page_url(current: &str, param: &str, current_page: u32) -> Result<String> {
    let mut url = Url::parse(current).with_context(|| format!("Unparseable page URL: {current}"))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let next = current_page.saturating_add(1);

    let mut replaced = false;
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            if k == param {
                if !replaced {
                    query.append_pair(k, &next.to_string());
                    replaced = true;
                }
            } else {
                query.append_pair(k, v);
            }
        }
        if !replaced {
            query.append_pair(param, &next.to_string());
        }
    }

    Ok(url.to_string())
}

/// Substitute a URL-encoded keyword into a `{keyword}` template.
#[must_use]
pub fn fill_keyword_template(template: &str, keyword: &str) -> String {
    template.replace("{keyword}", &urlencoding::encode(keyword.trim()))
}

/// Resolve an href or src found on a card against the portal origin.
///
/// Handles absolute, protocol-relative (`//host/x`) and relative forms.
/// Returns `None` for empty values and non-http schemes (`javascript:`,
/// `data:`, `mailto:`).
#[must_use]
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("data:")
        || href.starts_with("mailto:")
    {
        return None;
    }

    let base = Url::parse(base).ok()?;
    let joined = base.join(href).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}

/// Host component of a URL, if it parses.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url).ok()?.host_str().map(str::to_string)
}

/// Whether a cookie scoped to `cookie_domain` would be sent to `host`.
///
/// A leading dot on the cookie domain is ignored; the host must equal the
/// domain or be a subdomain of it.
#[must_use]
pub fn cookie_domain_matches(cookie_domain: &str, host: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_increments_existing_param() {
        let next = next_page_url("https://vip.104.com.tw/search?page=7&kws=x", "page", 7).unwrap();
        assert_eq!(next, "https://vip.104.com.tw/search?page=8&kws=x");
    }

    #[test]
    fn next_page_follows_the_counter_not_the_url() {
        let next = next_page_url("https://vip.104.com.tw/search?kws=x&page=2", "page", 1).unwrap();
        assert_eq!(next, "https://vip.104.com.tw/search?kws=x&page=2");
    }

    #[test]
    fn next_page_appends_when_absent() {
        let next = next_page_url("https://www.104.com.tw/jobs/search/", "page", 1).unwrap();
        assert_eq!(next, "https://www.104.com.tw/jobs/search/?page=2");
    }

    #[test]
    fn next_page_rejects_garbage() {
        assert!(next_page_url("not a url", "page", 1).is_err());
    }

    #[test]
    fn keyword_template_is_encoded() {
        assert_eq!(
            fill_keyword_template("https://x.test/search?keyword={keyword}", "工程師"),
            "https://x.test/search?keyword=%E5%B7%A5%E7%A8%8B%E5%B8%AB"
        );
    }

    #[test]
    fn absolutize_handles_relative_forms() {
        let base = "https://vip.104.com.tw/";
        assert_eq!(
            absolutize(base, "/webHeadShot/1.jpg").as_deref(),
            Some("https://vip.104.com.tw/webHeadShot/1.jpg")
        );
        assert_eq!(
            absolutize(base, "//static.104.com.tw/a.png").as_deref(),
            Some("https://static.104.com.tw/a.png")
        );
        assert_eq!(absolutize(base, "javascript:void(0)"), None);
        assert_eq!(absolutize(base, "  "), None);
    }

    #[test]
    fn cookie_domain_matching() {
        assert!(cookie_domain_matches(".104.com.tw", "vip.104.com.tw"));
        assert!(cookie_domain_matches("vip.104.com.tw", "vip.104.com.tw"));
        assert!(!cookie_domain_matches("vip.104.com.tw", "www.104.com.tw"));
        assert!(!cookie_domain_matches("", "vip.104.com.tw"));
    }
}
