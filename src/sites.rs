//! Site identity: which URLs the detox applies to.
//!
//! A malformed or missing URL is simply "not tracked"; nothing here fails.

use url::Url;

use crate::constants::{TRACKED_DOMAINS, VIDEO_ID_PARAM, WATCH_PAGE_PATH};

fn parse(url: &str) -> Option<Url> {
    Url::parse(url).ok()
}

/// Hostname of `url`, used as the session-record key.
pub fn domain_from_url(url: &str) -> Option<String> {
    parse(url)?.host_str().map(str::to_string)
}

pub fn is_tracked_host(host: &str) -> bool {
    TRACKED_DOMAINS.iter().any(|domain| host.contains(domain))
}

pub fn is_tracked_site(url: &str) -> bool {
    domain_from_url(url).is_some_and(|host| is_tracked_host(&host))
}

/// Tracked site and a video watch page.
pub fn is_watch_page(url: &str) -> bool {
    parse(url).is_some_and(|u| {
        u.host_str().is_some_and(is_tracked_host) && u.path() == WATCH_PAGE_PATH
    })
}

/// Video id from the `v` query parameter of a watch page.
pub fn video_id(url: &str) -> Option<String> {
    let url = parse(url)?;
    url.query_pairs()
        .find(|(key, _)| key == VIDEO_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// `url` with its video id replaced (or added), other parameters kept.
pub fn with_video_id(url: &str, id: &str) -> Option<String> {
    let mut url = parse(url)?;
    let others: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != VIDEO_ID_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .append_pair(VIDEO_ID_PARAM, id)
        .extend_pairs(others);
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::test_constants::*;

    #[test]
    fn test_tracked_sites() {
        assert!(is_tracked_site(TEST_WATCH_URL));
        assert!(is_tracked_site(TEST_HOME_URL));
        assert!(is_tracked_site("https://m.youtube.com/feed"));
        assert!(!is_tracked_site(TEST_UNTRACKED_URL));
    }

    #[test]
    fn test_malformed_urls_are_untracked() {
        assert!(!is_tracked_site(""));
        assert!(!is_tracked_site("not a url"));
        assert!(!is_tracked_site("about:blank"));
        assert_eq!(domain_from_url("::"), None);
    }

    #[test]
    fn test_domain_from_url() {
        assert_eq!(domain_from_url(TEST_WATCH_URL).as_deref(), Some(TEST_DOMAIN));
    }

    #[test]
    fn test_watch_page_and_video_id() {
        assert!(is_watch_page(TEST_WATCH_URL));
        assert!(!is_watch_page(TEST_HOME_URL));
        assert!(!is_watch_page(TEST_UNTRACKED_URL));
        assert_eq!(video_id(TEST_WATCH_URL).as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(video_id("https://www.youtube.com/watch?t=10&v=abc").as_deref(), Some("abc"));
        assert_eq!(video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(video_id(TEST_HOME_URL), None);
    }

    #[test]
    fn test_with_video_id_replaces_parameter() {
        let next = with_video_id("https://www.youtube.com/watch?v=abc&t=42", "xyz").unwrap();
        assert_eq!(next, "https://www.youtube.com/watch?v=xyz&t=42");
        assert_eq!(video_id(&next).as_deref(), Some("xyz"));
        assert_eq!(with_video_id("not a url", "xyz"), None);
    }
}
