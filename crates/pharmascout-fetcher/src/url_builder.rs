use crate::error::{FetchError, Result};
use pharmascout_registry::SearchConfig;
use url::{form_urlencoded, Url};

/// Fill a source's URL pattern for one query and result page.
///
/// `{query}` is percent-encoded; `{page}` is 1-based.
pub fn build_search_url(search: &SearchConfig, query: &str, page: u32) -> Result<String> {
    let encoded: String = form_urlencoded::byte_serialize(query.trim().as_bytes()).collect();

    let url = search
        .url_pattern
        .replace("{query}", &encoded)
        .replace("{page}", &page.to_string());

    let parsed = Url::parse(&url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(FetchError::InvalidUrl(format!("{url}: missing host")));
    }

    Ok(parsed.into())
}
