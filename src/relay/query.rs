use url::{form_urlencoded, Url};

use crate::error::ValidationError;

/// Query key the relay controls; caller values are dropped.
pub const PAGE_SIZE_KEY: &str = "limit";

/// Page size forced on every upstream read.
pub const FORCED_PAGE_SIZE: &str = "1";

/// Build the upstream URL: `<base>/<resource>?<caller pairs without limit>&limit=1`.
///
/// Caller pairs keep their order and duplicates. Any key equal to `limit`
/// ignoring ASCII case is removed before the forced `limit=1` is appended.
pub fn upstream_url(
    base: &Url,
    resource: &str,
    raw_query: Option<&str>,
) -> Result<Url, ValidationError> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), resource);
    let mut url = Url::parse(&joined).map_err(|_| ValidationError::InvalidPath)?;
    url.set_query(None);
    url.set_fragment(None);

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in forwarded_pairs(raw_query) {
            pairs.append_pair(&key, &value);
        }
        pairs.append_pair(PAGE_SIZE_KEY, FORCED_PAGE_SIZE);
    }

    Ok(url)
}

/// Decode the caller's query and drop every page-size override.
pub fn forwarded_pairs(raw_query: Option<&str>) -> Vec<(String, String)> {
    let Some(raw) = raw_query else {
        return Vec::new();
    };

    form_urlencoded::parse(raw.as_bytes())
        .filter(|(key, _)| !key.eq_ignore_ascii_case(PAGE_SIZE_KEY))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
