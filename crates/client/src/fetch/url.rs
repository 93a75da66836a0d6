//! Start-location canonicalization and href resolution.

use ::url::Url;

#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty location")]
    Empty,

    #[error("only http(s) pages can be soft-navigated, got {0}:")]
    UnsupportedScheme(String),

    #[error("cannot parse location: {0}")]
    Unparseable(String),
}

impl From<UrlError> for page_loader_core::Error {
    fn from(err: UrlError) -> Self {
        page_loader_core::Error::InvalidUrl(err.to_string())
    }
}

/// Turn a typed start location into the URL the first page is loaded from.
///
/// A missing scheme means https. The host is lowercased; path, query and
/// fragment are left alone since they identify the page.
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut location = match Url::parse(input) {
        Ok(location) => location,
        Err(::url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{input}")).map_err(|e| UrlError::Unparseable(e.to_string()))?
        }
        Err(e) => return Err(UrlError::Unparseable(e.to_string())),
    };

    if !matches!(location.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(location.scheme().to_string()));
    }

    if let Some(host) = location.host_str().map(str::to_ascii_lowercase) {
        location
            .set_host(Some(&host))
            .map_err(|e| UrlError::Unparseable(e.to_string()))?;
    }

    Ok(location)
}

/// Resolve an anchor's `href` against the page it appears on.
pub fn resolve(base: &Url, href: &str) -> Result<Url, UrlError> {
    match href.trim() {
        "" => Err(UrlError::Empty),
        href => base.join(href).map_err(|e| UrlError::Unparseable(e.to_string())),
    }
}
