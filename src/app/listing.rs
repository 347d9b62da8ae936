//! Remote file discovery for a float
//!
//! The metadata file of a float sits at a fixed location, so resolving it
//! needs no network access. Profile files are discovered by fetching the
//! float's `profiles/` index page and keeping the links that name files.

use scraper::{Html, Selector};
use url::Url;

use crate::app::client::Transport;
use crate::app::models::{ArchiveLocation, FloatIdentity};
use crate::errors::{RetrievalError, RetrievalResult};

/// Parse a URL built from archive and float components
pub(crate) fn parse_url(url: &str) -> RetrievalResult<Url> {
    Url::parse(url).map_err(|e| RetrievalError::InvalidUrl {
        url: url.to_string(),
        error: e.to_string(),
    })
}

/// Resolves remote file locations of a float on one archive
#[derive(Debug, Clone)]
pub struct ListingResolver {
    archive: ArchiveLocation,
}

impl ListingResolver {
    pub fn new(archive: ArchiveLocation) -> Self {
        Self { archive }
    }

    /// The archive this resolver builds URLs against
    pub fn archive(&self) -> &ArchiveLocation {
        &self.archive
    }

    /// Location of the float's metadata file (single element, no network)
    pub fn metadata_locations(&self, float: &FloatIdentity) -> RetrievalResult<Vec<Url>> {
        Ok(vec![parse_url(&self.archive.metadata_file(float))?])
    }

    /// Fetch and parse the float's profile directory index
    ///
    /// # Errors
    ///
    /// Returns `RetrievalError::Listing` naming the listing URL if the page
    /// cannot be fetched or a link cannot be resolved
    pub async fn profile_directory_listing(
        &self,
        transport: &dyn Transport,
        float: &FloatIdentity,
    ) -> RetrievalResult<Vec<Url>> {
        let listing_url = parse_url(&self.archive.profiles_dir(float))?;

        let page = transport
            .get_page(&listing_url)
            .await
            .map_err(|e| RetrievalError::Listing {
                url: listing_url.to_string(),
                reason: e.to_string(),
            })?;

        let links = parse_listing(&listing_url, &page)?;
        tracing::info!("Listed {} files under {}", links.len(), listing_url);
        Ok(links)
    }
}

/// Extract file links from an HTML directory index
///
/// A link is kept when its visible text equals its `href` (this skips sort
/// headers and parent-directory links) and it does not name a directory.
/// Kept links are resolved against `listing_url`, in page order.
pub fn parse_listing(listing_url: &Url, html: &str) -> RetrievalResult<Vec<Url>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").map_err(|e| RetrievalError::Listing {
        url: listing_url.to_string(),
        reason: format!("invalid link selector: {}", e),
    })?;

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let text: String = element.text().collect();
        if href != text || text.ends_with('/') {
            continue;
        }

        let resolved = listing_url
            .join(&text)
            .map_err(|e| RetrievalError::Listing {
                url: listing_url.to_string(),
                reason: format!("cannot resolve link {}: {}", text, e),
            })?;
        links.push(resolved);
    }

    Ok(links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::archive;

    const LISTING: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 3.2 Final//EN">
<html>
 <head><title>Index of /dac/aoml/1900722/profiles</title></head>
 <body>
<h1>Index of /dac/aoml/1900722/profiles</h1>
<table>
<tr><th><a href="?C=N;O=D">Name</a></th><th><a href="?C=M;O=A">Last modified</a></th></tr>
<tr><td><a href="/dac/aoml/1900722/">Parent Directory</a></td></tr>
<tr><td><a href="D1900722_002.nc">D1900722_002.nc</a></td></tr>
<tr><td><a href="D1900722_001.nc">D1900722_001.nc</a></td></tr>
<tr><td><a href="BR1900722_001D.nc">BR1900722_001D.nc</a></td></tr>
<tr><td><a href="old/">old/</a></td></tr>
</table>
</body></html>"#;

    fn resolver() -> ListingResolver {
        ListingResolver::new(ArchiveLocation::parse(archive::IFREMER).unwrap())
    }

    #[test]
    fn test_parse_listing_keeps_file_links_in_order() {
        let base = Url::parse("https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/").unwrap();
        let links = parse_listing(&base, LISTING).unwrap();
        let names: Vec<&str> = links.iter().map(|u| u.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/D1900722_002.nc",
                "https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/D1900722_001.nc",
                "https://data-argo.ifremer.fr/dac/aoml/1900722/profiles/BR1900722_001D.nc",
            ]
        );
    }

    #[test]
    fn test_parse_listing_empty_page() {
        let base = Url::parse("https://data-argo.ifremer.fr/dac/aoml/1/profiles/").unwrap();
        assert!(parse_listing(&base, "<html><body></body></html>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_metadata_location_is_deterministic() {
        let float = FloatIdentity::new("aoml", "1900722").unwrap();
        let urls = resolver().metadata_locations(&float).unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(
            urls[0].as_str(),
            "https://data-argo.ifremer.fr/dac/aoml/1900722/1900722_meta.nc"
        );
    }
}
