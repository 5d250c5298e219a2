//! Pagination cursor for channel listings.
//!
//! A cursor is a listing URL plus the name of its page-number query
//! parameter. The two platform listing variants use different parameter
//! names; the name is decided once from the base URL and fixed for the
//! listing's lifetime. Advancing rewrites exactly that one parameter.

use crate::error::{ResolveError, Result};

/// Which listing API the cursor paginates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingVariant {
    /// Plain upload archives, paged with `pn`.
    Archives,
    /// Season/collection archives, paged with `page_num`.
    SeasonsArchives,
}

impl ListingVariant {
    fn from_url(url: &str) -> Self {
        if url.contains("seasons_archives") {
            ListingVariant::SeasonsArchives
        } else {
            ListingVariant::Archives
        }
    }

    /// Name of the page-number query parameter.
    pub fn page_param(self) -> &'static str {
        match self {
            ListingVariant::Archives => "pn",
            ListingVariant::SeasonsArchives => "page_num",
        }
    }
}

/// Opaque pagination position for listing requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCursor {
    url: String,
    variant: ListingVariant,
}

impl PageCursor {
    /// Wrap a listing URL, detecting the listing variant from it.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let variant = ListingVariant::from_url(&url);
        Self { url, variant }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn variant(&self) -> ListingVariant {
        self.variant
    }

    /// Current value of the page parameter.
    ///
    /// # Errors
    ///
    /// [`ResolveError::MalformedCursor`] if the parameter is absent or
    /// non-numeric.
    pub fn current_page(&self) -> Result<u64> {
        self.locate_page().map(|(_, _, value)| value)
    }

    /// Next-page cursor: the same URL with the page parameter incremented by
    /// exactly one and nothing else touched.
    ///
    /// # Errors
    ///
    /// [`ResolveError::MalformedCursor`] if the parameter is absent or
    /// non-numeric.
    pub fn advance(&self) -> Result<PageCursor> {
        let (start, len, value) = self.locate_page()?;
        let next = value + 1;
        let url = format!("{}{}{}", &self.url[..start], next, &self.url[start + len..]);
        Ok(PageCursor {
            url,
            variant: self.variant,
        })
    }

    /// Find the page parameter's digit span: (byte offset, length, value).
    fn locate_page(&self) -> Result<(usize, usize, u64)> {
        let param = self.variant.page_param();
        let needle = format!("{param}=");

        for (idx, _) in self.url.match_indices(&needle) {
            // Only match a whole parameter name, not a suffix of another one.
            let preceded_ok = idx > 0 && matches!(self.url.as_bytes()[idx - 1], b'?' | b'&');
            if !preceded_ok {
                continue;
            }
            let digits_start = idx + needle.len();
            let digits: String = self.url[digits_start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                return Err(ResolveError::MalformedCursor(format!(
                    "page parameter '{param}' is non-numeric in {}",
                    self.url
                )));
            }
            let value = digits.parse::<u64>().map_err(|_| {
                ResolveError::MalformedCursor(format!(
                    "page parameter '{param}' overflows in {}",
                    self.url
                ))
            })?;
            return Ok((digits_start, digits.len(), value));
        }

        Err(ResolveError::MalformedCursor(format!(
            "page parameter '{param}' absent from {}",
            self.url
        )))
    }
}
