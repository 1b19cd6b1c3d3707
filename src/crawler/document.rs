//! HTML query layer
//!
//! Parses a response body once and runs compiled CSS selectors over it. Each
//! match is wrapped in an [`Element`] that also exposes the request and
//! response it came from, so element callbacks can resolve and follow links.

use crate::crawler::{Request, Response};
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};

/// A CSS selector compiled at hook registration time
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    source: String,
    selector: Selector,
}

impl CompiledSelector {
    /// Compiles a CSS selector
    ///
    /// # Returns
    ///
    /// * `Ok(CompiledSelector)` - The selector is valid
    /// * `Err(HarvestError::InvalidSelector)` - The selector failed to parse
    pub fn parse(source: &str) -> Result<Self, HarvestError> {
        let selector = Selector::parse(source).map_err(|e| HarvestError::InvalidSelector {
            selector: source.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            source: source.to_string(),
            selector,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a response body
    ///
    /// Parsing is lenient: malformed markup still produces a tree, and bytes
    /// that are not valid UTF-8 are replaced.
    pub fn parse(body: &[u8]) -> Self {
        let text = String::from_utf8_lossy(body);
        Self {
            html: Html::parse_document(&text),
        }
    }

    /// All elements matching `selector`, in document order
    pub fn select<'a>(
        &'a self,
        selector: &'a CompiledSelector,
    ) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        self.html.select(&selector.selector)
    }
}

/// One element matched by an HTML hook
pub struct Element<'a> {
    element: ElementRef<'a>,
    text: String,
    request: &'a Request,
    response: &'a Response,
}

impl<'a> Element<'a> {
    pub(crate) fn new(element: ElementRef<'a>, response: &'a Response) -> Self {
        let text = element.text().collect::<String>();
        Self {
            element,
            text,
            request: response.request(),
            response,
        }
    }

    /// Value of attribute `name`, if present
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// All attributes as `(name, value)` pairs
    pub fn attrs(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.element.value().attrs()
    }

    /// Concatenated text of the element and its descendants
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Tag name, lowercase
    pub fn name(&self) -> &'a str {
        self.element.value().name()
    }

    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    pub fn request(&self) -> &'a Request {
        self.request
    }

    pub fn response(&self) -> &'a Response {
        self.response
    }

    /// The underlying node, for queries below this element
    pub fn selection(&self) -> ElementRef<'a> {
        self.element
    }
}

impl std::fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name())
            .field("text", &self.text)
            .finish()
    }
}
