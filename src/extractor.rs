// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Page extraction - fetches an act's page and reads its associated acts

use crate::config::Config;
use crate::types::{Association, Extraction};
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors from fetching or parsing a page
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Transport or HTTP status failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// A CSS selector failed to compile
    #[error("selector error: {0}")]
    Selector(String),
    /// The configured base URL is not an absolute http(s) URL
    #[error("invalid base url: {0}")]
    BaseUrl(String),
}

/// Resolves one entity reference into a name and its associations
pub trait PageExtractor {
    /// Extract the page at `reference`.
    ///
    /// Returns the empty result when the reference is not a supported
    /// locator or the page has no associations row.
    fn extract(&self, reference: &str) -> Result<Extraction, ExtractError>;
}

impl<E: PageExtractor + ?Sized> PageExtractor for &E {
    fn extract(&self, reference: &str) -> Result<Extraction, ExtractError> {
        (**self).extract(reference)
    }
}

/// Extractor for encyclopedia pages with an infobox "Associated acts" row
pub struct WikipediaExtractor {
    client: Client,
    base_url: String,
    base: Url,
    labels: Vec<String>,
}

impl WikipediaExtractor {
    /// Build an extractor from configuration
    pub fn new(config: &Config) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        let base = parse_base_url(&config.base_url)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            base,
            labels: config.association_labels.clone(),
        })
    }

    /// Whether `reference` lives under the configured base URL
    #[must_use]
    pub fn supports(&self, reference: &str) -> bool {
        reference.starts_with(&self.base_url)
    }
}

impl PageExtractor for WikipediaExtractor {
    fn extract(&self, reference: &str) -> Result<Extraction, ExtractError> {
        if !self.supports(reference) {
            debug!("Unsupported reference: {}", reference);
            return Ok(Extraction::empty());
        }

        trace!("Fetching {}", reference);
        let body = self
            .client
            .get(reference)
            .send()?
            .error_for_status()?
            .text()?;

        parse_page(&body, &self.base, &self.labels)
    }
}

/// Parse the configured page prefix into a base for resolving links
pub fn parse_base_url(base_url: &str) -> Result<Url, ExtractError> {
    let base =
        Url::parse(base_url).map_err(|e| ExtractError::BaseUrl(format!("{base_url}: {e}")))?;
    if !is_web(&base) {
        return Err(ExtractError::BaseUrl(base_url.to_string()));
    }
    Ok(base)
}

fn is_web(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.has_host()
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(e.to_string()))
}

/// Read the page title and the associations row out of an HTML document.
///
/// The title is the text of the first `h1`. The associations row is the
/// first table row whose text mentions one of `labels`; every link in it
/// becomes an association, resolved against `base` with its fragment dropped.
pub fn parse_page(html: &str, base: &Url, labels: &[String]) -> Result<Extraction, ExtractError> {
    let document = Html::parse_document(html);
    let h1 = selector("h1")?;
    let tr = selector("tr")?;
    let anchor = selector("a[href]")?;

    let resolved_name = document
        .select(&h1)
        .next()
        .map(|title| collapse_whitespace(&title.text().collect::<String>()))
        .unwrap_or_default();

    let row = document.select(&tr).find(|row| {
        let text = row.text().collect::<String>();
        labels.iter().any(|label| text.contains(label.as_str()))
    });

    let associations = row
        .map(|row| {
            row.select(&anchor)
                .filter_map(|a| association(a, base))
                .collect()
        })
        .unwrap_or_default();

    Ok(Extraction {
        resolved_name,
        associations,
    })
}

fn association(anchor: ElementRef<'_>, base: &Url) -> Option<Association> {
    let element = anchor.value();
    // Red links point at pages that do not exist yet
    if element.classes().any(|class| class == "new") {
        return None;
    }

    let href = element.attr("href")?.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !is_web(&url) {
        return None;
    }
    // Section links name the same page
    url.set_fragment(None);
    let reference = String::from(url);

    let name = element
        .attr("title")
        .map(collapse_whitespace)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| collapse_whitespace(&anchor.text().collect::<String>()));

    Some(Association { name, reference })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ActGraph;

    fn base() -> Url {
        parse_base_url("https://en.wikipedia.org/wiki/").unwrap()
    }

    fn labels() -> Vec<String> {
        vec!["Associated acts".to_string()]
    }

    const BAND_PAGE: &str = r##"
        <html><body>
        <h1 id="firstHeading"><span>Gorillaz</span></h1>
        <table class="infobox">
          <tr><th>Origin</th><td>London, England</td></tr>
          <tr><th>Genres</th><td><a href="/wiki/Alternative_rock" title="Alternative rock">Alternative rock</a></td></tr>
          <tr>
            <th class="infobox-label">Associated acts</th>
            <td class="infobox-data"><div class="hlist"><ul>
              <li><a href="/wiki/Blur_(band)" title="Blur (band)">Blur</a></li>
              <li><a href="/wiki/The_Good,_the_Bad_%26_the_Queen" title="The Good, the Bad &amp; the Queen">The Good, the Bad &amp; the Queen</a></li>
              <li><a href="/w/index.php?title=Nope&amp;action=edit&amp;redlink=1" class="new" title="Nope (page does not exist)">Nope</a></li>
              <li><a href="#cite_note-1">[1]</a></li>
              <li><a href="https://example.org/elsewhere">Elsewhere</a></li>
            </ul></div></td>
          </tr>
          <tr><th>Website</th><td><a href="https://gorillaz.com">gorillaz.com</a></td></tr>
        </table>
        </body></html>
    "##;

    #[test]
    fn test_parse_page_reads_title_and_associations() {
        let extraction = parse_page(BAND_PAGE, &base(), &labels()).unwrap();

        assert_eq!(extraction.resolved_name, "Gorillaz");
        assert_eq!(
            extraction.associations,
            vec![
                Association::new("Blur (band)", "https://en.wikipedia.org/wiki/Blur_(band)"),
                Association::new(
                    "The Good, the Bad & the Queen",
                    "https://en.wikipedia.org/wiki/The_Good,_the_Bad_%26_the_Queen"
                ),
                Association::new("Elsewhere", "https://example.org/elsewhere"),
            ]
        );
    }

    #[test]
    fn test_parse_page_without_associations_row() {
        let html = "<html><body><h1>Solo Artist</h1><table><tr><th>Born</th></tr></table></body></html>";
        let extraction = parse_page(html, &base(), &labels()).unwrap();

        assert_eq!(extraction.resolved_name, "Solo Artist");
        assert!(extraction.associations.is_empty());
    }

    #[test]
    fn test_parse_page_without_title() {
        let extraction = parse_page("<p>nothing here</p>", &base(), &labels()).unwrap();
        assert!(extraction.is_empty());
    }

    #[test]
    fn test_parse_page_custom_label() {
        let html = r#"<h1>Band</h1><table><tr><th>Spinoffs</th><td><a href="/wiki/Other" title="Other">Other</a></td></tr></table>"#;

        let extraction = parse_page(html, &base(), &["Spinoffs".to_string()]).unwrap();
        assert_eq!(extraction.associations.len(), 1);

        let extraction = parse_page(html, &base(), &labels()).unwrap();
        assert!(extraction.associations.is_empty());
    }

    #[test]
    fn test_section_links_resolve_to_the_page() {
        let html = r##"<h1>Blur</h1><table><tr><th>Associated acts</th><td>
            <a href="/wiki/Damon_Albarn" title="Damon Albarn">Damon Albarn</a>
            <a href="/wiki/Damon_Albarn#Solo" title="Damon Albarn">solo work</a>
            <a href="//en.wikipedia.org/wiki/Gorillaz#History">Gorillaz</a>
            <a href="mailto:band@example.org">mail</a>
        </td></tr></table>"##;

        let extraction = parse_page(html, &base(), &labels()).unwrap();
        let references: Vec<_> = extraction
            .associations
            .iter()
            .map(|a| a.reference.as_str())
            .collect();
        assert_eq!(
            references,
            vec![
                "https://en.wikipedia.org/wiki/Damon_Albarn",
                "https://en.wikipedia.org/wiki/Damon_Albarn",
                "https://en.wikipedia.org/wiki/Gorillaz",
            ]
        );

        let mut graph = ActGraph::new("https://en.wikipedia.org/wiki/Blur");
        graph
            .merge(0, &extraction.resolved_name, &extraction.associations)
            .unwrap();
        assert_eq!(graph.entity_count(), 3);
        assert_eq!(graph.link_count(), 2);
    }

    #[test]
    fn test_parse_base_url() {
        let base = parse_base_url("http://127.0.0.1:8080/wiki/").unwrap();
        assert_eq!(
            base.join("/wiki/Blur").unwrap().as_str(),
            "http://127.0.0.1:8080/wiki/Blur"
        );
        assert!(matches!(
            parse_base_url("en.wikipedia.org/wiki/"),
            Err(ExtractError::BaseUrl(_))
        ));
        assert!(parse_base_url("file:///tmp/wiki/").is_err());
    }

    #[test]
    fn test_unsupported_reference_is_empty() {
        let extractor = WikipediaExtractor::new(&Config::default()).unwrap();

        assert!(!extractor.supports("https://example.org/wiki/Blur"));
        let extraction = extractor.extract("https://example.org/wiki/Blur").unwrap();
        assert!(extraction.is_empty());
    }
}
