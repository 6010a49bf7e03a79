//! HTML extraction for project pages
//!
//! A project page is opaque markup. Two independent rules are run against it:
//! - License: the text of the first license link among the project buttons
//! - Mirror: the text of the first "pull mirror" notice in the description
//!
//! Missing or malformed structure never fails; the field is simply absent.

use crate::config::ExtractConfig;
use crate::model::ProjectMeta;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Derives a project's metadata record from its HTML page
pub trait MetaExtractor: Send + Sync {
    fn extract(&self, project_id: i64, html: &str) -> ProjectMeta;
}

/// Extractor for GitLab project pages
#[derive(Debug, Clone)]
pub struct ProjectPageParser {
    license_container: Selector,
    description_panel: Selector,
    anchor: Selector,
    paragraph: Selector,
}

impl ProjectPageParser {
    /// Compiles the container selectors from configuration
    pub fn new(config: &ExtractConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            license_container: parse_selector(&config.license_container)?,
            description_panel: parse_selector(&config.description_panel)?,
            anchor: parse_selector("a[href]")?,
            paragraph: parse_selector("p")?,
        })
    }

    /// Returns the license link text, if the page has one
    ///
    /// Scans the anchors inside the first license container in document
    /// order and returns the text of the first whose `href` ends in
    /// `/LICENSE`, exactly as it appears in the page.
    pub fn license(&self, document: &Html) -> Option<String> {
        let container = document.select(&self.license_container).next()?;

        container
            .select(&self.anchor)
            .find(|anchor| {
                anchor
                    .value()
                    .attr("href")
                    .map_or(false, |href| href.ends_with("/LICENSE"))
            })
            .map(|anchor| element_text(&anchor))
    }

    /// Returns the mirror notice, lower-cased, if the page has one
    ///
    /// Scans the paragraphs inside the first description panel in document
    /// order and returns the first whose text mentions "pull mirror".
    pub fn mirror(&self, document: &Html) -> Option<String> {
        let panel = document.select(&self.description_panel).next()?;

        panel
            .select(&self.paragraph)
            .map(|paragraph| element_text(&paragraph).to_lowercase())
            .find(|text| text.contains("pull mirror"))
    }
}

impl MetaExtractor for ProjectPageParser {
    fn extract(&self, project_id: i64, html: &str) -> ProjectMeta {
        let document = Html::parse_document(html);

        ProjectMeta {
            project_id,
            project_license: self.license(&document),
            project_mirrored: self.mirror(&document),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProjectPageParser {
        ProjectPageParser::new(&ExtractConfig::default()).unwrap()
    }

    #[test]
    fn test_license_found() {
        let html = r#"
            <html><body>
              <div class="project-buttons gl-mb-3 js-show-on-project-root">
                <a href="https://x/README.md">README</a>
                <a href="https://x/LICENSE">MIT</a>
              </div>
            </body></html>"#;

        let meta = parser().extract(1, html);
        assert_eq!(meta.project_license.as_deref(), Some("MIT"));
    }

    #[test]
    fn test_license_first_match_wins() {
        let html = r#"
            <div class="project-buttons gl-mb-3 js-show-on-project-root">
              <a href="/group/p/-/blob/master/LICENSE">Apache License 2.0</a>
              <a href="/group/p/-/blob/other/LICENSE">GPL</a>
            </div>"#;

        let meta = parser().extract(1, html);
        assert_eq!(meta.project_license.as_deref(), Some("Apache License 2.0"));
    }

    #[test]
    fn test_extracted_text_is_not_trimmed() {
        let html = r#"
            <div class="project-buttons gl-mb-3 js-show-on-project-root">
              <a href="/group/p/-/blob/master/LICENSE">
                MIT License
              </a>
            </div>
            <div class="home-panel-home-desc mt-1">
              <p> Pull mirror of upstream </p>
            </div>"#;

        let meta = parser().extract(1, html);
        assert_eq!(
            meta.project_license.as_deref(),
            Some("\n                MIT License\n              ")
        );
        assert_eq!(meta.project_mirrored.as_deref(), Some(" pull mirror of upstream "));
    }

    #[test]
    fn test_license_requires_suffix() {
        let html = r#"
            <div class="project-buttons gl-mb-3 js-show-on-project-root">
              <a href="https://x/LICENSE.md">MIT</a>
              <a href="https://x/LICENSE/edit">Edit</a>
            </div>"#;

        assert_eq!(parser().extract(1, html).project_license, None);
    }

    #[test]
    fn test_license_without_container() {
        let html = r#"<div class="other"><a href="https://x/LICENSE">MIT</a></div>"#;
        assert_eq!(parser().extract(1, html).project_license, None);
    }

    #[test]
    fn test_license_outside_container_is_ignored() {
        let html = r#"
            <div class="project-buttons gl-mb-3 js-show-on-project-root">
              <a href="https://x/README.md">README</a>
            </div>
            <a href="https://x/LICENSE">MIT</a>"#;

        assert_eq!(parser().extract(1, html).project_license, None);
    }

    #[test]
    fn test_mirror_found() {
        let html = r#"
            <div class="home-panel-home-desc mt-1">
              <p>A description</p>
              <p>This is a pull mirror of https://github.com/x/y</p>
            </div>"#;

        let meta = parser().extract(1, html);
        assert_eq!(
            meta.project_mirrored.as_deref(),
            Some("this is a pull mirror of https://github.com/x/y")
        );
        assert!(meta.is_mirror());
    }

    #[test]
    fn test_mirror_match_is_case_insensitive() {
        let html = r#"
            <div class="home-panel-home-desc mt-1">
              <p>Pull Mirror of upstream</p>
            </div>"#;

        let meta = parser().extract(1, html);
        assert_eq!(meta.project_mirrored.as_deref(), Some("pull mirror of upstream"));
    }

    #[test]
    fn test_mirror_absent() {
        let html = r#"
            <div class="home-panel-home-desc mt-1">
              <p>Just a project</p>
            </div>"#;

        assert_eq!(parser().extract(1, html).project_mirrored, None);
    }

    #[test]
    fn test_malformed_html_degrades() {
        let meta = parser().extract(9, "<div class=\"project-buttons <<< </a>");
        assert_eq!(meta, ProjectMeta::absent(9));

        let meta = parser().extract(9, "");
        assert_eq!(meta, ProjectMeta::absent(9));
    }

    #[test]
    fn test_custom_selectors() {
        let config = ExtractConfig {
            license_container: "nav.buttons".to_string(),
            description_panel: "section.desc".to_string(),
        };
        let parser = ProjectPageParser::new(&config).unwrap();
        let html = r#"
            <nav class="buttons"><a href="/LICENSE">BSD</a></nav>
            <section class="desc"><p>pull mirror</p></section>"#;

        let meta = parser.extract(2, html);
        assert_eq!(meta.project_license.as_deref(), Some("BSD"));
        assert_eq!(meta.project_mirrored.as_deref(), Some("pull mirror"));
    }

    #[test]
    fn test_invalid_selector() {
        let config = ExtractConfig {
            license_container: "[[invalid".to_string(),
            ..ExtractConfig::default()
        };
        assert!(ProjectPageParser::new(&config).is_err());
    }
}
