//! Reading a directory of HTML pages into a [`LinkGraph`].
//!
//! Every `*.html` file is a page named by its file name. Anchor `href`
//! targets naming another page of the corpus become links; fragment links
//! and external targets are dropped. A `<meta name="reward" content="...">`
//! tag marks the page terminal.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::CrawlError;
use crate::graph::LinkGraph;

const ANCHOR_PATTERN: &str = r##"<a[^>]+href="([^"#]+)""##;
const REWARD_PATTERN: &str = r#"<meta\s+name="reward"\s+content="([-0-9.]+)""#;

/// Links and reward marker extracted from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPage {
    /// Raw `href` targets in document order (may include other sites).
    pub hrefs: Vec<String>,
    /// Terminal reward, if the page carries one.
    pub reward: Option<f64>,
}

/// Compiled patterns for page extraction.
#[derive(Debug, Clone)]
pub struct PageParser {
    anchor: Regex,
    reward: Regex,
}

impl PageParser {
    /// Compile the extraction patterns.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Pattern` if a pattern fails to compile.
    pub fn new() -> Result<Self, CrawlError> {
        Ok(Self {
            anchor: Regex::new(ANCHOR_PATTERN)?,
            reward: Regex::new(REWARD_PATTERN)?,
        })
    }

    /// Extract hrefs and the reward marker from page text.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::InvalidReward` if the marker is not a number.
    pub fn parse(&self, page: &str, text: &str) -> Result<ParsedPage, CrawlError> {
        let hrefs = self
            .anchor
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect();

        let reward = match self.reward.captures(text) {
            Some(c) => {
                let raw = &c[1];
                let value = raw.parse::<f64>().map_err(|_| CrawlError::InvalidReward {
                    page: page.to_string(),
                    raw: raw.to_string(),
                })?;
                Some(value)
            }
            None => None,
        };

        Ok(ParsedPage { hrefs, reward })
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CrawlError {
    let path = path.to_path_buf();
    move |source| CrawlError::Io { path, source }
}

/// Build a link graph from the `*.html` files directly inside `dir`.
///
/// # Errors
///
/// - `CrawlError::Io` if the directory or a page cannot be read.
/// - `CrawlError::InvalidReward` for an unparsable reward marker.
pub fn crawl_directory(dir: impl AsRef<Path>) -> Result<LinkGraph, CrawlError> {
    let dir = dir.as_ref();

    let mut pages = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".html") && path.is_file() {
            pages.push((name.to_string(), path.clone()));
        }
    }

    let parser = PageParser::new()?;
    let mut graph = LinkGraph::new();
    for (name, _) in &pages {
        graph.add_page(name.as_str());
    }

    for (name, path) in &pages {
        let text = fs::read_to_string(path).map_err(io_error(path))?;
        let parsed = parser.parse(name, &text)?;

        let mut kept = 0usize;
        for href in &parsed.hrefs {
            if graph.links(href).is_some() {
                graph.add_link(name.as_str(), href.as_str());
                kept += 1;
            }
        }
        if let Some(reward) = parsed.reward {
            graph.set_terminal_reward(name.as_str(), reward);
        }
        debug!(
            page = %name,
            hrefs = parsed.hrefs.len(),
            links = kept,
            reward = ?parsed.reward,
            "crawled page"
        );
    }

    Ok(graph)
}
