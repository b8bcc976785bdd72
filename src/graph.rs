//! Directed page-link graph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};

/// Pages, their outgoing links, and optional terminal rewards.
///
/// Ordered collections keep every derived MDP deterministic: pages become
/// states in name order and links become actions in name order.
///
/// Deserialized graphs go through the same insertion path as
/// [`add_link`](Self::add_link): self-links are dropped and link targets
/// become pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkGraph {
    links: BTreeMap<String, BTreeSet<String>>,
    terminal_rewards: BTreeMap<String, f64>,
}

impl LinkGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page (idempotent).
    pub fn add_page(&mut self, page: impl Into<String>) {
        self.links.entry(page.into()).or_default();
    }

    /// Add a link, creating both pages if needed. Self-links are ignored.
    pub fn add_link(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let (from, to) = (from.into(), to.into());
        self.add_page(to.clone());
        let out = self.links.entry(from.clone()).or_default();
        if from != to {
            out.insert(to);
        }
    }

    /// Mark `page` terminal with a fixed reward, creating it if needed.
    pub fn set_terminal_reward(&mut self, page: impl Into<String>, reward: f64) {
        let page = page.into();
        self.add_page(page.clone());
        self.terminal_rewards.insert(page, reward);
    }

    /// Iterate over pages in name order.
    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Returns the number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.links.len()
    }

    /// Returns the outgoing links of `page` in name order.
    #[must_use]
    pub fn links(&self, page: &str) -> Option<&BTreeSet<String>> {
        self.links.get(page)
    }

    /// Returns the terminal reward of `page`, if it is terminal.
    #[must_use]
    pub fn terminal_reward(&self, page: &str) -> Option<f64> {
        self.terminal_rewards.get(page).copied()
    }

    /// Returns true if `page` carries a terminal reward.
    #[must_use]
    pub fn is_terminal(&self, page: &str) -> bool {
        self.terminal_rewards.contains_key(page)
    }
}

#[derive(Deserialize)]
struct GraphParts {
    #[serde(default)]
    links: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    terminal_rewards: BTreeMap<String, f64>,
}

impl<'de> Deserialize<'de> for LinkGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = GraphParts::deserialize(deserializer)?;
        let mut graph = Self::new();
        for (from, targets) in parts.links {
            graph.add_page(from.clone());
            for to in targets {
                graph.add_link(from.clone(), to);
            }
        }
        for (page, reward) in parts.terminal_rewards {
            graph.set_terminal_reward(page, reward);
        }
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_create_pages_and_skip_self_loops() {
        let mut g = LinkGraph::new();
        g.add_link("a.html", "b.html");
        g.add_link("a.html", "a.html");
        assert_eq!(g.page_count(), 2);
        let out: Vec<&String> = g.links("a.html").unwrap().iter().collect();
        assert_eq!(out, vec!["b.html"]);
        assert!(g.links("b.html").unwrap().is_empty());
    }

    #[test]
    fn terminal_rewards() {
        let mut g = LinkGraph::new();
        g.set_terminal_reward("goal.html", 3.5);
        assert!(g.is_terminal("goal.html"));
        assert_eq!(g.terminal_reward("goal.html"), Some(3.5));
        assert_eq!(g.terminal_reward("other.html"), None);
    }

    #[test]
    fn pages_are_sorted() {
        let mut g = LinkGraph::new();
        g.add_page("c.html");
        g.add_page("a.html");
        g.add_page("b.html");
        assert_eq!(g.pages().collect::<Vec<_>>(), vec!["a.html", "b.html", "c.html"]);
    }

    #[test]
    fn deserialized_graph_is_normalized() {
        let json = r#"{
            "links": {"a.html": ["a.html", "b.html"]},
            "terminal_rewards": {"goal.html": 2.0}
        }"#;
        let g: LinkGraph = serde_json::from_str(json).unwrap();
        assert_eq!(
            g.pages().collect::<Vec<_>>(),
            vec!["a.html", "b.html", "goal.html"]
        );
        let out: Vec<&String> = g.links("a.html").unwrap().iter().collect();
        assert_eq!(out, vec!["b.html"]);
        assert!(g.links("b.html").unwrap().is_empty());
        assert_eq!(g.terminal_reward("goal.html"), Some(2.0));
    }

    #[test]
    fn serde_round_trip_keeps_graph() {
        let mut g = LinkGraph::new();
        g.add_link("a.html", "b.html");
        g.set_terminal_reward("b.html", 1.0);
        let json = serde_json::to_string(&g).unwrap();
        let back: LinkGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }
}
