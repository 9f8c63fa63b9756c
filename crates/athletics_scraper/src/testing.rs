//! In-memory page source and HTML fixtures, for exercising the façade and
//! anything built on it without a browser or network.

use crate::fetcher::{PageRequest, PageSource};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Serves canned HTML keyed by URL. URLs registered with
/// [`MockPageSource::with_failure`] fail like an unreachable site; unknown
/// URLs fail too.
#[derive(Default)]
pub struct MockPageSource {
    pages: HashMap<String, String>,
    failures: HashSet<String>,
    calls: Arc<RwLock<Vec<PageRequest>>>,
}

impl MockPageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Handle on the request log; stays valid after the source is moved.
    pub fn calls(&self) -> Arc<RwLock<Vec<PageRequest>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn load(&self, request: &PageRequest) -> Result<String> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(request.clone());
        }

        if self.failures.contains(&request.url) {
            return Err(anyhow::anyhow!("navigation failed for {}: net::ERR_CONNECTION_REFUSED", request.url));
        }

        self.pages
            .get(&request.url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no page registered for {}", request.url))
    }
}

/// Page builders in the shape of the classic (`sidearm-*`) templates.
pub mod fixtures {
    fn page(body: String) -> String {
        format!("<!DOCTYPE html><html><head><title>Athletics</title></head><body>{body}</body></html>")
    }

    /// `(name, jersey, position, hometown)`
    pub fn classic_roster(players: &[(&str, &str, &str, &str)]) -> String {
        let items: String = players
            .iter()
            .map(|(name, jersey, position, hometown)| {
                let slug = name.to_lowercase().replace(' ', "-");
                format!(
                    r#"<li class="sidearm-roster-player">
                         <div class="sidearm-roster-player-jersey-number">{jersey}</div>
                         <div class="sidearm-roster-player-name"><h3><a href="/sports/roster/{slug}">{name}</a></h3></div>
                         <div class="sidearm-roster-player-position">{position}</div>
                         <div class="sidearm-roster-player-hometown">{hometown}</div>
                       </li>"#
                )
            })
            .collect();
        page(format!(r#"<ul class="sidearm-roster-players">{items}</ul>"#))
    }

    /// `(date, opponent, result, score)`
    pub fn classic_schedule(games: &[(&str, &str, &str, &str)]) -> String {
        let items: String = games
            .iter()
            .map(|(date, opponent, result, score)| {
                format!(
                    r#"<li class="sidearm-schedule-game">
                         <div class="sidearm-schedule-game-date">{date}</div>
                         <div class="sidearm-schedule-game-opponent-name">{opponent}</div>
                         <div class="sidearm-schedule-game-location">Las Vegas, N.M.</div>
                         <div class="sidearm-schedule-game-result">{result}</div>
                         <div class="sidearm-schedule-game-result-score">{score}</div>
                       </li>"#
                )
            })
            .collect();
        page(format!(r#"<ul class="sidearm-schedule-games">{items}</ul>"#))
    }

    /// First header names the player column; rows follow the header order.
    pub fn classic_stats(header: &[&str], rows: &[&[&str]]) -> String {
        let head: String = header.iter().map(|h| format!("<th>{h}</th>")).collect();
        let body: String = rows
            .iter()
            .map(|cells| {
                let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{tds}</tr>")
            })
            .collect();
        page(format!(
            r#"<table class="sidearm-table"><thead><tr>{head}</tr></thead><tbody>{body}</tbody></table>"#
        ))
    }

    /// `(href, title)`
    pub fn archive_news(stories: &[(&str, &str)]) -> String {
        let items: String = stories
            .iter()
            .map(|(href, title)| format!(r#"<li><a href="{href}">{title}</a></li>"#))
            .collect();
        page(format!(r#"<div class="sidearm-archives"><ul>{items}</ul></div>"#))
    }
}
