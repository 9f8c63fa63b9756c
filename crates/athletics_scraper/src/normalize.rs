//! Raw extractor output → canonical entities.

use crate::extract::{Extraction, RawGame, RawPlayer, RawStatTable, RawStory};
use crate::model::{Game, NewsArticle, Player, Stat};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

pub struct Normalizer {
    base: Url,
    news_path: Regex,
}

impl Normalizer {
    pub fn new(base_origin: &str) -> Result<Self> {
        let base = Url::parse(base_origin)
            .with_context(|| format!("invalid base origin {}", base_origin))?;
        let news_path = Regex::new(r"/news/(\d{4})/(\d{1,2})/(\d{1,2})/")?;
        Ok(Self { base, news_path })
    }

    /// Absolute links pass through untouched; anything else is joined onto
    /// the base origin.
    pub fn resolve_link(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() {
            return String::new();
        }
        if Url::parse(href).is_ok() {
            return href.to_string();
        }
        match self.base.join(href) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base.as_str().trim_end_matches('/'), href),
        }
    }

    /// `m/d/yyyy` from a `/news/yyyy/m/d/` link, empty when the path has no
    /// real calendar date.
    pub fn news_date(&self, link: &str) -> String {
        let Some(caps) = self.news_path.captures(link) else {
            return String::new();
        };
        let parsed = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        );
        match parsed {
            (Ok(y), Ok(m), Ok(d)) if NaiveDate::from_ymd_opt(y, m, d).is_some() => {
                format!("{}/{}/{}", m, d, y)
            }
            _ => String::new(),
        }
    }

    pub fn players(&self, extraction: Extraction) -> Vec<Player> {
        match extraction {
            Extraction::Roster(raw) => raw.into_iter().map(|p| self.player(p)).collect(),
            _ => Vec::new(),
        }
    }

    pub fn games(&self, extraction: Extraction) -> Vec<Game> {
        match extraction {
            Extraction::Schedule(raw) => raw.into_iter().map(game).collect(),
            _ => Vec::new(),
        }
    }

    pub fn stats(&self, extraction: Extraction) -> Vec<Stat> {
        match extraction {
            Extraction::Stats(table) => stat_rows(table),
            _ => Vec::new(),
        }
    }

    pub fn news(&self, extraction: Extraction) -> Vec<NewsArticle> {
        let Extraction::News(raw) = extraction else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        raw.into_iter()
            .filter_map(|story| self.article(story))
            .filter(|article| seen.insert(article.link.clone()))
            .collect()
    }

    fn player(&self, raw: RawPlayer) -> Player {
        Player {
            name: raw.name.unwrap_or_default(),
            jersey_number: raw
                .jersey_number
                .unwrap_or_default()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect(),
            position: raw.position.unwrap_or_default(),
            year: raw.year.unwrap_or_default(),
            hometown: raw.hometown.unwrap_or_default(),
            height: raw.height.unwrap_or_default(),
            high_school: raw.high_school.unwrap_or_default(),
            bio_link: raw.href.map(|h| self.resolve_link(&h)).unwrap_or_default(),
        }
    }

    fn article(&self, raw: RawStory) -> Option<NewsArticle> {
        let link = self.resolve_link(raw.href.as_deref().unwrap_or_default());
        let title = raw.title.unwrap_or_default();
        if link.is_empty() || title.is_empty() {
            return None;
        }

        Some(NewsArticle {
            date: self.news_date(&link),
            summary: raw.summary.unwrap_or_default(),
            title,
            link,
        })
    }
}

fn game(raw: RawGame) -> Game {
    Game {
        date: raw.date.unwrap_or_default(),
        opponent: raw.opponent.unwrap_or_default(),
        location: raw.location.unwrap_or_default(),
        result: raw.result.unwrap_or_default(),
        score: raw.score.unwrap_or_default(),
    }
}

/// Index of the column holding the player's name.
fn player_column(header: &[String]) -> usize {
    if let Some(i) = header.iter().position(|h| {
        let h = h.trim().to_ascii_lowercase();
        h == "player" || h == "name"
    }) {
        return i;
    }
    match header.first() {
        Some(first) if first.trim() == "#" => 1,
        _ => 0,
    }
}

fn is_summary_row(player: &str) -> bool {
    let lower = player.to_ascii_lowercase();
    lower.starts_with("total") || lower.starts_with("opponent")
}

fn stat_rows(table: RawStatTable) -> Vec<Stat> {
    let player_idx = player_column(&table.header);

    table
        .rows
        .into_iter()
        .filter_map(|cells| {
            let player = cells.get(player_idx)?.trim().to_string();
            if player.is_empty() || is_summary_row(&player) {
                return None;
            }

            let mut stats = IndexMap::new();
            for (i, value) in cells.into_iter().enumerate() {
                if i == player_idx {
                    continue;
                }
                let mut column = table
                    .header
                    .get(i)
                    .map(|h| h.trim().to_string())
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| format!("col{}", i));
                if stats.contains_key(&column) {
                    column = format!("{}_{}", column, i);
                }
                stats.insert(column, value);
            }

            Some(Stat { player, stats })
        })
        .collect()
}
