//! Single-purpose read operations. Each call loads exactly one page in its
//! own session; nothing is cached between calls.

use crate::config::SiteConfig;
use crate::detect::{detect, FormatTag};
use crate::extract::{extract, Extraction};
use crate::fetcher::{build_page_source, PageRequest, PageSource, WaitStrategy};
use crate::model::{EntityKind, Game, NewsArticle, Player, Sport, Stat};
use crate::normalize::Normalizer;
use anyhow::Result;
use scraper::Html;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Hydration marker for the client-rendered archive page.
const NEWS_MARKER: &str = "a[href*='/news/']";

#[derive(Debug, Clone, Serialize)]
pub struct PageProbe {
    pub url: String,
    pub html_len: usize,
    pub format: Option<FormatTag>,
    pub records: usize,
}

#[derive(Clone)]
pub struct AthleticsScraper {
    config: Arc<SiteConfig>,
    source: Arc<dyn PageSource>,
    normalizer: Arc<Normalizer>,
}

/// Detects the template and runs its extractor. The parsed document never
/// outlives this call.
pub fn parse_page(html: &str, kind: EntityKind) -> Result<(Option<FormatTag>, Extraction)> {
    let document = Html::parse_document(html);
    let tag = detect(&document, kind)?;
    let extraction = extract(&document, kind, tag)?;
    Ok((tag, extraction))
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Substring match on name, hometown and position, or exact jersey number.
pub fn matches_search(player: &Player, term: &str) -> bool {
    let term = term.trim();
    contains_ci(&player.name, term)
        || contains_ci(&player.hometown, term)
        || contains_ci(&player.position, term)
        || (!player.jersey_number.is_empty() && player.jersey_number == term)
}

pub fn find_player<'a>(roster: &'a [Player], name: &str) -> Option<&'a Player> {
    let name = name.trim();
    roster.iter().find(|p| contains_ci(&p.name, name))
}

/// Upcoming games in schedule order.
pub fn upcoming_games(games: &[Game], limit: usize) -> Vec<Game> {
    games.iter().filter(|g| g.is_upcoming()).take(limit).cloned().collect()
}

/// Completed games, most recent first. Schedule pages list games
/// chronologically, so "most recent" means "last on the page".
pub fn recent_results(games: &[Game], limit: usize) -> Vec<Game> {
    games.iter().rev().filter(|g| g.is_completed()).take(limit).cloned().collect()
}

impl AthleticsScraper {
    pub fn new(config: SiteConfig) -> Result<Self> {
        let source = build_page_source(&config);
        Self::with_source(config, source)
    }

    pub fn with_source(config: SiteConfig, source: Arc<dyn PageSource>) -> Result<Self> {
        let normalizer = Normalizer::new(&config.base_origin)?;
        Ok(Self {
            config: Arc::new(config),
            source,
            normalizer: Arc::new(normalizer),
        })
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    fn request(&self, sport: Sport, kind: EntityKind) -> PageRequest {
        let wait = match kind {
            EntityKind::News => WaitStrategy::DomMarker {
                selector: NEWS_MARKER.to_string(),
                timeout: self.config.marker_timeout,
            },
            _ => WaitStrategy::NetworkIdle {
                settle: self.config.settle_delay,
            },
        };

        PageRequest {
            url: self.config.page_url(sport, kind),
            wait,
            timeout: self.config.navigation_timeout,
        }
    }

    async fn scrape(&self, sport: Sport, kind: EntityKind) -> Result<Extraction> {
        let request = self.request(sport, kind);
        debug!(url = %request.url, "loading page");

        let html = self.source.load(&request).await?;
        let (tag, extraction) = parse_page(&html, kind)?;

        match tag {
            Some(tag) => info!(%sport, entity = %kind, format = %tag, count = extraction.len(), "page extracted"),
            None => info!(%sport, entity = %kind, "no known template on page"),
        }

        Ok(extraction)
    }

    /// Loads one page and reports what the detector saw, without normalizing.
    pub async fn probe(&self, sport: Sport, kind: EntityKind) -> Result<PageProbe> {
        let request = self.request(sport, kind);
        let html = self.source.load(&request).await?;
        let (format, extraction) = parse_page(&html, kind)?;

        Ok(PageProbe {
            url: request.url,
            html_len: html.len(),
            format,
            records: extraction.len(),
        })
    }

    pub async fn get_roster(&self, sport: Sport) -> Result<Vec<Player>> {
        let extraction = self.scrape(sport, EntityKind::Roster).await?;
        Ok(self.normalizer.players(extraction))
    }

    pub async fn get_schedule(&self, sport: Sport) -> Result<Vec<Game>> {
        let extraction = self.scrape(sport, EntityKind::Schedule).await?;
        Ok(self.normalizer.games(extraction))
    }

    pub async fn get_stats(&self, sport: Sport) -> Result<Vec<Stat>> {
        let extraction = self.scrape(sport, EntityKind::Stats).await?;
        Ok(self.normalizer.stats(extraction))
    }

    pub async fn get_news(&self, sport: Sport, limit: usize) -> Result<Vec<NewsArticle>> {
        let extraction = self.scrape(sport, EntityKind::News).await?;
        let mut news = self.normalizer.news(extraction);
        news.truncate(limit);
        Ok(news)
    }

    pub async fn search_player(&self, sport: Sport, term: &str) -> Result<Vec<Player>> {
        let roster = self.get_roster(sport).await?;
        Ok(roster.into_iter().filter(|p| matches_search(p, term)).collect())
    }

    pub async fn get_player_bio(&self, sport: Sport, name: &str) -> Result<Option<Player>> {
        let roster = self.get_roster(sport).await?;
        Ok(find_player(&roster, name).cloned())
    }

    pub async fn get_games_by_date(&self, sport: Sport, date: &str) -> Result<Vec<Game>> {
        let schedule = self.get_schedule(sport).await?;
        let date = date.trim();
        Ok(schedule.into_iter().filter(|g| contains_ci(&g.date, date)).collect())
    }

    pub async fn get_upcoming_games(&self, sport: Sport, limit: usize) -> Result<Vec<Game>> {
        let schedule = self.get_schedule(sport).await?;
        Ok(upcoming_games(&schedule, limit))
    }

    pub async fn get_recent_results(&self, sport: Sport, limit: usize) -> Result<Vec<Game>> {
        let schedule = self.get_schedule(sport).await?;
        Ok(recent_results(&schedule, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockPageSource};

    const BASE: &str = "https://athletics.example.edu";

    fn scraper(source: MockPageSource) -> AthleticsScraper {
        AthleticsScraper::with_source(SiteConfig::with_base_origin(BASE), Arc::new(source)).unwrap()
    }

    fn url(sport: &str, page: &str) -> String {
        format!("{BASE}/sports/{sport}/{page}")
    }

    fn softball_roster() -> String {
        fixtures::classic_roster(&[
            ("Jane Doe", "5", "OF", "Reno, Nev."),
            ("Kim Roe", "15", "P", "Santa Fe, N.M."),
            ("Ana Cruz", "22", "C", "Las Vegas, N.M."),
            ("Mia 5th", "8", "INF", "Denver, Colo."),
        ])
    }

    #[tokio::test]
    async fn roster_on_unknown_template_is_empty_not_an_error() {
        let source = MockPageSource::new()
            .with_page(url("football", "roster"), "<html><body><p>Roster coming soon</p></body></html>");
        let roster = scraper(source).get_roster(Sport::Football).await.unwrap();
        assert!(roster.is_empty());
    }

    #[tokio::test]
    async fn roster_fields_are_strings_and_jerseys_are_digits() {
        let source = MockPageSource::new().with_page(url("softball", "roster"), softball_roster());
        let roster = scraper(source).get_roster(Sport::Softball).await.unwrap();

        assert_eq!(roster.len(), 4);
        for p in &roster {
            assert!(p.jersey_number.chars().all(|c| c.is_ascii_digit()));
            assert!(p.bio_link.starts_with(BASE));
        }
        assert_eq!(roster[0].height, "");
    }

    #[tokio::test]
    async fn search_unions_exact_jersey_with_substring_fields() {
        let source = MockPageSource::new().with_page(url("softball", "roster"), softball_roster());
        let found = scraper(source).search_player(Sport::Softball, "5").await.unwrap();

        // #5 exactly, "Mia 5th" by name; #15 is not an exact jersey match.
        let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "Mia 5th"]);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_hometown_and_position() {
        let source = MockPageSource::new().with_page(url("softball", "roster"), softball_roster());
        let scraper = scraper(source);

        let by_town = scraper.search_player(Sport::Softball, "las vegas").await.unwrap();
        assert_eq!(by_town.len(), 1);
        assert_eq!(by_town[0].name, "Ana Cruz");

        let by_position = scraper.search_player(Sport::Softball, "inf").await.unwrap();
        assert_eq!(by_position[0].name, "Mia 5th");
    }

    #[tokio::test]
    async fn player_bio_returns_first_substring_match() {
        let source = MockPageSource::new().with_page(url("softball", "roster"), softball_roster());
        let scraper = scraper(source);

        let bio = scraper.get_player_bio(Sport::Softball, "ROE").await.unwrap();
        assert_eq!(bio.map(|p| p.name), Some("Kim Roe".to_string()));

        let missing = scraper.get_player_bio(Sport::Softball, "Nobody").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn news_waits_for_marker_and_honours_limit() {
        let source = MockPageSource::new().with_page(
            url("softball", "archives"),
            fixtures::archive_news(&[
                ("/news/2026/1/22/poll.aspx", "RMAC Releases Softball Preseason Poll"),
                ("/news/2025/8/13/signing-class.aspx", "Coach Announces Signing Class"),
                ("/news/2025/5/28/coach.aspx", "Kali Pugh Named Coach"),
            ]),
        );
        let calls = source.calls();
        let news = scraper(source).get_news(Sport::Softball, 2).await.unwrap();

        assert_eq!(news.len(), 2);
        assert_eq!(news[0].date, "1/22/2026");
        assert_eq!(news[0].link, format!("{BASE}/news/2026/1/22/poll.aspx"));

        let calls = calls.read().unwrap();
        assert!(matches!(calls[0].wait, WaitStrategy::DomMarker { .. }));
    }

    #[tokio::test]
    async fn schedule_pages_wait_for_network_idle() {
        let source = MockPageSource::new()
            .with_page(url("baseball", "schedule"), fixtures::classic_schedule(&[("Feb 1", "Adams State", "", "")]));
        let calls = source.calls();
        scraper(source).get_schedule(Sport::Baseball).await.unwrap();

        let calls = calls.read().unwrap();
        assert_eq!(calls[0].url, url("baseball", "schedule"));
        assert!(matches!(calls[0].wait, WaitStrategy::NetworkIdle { .. }));
    }

    #[tokio::test]
    async fn fetch_failures_propagate() {
        let source = MockPageSource::new().with_failure(url("wrestling", "roster"));
        let err = scraper(source).get_roster(Sport::Wrestling).await.unwrap_err();
        assert!(err.to_string().contains("wrestling"));
    }

    #[tokio::test]
    async fn upcoming_and_recent_games() {
        let source = MockPageSource::new().with_page(
            url("baseball", "schedule"),
            fixtures::classic_schedule(&[
                ("Feb 1", "Adams State", "W", "5-3"),
                ("Feb 2", "Adams State", "L", "1-2"),
                ("Feb 8", "CSU Pueblo", "", ""),
                ("Feb 9", "CSU Pueblo", "", ""),
            ]),
        );
        let scraper = scraper(source);

        let recent = scraper.get_recent_results(Sport::Baseball, 5).await.unwrap();
        assert_eq!(recent.iter().map(|g| g.date.as_str()).collect::<Vec<_>>(), vec!["Feb 2", "Feb 1"]);

        let upcoming = scraper.get_upcoming_games(Sport::Baseball, 1).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].date, "Feb 8");

        let by_date = scraper.get_games_by_date(Sport::Baseball, "feb 9").await.unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].opponent, "CSU Pueblo");
    }

    #[tokio::test]
    async fn probe_reports_detected_format() {
        let source = MockPageSource::new().with_page(url("softball", "roster"), softball_roster());
        let probe = scraper(source).probe(Sport::Softball, EntityKind::Roster).await.unwrap();
        assert_eq!(probe.format, Some(FormatTag::Classic));
        assert_eq!(probe.records, 4);
        assert!(probe.html_len > 0);
    }
}
