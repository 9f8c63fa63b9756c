//! Athletics Hub - aggregated team views
//!
//! Fans several façade calls out concurrently and merges them into derived
//! views (dashboard, summaries, season record, comparisons).
//!
//! Failure handling differs by view:
//!   - dashboard / sport summary / player stats detail: any failing page fails the view
//!   - all-sports summary / team comparison: a failing sport becomes an error
//!     entry, the other sports are still reported

use anyhow::Result;
use athletics_scraper::{
    contains_ci, find_player, recent_results, upcoming_games, AthleticsScraper, Game, GameState,
    NewsArticle, Player, Sport, Stat,
};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

/// Sports covered by [`TeamAggregator::get_all_sports_summary`].
pub const SUMMARY_SPORTS: [Sport; 6] = [
    Sport::Football,
    Sport::MensBasketball,
    Sport::WomensBasketball,
    Sport::Baseball,
    Sport::Softball,
    Sport::WomensVolleyball,
];

const DASHBOARD_GAMES: usize = 5;
const DASHBOARD_NEWS: usize = 5;
const DASHBOARD_STATS: usize = 10;
const SUMMARY_NEWS: usize = 3;

/// Stat columns that count appearances or identify the row, never ranked by default.
const UNRANKED_COLUMNS: [&str; 6] = ["#", "no", "no.", "gp", "gs", "gp-gs"];

// ── views ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDashboard {
    pub sport: Sport,
    pub roster_size: usize,
    pub roster: Vec<Player>,
    pub recent_games: Vec<Game>,
    pub upcoming_games: Vec<Game>,
    pub stats: Vec<Stat>,
    pub news: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SportSummary {
    pub sport: Sport,
    pub roster_size: usize,
    pub next_game: Option<Game>,
    pub last_game: Option<Game>,
    pub latest_news: Vec<NewsArticle>,
}

/// One sport's slot in a multi-sport view.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SportEntry<T> {
    Ok(T),
    Failed { sport: Sport, error: String },
}

impl<T> SportEntry<T> {
    fn from_result(sport: Sport, result: Result<T>) -> Self {
        match result {
            Ok(value) => SportEntry::Ok(value),
            Err(e) => {
                warn!(%sport, "sport excluded from aggregate: {:#}", e);
                SportEntry::Failed { sport, error: e.to_string() }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, SportEntry::Ok(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub sport: Sport,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub total_games: u32,
    pub win_percentage: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSnapshot {
    pub sport: Sport,
    pub roster_size: usize,
    pub record: SeasonRecord,
    pub next_game: Option<Game>,
    pub last_game: Option<Game>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamComparison {
    pub teams: Vec<SportEntry<TeamSnapshot>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Performer {
    pub rank: usize,
    pub value: String,
    #[serde(flatten)]
    pub row: Stat,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopPerformers {
    pub sport: Sport,
    /// Column the ranking used; `None` when the page had no rankable column.
    pub stat: Option<String>,
    pub performers: Vec<Performer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: Game,
    pub status: GameState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatsDetail {
    pub sport: Sport,
    pub player: Option<Player>,
    pub stats: Vec<Stat>,
}

// ── pure derivations ─────────────────────────────────────────────────────────

const WIN_TOKENS: [&str; 2] = ["w", "win"];
const LOSS_TOKENS: [&str; 2] = ["l", "loss"];
const TIE_TOKENS: [&str; 2] = ["t", "tie"];

fn has_token(result: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| result.contains(t))
}

/// W/L/T tallies from the free-text `result` of completed games.
///
/// Buckets are checked independently, so one result string can count in more
/// than one of them ("Lost" hits both L and T).
pub fn season_record(sport: Sport, games: &[Game]) -> SeasonRecord {
    let mut record = SeasonRecord {
        sport,
        wins: 0,
        losses: 0,
        ties: 0,
        total_games: 0,
        win_percentage: String::new(),
    };

    for game in games.iter().filter(|g| g.is_completed()) {
        record.total_games += 1;
        let result = game.result.to_lowercase();
        if has_token(&result, &WIN_TOKENS) {
            record.wins += 1;
        }
        if has_token(&result, &LOSS_TOKENS) {
            record.losses += 1;
        }
        if has_token(&result, &TIE_TOKENS) {
            record.ties += 1;
        }
    }

    let decided = record.wins + record.losses;
    record.win_percentage = if decided == 0 {
        "0".to_string()
    } else {
        format!("{:.1}", f64::from(record.wins) / f64::from(decided) * 100.0)
    };

    record
}

fn last_completed(games: &[Game]) -> Option<Game> {
    recent_results(games, 1).into_iter().next()
}

fn next_upcoming(games: &[Game]) -> Option<Game> {
    upcoming_games(games, 1).into_iter().next()
}

fn parse_stat_value(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn ranking_column(stats: &[Stat], requested: Option<&str>) -> Result<Option<String>> {
    if let Some(wanted) = requested.map(str::trim).filter(|w| !w.is_empty()) {
        let found = stats
            .iter()
            .flat_map(|s| s.stats.keys())
            .find(|k| k.eq_ignore_ascii_case(wanted))
            .cloned();
        return match found {
            Some(column) => Ok(Some(column)),
            None if stats.is_empty() => Ok(None),
            None => Err(anyhow::anyhow!("Stat column '{}' not found", wanted)),
        };
    }

    let Some(first) = stats.first() else {
        return Ok(None);
    };

    let column = first
        .stats
        .keys()
        .filter(|c| !UNRANKED_COLUMNS.contains(&c.trim().to_lowercase().as_str()))
        .find(|c| {
            stats
                .iter()
                .any(|s| s.stats.get(c.as_str()).and_then(|v| parse_stat_value(v)).is_some())
        })
        .cloned();

    Ok(column)
}

/// Orders rows by `requested` (or the first numeric column), highest first.
/// Rows without a numeric value in that column sort last.
pub fn rank_performers(
    sport: Sport,
    stats: Vec<Stat>,
    requested: Option<&str>,
    limit: usize,
) -> Result<TopPerformers> {
    let Some(column) = ranking_column(&stats, requested)? else {
        return Ok(TopPerformers { sport, stat: None, performers: Vec::new() });
    };

    let mut scored: Vec<(Option<f64>, Stat)> = stats
        .into_iter()
        .map(|row| (row.stats.get(column.as_str()).and_then(|v| parse_stat_value(v)), row))
        .collect();

    scored.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(x).unwrap_or(std::cmp::Ordering::Equal),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let performers = scored
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (_, row))| Performer {
            rank: i + 1,
            value: row.stats.get(column.as_str()).cloned().unwrap_or_default(),
            row,
        })
        .collect();

    Ok(TopPerformers { sport, stat: Some(column), performers })
}

/// Stats tables often list players as "Last, First".
pub fn stat_name_matches(stat_player: &str, query: &str) -> bool {
    let query = query.trim();
    if contains_ci(stat_player, query) {
        return true;
    }
    stat_player
        .split_once(',')
        .map(|(last, first)| format!("{} {}", first.trim(), last.trim()))
        .is_some_and(|flipped| contains_ci(&flipped, query))
}

// ── aggregator ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TeamAggregator {
    scraper: AthleticsScraper,
}

impl TeamAggregator {
    pub fn new(scraper: AthleticsScraper) -> Self {
        Self { scraper }
    }

    pub fn scraper(&self) -> &AthleticsScraper {
        &self.scraper
    }

    pub async fn get_team_dashboard(&self, sport: Sport) -> Result<TeamDashboard> {
        let (roster, schedule, stats, news) = tokio::join!(
            self.scraper.get_roster(sport),
            self.scraper.get_schedule(sport),
            self.scraper.get_stats(sport),
            self.scraper.get_news(sport, DASHBOARD_NEWS),
        );
        let (roster, schedule, mut stats, news) = (roster?, schedule?, stats?, news?);
        stats.truncate(DASHBOARD_STATS);

        Ok(TeamDashboard {
            sport,
            roster_size: roster.len(),
            roster,
            recent_games: recent_results(&schedule, DASHBOARD_GAMES),
            upcoming_games: upcoming_games(&schedule, DASHBOARD_GAMES),
            stats,
            news,
        })
    }

    pub async fn get_sport_summary(&self, sport: Sport) -> Result<SportSummary> {
        let (roster, news, schedule) = tokio::join!(
            self.scraper.get_roster(sport),
            self.scraper.get_news(sport, SUMMARY_NEWS),
            self.scraper.get_schedule(sport),
        );
        let (roster, news, schedule) = (roster?, news?, schedule?);

        Ok(SportSummary {
            sport,
            roster_size: roster.len(),
            next_game: next_upcoming(&schedule),
            last_game: last_completed(&schedule),
            latest_news: news,
        })
    }

    pub async fn get_season_records(&self, sport: Sport) -> Result<SeasonRecord> {
        let schedule = self.scraper.get_schedule(sport).await?;
        Ok(season_record(sport, &schedule))
    }

    /// Summaries for `sports`, one entry per sport in input order. A sport
    /// whose pages fail is reported as an error entry.
    pub async fn summarize_sports(&self, sports: &[Sport]) -> Vec<SportEntry<SportSummary>> {
        let entries = join_all(sports.iter().map(|&sport| async move {
            SportEntry::from_result(sport, self.get_sport_summary(sport).await)
        }))
        .await;

        let healthy = entries.iter().filter(|e| e.is_ok()).count();
        info!("All-sports summary completed (healthy: {}/{}).", healthy, entries.len());
        entries
    }

    pub async fn get_all_sports_summary(&self) -> Vec<SportEntry<SportSummary>> {
        self.summarize_sports(&SUMMARY_SPORTS).await
    }

    async fn team_snapshot(&self, sport: Sport) -> Result<TeamSnapshot> {
        let (roster, schedule) = tokio::join!(
            self.scraper.get_roster(sport),
            self.scraper.get_schedule(sport),
        );
        let (roster, schedule) = (roster?, schedule?);

        Ok(TeamSnapshot {
            sport,
            roster_size: roster.len(),
            record: season_record(sport, &schedule),
            next_game: next_upcoming(&schedule),
            last_game: last_completed(&schedule),
        })
    }

    pub async fn get_team_comparison(&self, first: Sport, second: Sport) -> TeamComparison {
        let (a, b) = tokio::join!(self.team_snapshot(first), self.team_snapshot(second));
        TeamComparison {
            teams: vec![SportEntry::from_result(first, a), SportEntry::from_result(second, b)],
        }
    }

    pub async fn get_top_performers(
        &self,
        sport: Sport,
        stat: Option<&str>,
        limit: usize,
    ) -> Result<TopPerformers> {
        let stats = self.scraper.get_stats(sport).await?;
        rank_performers(sport, stats, stat, limit)
    }

    pub async fn get_game_details(&self, sport: Sport, opponent: &str) -> Result<Vec<GameDetail>> {
        let schedule = self.scraper.get_schedule(sport).await?;
        let opponent = opponent.trim();

        Ok(schedule
            .into_iter()
            .filter(|g| contains_ci(&g.opponent, opponent))
            .map(|game| GameDetail { status: game.state(), game })
            .collect())
    }

    pub async fn get_player_stats_detail(
        &self,
        sport: Sport,
        name: &str,
    ) -> Result<Option<PlayerStatsDetail>> {
        let (roster, stats) = tokio::join!(
            self.scraper.get_roster(sport),
            self.scraper.get_stats(sport),
        );
        let (roster, stats) = (roster?, stats?);

        let player = find_player(&roster, name).cloned();
        let stats: Vec<Stat> = stats
            .into_iter()
            .filter(|s| stat_name_matches(&s.player, name))
            .collect();

        if player.is_none() && stats.is_empty() {
            return Ok(None);
        }
        Ok(Some(PlayerStatsDetail { sport, player, stats }))
    }
}
