//! Athletics site scraper: rosters, schedules, stats and news
//!
//! Pages come in two template families:
//!   Nextgen  `<div class="s-person-card">`, `<div class="s-game-card">`, ...
//!   Classic  `<li class="sidearm-roster-player">`, `<li class="sidearm-schedule-game">`, ...
//!
//! Flow per call: fetch (own browser session) → detect family → extract →
//! normalize into `Player` / `Game` / `Stat` / `NewsArticle`.

pub mod config;
pub mod detect;
mod dom;
pub mod extract;
pub mod facade;
pub mod fetcher;
pub mod labels;
pub mod model;
pub mod normalize;
pub mod testing;

pub use config::{FetchBackend, SiteConfig};
pub use detect::FormatTag;
pub use facade::{
    contains_ci, find_player, matches_search, parse_page, recent_results, upcoming_games,
    AthleticsScraper, PageProbe,
};
pub use fetcher::{ChromeFetcher, HttpFetcher, PageRequest, PageSource, WaitStrategy};
pub use model::{EntityKind, Game, GameState, NewsArticle, Player, Sport, Stat};
