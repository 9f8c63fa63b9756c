//! Canonical entities returned by every query, independent of the template
//! family the page was rendered with.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sports published on the athletics site. The slug is the URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sport {
    Football,
    Baseball,
    Softball,
    MensBasketball,
    WomensBasketball,
    MensCrossCountry,
    WomensCrossCountry,
    WomensSoccer,
    WomensVolleyball,
    WomensTrackAndField,
    Wrestling,
}

impl Sport {
    pub const ALL: [Sport; 11] = [
        Sport::Football,
        Sport::Baseball,
        Sport::Softball,
        Sport::MensBasketball,
        Sport::WomensBasketball,
        Sport::MensCrossCountry,
        Sport::WomensCrossCountry,
        Sport::WomensSoccer,
        Sport::WomensVolleyball,
        Sport::WomensTrackAndField,
        Sport::Wrestling,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Baseball => "baseball",
            Sport::Softball => "softball",
            Sport::MensBasketball => "mens-basketball",
            Sport::WomensBasketball => "womens-basketball",
            Sport::MensCrossCountry => "mens-cross-country",
            Sport::WomensCrossCountry => "womens-cross-country",
            Sport::WomensSoccer => "womens-soccer",
            Sport::WomensVolleyball => "womens-volleyball",
            Sport::WomensTrackAndField => "womens-track-and-field",
            Sport::Wrestling => "wrestling",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Sport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Sport::ALL
            .into_iter()
            .find(|sport| sport.slug() == wanted)
            .ok_or_else(|| anyhow::anyhow!("Unknown sport: {}", s))
    }
}

/// Page kinds the site publishes per sport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Roster,
    Schedule,
    Stats,
    News,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Roster,
        EntityKind::Schedule,
        EntityKind::Stats,
        EntityKind::News,
    ];

    /// Last path segment under `/sports/{sport}/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            EntityKind::Roster => "roster",
            EntityKind::Schedule => "schedule",
            EntityKind::Stats => "stats",
            EntityKind::News => "archives",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Roster => "roster",
            EntityKind::Schedule => "schedule",
            EntityKind::Stats => "stats",
            EntityKind::News => "news",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Roster entry. Every field is a string; absent fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub jersey_number: String,
    pub position: String,
    pub year: String,
    pub hometown: String,
    pub height: String,
    pub high_school: String,
    pub bio_link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Completed,
    Upcoming,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub date: String,
    pub opponent: String,
    pub location: String,
    pub result: String,
    pub score: String,
}

impl Game {
    /// Completed once either a result or a score has been posted.
    pub fn state(&self) -> GameState {
        if self.result.is_empty() && self.score.is_empty() {
            GameState::Upcoming
        } else {
            GameState::Completed
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state() == GameState::Completed
    }

    pub fn is_upcoming(&self) -> bool {
        self.state() == GameState::Upcoming
    }
}

/// One stats row. Column order follows the source table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub player: String,
    pub stats: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub date: String,
    pub summary: String,
    pub link: String,
}
