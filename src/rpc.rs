//! JSON-RPC tool surface: tool declarations, argument checks, dispatch into
//! the scraper/aggregator and error envelopes.

use athletics_scraper::Sport;
use logger::{now_iso, EventLogger, ToolCallEvent};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use team_aggregator::TeamAggregator;
use tracing::{info, warn};

pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, Copy)]
enum ParamKind {
    Sport,
    Text,
    Number { default: u64 },
}

struct Param {
    name: &'static str,
    description: &'static str,
    kind: ParamKind,
    required: bool,
}

pub struct ToolSpec {
    pub name: &'static str,
    description: &'static str,
    params: &'static [Param],
}

const SPORT: Param = Param { name: "sport", description: "Sport name", kind: ParamKind::Sport, required: true };

pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_roster",
        description: "Get the roster for a sport including player details (name, number, position, year, hometown, height, high school)",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_schedule",
        description: "Get the schedule for a sport including past and upcoming games",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_stats",
        description: "Get player statistics for a sport",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_news",
        description: "Get latest news articles for a sport",
        params: &[
            SPORT,
            Param { name: "limit", description: "Number of articles to return", kind: ParamKind::Number { default: 10 }, required: false },
        ],
    },
    ToolSpec {
        name: "search_player",
        description: "Search a roster by name, hometown or position, or by exact jersey number",
        params: &[
            SPORT,
            Param { name: "query", description: "Search term", kind: ParamKind::Text, required: true },
        ],
    },
    ToolSpec {
        name: "get_player_bio",
        description: "Get the roster entry of the first player whose name contains the given text",
        params: &[
            SPORT,
            Param { name: "name", description: "Player name or part of it", kind: ParamKind::Text, required: true },
        ],
    },
    ToolSpec {
        name: "get_games_by_date",
        description: "Get games whose date contains the given text (e.g. 'Feb 7')",
        params: &[
            SPORT,
            Param { name: "date", description: "Date text as shown on the schedule", kind: ParamKind::Text, required: true },
        ],
    },
    ToolSpec {
        name: "get_upcoming_games",
        description: "Get the next games that have not been played yet",
        params: &[
            SPORT,
            Param { name: "limit", description: "Number of games to return", kind: ParamKind::Number { default: 5 }, required: false },
        ],
    },
    ToolSpec {
        name: "get_recent_results",
        description: "Get the most recent completed games, newest first",
        params: &[
            SPORT,
            Param { name: "limit", description: "Number of games to return", kind: ParamKind::Number { default: 5 }, required: false },
        ],
    },
    ToolSpec {
        name: "get_team_dashboard",
        description: "Get roster, recent results, upcoming games, top stats and news for a sport in one call",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_sport_summary",
        description: "Get roster size, next game, last game and latest news for a sport",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_season_records",
        description: "Get wins, losses, ties and win percentage for a sport's season",
        params: &[SPORT],
    },
    ToolSpec {
        name: "get_all_sports_summary",
        description: "Get a summary for every major sport; sports that fail to load are reported individually",
        params: &[],
    },
    ToolSpec {
        name: "get_team_comparison",
        description: "Compare two teams' rosters, records and games",
        params: &[
            Param { name: "sport1", description: "First sport", kind: ParamKind::Sport, required: true },
            Param { name: "sport2", description: "Second sport", kind: ParamKind::Sport, required: true },
        ],
    },
    ToolSpec {
        name: "get_top_performers",
        description: "Rank players by a statistic (defaults to the first numeric column)",
        params: &[
            SPORT,
            Param { name: "stat", description: "Stat column name, e.g. AVG or PTS", kind: ParamKind::Text, required: false },
            Param { name: "limit", description: "Number of players to return", kind: ParamKind::Number { default: 5 }, required: false },
        ],
    },
    ToolSpec {
        name: "get_game_details",
        description: "Get every game against opponents whose name contains the given text",
        params: &[
            SPORT,
            Param { name: "opponent", description: "Opponent name or part of it", kind: ParamKind::Text, required: true },
        ],
    },
    ToolSpec {
        name: "get_player_stats_detail",
        description: "Get a player's roster entry together with their stat lines",
        params: &[
            SPORT,
            Param { name: "name", description: "Player name or part of it", kind: ParamKind::Text, required: true },
        ],
    },
];

pub fn tool_definitions() -> Vec<Value> {
    let sports: Vec<&str> = Sport::ALL.iter().map(|s| s.slug()).collect();

    TOOLS
        .iter()
        .map(|tool| {
            let mut properties = serde_json::Map::new();
            for p in tool.params {
                let schema = match p.kind {
                    ParamKind::Sport => json!({ "type": "string", "description": p.description, "enum": sports }),
                    ParamKind::Text => json!({ "type": "string", "description": p.description }),
                    ParamKind::Number { default } => {
                        json!({ "type": "number", "description": p.description, "default": default })
                    }
                };
                properties.insert(p.name.to_string(), schema);
            }
            let required: Vec<&str> = tool.params.iter().filter(|p| p.required).map(|p| p.name).collect();

            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": { "type": "object", "properties": properties, "required": required },
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<anyhow::Error> for RpcError {
    fn from(e: anyhow::Error) -> Self {
        RpcError::new(INTERNAL_ERROR, e.to_string())
    }
}

fn arg_sport(args: &Value, key: &str) -> Result<Sport, RpcError> {
    let raw = args
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::new(INVALID_PARAMS, format!("Missing required argument: {}", key)))?;
    raw.parse::<Sport>().map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))
}

fn arg_text<'a>(args: &'a Value, key: &str) -> Result<&'a str, RpcError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::new(INVALID_PARAMS, format!("Missing required argument: {}", key)))
}

fn arg_limit(args: &Value, default: usize) -> Result<usize, RpcError> {
    match args.get("limit") {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
            .map(|n| n as usize)
            .ok_or_else(|| RpcError::new(INVALID_PARAMS, "limit must be a non-negative integer")),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))
}

/// Runs one tool and returns its raw JSON result.
pub async fn call_tool(agg: &TeamAggregator, name: &str, args: &Value) -> Result<Value, RpcError> {
    let scraper = agg.scraper();

    match name {
        "get_roster" => to_json(scraper.get_roster(arg_sport(args, "sport")?).await?),
        "get_schedule" => to_json(scraper.get_schedule(arg_sport(args, "sport")?).await?),
        "get_stats" => to_json(scraper.get_stats(arg_sport(args, "sport")?).await?),
        "get_news" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.get_news(sport, arg_limit(args, 10)?).await?)
        }
        "search_player" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.search_player(sport, arg_text(args, "query")?).await?)
        }
        "get_player_bio" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.get_player_bio(sport, arg_text(args, "name")?).await?)
        }
        "get_games_by_date" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.get_games_by_date(sport, arg_text(args, "date")?).await?)
        }
        "get_upcoming_games" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.get_upcoming_games(sport, arg_limit(args, 5)?).await?)
        }
        "get_recent_results" => {
            let sport = arg_sport(args, "sport")?;
            to_json(scraper.get_recent_results(sport, arg_limit(args, 5)?).await?)
        }
        "get_team_dashboard" => to_json(agg.get_team_dashboard(arg_sport(args, "sport")?).await?),
        "get_sport_summary" => to_json(agg.get_sport_summary(arg_sport(args, "sport")?).await?),
        "get_season_records" => to_json(agg.get_season_records(arg_sport(args, "sport")?).await?),
        "get_all_sports_summary" => to_json(agg.get_all_sports_summary().await),
        "get_team_comparison" => {
            let first = arg_sport(args, "sport1")?;
            let second = arg_sport(args, "sport2")?;
            to_json(agg.get_team_comparison(first, second).await)
        }
        "get_top_performers" => {
            let sport = arg_sport(args, "sport")?;
            let stat = args.get("stat").and_then(Value::as_str);
            to_json(agg.get_top_performers(sport, stat, arg_limit(args, 5)?).await?)
        }
        "get_game_details" => {
            let sport = arg_sport(args, "sport")?;
            to_json(agg.get_game_details(sport, arg_text(args, "opponent")?).await?)
        }
        "get_player_stats_detail" => {
            let sport = arg_sport(args, "sport")?;
            to_json(agg.get_player_stats_detail(sport, arg_text(args, "name")?).await?)
        }
        _ => Err(RpcError::new(METHOD_NOT_FOUND, format!("Unknown tool: {}", name))),
    }
}

/// HTTP status that accompanies an error code.
pub fn http_status(code: i64) -> &'static str {
    match code {
        INTERNAL_ERROR => "HTTP/1.1 500 Internal Server Error",
        _ => "HTTP/1.1 400 Bad Request",
    }
}

/// Handles one JSON-RPC request body. Returns the envelope and, for errors,
/// the error code.
pub async fn handle_rpc(agg: &TeamAggregator, logger: &EventLogger, body: &Value) -> (Value, Option<i64>) {
    let id = body.get("id").cloned().unwrap_or(Value::Null);
    let method = body.get("method").and_then(Value::as_str).unwrap_or_default();
    let params = body.get("params").cloned().unwrap_or(Value::Null);

    let outcome = match method {
        "initialize" => Ok(json!({
            "protocolVersion": "0.1.0",
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "athletics-hub", "version": env!("CARGO_PKG_VERSION") },
        })),
        "tools/list" => Ok(json!({ "tools": tool_definitions() })),
        "tools/call" => call_logged(agg, logger, &params).await,
        other => Err(RpcError::new(METHOD_NOT_FOUND, format!("Unknown method: {}", other))),
    };

    match outcome {
        Ok(result) => (json!({ "jsonrpc": "2.0", "id": id, "result": result }), None),
        Err(e) => (
            json!({ "jsonrpc": "2.0", "id": id, "error": { "code": e.code, "message": e.message } }),
            Some(e.code),
        ),
    }
}

async fn call_logged(agg: &TeamAggregator, logger: &EventLogger, params: &Value) -> Result<Value, RpcError> {
    let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
    let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));
    let sport = args.get("sport").and_then(Value::as_str).map(str::to_string);

    info!(tool = name, ?sport, "tool call");
    let started = Instant::now();
    let outcome = call_tool(agg, name, &args).await;

    let (ok, message) = match &outcome {
        Ok(_) => (true, "ok".to_string()),
        Err(e) => {
            warn!(tool = name, code = e.code, "tool call failed: {}", e.message);
            (false, e.message.clone())
        }
    };
    let _ = logger.log(&ToolCallEvent {
        ts: now_iso(),
        event: "TOOL_CALL",
        tool: name.to_string(),
        sport,
        ok,
        duration_ms: started.elapsed().as_millis() as u64,
        message,
    });

    let data = outcome?;
    let text = serde_json::to_string_pretty(&data).map_err(|e| RpcError::new(INTERNAL_ERROR, e.to_string()))?;
    Ok(json!({ "content": [{ "type": "text", "text": text }] }))
}
