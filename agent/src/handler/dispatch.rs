use std::collections::HashMap;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use sofatracker_core::engine::TrackerHandle;
use sofatracker_core::errors::CoreError;
use sofatracker_core::provider::{Lineups, LiveMatch};
use sofatracker_core::stats::Metric;

use crate::protocol::errors;
use crate::protocol::messages::{JsonRpcErrorResponse, JsonRpcRequest, JsonRpcResponse};
use crate::protocol::methods::{
    Capabilities, HealthCheckResult, InitializeParams, InitializeResult, LineupsParams,
    LineupsResult, MatchesLiveResult, NotificationsListResult, PlayerIdParams, PlayerOpenParams,
    ToggleMetricParams, ToggleMetricResult, ToggleSaveResult, TrackedListResult, ViewResult,
};

/// The agent's protocol version.
const AGENT_PROTOCOL_VERSION: &str = "0.1.0";

/// Routes JSON-RPC requests to the tracker.
///
/// Matches and lineups returned to the client are cached so `player.open`
/// can refer to them by id.
pub struct Dispatcher {
    handle: TrackerHandle,
    initialized: bool,
    start_time: Instant,
    matches: HashMap<u64, LiveMatch>,
    lineups: HashMap<u64, Lineups>,
}

/// The result of dispatching a request: either a success or error response.
pub enum DispatchResult {
    Success(JsonRpcResponse),
    Error(JsonRpcErrorResponse),
}

impl DispatchResult {
    /// Serialize the result to a JSON `Value`.
    pub fn to_json(&self) -> Value {
        let value = match self {
            Self::Success(resp) => serde_json::to_value(resp),
            Self::Error(resp) => serde_json::to_value(resp),
        };
        value.unwrap_or(Value::Null)
    }

    fn ok<T: Serialize>(id: Value, result: T) -> Self {
        match serde_json::to_value(result) {
            Ok(result) => Self::Success(JsonRpcResponse::new(id, result)),
            Err(e) => Self::error(id, errors::INTERNAL_ERROR, format!("Serialization failed: {e}")),
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::Error(JsonRpcErrorResponse::new(id, code, message))
    }
}

fn parse_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, DispatchResult> {
    serde_json::from_value(request.params.clone()).map_err(|e| {
        DispatchResult::error(
            request.id.clone(),
            errors::INVALID_PARAMS,
            format!("Invalid {} params: {e}", request.method),
        )
    })
}

fn core_error(id: Value, err: CoreError) -> DispatchResult {
    match err {
        CoreError::NoActiveView => {
            DispatchResult::error(id, errors::NO_ACTIVE_VIEW, err.to_string())
        }
        CoreError::NotTracked(player_id) => DispatchResult::Error(
            JsonRpcErrorResponse::new(id, errors::NOT_TRACKED, err.to_string())
                .with_data(json!({"player_id": player_id})),
        ),
        other => DispatchResult::error(id, errors::INTERNAL_ERROR, other.to_string()),
    }
}

impl Dispatcher {
    pub fn new(handle: TrackerHandle) -> Self {
        Self {
            handle,
            initialized: false,
            start_time: Instant::now(),
            matches: HashMap::new(),
            lineups: HashMap::new(),
        }
    }

    /// Dispatch a parsed JSON-RPC request to the appropriate handler.
    pub async fn dispatch(&mut self, request: JsonRpcRequest) -> DispatchResult {
        let id = request.id.clone();
        let method = request.method.as_str();

        debug!("Dispatching method: {}", method);

        // The `initialize` method is always allowed
        if method == "initialize" {
            return self.handle_initialize(request).await;
        }

        // All other methods require initialization
        if !self.initialized {
            return DispatchResult::error(
                id,
                errors::NOT_INITIALIZED,
                "Agent not initialized, call 'initialize' first",
            );
        }

        let result = match method {
            "health.check" => Ok(self.handle_health_check(&request).await),
            "matches.live" => Ok(self.handle_matches_live(&request).await),
            "matches.lineups" => self.handle_matches_lineups(&request).await,
            "player.open" => self.handle_player_open(&request).await,
            "player.openSaved" => self.handle_player_open_saved(&request).await,
            "player.close" => Ok(self.handle_player_close(&request).await),
            "player.toggleSave" => Ok(self.handle_toggle_save(&request).await),
            "player.toggleMetric" => self.handle_toggle_metric(&request).await,
            "tracked.list" => Ok(self.handle_tracked_list(&request).await),
            "tracked.remove" => self.handle_tracked_remove(&request).await,
            "notifications.list" => Ok(self.handle_notifications_list(&request).await),
            _ => {
                warn!("Unknown method: {}", method);
                Err(DispatchResult::error(
                    id,
                    errors::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                ))
            }
        };
        result.unwrap_or_else(|err| err)
    }

    async fn handle_initialize(&mut self, request: JsonRpcRequest) -> DispatchResult {
        let params: InitializeParams = match parse_params(&request) {
            Ok(p) => p,
            Err(err) => return err,
        };
        let id = request.id;

        // Version negotiation: we only support major version 0
        let major = params
            .protocol_version
            .split('.')
            .next()
            .and_then(|s| s.parse::<u32>().ok());
        if major != Some(0) {
            return DispatchResult::error(
                id,
                errors::VERSION_NOT_SUPPORTED,
                format!(
                    "Unsupported protocol version: {} (agent supports 0.x)",
                    params.protocol_version
                ),
            );
        }

        self.initialized = true;
        info!(
            "Initialized by {} {}",
            params.client, params.client_version
        );

        let tracker = self.handle.lock().await;
        let config = tracker.config();
        DispatchResult::ok(
            id,
            InitializeResult {
                protocol_version: AGENT_PROTOCOL_VERSION.to_string(),
                agent_version: env!("CARGO_PKG_VERSION").to_string(),
                capabilities: Capabilities {
                    metrics: Metric::ALL.to_vec(),
                    live_interval_ms: config.live_interval_ms,
                    demo_interval_ms: config.demo_interval_ms,
                },
            },
        )
    }

    async fn handle_health_check(&self, request: &JsonRpcRequest) -> DispatchResult {
        let tracker = self.handle.lock().await;
        DispatchResult::ok(
            request.id.clone(),
            HealthCheckResult {
                status: "ok".to_string(),
                uptime_secs: self.start_time.elapsed().as_secs(),
                tracked_players: tracker.tracked().len(),
                monitoring: tracker.is_monitoring(),
                demo: tracker.is_demo(),
            },
        )
    }

    async fn handle_matches_live(&mut self, request: &JsonRpcRequest) -> DispatchResult {
        let matches = self.refresh_matches().await;
        let demo = self.handle.lock().await.is_demo();
        DispatchResult::ok(request.id.clone(), MatchesLiveResult { matches, demo })
    }

    async fn handle_matches_lineups(
        &mut self,
        request: &JsonRpcRequest,
    ) -> Result<DispatchResult, DispatchResult> {
        let params: LineupsParams = parse_params(request)?;
        let lineups = self.handle.load_lineups(params.match_id).await;
        self.lineups.insert(params.match_id, lineups.clone());
        let demo = self.handle.lock().await.is_demo();
        Ok(DispatchResult::ok(
            request.id.clone(),
            LineupsResult {
                match_id: params.match_id,
                lineups,
                demo,
            },
        ))
    }

    async fn handle_player_open(
        &mut self,
        request: &JsonRpcRequest,
    ) -> Result<DispatchResult, DispatchResult> {
        let params: PlayerOpenParams = parse_params(request)?;
        let id = request.id.clone();
        let not_found = |what: &str| {
            DispatchResult::Error(
                JsonRpcErrorResponse::new(
                    id.clone(),
                    errors::PLAYER_NOT_FOUND,
                    format!("{what} not found"),
                )
                .with_data(json!({"match_id": params.match_id, "player_id": params.player_id})),
            )
        };

        if !self.matches.contains_key(&params.match_id) {
            self.refresh_matches().await;
        }
        let game = self
            .matches
            .get(&params.match_id)
            .cloned()
            .ok_or_else(|| not_found("Match"))?;

        if !self.lineups.contains_key(&params.match_id) {
            let lineups = self.handle.load_lineups(params.match_id).await;
            self.lineups.insert(params.match_id, lineups);
        }
        let player = self
            .lineups
            .get(&params.match_id)
            .and_then(|l| l.find(params.player_id))
            .cloned()
            .ok_or_else(|| not_found("Player"))?;

        let mut tracker = self.handle.lock().await;
        let saved = tracker.tracked().iter().any(|e| e.entity_id() == player.id);
        let view = tracker.open_player(&player, &game);
        Ok(DispatchResult::ok(request.id.clone(), ViewResult::new(view, saved)))
    }

    async fn handle_player_open_saved(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<DispatchResult, DispatchResult> {
        let params: PlayerIdParams = parse_params(request)?;
        let mut tracker = self.handle.lock().await;
        let view = tracker
            .open_saved(params.player_id)
            .map_err(|e| core_error(request.id.clone(), e))?;
        Ok(DispatchResult::ok(request.id.clone(), ViewResult::new(view, true)))
    }

    async fn handle_player_close(&self, request: &JsonRpcRequest) -> DispatchResult {
        self.handle.lock().await.close_view();
        DispatchResult::ok(request.id.clone(), json!({}))
    }

    async fn handle_toggle_save(&self, request: &JsonRpcRequest) -> DispatchResult {
        let mut tracker = self.handle.lock().await;
        match tracker.toggle_save() {
            Ok(saved) => {
                let player_id = tracker.view().map(|v| v.entity_id()).unwrap_or_default();
                DispatchResult::ok(request.id.clone(), ToggleSaveResult { player_id, saved })
            }
            Err(e) => core_error(request.id.clone(), e),
        }
    }

    async fn handle_toggle_metric(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<DispatchResult, DispatchResult> {
        let params: ToggleMetricParams = parse_params(request)?;
        let metric = params.metric.parse::<Metric>().map_err(|e| {
            DispatchResult::Error(
                JsonRpcErrorResponse::new(
                    request.id.clone(),
                    errors::INVALID_METRIC,
                    e.to_string(),
                )
                .with_data(json!({"metrics": Metric::ALL})),
            )
        })?;

        let mut tracker = self.handle.lock().await;
        let enabled = tracker
            .toggle_metric(metric)
            .map_err(|e| core_error(request.id.clone(), e))?;
        let player_id = tracker.view().map(|v| v.entity_id()).unwrap_or_default();
        Ok(DispatchResult::ok(
            request.id.clone(),
            ToggleMetricResult {
                player_id,
                metric,
                enabled,
            },
        ))
    }

    async fn handle_tracked_list(&self, request: &JsonRpcRequest) -> DispatchResult {
        let tracker = self.handle.lock().await;
        DispatchResult::ok(
            request.id.clone(),
            TrackedListResult {
                players: tracker.tracked().to_vec(),
                monitoring: tracker.is_monitoring(),
            },
        )
    }

    async fn handle_tracked_remove(
        &self,
        request: &JsonRpcRequest,
    ) -> Result<DispatchResult, DispatchResult> {
        let params: PlayerIdParams = parse_params(request)?;
        if self.handle.lock().await.remove_saved(params.player_id) {
            Ok(DispatchResult::ok(request.id.clone(), json!({})))
        } else {
            Err(core_error(
                request.id.clone(),
                CoreError::NotTracked(params.player_id),
            ))
        }
    }

    async fn handle_notifications_list(&self, request: &JsonRpcRequest) -> DispatchResult {
        let notifications = self.handle.lock().await.notifications();
        DispatchResult::ok(
            request.id.clone(),
            NotificationsListResult { notifications },
        )
    }

    async fn refresh_matches(&mut self) -> Vec<LiveMatch> {
        let matches = self.handle.load_live_matches().await;
        self.matches = matches.iter().map(|m| (m.id, m.clone())).collect();
        matches
    }
}
