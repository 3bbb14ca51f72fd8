//! Single binary web server: REST API over in-memory sessions, static UI assets from /static.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env HOST / PORT, or a badminton.toml
//! (see BADMINTON_CONFIG). Set DATA_FILE to keep sessions across restarts.

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use badminton_court_manager::{
    match_summaries, player_costs, read_roster, suggest_match, win_rates, write_costs_csv,
    AppConfig, CourtId, CostRates, JsonFileStore, MatchId, MemoryStore, PairingError, PlayerId,
    PlayerStatus, Session, SessionError, SessionId, SessionStore,
};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-session entry: session data + last activity time (for auto-cleanup).
struct SessionEntry {
    session: Session,
    last_activity: Instant,
}

struct AppData {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    store: Box<dyn SessionStore>,
    config: AppConfig,
    /// Set by every successful mutation, cleared by the next flush.
    dirty: AtomicBool,
}

type AppState = Data<AppData>;

/// How often dirty sessions are written to the store.
const FLUSH_INTERVAL: Duration = Duration::from_secs(30);
/// How often inactive sessions are looked for.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateSessionBody {
    courts: Option<u32>,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    skill_level: u8,
}

#[derive(Deserialize)]
struct UpdatePlayerBody {
    name: Option<String>,
    skill_level: Option<u8>,
}

#[derive(Deserialize)]
struct PlayerStatusBody {
    status: PlayerStatus,
}

#[derive(Deserialize)]
struct AvoidListBody {
    player_ids: Vec<PlayerId>,
}

#[derive(Deserialize)]
struct CourtBody {
    name: String,
}

#[derive(Deserialize)]
struct CreateMatchBody {
    team_a: [PlayerId; 2],
    team_b: [PlayerId; 2],
}

#[derive(Deserialize)]
struct CompleteMatchBody {
    score_a: u32,
    score_b: u32,
}

#[derive(Deserialize)]
struct ShuttlecockBody {
    delta: i32,
}

#[derive(Deserialize)]
struct CostQuery {
    daily_fee: Option<f64>,
    shuttlecock_fee: Option<f64>,
}

#[derive(Deserialize)]
struct SummaryQuery {
    player_id: Option<PlayerId>,
}

/// Path segment: session id (e.g. /api/sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[derive(Deserialize)]
struct SessionPlayerPath {
    id: SessionId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct SessionCourtPath {
    id: SessionId,
    court_id: CourtId,
}

#[derive(Deserialize)]
struct SessionMatchPath {
    id: SessionId,
    match_id: MatchId,
}

fn error_json(msg: impl ToString) -> serde_json::Value {
    serde_json::json!({ "error": msg.to_string() })
}

fn session_error_response(e: &SessionError) -> HttpResponse {
    match e {
        SessionError::PlayerNotFound(_)
        | SessionError::CourtNotFound(_)
        | SessionError::MatchNotFound(_) => HttpResponse::NotFound().json(error_json(e)),
        _ => HttpResponse::BadRequest().json(error_json(e)),
    }
}

/// Look up a session (refreshing its activity time) and hand it to `f`.
fn with_session<F>(state: &AppState, id: SessionId, f: F) -> HttpResponse
where
    F: FnOnce(&mut Session) -> HttpResponse,
{
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(&mut entry.session)
        }
        None => HttpResponse::NotFound().json(error_json("No session")),
    }
}

/// Apply a state change and answer with the updated session.
fn mutate_session<F>(state: &AppState, id: SessionId, f: F) -> HttpResponse
where
    F: FnOnce(&mut Session) -> Result<(), SessionError>,
{
    with_session(state, id, |s| match f(s) {
        Ok(()) => {
            state.dirty.store(true, Ordering::Release);
            HttpResponse::Ok().json(&*s)
        }
        Err(e) => session_error_response(&e),
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "badminton-court-manager",
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// Create a new session (returns it with id; client stores id for subsequent requests).
#[post("/api/sessions")]
async fn api_create_session(state: AppState, body: Option<Json<CreateSessionBody>>) -> HttpResponse {
    let now = Utc::now();
    let session = match body.and_then(|b| b.courts) {
        Some(courts) => match Session::with_courts(courts, now) {
            Ok(session) => session,
            Err(e) => return session_error_response(&e),
        },
        None => Session::new(now),
    };
    let response = HttpResponse::Ok().json(&session);
    let mut g = match state.sessions.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    g.insert(
        session.id,
        SessionEntry {
            session,
            last_activity: Instant::now(),
        },
    );
    state.dirty.store(true, Ordering::Release);
    response
}

#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| HttpResponse::Ok().json(&*s))
}

#[post("/api/sessions/{id}/players")]
async fn api_add_player(state: AppState, path: Path<SessionPath>, body: Json<AddPlayerBody>) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.add_player(&body.name, body.skill_level, Utc::now()).map(|_| ())
    })
}

#[put("/api/sessions/{id}/players/{player_id}")]
async fn api_update_player(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<UpdatePlayerBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.update_player(path.player_id, body.name.as_deref(), body.skill_level)
    })
}

/// Remove a player (not while they are on court).
#[delete("/api/sessions/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<SessionPlayerPath>) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.remove_player(path.player_id))
}

/// Mark a player available or unavailable.
#[put("/api/sessions/{id}/players/{player_id}/status")]
async fn api_set_player_status(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<PlayerStatusBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.set_player_status(path.player_id, body.status, Utc::now())
    })
}

#[put("/api/sessions/{id}/players/{player_id}/avoid")]
async fn api_set_avoid_list(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<AvoidListBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.set_avoid_players(path.player_id, &body.player_ids))
}

/// Bulk add players from a `name,skill_level` CSV body.
#[post("/api/sessions/{id}/players/import")]
async fn api_import_players(state: AppState, path: Path<SessionPath>, body: String) -> HttpResponse {
    let rows = match read_roster(body.as_bytes()) {
        Ok(rows) => rows,
        Err(e) => return HttpResponse::BadRequest().json(error_json(e)),
    };
    with_session(&state, path.id, |s| {
        let summary = s.import_players(rows, Utc::now());
        if summary.added > 0 {
            state.dirty.store(true, Ordering::Release);
        }
        HttpResponse::Ok().json(summary)
    })
}

#[post("/api/sessions/{id}/courts")]
async fn api_add_court(state: AppState, path: Path<SessionPath>, body: Json<CourtBody>) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.add_court(&body.name).map(|_| ()))
}

#[put("/api/sessions/{id}/courts/{court_id}")]
async fn api_rename_court(
    state: AppState,
    path: Path<SessionCourtPath>,
    body: Json<CourtBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.rename_court(path.court_id, &body.name))
}

/// Remove a court (not while a match is on it).
#[delete("/api/sessions/{id}/courts/{court_id}")]
async fn api_remove_court(state: AppState, path: Path<SessionCourtPath>) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.remove_court(path.court_id))
}

/// Suggest balanced teams from the available players. Does not change the session.
#[post("/api/sessions/{id}/suggest")]
async fn api_suggest_match(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    let pairing = state.config.pairing.clone();
    with_session(&state, path.id, |s| match suggest_match(s, &pairing) {
        Ok(suggestion) => HttpResponse::Ok().json(suggestion),
        Err(e @ PairingError::InsufficientPlayers { .. }) => HttpResponse::BadRequest().json(error_json(e)),
        Err(e @ PairingError::NoMatchupFound) => HttpResponse::InternalServerError().json(error_json(e)),
    })
}

/// Put four players on a court (from a suggestion or assembled by hand).
#[post("/api/sessions/{id}/courts/{court_id}/match")]
async fn api_create_match(
    state: AppState,
    path: Path<SessionCourtPath>,
    body: Json<CreateMatchBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.create_match(path.court_id, body.team_a, body.team_b, Utc::now())
            .map(|_| ())
    })
}

#[post("/api/sessions/{id}/matches/{match_id}/start")]
async fn api_start_match(state: AppState, path: Path<SessionMatchPath>) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.start_match(path.match_id, Utc::now()))
}

#[post("/api/sessions/{id}/matches/{match_id}/complete")]
async fn api_complete_match(
    state: AppState,
    path: Path<SessionMatchPath>,
    body: Json<CompleteMatchBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.complete_match(path.match_id, body.score_a, body.score_b, Utc::now())
    })
}

#[post("/api/sessions/{id}/matches/{match_id}/cancel")]
async fn api_cancel_match(state: AppState, path: Path<SessionMatchPath>) -> HttpResponse {
    mutate_session(&state, path.id, |s| s.cancel_match(path.match_id, Utc::now()))
}

#[put("/api/sessions/{id}/matches/{match_id}/shuttlecocks")]
async fn api_adjust_shuttlecocks(
    state: AppState,
    path: Path<SessionMatchPath>,
    body: Json<ShuttlecockBody>,
) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.adjust_shuttlecocks(path.match_id, body.delta).map(|_| ())
    })
}

/// Drop completed matches and reset match counts.
#[post("/api/sessions/{id}/history/clear")]
async fn api_clear_history(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    mutate_session(&state, path.id, |s| {
        s.clear_history();
        Ok(())
    })
}

#[get("/api/sessions/{id}/reports/win-rate")]
async fn api_win_rate(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        HttpResponse::Ok().json(win_rates(&s.players, &s.matches))
    })
}

/// Configured fees with any query overrides. Invalid overrides answer 400.
fn cost_rates(defaults: &CostRates, query: &CostQuery) -> Result<CostRates, HttpResponse> {
    let rates = CostRates {
        daily_fee: query.daily_fee.unwrap_or(defaults.daily_fee),
        shuttlecock_fee: query.shuttlecock_fee.unwrap_or(defaults.shuttlecock_fee),
    };
    rates
        .validate()
        .map_err(|e| HttpResponse::BadRequest().json(error_json(e)))?;
    Ok(rates)
}

#[get("/api/sessions/{id}/reports/costs")]
async fn api_costs(state: AppState, path: Path<SessionPath>, query: Query<CostQuery>) -> HttpResponse {
    let rates = match cost_rates(&state.config.costs, &query) {
        Ok(rates) => rates,
        Err(response) => return response,
    };
    with_session(&state, path.id, |s| {
        HttpResponse::Ok().json(player_costs(&s.players, &s.matches, &rates))
    })
}

#[get("/api/sessions/{id}/reports/costs.csv")]
async fn api_costs_csv(state: AppState, path: Path<SessionPath>, query: Query<CostQuery>) -> HttpResponse {
    let rates = match cost_rates(&state.config.costs, &query) {
        Ok(rates) => rates,
        Err(response) => return response,
    };
    with_session(&state, path.id, |s| {
        let costs = player_costs(&s.players, &s.matches, &rates);
        let mut out = Vec::new();
        match write_costs_csv(&mut out, &costs) {
            Ok(()) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(out),
            Err(e) => HttpResponse::InternalServerError().json(error_json(e)),
        }
    })
}

/// Completed matches, optionally filtered to one player.
#[get("/api/sessions/{id}/reports/matches")]
async fn api_match_summary(
    state: AppState,
    path: Path<SessionPath>,
    query: Query<SummaryQuery>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        HttpResponse::Ok().json(match_summaries(&s.matches, query.player_id))
    })
}

/// Write all sessions to the store if anything changed since the last flush.
fn flush(state: &AppData) {
    if !state.dirty.swap(false, Ordering::AcqRel) {
        return;
    }
    let snapshot: Vec<Session> = match state.sessions.read() {
        Ok(g) => g.values().map(|e| e.session.clone()).collect(),
        Err(_) => return,
    };
    if let Err(e) = state.store.save(&snapshot) {
        log::error!("Failed to save sessions: {}", e);
        state.dirty.store(true, Ordering::Release);
    }
}

fn load_sessions(store: &dyn SessionStore) -> HashMap<SessionId, SessionEntry> {
    let now = Utc::now();
    let sessions = store.load().unwrap_or_else(|e| {
        log::error!("Failed to load saved sessions, starting empty: {}", e);
        Vec::new()
    });
    log::info!("Loaded {} saved session(s)", sessions.len());
    sessions
        .into_iter()
        .map(|mut session| {
            session.reconcile(now);
            (
                session.id,
                SessionEntry {
                    session,
                    last_activity: Instant::now(),
                },
            )
        })
        .collect()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::load().map_err(|e| {
        log::error!("{}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    let store: Box<dyn SessionStore> = match &config.data_file {
        Some(path) => {
            log::info!("Persisting sessions to {}", path.display());
            Box::new(JsonFileStore::new(path))
        }
        None => Box::new(MemoryStore::default()),
    };
    let bind = (config.host.clone(), config.port);
    let inactivity_timeout = Duration::from_secs(config.inactivity_timeout_hours * 3600);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(AppData {
        sessions: RwLock::new(load_sessions(store.as_ref())),
        store,
        config,
        dirty: AtomicBool::new(false),
    });

    // Background task: save changed sessions every 30 seconds
    let state_flush = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(FLUSH_INTERVAL);
        loop {
            interval.tick().await;
            flush(&state_flush);
        }
    });

    // Background task: every 30 minutes, remove sessions inactive past the timeout
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.sessions.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < inactivity_timeout);
            let removed = before - g.len();
            if removed > 0 {
                state_cleanup.dirty.store(true, Ordering::Release);
                log::info!("Cleaned up {} inactive session(s)", removed);
            }
        }
    });

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(server_state.clone())
            .service(api_health)
            .service(favicon)
            .service(api_create_session)
            .service(api_get_session)
            .service(api_import_players)
            .service(api_add_player)
            .service(api_update_player)
            .service(api_remove_player)
            .service(api_set_player_status)
            .service(api_set_avoid_list)
            .service(api_add_court)
            .service(api_rename_court)
            .service(api_remove_court)
            .service(api_suggest_match)
            .service(api_create_match)
            .service(api_start_match)
            .service(api_complete_match)
            .service(api_cancel_match)
            .service(api_adjust_shuttlecocks)
            .service(api_clear_history)
            .service(api_win_rate)
            .service(api_costs_csv)
            .service(api_costs)
            .service(api_match_summary)
            .service(Files::new("/", "static").index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await?;

    flush(&state);
    Ok(())
}
