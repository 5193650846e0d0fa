mod config;
mod control;
mod forms;
mod state;
mod web;

use anyhow::Result;
use std::{env, sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

use agribot_sim::{TelemetrySimulator, Ticker};
use control::{CommandTransport, LoggingTransport};
use state::DashboardState;
use web::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config file ─────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "agribot.toml".to_string());
    let cfg = config::load_or_default(&config_path)?;

    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(cfg.web.port);

    // ── Simulator + grid ────────────────────────────────────────────
    let profile = cfg.profile();
    let simulator = match cfg.sim.seed {
        Some(seed) => TelemetrySimulator::seeded(profile, seed),
        None => TelemetrySimulator::new(profile),
    };
    let grid = cfg.build_grid()?;

    info!(
        scenario = %cfg.scenario(),
        seed = ?cfg.sim.seed,
        max_distance_m = simulator.profile().geofence.max,
        "simulator ready"
    );

    // ── Shared state (ephemeral, lives as long as the hub) ─────────
    let shared = DashboardState::new(
        simulator,
        cfg.initial_reading(),
        grid,
        cfg.sim.tank_capacity_l,
    )
    .into_shared();
    {
        let mut st = shared.write().await;
        let (rows, cols) = (st.grid().rows(), st.grid().cols());
        st.record_system(format!(
            "hub started (scenario: {}, grid {rows}x{cols})",
            cfg.scenario()
        ));
    }

    // ── Telemetry ticker ────────────────────────────────────────────
    let tick_state = Arc::clone(&shared);
    let ticker = Ticker::spawn(Duration::from_millis(cfg.sim.tick_ms), move || {
        let st = Arc::clone(&tick_state);
        async move {
            let mut st = st.write().await;
            let r = st.advance();
            tracing::debug!(
                tick = st.reading().tick,
                water = format!("{:.1}", r.water_level_percent),
                battery = format!("{:.2}", r.battery_percent),
                distance = format!("{:.1}", r.geofence_distance),
                tank = %r.tank_status(),
                "telemetry tick"
            );
        }
    });
    info!(period_ms = ticker.period().as_millis() as u64, "telemetry ticker started");

    // ── Web server ──────────────────────────────────────────────────
    let transport: Arc<dyn CommandTransport> = Arc::new(LoggingTransport::new());
    let served = web::serve(AppState::new(Arc::clone(&shared), transport), port, shutdown_signal()).await;

    let ticks = ticker.cancel().await;
    info!(ticks, "ticker stopped, hub exiting");

    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
