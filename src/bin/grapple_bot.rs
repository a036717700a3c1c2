//! Headless Grapple City client
//!
//! Connects to a relay, generates the city, and swings around it with a
//! scripted input loop at the fixed simulation rate. Useful for load and
//! smoke testing a relay without a browser.

use std::time::Instant;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grapple_city::config::BotConfig;
use grapple_city::game::{
    FixedTimestep, InputEvent, InputSource, Key, MovementTuning, Simulation,
};
use grapple_city::net::{SyncClient, WsTransport};
use grapple_city::render::{PuppetPresenter, TracingRenderer};
use grapple_city::util::time::{tick_duration, SIMULATION_TPS};
use grapple_city::world::CityGenerator;

/// Ticks in one pass of the input script
const SCRIPT_PERIOD: u64 = 240;

/// Walk, look up, swing, let go, turn; repeat
struct ScriptedInput {
    frame: u64,
}

impl InputSource for ScriptedInput {
    fn drain_events(&mut self, out: &mut Vec<InputEvent>) {
        match self.frame % SCRIPT_PERIOD {
            0 => {
                out.push(InputEvent::KeyDown(Key::Forward));
                out.push(InputEvent::MouseDelta { dx: 0.0, dy: -150.0 });
            }
            60 => out.push(InputEvent::KeyDown(Key::Grapple)),
            150 => {
                out.push(InputEvent::KeyUp(Key::Grapple));
                out.push(InputEvent::MouseDelta { dx: 400.0, dy: 150.0 });
            }
            200 => out.push(InputEvent::KeyUp(Key::Forward)),
            _ => {}
        }
        self.frame += 1;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(&config.log_level);

    let world = CityGenerator::new(config.city_seed).generate();
    info!(seed = config.city_seed, volumes = world.len(), "City generated");

    let mut sync = match WsTransport::connect(&config.relay_url).await {
        Ok(transport) => SyncClient::new(transport),
        Err(e) => {
            error!(url = %config.relay_url, error = %e, "Relay unavailable, running offline");
            SyncClient::offline()
        }
    };

    let mut sim = Simulation::new(world, MovementTuning::default());
    let mut clock = FixedTimestep::default();
    let mut script = ScriptedInput { frame: 0 };
    let mut presenter = PuppetPresenter::new();
    let mut renderer = TracingRenderer::default();
    let mut events = Vec::new();
    let mut greeted = false;

    let mut frames = tokio::time::interval(tick_duration());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut last_frame = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {}
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame);
        last_frame = now;

        for _ in 0..clock.advance(frame_time) {
            sync.drain();

            script.drain_events(&mut events);
            for event in events.drain(..) {
                sim.handle_event(event);
            }

            let step = sim.tick();
            if step.landed {
                info!(tick = sim.tick_count(), position = ?sim.player().position, "Landed");
            }
            sync.publish(sim.player());

            if !greeted && sync.local_id().is_some() {
                sync.send_chat("grapple_bot online");
                greeted = true;
            }

            if sim.tick_count() % u64::from(SIMULATION_TPS) == 0 {
                report(&sim, &sync);
            }
        }

        presenter.present(&sim, &sync, &mut renderer);

        if config.max_ticks.is_some_and(|max| sim.tick_count() >= max) {
            break;
        }
    }

    report(&sim, &sync);
    info!(
        ticks = sim.tick_count(),
        elapsed = ?sim.elapsed(),
        meshes = renderer.mesh_count(),
        "Bot finished"
    );
    Ok(())
}

fn report(sim: &Simulation, sync: &SyncClient<WsTransport>) {
    let player = sim.player();
    info!(
        tick = sim.tick_count(),
        position = ?player.position,
        speed = player.velocity.length(),
        grounded = player.grounded,
        grappling = player.is_grappling(),
        connected = sync.is_connected(),
        remote_players = sync.remote_count(),
        chat_lines = sync.chat_log().count(),
        "Status"
    );
}

fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
