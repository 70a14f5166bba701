//! Local Control Socket
//!
//! A Unix domain socket carrying a newline-delimited command protocol. This
//! is the local abort path and maintenance interface: every command maps
//! onto the engine's inbox or a read-only snapshot, and every line gets an
//! `ok`/`error:` style reply. Network façades are built on top of this, not
//! inside the controller.

use std::path::Path;
use std::sync::atomic::Ordering;

use anyhow::Result;
use kiln_core::command::Command;
use kiln_core::cone::{self, ConeSpeed};
use kiln_core::events;
use kiln_store::DirStore;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info};

use crate::tasks::Controller;

/// Handles an individual client connection to the socket.
async fn handle_client(mut stream: UnixStream, controller: Controller, store: DirStore) {
    info!("client connected to control socket");
    let (reader, mut writer) = stream.split();
    let mut reader = BufReader::new(reader);
    let mut line_buf = String::new();

    loop {
        match reader.read_line(&mut line_buf).await {
            Ok(0) => {
                info!("client disconnected from control socket");
                break;
            }
            Ok(_) => {
                let line = line_buf.trim();
                if !line.is_empty() {
                    let reply = dispatch(line, &controller, &store);
                    if let Err(err) = writer.write_all(reply.as_bytes()).await {
                        error!(%err, "failed to write reply to control socket");
                        break;
                    }
                    if let Err(err) = writer.write_all(b"\n").await {
                        error!(%err, "failed to write reply to control socket");
                        break;
                    }
                }
                line_buf.clear();
            }
            Err(err) => {
                error!(%err, "failed to read from control socket");
                break;
            }
        }
    }
}

/// Executes one command line and renders the reply.
fn dispatch(line: &str, controller: &Controller, store: &DirStore) -> String {
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    let send = |command: Command| match controller.inbox.send(command) {
        Ok(()) => "ok".to_string(),
        Err(err) => format!("error: {err}"),
    };

    match verb.as_str() {
        "start" => {
            let Some(id) = args.first() else {
                return "error: usage: start <profile_id> [delay_minutes]".to_string();
            };
            let delay_minutes = args
                .get(1)
                .and_then(|value| value.parse::<u32>().ok())
                .unwrap_or(0);
            match store.load_profile(id) {
                Ok(profile) => send(Command::Start {
                    profile,
                    delay_minutes,
                }),
                Err(err) => format!("error: {err}"),
            }
        }
        "stop" => send(Command::Stop),
        "pause" => send(Command::Pause),
        "resume" => send(Command::Resume),
        "skip" => send(Command::SkipSegment),
        "tune" => {
            let setpoint: Option<f32> = args.first().and_then(|v| v.parse().ok());
            let hysteresis: Option<f32> = args.get(1).and_then(|v| v.parse().ok());
            let (Some(setpoint_c), Some(hysteresis_c)) = (setpoint, hysteresis) else {
                return "error: usage: tune <setpoint_c> <hysteresis_c>".to_string();
            };
            // Caller-side guard; the engine enforces the same limit.
            if setpoint_c > controller.settings.lock().max_safe_temp_c() {
                return format!("error: setpoint {setpoint_c} exceeds the safe temperature limit");
            }
            send(Command::AutotuneStart {
                setpoint_c,
                hysteresis_c,
            })
        }
        "tune-stop" => send(Command::AutotuneStop),
        "clear" => {
            controller.clear_requested.store(true, Ordering::SeqCst);
            "ok".to_string()
        }
        "status" => {
            let progress = controller.progress.get();
            let reading = controller.reading.get();
            json!({
                "progress": progress,
                "temperature_c": reading.temperature_c,
                "cold_junction_c": reading.cold_junction_c,
                "faults": reading.faults,
                "error": format!("{:?}", controller.error.get()),
                "emergency": controller.events.is_set(events::EMERGENCY_STOP),
                "element_on_seconds": controller.element_seconds.get(),
            })
            .to_string()
        }
        "settings" => {
            let settings = controller.settings.lock().clone();
            serde_json::to_string(&settings).unwrap_or_else(|err| format!("error: {err}"))
        }
        "set" => {
            let (Some(key), Some(value)) = (args.first(), args.get(1)) else {
                return "error: usage: set <key> <value>".to_string();
            };
            let mut settings = controller.settings.lock().clone();
            let applied = match (*key, value.parse::<f32>()) {
                ("max_safe_temp", Ok(v)) => {
                    settings.set_max_safe_temp_c(v);
                    true
                }
                ("tc_offset", Ok(v)) => {
                    settings.tc_offset_c = v;
                    true
                }
                ("element_watts", Ok(v)) => {
                    settings.element_watts = v as i32;
                    true
                }
                ("energy_cost", Ok(v)) => {
                    settings.electricity_cost_per_kwh = v;
                    true
                }
                ("unit", _) => {
                    settings.unit = kiln_core::settings::TempUnit::from_ascii(
                        value.bytes().next().unwrap_or(b'C').to_ascii_uppercase(),
                    );
                    true
                }
                _ => false,
            };
            if !applied {
                return "error: unknown or malformed setting".to_string();
            }
            *controller.settings.lock() = settings.clone();
            let mut store = store.clone();
            match store.save_settings(&settings) {
                Ok(()) => "ok".to_string(),
                Err(err) => format!("error: {err}"),
            }
        }
        "profiles" => match store.list_profiles() {
            Ok(ids) => json!(ids).to_string(),
            Err(err) => format!("error: {err}"),
        },
        "history" => match store.history() {
            Ok(records) => serde_json::to_string(&records)
                .unwrap_or_else(|err| format!("error: {err}")),
            Err(err) => format!("error: {err}"),
        },
        "cone" => {
            // cone <number> <slow|medium|fast> [preheat] [slow_cool]
            let Some(number) = args.first() else {
                return "error: usage: cone <number> <speed> [preheat] [slow_cool]".to_string();
            };
            let speed = match args.get(1).copied().unwrap_or("medium") {
                "slow" => ConeSpeed::Slow,
                "fast" => ConeSpeed::Fast,
                _ => ConeSpeed::Medium,
            };
            let preheat = args.contains(&"preheat");
            let slow_cool = args.contains(&"slow_cool");
            match cone::generate(number, speed, preheat, slow_cool) {
                Ok(profile) => {
                    let mut store = store.clone();
                    match store.save_profile(&profile) {
                        Ok(()) => format!("ok {}", profile.id),
                        Err(err) => format!("error: {err}"),
                    }
                }
                Err(err) => format!("error: {err}"),
            }
        }
        _ => "error: unknown command".to_string(),
    }
}

/// Starts the Unix domain socket listener.
pub async fn start_control_socket(
    path: &str,
    controller: Controller,
    store: DirStore,
) -> Result<()> {
    // Clean up any old socket file that might exist.
    if Path::new(path).exists() {
        let _ = std::fs::remove_file(path);
        info!("removed existing socket file at {}", path);
    }

    let listener = UnixListener::bind(path)
        .map_err(|err| anyhow::anyhow!("failed to bind to socket {path}: {err}"))?;
    info!("control socket listening on {}", path);

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                tokio::spawn(handle_client(stream, controller.clone(), store.clone()));
            }
            Err(err) => {
                error!(%err, "failed to accept client connection on control socket");
            }
        }
    }
}
