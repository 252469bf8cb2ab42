//! OHT-50 master module firmware daemon.
//!
//! Composes the scheduler, the 1 ms control loop, the safety monitor and the
//! system controller into a single process, in dependency order, and runs
//! until SIGINT/SIGTERM requests a graceful shutdown.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use oht50_common::config::OhtConfig;
use oht50_common::consts;
use oht50_common::{logging, now_us, Cli, ConfigLoader};
use oht50_control_loop::ControlLoop;
use oht50_controller::{ControllerEvent, ControllerInitConfig, SystemController};
use oht50_hal::{
    SimulatedEStopInput, SimulatedFieldBus, SimulatedLedController, SimulatedRelayController,
};
use oht50_safety::persist::load_or_factory_default;
use oht50_safety::{SafetyInitConfig, SafetyMonitor, SafetyMonitorHandles};
use oht50_scheduler::Scheduler;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn request_shutdown(_signum: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() {
    unsafe {
        let handler = nix::sys::signal::SigHandler::Handler(request_shutdown);
        let action = nix::sys::signal::SigAction::new(
            handler,
            nix::sys::signal::SaFlags::empty(),
            nix::sys::signal::SigSet::empty(),
        );
        let _ = nix::sys::signal::sigaction(nix::sys::signal::Signal::SIGINT, &action);
        let _ = nix::sys::signal::sigaction(nix::sys::signal::Signal::SIGTERM, &action);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match OhtConfig::load_from_path(&cli.config) {
        Ok(mut config) => {
            if let Some(level) = cli.log_level {
                config.logging.level = level;
            }
            config
        }
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::from(consts::EXIT_CONFIG_ERROR as u8);
        }
    };

    logging::init(&config.logging);
    tracing::info!("OHT-50 master module firmware starting...");

    install_signal_handlers();

    // HAL: simulated backends only. Real serial/LiDAR drivers are an
    // out-of-scope collaborator per SPEC_FULL §1/§6; `--simulate` exists to
    // make that explicit rather than to switch behaviour, since no other
    // backend is wired in yet.
    let _ = cli.simulate;
    let fieldbus: Arc<dyn oht50_hal::FieldBus> = Arc::new(SimulatedFieldBus::new());
    let estop_input = Arc::new(SimulatedEStopInput::new());
    let leds = Arc::new(SimulatedLedController::new());
    let relays = Arc::new(SimulatedRelayController::new());

    let scheduler = Arc::new(Scheduler::new(
        config.scheduler.task_table_capacity,
        config.scheduler.tick_period_us,
        cfg!(feature = "rt"),
    ));
    if let Err(err) = scheduler.start() {
        tracing::error!(%err, "scheduler failed to start");
        return ExitCode::from(consts::EXIT_SCHEDULER_INIT_FAILED as u8);
    }

    let control_loop = ControlLoop::new(
        config.control_loop.period_us,
        config.control_loop.deadline_us,
        config.control_loop.latency_samples,
    );

    let zone_config_path = cli
        .config
        .parent()
        .unwrap_or_else(|| std::path::Path::new("."))
        .join("zones.json");
    let zone_document = match std::fs::read_to_string(&zone_config_path) {
        Ok(json) => load_or_factory_default(&json, now_us()),
        Err(err) => {
            tracing::info!(
                path = %zone_config_path.display(),
                %err,
                "no persisted zone config found, using factory defaults"
            );
            oht50_safety::persist::ZoneConfigDocument::factory_default(now_us())
        }
    };

    let safety_init = SafetyInitConfig {
        section: config.safety.clone(),
        estop_input,
        leds,
        relays,
    };
    let (handles, _toml_zone_thresholds, watchdog_timeout_us) = safety_init.into_handles();
    let zone_thresholds = zone_document.thresholds();
    let safety = match SafetyMonitor::init(handles, zone_thresholds, watchdog_timeout_us) {
        Ok(safety) => safety,
        Err(err) => {
            tracing::error!(%err, "safety monitor failed to initialize");
            let _ = scheduler.stop();
            return ExitCode::from(consts::EXIT_SAFETY_INIT_FAILED as u8);
        }
    };

    let controller = SystemController::new(&ControllerInitConfig {
        section: config.system_controller.clone(),
        ..ControllerInitConfig::default()
    });
    if controller.process_event(ControllerEvent::InitComplete).is_err() {
        tracing::error!("system controller event queue rejected init-complete");
        let _ = scheduler.stop();
        return ExitCode::from(consts::EXIT_CONTROLLER_INIT_FAILED as u8);
    }

    {
        let control_loop = control_loop.clone();
        let safety = safety.clone();
        control_loop.set_safety_fn(Box::new(move || {
            safety.update(|_| false, |_| 0, || true);
        }));
    }

    if let Err(err) = control_loop.start(&scheduler) {
        tracing::error!(%err, "control loop failed to start");
        let _ = scheduler.stop();
        return ExitCode::from(consts::EXIT_SCHEDULER_INIT_FAILED as u8);
    }

    // System-controller update loop runs on its own OS thread (T2), distinct
    // from the dispatcher's thread (T1) that carries the critical-priority
    // control loop, per SPEC_FULL §5's Thread Map — a slow controller tick
    // must never delay dispatch of the hard-real-time control task.
    let controller_period_us = config.system_controller.update_period_us;
    let controller_thread = {
        let controller = controller.clone();
        let safety = safety.clone();
        let fieldbus = Arc::clone(&fieldbus);
        std::thread::Builder::new()
            .name("oht50-system-controller".into())
            .spawn(move || {
                while !SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
                    controller.update(safety.is_safe(), fieldbus.is_connected(), true);
                    std::thread::sleep(Duration::from_micros(controller_period_us));
                }
            })
    };
    let controller_thread = match controller_thread {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(%err, "failed to start system-controller thread");
            let _ = scheduler.stop();
            return ExitCode::from(consts::EXIT_CONTROLLER_INIT_FAILED as u8);
        }
    };

    tracing::info!("OHT-50 master module firmware running");

    while !SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }

    tracing::info!("shutdown signal received, stopping gracefully");

    control_loop.stop();
    let _ = scheduler.stop();
    if controller_thread.join().is_err() {
        tracing::warn!("system-controller thread panicked during shutdown");
    }

    if matches!(
        safety.state(),
        oht50_safety::SafetyState::EStop | oht50_safety::SafetyState::Critical
    ) {
        tracing::warn!("shutting down while safety monitor is not in a clean state");
    }

    tracing::info!("OHT-50 master module firmware shutdown complete");
    ExitCode::from(consts::EXIT_OK as u8)
}
