//! openwheeld - virtual FFB racing wheel daemon
//!
//! Turns a keyboard and a mouse into a Logitech-G29-class force-feedback
//! wheel: pointer motion steers, held keys drive pedals and buttons, and
//! the host game's FFB commands are rendered as a simulated wheel response.
//! Toggle emulation with Ctrl+M.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]

mod config;
mod detect;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use openwheel_engine::hid::UinputBackend;
use openwheel_engine::input::{open_keyboard, open_pointer, InputMapper, InputReader};
use openwheel_engine::WheelEngine;
use openwheel_errors::SetupError;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "openwheeld")]
#[command(about = "Virtual force-feedback racing wheel driven by keyboard and mouse")]
#[command(version)]
struct Cli {
    /// Debug verbosity
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit config file path (bypasses the search order)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Interactively pick input devices and save them to the config
    #[arg(long)]
    detect: bool,
}

/// Process-global shutdown flag; the SIGINT handler must be able to see it.
static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn handle_sigint(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

fn install_signal_handler() {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_sigint as extern "C" fn(libc::c_int) as usize;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut());
        libc::sigaction(libc::SIGTERM, &action, std::ptr::null_mut());
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("openwheeld={log_level},openwheel_engine={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&cli) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.detect {
        return detect::run(cli.config.as_deref());
    }

    check_privileges()?;
    install_signal_handler();

    let config = Config::load(cli.config.as_deref());

    let mut engine = WheelEngine::new(Box::new(UinputBackend::new()), config.ffb_gain);
    engine.start()?;

    let keyboard = match open_keyboard(config.keyboard.as_deref()) {
        Ok(found) => Some(found),
        Err(err) => {
            warn!(error = %err, "continuing without a keyboard");
            None
        }
    };
    let pointer = match open_pointer(config.mouse.as_deref()) {
        Ok(found) => Some(found),
        Err(err) => {
            warn!(error = %err, "continuing without a pointer");
            None
        }
    };
    let mut reader = InputReader::new(keyboard, pointer)?;
    let mapper = InputMapper::new(config.mapping.clone());

    info!("ready; press Ctrl+M to toggle wheel emulation");

    while RUNNING.load(Ordering::Relaxed) {
        if !wait_for_input(&reader) {
            continue;
        }

        let mouse_dx = reader.read();
        let toggle_pressed = reader.check_toggle();
        let frame = mapper.frame(&reader, mouse_dx, toggle_pressed);

        if frame.toggle_pressed {
            if engine.is_enabled() {
                engine.disable();
                if let Err(err) = reader.grab(false) {
                    warn!(error = %err, "device release failed");
                }
            } else {
                match reader.grab(true) {
                    Ok(()) => engine.enable(),
                    Err(err) => warn!(error = %err, "staying disabled: grab failed"),
                }
            }
            continue;
        }

        engine.process_frame(&frame, config.sensitivity);
    }

    info!("shutting down");
    engine.shutdown();
    if let Err(err) = reader.grab(false) {
        warn!(error = %err, "device release failed during shutdown");
    }
    info!("clean shutdown");
    Ok(())
}

fn check_privileges() -> Result<(), SetupError> {
    if unsafe { libc::geteuid() } != 0 {
        return Err(SetupError::InsufficientPrivileges);
    }
    Ok(())
}

/// Block until a device is readable or a signal arrives. Returns false when
/// the caller should re-check the running flag without reading.
fn wait_for_input(reader: &InputReader) -> bool {
    let fds = reader.poll_fds();
    let mut pollfds: Vec<libc::pollfd> = fds
        .iter()
        .map(|&fd| libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    let ret = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, -1) };
    if ret < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            warn!(error = %err, "input poll failed");
        }
        return false;
    }
    ret > 0
}
