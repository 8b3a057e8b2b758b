//! Entry point for the **wheeldesk** daemon.
//!
//! Parses the command line, connects to the X server, locates the windows to
//! track and runs the event loop until every tracked window is gone or the
//! process is asked to terminate.

use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wheeldesk::cli::{Args, Settings, StartupError, EXIT_USAGE};
use wheeldesk::config::{default_config_path, Config};
use wheeldesk::event_loop::{EventLoop, Shutdown};
use wheeldesk::grab::GrabManager;
use wheeldesk::locator::Locator;
use wheeldesk::registry::Registry;
use wheeldesk::traits::WindowSystem;
use wheeldesk::x11::wm::X11System;

/// Load the config named on the command line, which must exist, or the one
/// in `$XDG_CONFIG_HOME/wheeldesk/config.json`, falling back to compiled-in
/// defaults.
fn load_config(args: &Args) -> Result<Config, StartupError> {
    if let Some(path) = &args.config {
        let cfg = Config::load(path)?;
        info!("loaded config from {}", path.display());
        return Ok(cfg);
    }
    let path = default_config_path();
    match Config::load_optional(&path) {
        Ok(Some(cfg)) => {
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Ok(None) => {
            info!("no config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
        Err(e) => {
            warn!("ignoring {}", e);
            Ok(Config::default())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

//  Main

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    init_logging(args.verbose);

    match run_daemon(&args) {
        Ok(shutdown) => {
            info!("exiting ({:?})", shutdown);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Normal daemon mode.
fn run_daemon(args: &Args) -> Result<Shutdown, StartupError> {
    let settings = Settings::resolve(args, load_config(args)?);

    let terminate = Arc::new(AtomicBool::new(false));
    {
        let terminate = Arc::clone(&terminate);
        if let Err(e) = ctrlc::set_handler(move || terminate.store(true, Ordering::SeqCst)) {
            warn!("cannot install signal handler: {}", e);
        }
    }

    let ws = X11System::connect(args.display.as_deref())?;
    ws.atoms().require(&settings.bindings)?;

    let locator = Locator::new(settings.retries, settings.backoff);
    let windows = locator.locate_all(&ws, &settings.targets, settings.match_by)?;
    info!("tracking {} window(s)", windows.len());

    let registry = Registry::from_windows(windows, ws.root());
    let grabs = GrabManager::new(settings.extra_modifier, settings.grab_root);
    let mut event_loop = EventLoop::new(ws, registry, grabs, settings.bindings, terminate)
        .with_idle_interval(settings.idle_interval)
        .with_sync(settings.sync);
    event_loop.install_grabs();

    info!("wheeldesk running");
    Ok(event_loop.run()?)
}
