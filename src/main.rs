//! Entry point for **monswitch**.
//!
//! ```text
//! monswitch           show the layout menu
//! monswitch --reset   run the display reset sequence without a menu
//! monswitch --list    print the outputs and their modes
//! ```
//!
//! Errors are logged and shown in the error dialog, since the program
//! usually runs from a key binding with no terminal attached.

use monswitch::app::App;
use monswitch::config::Config;
use monswitch::reset::ResetOutcome;
use monswitch::system::process::ProcessRunner;
use monswitch::system::profiles::XdgProfiles;
use log::{error, info, warn};

/// Resolve the config directory (`$XDG_CONFIG_HOME/monswitch`).
fn config_dir() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("/tmp"))
        .join("monswitch")
}

/// Try to load the config from `$XDG_CONFIG_HOME/monswitch/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

/// What the command line asks for.
enum Mode {
    Menu,
    Reset,
    List,
}

fn parse_args() -> Mode {
    let mut mode = Mode::Menu;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--reset" => mode = Mode::Reset,
            "--list" => mode = Mode::List,
            other => warn!("ignoring unknown argument {}", other),
        }
    }
    mode
}

//  Main

fn main() {
    env_logger::init();

    let mode = parse_args();
    let config = load_config();
    let runner = ProcessRunner;
    let app = App::new(&runner, XdgProfiles::new(), &config);

    let result = match mode {
        Mode::Menu => app.run_menu(),
        Mode::List => app.list().map(|text| print!("{}", text)),
        Mode::Reset => app.reset().map(|outcome| match outcome {
            ResetOutcome::Completed { layout } => info!("reset complete, activated {}", layout),
            ResetOutcome::NoExternalOutputs { report } => warn!("{}", report),
        }),
    };

    if let Err(e) = result {
        error!("{}", e);
        app.report_error(&e.to_string());
        std::process::exit(1);
    }
}
