use std::fs;
use std::io::{self, IsTerminal};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hbnb::config::Settings;
use hbnb::console::{Console, Flow};
use hbnb::persist::PersistenceMode;
use hbnb::storage::Storage;

fn main() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    // command output owns stdout, so the log goes to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mode = settings.persistence_mode();
    if let PersistenceMode::File(path) = &mode {
        info!(path = %path.display(), "using file storage");
    }
    let mut storage = Storage::new(mode);
    if let Err(e) = storage.reload() {
        error!(error = %e, "could not reload the store, starting empty");
        println!("** {e} **");
    }
    let mut console = Console::new(storage);

    if let Some(script) = &settings.startup_script {
        run_startup_script(&mut console, script);
    }

    let stdin = io::stdin();
    let prompt = stdin.is_terminal().then_some(settings.prompt.as_str());
    let mut stdout = io::stdout();
    if let Err(e) = console.run(stdin.lock(), &mut stdout, prompt) {
        error!(error = %e, "console stopped");
    }
}

fn run_startup_script(console: &mut Console, script: &str) {
    let content = match fs::read_to_string(script) {
        Ok(content) => content,
        Err(e) => {
            warn!(%script, error = %e, "startup script not readable");
            return;
        }
    };
    info!(%script, "running startup script");
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        match console.execute(line) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => (),
            Err(e) => {
                error!(%line, error = %e, "startup script line failed");
                println!("** {e} **");
            }
        }
    }
}
