use mazestep::app::{App, AppConfig};

fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    // Logs go to a file so they never interleave with the maze on screen
    let _guard = App::init_logging(&config)?;
    let app = App::new(config);

    let mut stdout = std::io::stdout();
    App::setup_terminal(&mut stdout)?;
    let result = app.run(&mut stdout);
    App::restore_terminal(&mut stdout)?;

    if let Err(e) = &result {
        tracing::error!("[app] exiting with an error: {e}");
    }
    result
}
