use mazestep::{
    app::{App, AppConfig},
    generators::Generator,
    solvers::Solver,
};

fn main() -> std::io::Result<()> {
    let config = AppConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let _guard = App::init_logging(&config)?;
    let app = App::new(config);

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_iters = args.next().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);
    let size = u8::MAX as usize;
    app.profile(size, size, Generator::Prim, Solver::AStar, num_iters)?;
    Ok(())
}
