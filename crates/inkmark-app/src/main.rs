//! Inkmark command line entry point.

fn main() {
    env_logger::init();

    if let Err(error) = inkmark_app::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
