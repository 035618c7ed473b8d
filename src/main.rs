mod app;
mod artwork;
mod audio;
mod carousel;
mod config;
mod library;
mod logging;
mod mpris;
mod runtime;
mod sync;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
