use std::path::PathBuf;
use std::time::Instant;

use narrate_rs::{Config, Document, Pipeline};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: narrate <file> [language]");
        std::process::exit(2);
    };
    let language = args.next().unwrap_or_else(|| "English".to_string());

    let pipeline = Pipeline::from_config(Config::from_env()?)?;
    println!(
        "Backends: {:?}",
        pipeline.synthesizer().capabilities().backends()
    );

    let bytes = std::fs::read(&path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let start = Instant::now();
    let response = pipeline.respond(&Document::new(&bytes, &filename), &language);
    println!("Status {} in {:.2?}", response.status_code(), start.elapsed());
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
