use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Error};

use clap::Parser;

use gcmtool::gcm::Apploader;

#[derive(Parser)]
#[command(author, version, about = "Print the header of a GameCube apploader (appldr.bin)", long_about = None)]
#[command(color = clap::ColorChoice::Never)]
struct Cli {
    /// Apploader file
    apploader_file: PathBuf,
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    let file = File::open(&args.apploader_file).context("error opening apploader file")?;
    let apploader = Apploader::read(BufReader::new(file)).context("error reading apploader")?;

    log::debug!("apploader is {:#x} bytes", apploader.total_len());
    println!("{apploader}");

    Ok(())
}
