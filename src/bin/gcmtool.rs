use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Error};

use clap::{Parser, Subcommand};

use gcmtool::fst::{Entry, TreeBuilder, DEFAULT_FILE_ALIGNMENT};
use gcmtool::gcm::GcmReader;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(color = clap::ColorChoice::Never)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the disk header and the location of the file system table
    Info {
        /// GameCube disc image
        image: PathBuf,
    },

    /// List every file and directory in the image
    List {
        /// GameCube disc image
        image: PathBuf,
    },

    /// Extract the whole file tree into a directory
    Extract {
        /// GameCube disc image
        image: PathBuf,

        /// A folder to write the files to
        out_dir: PathBuf,
    },

    /// Extract a single file
    ExtractFile {
        /// GameCube disc image
        image: PathBuf,

        /// Absolute path of the file inside the image
        path: String,

        /// Where to write the file
        out_file: PathBuf,
    },

    /// Print the apploader header
    Apploader {
        /// GameCube disc image
        image: PathBuf,

        /// Also write the apploader header and code to this file
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Build a file system table from a host directory
    BuildFst {
        /// Directory to build the table from
        dir: PathBuf,

        /// Where to write the table
        out: PathBuf,

        /// Disc offset the table will be placed at
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        fst_offset: u32,

        /// Alignment of file data, in bytes
        #[arg(long, default_value_t = DEFAULT_FILE_ALIGNMENT, value_parser = parse_u32)]
        alignment: u32,
    },
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match args.command {
        Command::Info { image } => info(&image),
        Command::List { image } => list(&image),
        Command::Extract { image, out_dir } => extract(&image, &out_dir),
        Command::ExtractFile {
            image,
            path,
            out_file,
        } => extract_file(&image, &path, &out_file),
        Command::Apploader { image, dump } => apploader(&image, dump.as_deref()),
        Command::BuildFst {
            dir,
            out,
            fst_offset,
            alignment,
        } => build_fst(&dir, &out, fst_offset, alignment),
    }
}

fn info(image: &Path) -> Result<(), Error> {
    let mut image = open_image(image)?;
    let header = image.disk_header.clone();

    let region = match header.region() {
        Some(region) if region.is_pal() => format!("{region}, 50Hz"),
        Some(region) => format!("{region}, 60Hz"),
        None => format!("unknown ({:?})", header.region_code as char),
    };

    println!("Game code:    {}", header.game_code());
    println!("Maker code:   {}", header.maker());
    println!("Region:       {region}");
    println!("Disc number:  {}", header.disc_number as u32 + 1);
    println!("Version:      {}", header.version);
    println!("Game name:    {}", header.game_name);
    println!("DOL offset:   {:#010x}", header.dol_offset);
    println!("FST offset:   {:#010x}", header.fst_offset);
    println!("FST size:     {:#010x}", header.fst_size);
    println!("FST max size: {:#010x}", header.fst_max_size);

    let fst = image.fst().context("error reading file system table")?;
    println!("FST entries:  {}", fst.entry_count());

    Ok(())
}

fn list(image: &Path) -> Result<(), Error> {
    let mut image = open_image(image)?;
    let fst = image
        .read_table()
        .context("error reading file system table")?;

    fst.walk(|_, path, entry| match *entry {
        Entry::File { data_length, .. } => println!("{data_length:12} {path}"),
        Entry::Directory { .. } => println!("{:12} {path}/", ""),
    })
    .context("error resolving file names")?;

    Ok(())
}

fn extract(image: &Path, out_dir: &Path) -> Result<(), Error> {
    let mut image = open_image(image)?;
    let fst = image
        .read_table()
        .context("error reading file system table")?;

    let mut entries = Vec::new();
    fst.walk(|index, path, entry| entries.push((index, path.to_owned(), entry.is_dir())))
        .context("error resolving file names")?;

    fs::create_dir_all(out_dir).context("error creating output directory")?;

    let mut reader = image.fst().context("error reading file system table")?;

    for (index, path, is_dir) in entries {
        if path.split('/').any(|c| c == "." || c == "..") {
            bail!("refusing to extract {path}: path escapes the output directory");
        }

        let dest = out_dir.join(path.trim_start_matches('/'));
        log::debug!("{}", dest.display());

        if is_dir {
            fs::create_dir_all(&dest)
                .with_context(|| format!("error creating {}", dest.display()))?;
        } else {
            write_file(&mut reader, index, &dest)?;
        }
    }

    log::info!("extracted {} entries", fst.entry_count() - 1);

    Ok(())
}

fn extract_file(image: &Path, path: &str, out_file: &Path) -> Result<(), Error> {
    let mut image = open_image(image)?;
    let fst = image
        .read_table()
        .context("error reading file system table")?;

    let index = fst
        .find(path)
        .context("error resolving file names")?
        .with_context(|| format!("{path} not found in image"))?;

    if fst.entry(index)?.is_dir() {
        bail!("{path} is a directory");
    }

    let mut reader = image.fst().context("error reading file system table")?;
    write_file(&mut reader, index, out_file)
}

fn apploader(image: &Path, dump: Option<&Path>) -> Result<(), Error> {
    let mut image = open_image(image)?;

    let apploader = image.apploader().context("error reading apploader")?;
    println!("{apploader}");

    if let Some(dump) = dump {
        let bytes = image.apploader_bytes().context("error reading apploader")?;
        fs::write(dump, bytes).context("error writing apploader")?;
        log::info!("wrote apploader to {}", dump.display());
    }

    Ok(())
}

fn build_fst(dir: &Path, out: &Path, fst_offset: u32, alignment: u32) -> Result<(), Error> {
    log::info!("scanning {}", dir.display());

    let built = TreeBuilder::new()
        .with_fst_offset(fst_offset)
        .with_alignment(alignment)
        .build(dir)
        .with_context(|| format!("error building table for {}", dir.display()))?;

    built
        .fst
        .walk(|_, path, entry| match *entry {
            Entry::File {
                data_offset,
                data_length,
                ..
            } => log::debug!("file: {path} at {data_offset:#x} ({data_length} bytes)"),
            Entry::Directory { .. } => log::debug!("dir : {path}"),
        })
        .context("error resolving file names")?;

    log::info!("writing table to {}", out.display());

    let mut out_file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(out)
        .map(BufWriter::new)
        .context("error creating table file")?;

    built
        .fst
        .write(&mut out_file)
        .and_then(|_| out_file.flush())
        .context("error writing table file")?;

    println!("entries:   {}", built.fst.entry_count());
    println!("fst size:  {:#x}", built.fst.byte_len());
    println!("file data: {:#x} bytes", built.total_file_bytes);

    Ok(())
}

fn write_file<R: Read + Seek>(
    reader: &mut gcmtool::fst::FstReader<R>,
    index: u32,
    dest: &Path,
) -> Result<(), Error> {
    let file = File::options()
        .write(true)
        .create(true)
        .truncate(true)
        .open(dest)
        .with_context(|| format!("error creating {}", dest.display()))?;

    let mut file = BufWriter::new(file);
    reader
        .read_file(index, &mut file)
        .with_context(|| format!("error extracting {}", dest.display()))?;
    file.flush()
        .with_context(|| format!("error writing {}", dest.display()))?;

    Ok(())
}

fn open_image(path: &Path) -> Result<GcmReader<impl Read + Seek>, Error> {
    let file = File::open(path).context("error opening disc image")?;
    let file = BufReader::with_capacity(8 * 1024 * 1024, file);
    GcmReader::read(file).context("error reading disk header")
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number {s:?}: {e}"))
}
