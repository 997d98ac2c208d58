use clap::{ArgAction, Parser};
use glob::glob;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use vexel_png::{log_error, log_info, log_warn, writer, DecodedImage, DecoderOptions, Image, Logger, PngInfo, ResourcePool};

#[derive(Parser, Debug)]
#[clap(name = "vexel-png", about = "Decode PNG and APNG files to PAM")]
struct Cli {
    #[arg(required = true, help = "File path or glob pattern")]
    path: String,

    #[arg(short = 'o', long = "output-dir", help = "Output directory for converted files")]
    output_dir: Option<String>,

    #[arg(long, help = "Print header, chunk and frame information")]
    info: bool,

    #[arg(long, help = "Write every animation frame instead of the first one")]
    frames: bool,

    #[arg(long, help = "Decode the image without writing to a file")]
    void: bool,

    #[arg(long, help = "Accept IHDR chunks longer than 13 bytes")]
    lenient_header: bool,

    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity")]
    verbose: u8,
}

fn get_files(path: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute_pattern = if Path::new(path).is_relative() {
        base_dir.join(path).to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    for entry in glob(&absolute_pattern)? {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }

                files.push(path);
            }
            Err(e) => log_warn!("{}", e),
        }
    }

    Ok(files)
}

fn get_output_path(file: &Path, output_dir: Option<&str>, suffix: Option<usize>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file_stem = file
        .file_stem()
        .ok_or("Invalid file name")?
        .to_str()
        .ok_or("Invalid file stem")?;

    let file_name = match suffix {
        Some(index) => format!("{}_{:04}.pam", file_stem, index),
        None => format!("{}.pam", file_stem),
    };

    let output_path = if let Some(dir) = output_dir {
        let output_dir = Path::new(dir);

        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        let output_dir = if output_dir.is_relative() {
            std::env::current_dir()?.join(output_dir)
        } else {
            output_dir.to_path_buf()
        };

        output_dir.join(file_name)
    } else {
        file.parent().unwrap_or_else(|| Path::new(".")).join(file_name)
    };

    Ok(output_path)
}

fn write_output(file: &Path, decoded: &DecodedImage, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &decoded.image {
        Image::Animated(animation) if cli.frames => {
            for (i, frame) in animation.frames().iter().enumerate() {
                let output_path = get_output_path(file, cli.output_dir.as_deref(), Some(i))?;
                println!("Writing frame {} to: {}", i, output_path.display());
                writer::write_pam_file(&output_path, frame.pixels())?;
            }
        }
        image => {
            let pixels = image.first_pixels().ok_or("Image has no frames")?;
            let output_path = get_output_path(file, cli.output_dir.as_deref(), None)?;
            println!("Writing to: {}", output_path.display());
            writer::write_pam_file(&output_path, pixels)?;
        }
    }

    Ok(())
}

fn process_file(file: &Path, cli: &Cli, pool: &ResourcePool) -> Result<(), Box<dyn std::error::Error>> {
    println!("File: {}", file.display());

    let data = fs::read(file)?;
    let decoded = pool.decode(&data)?;

    log_info!(
        "Decoded {}x{} {}",
        decoded.image.width(),
        decoded.image.height(),
        match &decoded.image {
            Image::Animated(animation) => format!("animation with {} frames", animation.frame_count()),
            Image::Static(_) => "image".to_string(),
        }
    );

    if cli.info {
        print!("{}", PngInfo::from(&decoded));
    }

    if cli.void || cli.info {
        return Ok(());
    }

    write_output(file, &decoded, cli)
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    if let Err(e) = Logger::init(level) {
        eprintln!("Failed to install logger: {}", e);
    }

    let files = match get_files(&cli.path) {
        Ok(files) => files,
        Err(e) => {
            log_error!("Invalid path pattern {}: {}", cli.path, e);
            std::process::exit(2);
        }
    };

    if files.is_empty() {
        log_error!("No files match {}", cli.path);
        std::process::exit(2);
    }

    let options = DecoderOptions::default().set_strict_header_length(!cli.lenient_header);
    let pool = ResourcePool::with_options(options);

    let mut failures = 0;
    for file in &files {
        if let Err(e) = process_file(file, &cli, &pool) {
            log_error!("{}: {}", file.display(), e);
            failures += 1;
        }
    }

    log_info!("Processed {} files, {} failed", files.len(), failures);

    if failures > 0 {
        std::process::exit(1);
    }
}
