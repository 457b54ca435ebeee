// fraction_coder_demo/src/main.rs

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use fraction_coder::config::{DEFAULT_MAX_MESSAGE_LEN, DEFAULT_PROGRESS_INTERVAL};
use fraction_coder::{compress_file, decompress_file, CodingConfig, FileReport, Progress, Stage};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

fn main() {
    env_logger::init();

    let matches = cli().get_matches();
    match run(&matches) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            process::exit(1);
        }
    }
}

fn cli() -> Command {
    Command::new("fraction_coder_demo")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Static arithmetic coding over exact fractions")
        .subcommand_required(true)
        .arg(
            Arg::new("max-message-len")
                .long("max-message-len")
                .value_name("BYTES")
                .help("Largest message accepted or decoded [default: 1 GiB]")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .arg(
            Arg::new("progress-interval")
                .long("progress-interval")
                .value_name("SYMBOLS")
                .help("Symbols between progress updates [default: 4096]")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .subcommand(
            Command::new("compress")
                .about("Compress a file into a container")
                .arg(path_arg("input", "File to compress"))
                .arg(path_arg("output", "Container to write")),
        )
        .subcommand(
            Command::new("decompress")
                .about("Restore a file from a container")
                .arg(path_arg("input", "Container to read"))
                .arg(path_arg("output", "File to write")),
        )
        .subcommand(
            Command::new("roundtrip")
                .about("Compress, decompress and verify a file, reporting sizes and timings")
                .arg(path_arg("input", "File to round-trip")),
        )
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

/// Runs the selected sub-command. Returns `false` when a round trip does
/// not reproduce its input.
fn run(matches: &ArgMatches) -> Result<bool> {
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no sub-command given");
    };
    let config = coding_config(sub);
    debug!("running {} with {:?}", name, config);

    match name {
        "compress" => {
            let (input, output) = (required_path(sub, "input")?, required_path(sub, "output")?);
            let report = timed("Compression", || compress(input, output, &config))?;
            print_sizes(&report);
            Ok(true)
        }
        "decompress" => {
            let (input, output) = (required_path(sub, "input")?, required_path(sub, "output")?);
            let report = timed("Decompression", || decompress(input, output, &config))?;
            print_sizes(&report);
            Ok(true)
        }
        "roundtrip" => roundtrip(required_path(sub, "input")?, &config),
        other => bail!("unknown sub-command {}", other),
    }
}

fn coding_config(matches: &ArgMatches) -> CodingConfig {
    CodingConfig {
        max_message_len: matches
            .get_one::<usize>("max-message-len")
            .copied()
            .unwrap_or(DEFAULT_MAX_MESSAGE_LEN),
        progress_interval: matches
            .get_one::<usize>("progress-interval")
            .copied()
            .unwrap_or(DEFAULT_PROGRESS_INTERVAL),
    }
}

fn required_path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a Path> {
    matches
        .get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .with_context(|| format!("missing <{}>", name))
}

fn roundtrip(input: &Path, config: &CodingConfig) -> Result<bool> {
    let (compressed, decompressed) = roundtrip_paths(input);

    println!("Starting Compression ...");
    let packed = timed("Compression", || compress(input, &compressed, config))?;
    println!("Starting Decompression ...");
    let restored = timed("Decompression", || decompress(&compressed, &decompressed, config))?;

    println!("Original file size: {} bytes", packed.input_len);
    println!("Compressed file size: {} bytes", packed.output_len);
    println!("Decompressed file size: {} bytes", restored.output_len);
    println!(
        "Compression ratio: {}",
        packed.input_len as f64 / packed.output_len as f64
    );

    let original = std::fs::read(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let roundtripped = std::fs::read(&decompressed)
        .with_context(|| format!("reading {}", decompressed.display()))?;
    if original == roundtripped {
        println!("Decompressed file matches the original");
        Ok(true)
    } else {
        eprintln!("Decompressed file differs from the original");
        Ok(false)
    }
}

/// `dir/name.ext` -> (`dir/name_compressed_arithmetic.bin`,
/// `dir/name_decompressed_arithmetic.ext`).
fn roundtrip_paths(input: &Path) -> (PathBuf, PathBuf) {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let decompressed_name = match input.extension() {
        Some(ext) => format!("{}_decompressed_arithmetic.{}", stem, ext.to_string_lossy()),
        None => format!("{}_decompressed_arithmetic", stem),
    };
    (
        input.with_file_name(format!("{}_compressed_arithmetic.bin", stem)),
        input.with_file_name(decompressed_name),
    )
}

fn compress(input: &Path, output: &Path, config: &CodingConfig) -> Result<FileReport> {
    let bar = progress_bar();
    let report = compress_file(input, output, config, &mut observe_with(&bar))
        .with_context(|| format!("compressing {}", input.display()));
    bar.finish_and_clear();
    report
}

fn decompress(input: &Path, output: &Path, config: &CodingConfig) -> Result<FileReport> {
    let bar = progress_bar();
    let report = decompress_file(input, output, config, &mut observe_with(&bar))
        .with_context(|| format!("decompressing {}", input.display()));
    bar.finish_and_clear();
    report
}

fn timed<T>(label: &str, action: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = action()?;
    println!("{} Time = {} sec", label, start.elapsed().as_secs_f64());
    Ok(result)
}

fn print_sizes(report: &FileReport) {
    println!("Input file size: {}", report.input_len);
    println!("Output file size: {}", report.output_len);
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{msg:>10} [{bar:40}] {pos}/{len}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn observe_with(bar: &ProgressBar) -> impl FnMut(Progress) -> ControlFlow<()> + '_ {
    move |progress| {
        bar.set_length(progress.total as u64);
        bar.set_position(progress.processed as u64);
        bar.set_message(match progress.stage {
            Stage::Encoding => "Encoding",
            Stage::Decoding => "Decoding",
        });
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_paths() {
        let (compressed, decompressed) = roundtrip_paths(Path::new("data/input.txt"));
        assert_eq!(
            compressed,
            PathBuf::from("data/input_compressed_arithmetic.bin")
        );
        assert_eq!(
            decompressed,
            PathBuf::from("data/input_decompressed_arithmetic.txt")
        );

        let (_, bare) = roundtrip_paths(Path::new("blob"));
        assert_eq!(bare, PathBuf::from("blob_decompressed_arithmetic"));
    }

    #[test]
    fn test_cli_parses_global_options() {
        let matches = cli()
            .try_get_matches_from([
                "fraction_coder_demo",
                "compress",
                "in.bin",
                "out.bin",
                "--max-message-len",
                "64",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "compress");
        let config = coding_config(sub);
        assert_eq!(config.max_message_len, 64);
        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
    }
}
