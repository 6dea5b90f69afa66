use clap::{ArgAction, Parser};
use image_sizes::config::{self, Overrides, RunOptions};
use image_sizes::imaging::RustBackend;
use image_sizes::types::OptionMap;
use image_sizes::{output, process};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "image-sizes")]
#[command(about = "Generate resized renditions for a folder of images")]
#[command(long_about = "\
Generate resized renditions for a folder of images

Every file matching --files below the input folder gets one rendition per
size and format. Renditions are named by --rendition-file-name-template,
which may contain '/' to create subfolders:

  input/
  ├── photo.jpg
  └── photo/                  # ${name}/${width}x${height}.${ext}
      ├── 320x240.jpg
      └── 320x240.webp

Outputs newer than their source are skipped, so re-running is cheap.

An images file (-I) is a JSON map of known images with optional per-image
resizeOptions/outputOptions overrides. With -U, newly found images are
added to it after the run.

Defaults can be kept in a TOML settings file (--config). Flags given on the
command line take precedence over it.")]
#[command(version)]
struct Cli {
    /// Input folder
    #[arg(short, long)]
    input: PathBuf,

    /// Matcher for files inside the input folder [default: **/*.jpg]
    #[arg(short, long)]
    files: Option<String>,

    /// Output folder; renditions go next to their sources when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also re-encode the original into the output folder (requires --output)
    #[arg(short, long)]
    copy: bool,

    /// Write web-friendly names to the output folder
    #[arg(short = 'S', long)]
    slugify_output: bool,

    /// Comma separated <width>x<height> list, e.g. 100x200,150x300
    #[arg(short = 's', long, value_delimiter = ',')]
    rendition_sizes: Option<Vec<String>>,

    /// Rendition file name template [default: ${name}/${width}x${height}.${ext}]
    #[arg(short = 'n', long)]
    rendition_file_name_template: Option<String>,

    /// Comma separated rendition formats: jpg, webp, png, tif [default: jpg,webp]
    #[arg(short = 't', long, value_delimiter = ',')]
    rendition_file_formats: Option<Vec<String>>,

    /// Resize options as a JSON object [default: {}]
    #[arg(short = 'R', long, value_parser = parse_option_map)]
    resize_options: Option<OptionMap>,

    /// Encoder options as a JSON object [default: {"progressive": true}]
    #[arg(short = 'O', long, value_parser = parse_option_map)]
    output_options: Option<OptionMap>,

    /// Images file (JSON) with per-image overrides
    #[arg(short = 'I', long)]
    images_file: Option<PathBuf>,

    /// Add newly found images to the images file
    #[arg(short = 'U', long)]
    update_images_file: bool,

    /// Verbose logging, repeat for more detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Parallel encoders, capped at the number of cores [default: 1]
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            files: self.files.clone(),
            copy: self.copy,
            slugify_output: self.slugify_output,
            rendition_sizes: self.rendition_sizes.clone(),
            rendition_file_name_template: self.rendition_file_name_template.clone(),
            rendition_file_formats: self.rendition_file_formats.clone(),
            resize_options: self.resize_options.clone(),
            output_options: self.output_options.clone(),
            update_images_file: self.update_images_file,
            jobs: self.jobs,
        }
    }
}

/// Parse a command-line JSON argument that must be an object.
fn parse_option_map(arg: &str) -> Result<OptionMap, String> {
    match serde_json::from_str::<serde_json::Value>(arg) {
        Ok(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(config::log_level(cli.verbose))
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();

    let settings = config::load_settings(cli.config.as_deref())?.with_overrides(cli.overrides());
    let options = RunOptions::resolve(
        cli.input.clone(),
        cli.output.clone(),
        cli.images_file.clone(),
        settings,
    )?;
    log::debug!("options: {:?}", options);

    let summary = process::run(&options, &RustBackend::new())?;
    output::print_run_summary(&summary, options.rendition_root());

    Ok(())
}
