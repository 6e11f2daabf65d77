use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "deptsplit",
    version,
    about = "Split consolidated fuel reports into per-department PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Split(SplitArgs),
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    pub input: PathBuf,

    #[arg(long, default_value = "split-output")]
    pub output_dir: PathBuf,

    #[arg(long, default_value_t = false)]
    pub archive: bool,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = 40.0)]
    pub footer_margin: f32,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub input: PathBuf,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub extraction: ExtractionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractionArgs {
    #[arg(long, value_enum, default_value_t = ReadingDirection::Rtl)]
    pub reading_direction: ReadingDirection,

    #[arg(long, value_enum, default_value_t = TextMode::Raw)]
    pub text_mode: TextMode,

    #[arg(long, default_value_t = 100.0)]
    pub metadata_search_width: f32,

    #[arg(long, default_value_t = 100.0)]
    pub department_search_width: f32,

    #[arg(long, default_value_t = 5.0)]
    pub department_vertical_tolerance: f32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ReadingDirection {
    Rtl,
    Ltr,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TextMode {
    Layout,
    Raw,
}

impl ReadingDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rtl => "rtl",
            Self::Ltr => "ltr",
        }
    }
}

impl TextMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Raw => "raw",
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            Self::Layout => "-layout",
            Self::Raw => "-raw",
        }
    }
}
