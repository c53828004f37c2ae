//! # Bluberry CLI
//!
//! Command-line interface for compiling and printing receipt scripts.
//!
//! ## Usage
//!
//! ```bash
//! # Compile a script and dump the command bytes as hex
//! bluberry compile receipt.txt
//!
//! # Compile to a raw file that can be `cat`ed to a printer
//! bluberry compile receipt.txt -o receipt.bin
//!
//! # Print over Bluetooth (device path or MAC)
//! bluberry print receipt.txt --device 00:11:62:AA:BB:CC --font NanumGothic.ttf
//!
//! # Render each text block to PNG
//! bluberry preview receipt.txt --out preview/
//!
//! # Show the section style table
//! bluberry styles
//! ```
//!
//! Log verbosity grows with `-v`; `BLUBERRY_LOG` takes an `EnvFilter`
//! directive (e.g. `BLUBERRY_LOG=bluberry::transport=trace`) and wins over `-v`.

use std::fs;
use std::io::{self, Read};
use std::num::{NonZeroU16, NonZeroUsize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::metadata::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use bluberry::{
    BluberryError, PrintSettings, PrinterConfig, Result,
    protocol::text::Alignment,
    receipt::{
        CompileOptions, CutKind, CutPolicy, ReceiptCompiler, Section, StyleTable, parse_with,
    },
    render::{Bitmap, BitmapFontRasterizer, Rasterizer, TtfRasterizer},
    transport::{DeviceDirectory, RfcommDirectory, TransportSession, bluetooth::DEFAULT_DEVICE},
};

/// Bluberry - receipt scripts for ESC/POS thermal printers
#[derive(Parser, Debug)]
#[command(name = "bluberry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a script to ESC/POS bytes
    Compile {
        #[command(flatten)]
        job: JobArgs,

        /// Write raw bytes to FILE instead of a hex dump on stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Compile a script and send it to a printer
    Print {
        #[command(flatten)]
        job: JobArgs,

        /// Printer device path or Bluetooth MAC
        #[arg(long, default_value = DEFAULT_DEVICE)]
        device: String,

        /// RFCOMM slot to bind when --device is a MAC without a binding
        #[arg(long, default_value = "0")]
        bind_slot: u8,

        /// Largest single write in bytes
        #[arg(long, value_name = "BYTES")]
        frame_bytes: Option<NonZeroUsize>,

        /// Pause between writes in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,
    },

    /// Render each text section of a script to PNG
    Preview {
        #[command(flatten)]
        job: JobArgs,

        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// List the section style table
    Styles {
        /// Style table JSON (defaults to the built-in table)
        #[arg(long, value_name = "FILE")]
        styles: Option<PathBuf>,
    },
}

/// Arguments shared by every command that compiles a script.
#[derive(Args, Debug)]
struct JobArgs {
    /// Script file, or `-` for stdin
    script: PathBuf,

    /// Print settings JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Printer profile (80mm, 58mm)
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,

    /// Style table JSON
    #[arg(long, value_name = "FILE")]
    styles: Option<PathBuf>,

    /// TrueType/OpenType font for text blocks (built-in bitmap font otherwise)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Bold face to use with --font
    #[arg(long, value_name = "FILE", requires = "font")]
    bold_font: Option<PathBuf>,

    /// Printable width in dots
    #[arg(long)]
    width: Option<NonZeroU16>,

    /// Cut command(s) to emit
    #[arg(long, value_enum, default_value = "full")]
    cut: CutArg,

    /// Feed this many units before every cut
    #[arg(long, value_name = "N")]
    feed_before_cut: Option<u8>,

    /// Send ASCII-only text blocks as native printer text
    #[arg(long)]
    ascii: bool,

    /// Split images into raster commands of at most N rows
    #[arg(long, value_name = "N")]
    band_rows: Option<u32>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CutArg {
    Full,
    Partial,
    /// Every known cut command in turn, for printers of unknown dialect
    Fallback,
}

impl From<CutArg> for CutPolicy {
    fn from(arg: CutArg) -> Self {
        match arg {
            CutArg::Full => CutPolicy::Single(CutKind::Full),
            CutArg::Partial => CutPolicy::Single(CutKind::Partial),
            CutArg::Fallback => CutPolicy::Fallback,
        }
    }
}

/// Whichever rasterizer the command line selected.
enum TextRasterizer {
    Ttf(TtfRasterizer),
    Bitmap(BitmapFontRasterizer),
}

impl Rasterizer for TextRasterizer {
    fn render(&self, text: &str, point_size: f32, bold: bool, align: Alignment) -> Result<Bitmap> {
        match self {
            Self::Ttf(r) => r.render(text, point_size, bold, align),
            Self::Bitmap(r) => r.render(text, point_size, bold, align),
        }
    }
}

/// Everything resolved from [`JobArgs`].
struct Job {
    source: String,
    settings: PrintSettings,
    compiler: ReceiptCompiler<TextRasterizer>,
}

impl JobArgs {
    fn settings(&self) -> Result<PrintSettings> {
        let mut settings = match (&self.config, &self.profile) {
            (Some(path), _) => PrintSettings::load(path)?,
            (None, Some(name)) => PrinterConfig::by_name(name)
                .ok_or_else(|| BluberryError::Config(format!("Unknown printer profile '{}'", name)))?
                .settings(),
            (None, None) => PrintSettings::default(),
        };
        if let Some(width) = self.width {
            settings.printable_width_pixels = width;
        }
        Ok(settings)
    }

    fn load(&self) -> Result<Job> {
        let source = read_script(&self.script)?;
        let settings = self.settings()?;
        let width = settings.printable_width();

        let rasterizer = match &self.font {
            Some(path) => {
                let mut ttf = TtfRasterizer::from_file(path, width)?;
                if let Some(bold) = &self.bold_font {
                    ttf = ttf.with_bold_file(bold)?;
                }
                TextRasterizer::Ttf(ttf)
            }
            None => TextRasterizer::Bitmap(BitmapFontRasterizer::new(width)),
        };

        let styles = match &self.styles {
            Some(path) => StyleTable::load(path)?,
            None => StyleTable::default(),
        };

        let options = CompileOptions {
            printable_width: width,
            cut: self.cut.into(),
            feed_before_cut: self.feed_before_cut,
            ascii_passthrough: self.ascii,
            raster_band_rows: self.band_rows,
            ..CompileOptions::default()
        };

        Ok(Job {
            source,
            settings,
            compiler: ReceiptCompiler::new(rasterizer)
                .with_styles(styles)
                .with_options(options),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_from_verbosity(verbose).into())
        .with_env_var("BLUBERRY_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Compile { job, output } => {
            let job = job.load()?;
            let bytes = job.compiler.compile_text(&job.source)?.to_bytes();
            match output {
                Some(path) => {
                    fs::write(&path, &bytes)?;
                    println!("Wrote {} bytes to {}", bytes.len(), path.display());
                }
                None => print!("{}", hex_dump(&bytes)),
            }
        }

        Commands::Print {
            job,
            device,
            bind_slot,
            frame_bytes,
            delay_ms,
        } => {
            let job = job.load()?;
            let mut settings = job.settings;
            if let Some(frame_bytes) = frame_bytes {
                settings.max_frame_bytes = frame_bytes;
            }
            if let Some(ms) = delay_ms {
                settings.inter_frame_delay = Duration::from_millis(ms);
            }

            let stream = job.compiler.compile_text(&job.source)?;
            info!(commands = stream.len(), bytes = stream.byte_len(), "compiled");

            let directory = RfcommDirectory::new(bind_slot);
            let channel = directory.connect(&device)?;
            let mut session = TransportSession::with_settings(channel, &settings);
            let sent = session.send(&stream);
            directory.disconnect(session.into_channel())?;

            let report = sent?;
            println!(
                "Printed {} bytes in {} frames to {}",
                report.bytes_sent, report.frames, device
            );
        }

        Commands::Preview { job, out } => {
            let job = job.load()?;
            let script = parse_with(&job.source, job.compiler.styles())?;
            fs::create_dir_all(&out)?;

            let mut written = 0;
            for (index, section) in script.iter().enumerate() {
                let Section::Text(block) = section else {
                    continue;
                };
                if block.is_empty() {
                    continue;
                }
                let bitmap = job.compiler.rasterizer().render(
                    &block.text(),
                    block.point_size,
                    block.bold,
                    block.align,
                )?;
                let path = preview_path(&out, index, &block.name);
                bitmap.save_png(&path)?;
                debug!(path = %path.display(), width = bitmap.width(), height = bitmap.height(), "preview saved");
                println!("{}", path.display());
                written += 1;
            }
            if written == 0 {
                println!("No text sections to preview");
            }
        }

        Commands::Styles { styles } => {
            let table = match styles {
                Some(path) => StyleTable::load(&path)?,
                None => StyleTable::default(),
            };
            println!("{:<16} {:>5} {:<7} {:>5}", "SECTION", "BOLD", "ALIGN", "SIZE");
            for entry in table.entries() {
                let align = match entry.style.align {
                    Alignment::Left => "left",
                    Alignment::Center => "center",
                    Alignment::Right => "right",
                };
                println!(
                    "{:<16} {:>5} {:<7} {:>5}",
                    entry.name,
                    if entry.style.bold { "yes" } else { "no" },
                    align,
                    entry.style.size
                );
            }
        }
    }

    Ok(())
}

/// Read a script from a file, or stdin for `-`.
fn read_script(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    fs::read_to_string(path).map_err(|e| {
        BluberryError::Config(format!("Cannot read script {}: {}", path.display(), e))
    })
}

/// `NN-name.png`, with path separators in the section name replaced.
fn preview_path(dir: &Path, index: usize, name: &str) -> PathBuf {
    let name: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '_' } else { c })
        .collect();
    dir.join(format!("{:02}-{}.png", index, name))
}

/// 16 bytes per line, offset first.
fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02X}", b)).collect();
        out.push_str(&format!("{:08X}  {}\n", line * 16, hex.join(" ")));
    }
    out
}
