//! # Receipt Compiler
//!
//! Walks a [`ReceiptScript`] in order and produces the [`CommandStream`] that
//! is handed to the transport.
//!
//! ## Section Translation
//!
//! | Section | Commands |
//! |---------|----------|
//! | *(start)* | `ESC @` |
//! | Text | `GS v 0` raster of the rasterized block (or native text, see below) |
//! | Feed | `ESC J n` |
//! | Cut | optional `ESC J n`, then the selected cut command(s) |
//! | Barcode | `GS h`, `GS w`, `GS H`, `GS k` |
//!
//! Text blocks with no content contribute nothing. Sections are never
//! reordered, and the output depends only on the script and the rasterizer.
//!
//! ## ASCII Passthrough
//!
//! With [`CompileOptions::ascii_passthrough`] set, a text block made only of
//! printable ASCII is sent as native text in the printer's font instead of
//! an image, which is far fewer bytes over a slow link:
//!
//! ```text
//! ESC a n   ESC E n   GS ! n   "line" LF ...   ESC E 0   GS ! 0   ESC a 0
//! ```

use std::slice;

use tracing::{debug, info};

use super::parser::parse_with;
use super::script::{BarcodeDirective, ReceiptScript, Section, TextBlock};
use super::style::StyleTable;
use crate::error::Result;
use crate::protocol::barcode::{self, BarcodeSetup};
use crate::protocol::commands::{
    self, CUT_ESC_I, CUT_ESC_M, CUT_FULL, CUT_PARTIAL, FEED_AND_CUT,
};
use crate::protocol::graphics;
use crate::protocol::template::Command;
use crate::protocol::text::{self, Alignment};
use crate::render::Rasterizer;

/// A single cut command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CutKind {
    /// `GS V 0`
    #[default]
    Full,
    /// `GS V 1`
    Partial,
    /// `GS V B n`: feed `n` units, then cut.
    FeedAndCut(u8),
    /// `ESC i`
    EscI,
    /// `ESC m`
    EscM,
}

impl CutKind {
    pub fn command(self) -> Result<Command> {
        match self {
            Self::Full => CUT_FULL.bind(&[]),
            Self::Partial => CUT_PARTIAL.bind(&[]),
            Self::FeedAndCut(n) => FEED_AND_CUT.bind(&[("feed", n as i64)]),
            Self::EscI => CUT_ESC_I.bind(&[]),
            Self::EscM => CUT_ESC_M.bind(&[]),
        }
    }
}

/// How a cut directive is emitted.
///
/// Which cut opcode a given printer honours cannot be queried over a
/// write-only link. `Fallback` sends every common variant in turn; printers
/// ignore the ones they do not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutPolicy {
    Single(CutKind),
    Fallback,
}

impl Default for CutPolicy {
    fn default() -> Self {
        Self::Single(CutKind::Full)
    }
}

impl CutPolicy {
    const FALLBACK_ORDER: [CutKind; 4] = [
        CutKind::Full,
        CutKind::FeedAndCut(0),
        CutKind::EscI,
        CutKind::EscM,
    ];

    fn kinds(&self) -> &[CutKind] {
        match self {
            Self::Single(kind) => slice::from_ref(kind),
            Self::Fallback => &Self::FALLBACK_ORDER,
        }
    }
}

/// Knobs for one compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Widest bitmap accepted, in dots.
    pub printable_width: u32,
    pub cut: CutPolicy,
    /// Feed this many units before every cut.
    pub feed_before_cut: Option<u8>,
    /// Send pure-ASCII text blocks as native text instead of images.
    pub ascii_passthrough: bool,
    /// Split images into raster commands of at most this many rows.
    pub raster_band_rows: Option<u32>,
    pub barcode: BarcodeSetup,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            printable_width: 576,
            cut: CutPolicy::default(),
            feed_before_cut: None,
            ascii_passthrough: false,
            raster_band_rows: None,
            barcode: BarcodeSetup::default(),
        }
    }
}

/// Ordered, immutable sequence of commands ready for transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStream {
    commands: Vec<Command>,
}

impl CommandStream {
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn iter(&self) -> slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Total encoded size in bytes.
    pub fn byte_len(&self) -> usize {
        self.commands.iter().map(Command::len).sum()
    }

    /// All command bytes concatenated in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for cmd in &self.commands {
            out.extend_from_slice(cmd.bytes());
        }
        out
    }
}

impl FromIterator<Command> for CommandStream {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CommandStream {
    type Item = &'a Command;
    type IntoIter = slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

/// Compiles scripts with a fixed rasterizer, style table and options.
pub struct ReceiptCompiler<R> {
    rasterizer: R,
    styles: StyleTable,
    options: CompileOptions,
}

impl<R: Rasterizer> ReceiptCompiler<R> {
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            styles: StyleTable::default(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_styles(mut self, styles: StyleTable) -> Self {
        self.styles = styles;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Parse and compile script text.
    pub fn compile_text(&self, text: &str) -> Result<CommandStream> {
        let script = parse_with(text, &self.styles)?;
        self.compile(&script)
    }

    /// Compile an already parsed script.
    pub fn compile(&self, script: &ReceiptScript) -> Result<CommandStream> {
        let mut out = vec![commands::init()];

        for (index, section) in script.iter().enumerate() {
            let before = out.len();
            match section {
                Section::Text(block) => self.text_block(block, &mut out)?,
                Section::Feed(feed) => out.push(commands::print_and_feed(feed.line_count)),
                Section::Cut => self.cut(&mut out)?,
                Section::Barcode(directive) => self.barcode(directive, &mut out)?,
            }
            debug!(
                index,
                kind = section_kind(section),
                commands = out.len() - before,
                "compiled section"
            );
        }

        let stream = CommandStream { commands: out };
        info!(
            sections = script.len(),
            commands = stream.len(),
            bytes = stream.byte_len(),
            "compiled receipt"
        );
        Ok(stream)
    }

    fn text_block(&self, block: &TextBlock, out: &mut Vec<Command>) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }

        if self.options.ascii_passthrough && block.lines.iter().all(|l| text::is_printable_ascii(l))
        {
            return native_text(block, out);
        }

        let bitmap = self
            .rasterizer
            .render(&block.text(), block.point_size, block.bold, block.align)?;
        let width = self.options.printable_width;
        match self.options.raster_band_rows {
            Some(rows) => out.extend(graphics::encode_banded(&bitmap, width, rows)?),
            None => out.push(graphics::encode(&bitmap, width)?),
        }
        Ok(())
    }

    fn cut(&self, out: &mut Vec<Command>) -> Result<()> {
        if let Some(n) = self.options.feed_before_cut {
            out.push(commands::print_and_feed(n));
        }
        for kind in self.options.cut.kinds() {
            out.push(kind.command()?);
        }
        Ok(())
    }

    fn barcode(&self, directive: &BarcodeDirective, out: &mut Vec<Command>) -> Result<()> {
        // Build the barcode first so bad data leaves no setup commands behind.
        let symbol = barcode::barcode(directive.kind, &directive.data)?;
        out.extend(barcode::setup(&self.options.barcode)?);
        out.push(symbol);
        Ok(())
    }
}

/// Native font scale factor for a point size (24pt is the 12×24 ROM font).
fn native_scale(point_size: f32) -> u8 {
    (point_size / 24.0).round().clamp(1.0, 8.0) as u8
}

fn native_text(block: &TextBlock, out: &mut Vec<Command>) -> Result<()> {
    let scale = native_scale(block.point_size);
    out.push(text::align(block.align));
    out.push(text::bold(block.bold));
    out.push(commands::text_scale(scale, scale)?);
    for line in &block.lines {
        out.push(text::text_line(line)?);
    }
    out.push(text::bold(false));
    out.push(commands::text_scale(1, 1)?);
    out.push(text::align(Alignment::Left));
    Ok(())
}

fn section_kind(section: &Section) -> &'static str {
    match section {
        Section::Text(_) => "text",
        Section::Feed(_) => "feed",
        Section::Cut => "cut",
        Section::Barcode(_) => "barcode",
    }
}

/// Compile a parsed script with default options.
pub fn compile<R: Rasterizer>(script: &ReceiptScript, rasterizer: R) -> Result<CommandStream> {
    ReceiptCompiler::new(rasterizer).compile(script)
}

/// Parse and compile script text: the single entry point from text to
/// printable bytes.
pub fn compile_receipt<R: Rasterizer>(
    text: &str,
    rasterizer: R,
    options: CompileOptions,
) -> Result<CommandStream> {
    ReceiptCompiler::new(rasterizer)
        .with_options(options)
        .compile_text(text)
}
