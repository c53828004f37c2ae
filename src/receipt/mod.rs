//! # Receipt Scripts
//!
//! Section-tagged receipt text, from source to printer commands.
//!
//! ```text
//! "타이틀, 24\n블루베리 카페\n\n줄바꿈, 3"
//!        │ parser
//!        ▼
//! ReceiptScript [Text, Feed]
//!        │ compiler (+ Rasterizer)
//!        ▼
//! CommandStream [ESC @, GS v 0 ..., ESC J 3]
//! ```
//!
//! ## Modules
//!
//! - [`style`]: section name → bold / alignment / default size
//! - [`script`]: the parsed section model
//! - [`parser`]: text → [`ReceiptScript`]
//! - [`compiler`]: [`ReceiptScript`] → [`CommandStream`]

pub mod compiler;
pub mod parser;
pub mod script;
pub mod style;

pub use compiler::{
    CommandStream, CompileOptions, CutKind, CutPolicy, ReceiptCompiler, compile, compile_receipt,
};
pub use parser::{parse, parse_with};
pub use script::{BarcodeDirective, FeedDirective, ReceiptScript, Section, TextBlock};
pub use style::{SectionStyle, StyleEntry, StyleTable};
