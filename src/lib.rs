//! `mdflow`: a streaming Markdown tokenizer and block assembler for
//! chat-oriented rendering.
//!
//! The pipeline has three stages, leaves first:
//!
//! - [`inline`] resolves emphasis, code spans, links, images, autolinks,
//!   math and a safe HTML subset over the text inside one open
//!   inline-capable block.
//! - [`replacement`] sits between the block state machine and the inline
//!   parser, expanding literal patterns (`...` → `…`) and `:shortcode:`
//!   emoji.
//! - [`bsm`] (the block state machine) line-buffers input, classifies each
//!   line, and opens/closes blocks, driving the inline parser for
//!   inline-capable kinds.
//! - [`assembler`] applies the tokenizer's event stream to an ordered store
//!   of block snapshots and produces a diff for a renderer.
//!
//! None of the four stages perform I/O, and none of them can fail: malformed
//! input always degrades to literal text or an `unknown` block rather than
//! erroring. The only fallible surface in this crate is
//! constructing a [`config::TokenizerConfig`] or [`config::AssemblerConfig`]
//! from caller-supplied values.
//!
//! ```
//! use mdflow_lib::assembler::Assembler;
//! use mdflow_lib::bsm::Tokenizer;
//! use mdflow_lib::config::{AssemblerConfig, TokenizerConfig};
//!
//! let mut tokenizer = Tokenizer::new(TokenizerConfig::default());
//! let mut assembler = Assembler::new(AssemblerConfig::default());
//!
//! let chunk = tokenizer.feed("Hello, **world**!\n\n");
//! let diff = assembler.apply(chunk);
//! assert!(diff.document_version > 0);
//! ```

pub mod assembler;
pub mod bsm;
pub mod config;
pub mod ids;
pub mod inline;
pub mod model;
pub mod replacement;
pub mod style;

pub use assembler::{Assembler, AssemblerDiff, BlockSnapshot, Change, TableSnapshot};
pub use bsm::Tokenizer;
pub use config::{AssemblerConfig, ConfigError, SafeInlineTags, TokenizerConfig};
pub use ids::BlockId;
pub use model::{BlockEvent, BlockKind, ChunkResult, InlineRun, OpenBlockState, TableAlignment, TaskState};
pub use style::StyleFlags;
