//! Presentation for bot responses.
//!
//! - **Blocks** (`blocks`) - the narrative markup subset rendered to `DisplayBlock`s
//! - **Panels** (`panels`) - typed payload attachments rendered to titled key/value cards

pub mod blocks;
pub mod panels;

pub use blocks::{render, BlockKind, DisplayBlock, MarkupRenderer, RenderOptions};
pub use panels::{payload_panels, Panel, PanelBuilder, PanelField, PanelItem};
