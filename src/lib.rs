pub mod batch;
pub mod classify;
pub mod config;
pub mod gemini;
pub mod sheets;
pub mod util;

pub use batch::{BatchDriver, BatchSettings, RunSummary};
pub use config::Config;
pub use gemini::{Annotator, GeminiClient};
pub use sheets::{RowStore, SheetRow};
