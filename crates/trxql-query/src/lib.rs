//! Natural-language to SQL pipeline over the `transaction` table.
//!
//! relevance filter → generation → refusal check → extraction → safety gate
//! → execution → optional analysis.

pub mod error;
pub mod pipeline;
pub mod format;
pub mod analysis;

pub use error::{QueryError, SetupError, MISSING_API_KEY_MESSAGE};
pub use pipeline::{screen_prompt, QueryOutcome, QueryPipeline};
pub use format::format_table;
pub use analysis::format_results_for_analysis;
