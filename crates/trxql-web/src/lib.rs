//! trxql-web: single-page form over the query pipeline.
//!   - `GET /`            empty form
//!   - `POST /`           form submission, rendered result page
//!   - `POST /api/query`  JSON variant of the same pipeline
//!   - `GET /health`      liveness

pub mod router;
pub mod handlers;
pub mod state;
