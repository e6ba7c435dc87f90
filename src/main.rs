//! # imagepipe CLI
//!
//! Command-line interface for persisted image pipelines.
//!
//! ## Usage
//! ```bash
//! imagepipe run pipeline.json --parallel
//! imagepipe summary pipeline.json --output json
//! ```

mod cli;

use imagepipe::Result;

fn main() -> Result<()> {
    imagepipe::init_tracing();
    cli::run()
}
