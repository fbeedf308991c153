//! # aid-cli: Command-Line Validator
//!
//! Library half of the `aid-validate` binary. Argument definitions, config
//! loading and the validation run live here so they can be tested without
//! spawning a process; `main.rs` only wires logging, printing and the exit
//! code.
//!
//! ```bash
//! aid-validate aid.json                      # manifest
//! aid-validate record.txt                    # advertisement record
//! aid-validate aid.json record.txt           # pair
//! aid-validate --advertise example.com aid.json
//! ```

pub mod config;
pub mod validate;

pub use config::load_options;
pub use validate::{run_validate, InputKind, Outcome, ValidateArgs};
