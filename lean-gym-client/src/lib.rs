//! # lean-gym-client
//!
//! A programmatic connection to a [lean-gym](https://github.com/openai/lean-gym)
//! REPL. Each connection runs the REPL inside its own detached GNU screen
//! session, types commands into it and reads responses back from screen's
//! session log.
//!
//! ## Core Components
//!
//! - **Session**: launches, addresses and quits the screen session
//! - **Log**: incremental reader over the session log
//! - **Response**: decoder turning response lines into typed records
//! - **Connection**: pipelined command issuing and in-order collection
//!
//! ## Example
//!
//! ```rust,ignore
//! use lean_gym_client::invoke_lean;
//!
//! let records = invoke_lean("~/lean-gym", |conn| {
//!     conn.init_search("nat.zero_add", &[])?;
//!     let init = conn.collect()?;
//!     let search_id = init[0].search_id().unwrap_or_default();
//!     let state_id = init[0].tactic_state_id().unwrap_or_default();
//!
//!     conn.run_tac(search_id, state_id, "intro n,\nsimp")?;
//!     conn.clear_search(search_id)?;
//!     conn.collect()
//! })?;
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod log;
#[cfg(feature = "python")]
pub mod pybind;
pub mod response;
pub mod session;

// Re-exports for convenience
pub use command::{escape_newlines, unescape_newlines, Command};
pub use config::LeanGymConfig;
pub use connection::{invoke_lean, Connection, ConnectionFactory, ConnectionState};
pub use error::{Error, Result};
pub use log::OutputLogReader;
pub use response::{decode_line, is_candidate, parse_record, FieldValue, ResponseRecord};
pub use session::{LaunchSpec, Multiplexer, Screen, Session};
