//! # command-core
//!
//! Transport-agnostic slash-command framework for the stock bot.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Chat transport                          │
//! │  (Discord gateway, HTTP gateway, tests ...)                 │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ CommandCall
//! ┌──────────────────────────▼──────────────────────────────────┐
//! │  CommandRegistry                                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Validate   │──│  Dispatch   │──│  Command (Strategy) │  │
//! │  │  (schema)   │  │  (span +    │  │  dca, probability,  │  │
//! │  │             │  │   timeout)  │  │  stock, news, ...   │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └──────────────────────────┬──────────────────────────────────┘
//!                            │ CommandReply
//! ```
//!
//! Commands never fail the transport: domain errors are turned into
//! failed [`CommandReply`] values carrying a user-facing message.

pub mod command;
pub mod error;

pub use command::{
    Command, CommandCall, CommandReply, CommandRegistry, CommandSchema, HelloCommand,
    ParameterSchema,
};
pub use error::{CommandError, Result};
