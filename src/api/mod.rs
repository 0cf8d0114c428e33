//! mod `api` provides the topmost fundamental APIs for users of this crate.
//! Users must initialize the library before loading rules. Three ways of
//! initialization are supported:
//!
//!  1. `init_default()`, using default config to initialize.
//!  2. `init_with_config(config_entity: config::Entity)`, using customized config Entity to initialize.
//!  3. `init_with_config_file(config_path: String)`, using yaml file to initialize.

mod base;
mod context;
mod init;
mod slot_chain;

pub use base::*;
pub use context::*;
pub use init::*;
pub use slot_chain::*;
