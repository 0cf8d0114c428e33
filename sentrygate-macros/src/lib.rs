//! This crate supplies out-of-the-box attribute macros that ease resource and rule
//! declaration on top of the `sentrygate-core` crate.
//! Currently, only one attribute macro is permitted on a single function.

#![allow(clippy::needless_update)]

use proc_macro::TokenStream;
use syn::{parse_macro_input, AttributeArgs};

#[macro_use]
#[doc(hidden)]
mod utils;
use utils::*;

mod circuitbreaker;
mod flow;

build!(flow);
build!(circuitbreaker);
