pub mod adapters;
pub mod helpers;
pub mod property;

pub use adapters::*;
pub use helpers::*;
pub use property::*;

use crate::base::GuardRule;
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;
