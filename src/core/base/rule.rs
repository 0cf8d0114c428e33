use crate::Result;
use std::fmt;

/// Common contract implemented by every rule type (`flow::Rule`, `circuitbreaker::Rule`, ...).
pub trait GuardRule: fmt::Debug + Send + Sync {
    fn resource_name(&self) -> String;
    fn is_valid(&self) -> Result<()> {
        Ok(())
    }
}
