//! Initialization entry points. These set up the global config, select a
//! logging backend and otherwise bring the runtime environment up before
//! any resource entry or rule load can take effect.

use crate::core::config;
use crate::Result;

/// Initializes Guard using configuration resolved from system environment
/// variables and hard-coded defaults.
#[inline]
pub fn init_default() -> Result<()> {
    init_guard(&mut String::new())
}

/// Initializes Guard from a hand-built `ConfigEntity`.
#[inline]
pub fn init_with_config(config_entity: config::ConfigEntity) -> Result<()> {
    config_entity.check()?;
    config::reset_global_config(config_entity);
    #[cfg(any(feature = "env_logger", feature = "log4rs"))]
    config::init_log()?;
    Ok(())
}

/// Initializes Guard from a YAML configuration file.
#[inline]
pub fn init_with_config_file(config_path: &mut String) -> Result<()> {
    init_guard(config_path)
}

#[inline]
fn init_guard(config_path: &mut String) -> Result<()> {
    config::init_config_with_yaml(config_path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_init_does_not_panic() {
        init_default().unwrap();
    }
}
