use super::*;
use crate::core::{circuitbreaker, flow};

/// Loads the given flow rules into the flow rule manager.
fn flow_rule_updater(rules: Vec<Arc<flow::Rule>>) -> Result<bool> {
    Ok(flow::load_rules(rules))
}

pub fn new_flow_rule_handler(
    converter: PropertyConverter<flow::Rule>,
) -> Arc<impl PropertyHandler<flow::Rule>> {
    DefaultPropertyHandler::new(converter, flow_rule_updater)
}

/// Loads the given circuit breaker rules into the circuit breaker rule manager.
fn circuitbreaker_rule_updater(rules: Vec<Arc<circuitbreaker::Rule>>) -> Result<bool> {
    Ok(circuitbreaker::load_rules(rules))
}

pub fn new_circuitbreaker_rule_handler(
    converter: PropertyConverter<circuitbreaker::Rule>,
) -> Arc<impl PropertyHandler<circuitbreaker::Rule>> {
    DefaultPropertyHandler::new(converter, circuitbreaker_rule_updater)
}
