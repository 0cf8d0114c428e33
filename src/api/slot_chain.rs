use crate::core::base::SlotChain;
use crate::core::{circuitbreaker, flow, stat};
use lazy_static::lazy_static;
use std::sync::Arc;

lazy_static! {
    pub static ref GLOBAL_SLOT_CHAIN: Arc<SlotChain> = {
        let mut sc = SlotChain::new();

        sc.add_stat_prepare_slot(stat::default_resource_node_prepare_slot());

        sc.add_rule_check_slot(flow::default_slot());
        sc.add_rule_check_slot(circuitbreaker::default_slot());

        sc.add_stat_slot(stat::default_resource_stat_slot());
        sc.add_stat_slot(flow::default_stand_alone_stat_slot());
        sc.add_stat_slot(circuitbreaker::default_metric_stat_slot());
        Arc::new(sc)
    };
}

/// The canonical slot chain wired once at process start, matching the fixed
/// NodeSelector -> ClusterBuilder -> StatisticSlot -> Flow -> Degrade ordering.
pub fn global_slot_chain() -> Arc<SlotChain> {
    GLOBAL_SLOT_CHAIN.clone()
}
