use super::*;
use crate::{
    base::{BaseSlot, ContextPtr, GuardRule, RuleCheckSlot, StatNode, TokenResult},
    logging, stat, utils,
    utils::AsAny,
};
use lazy_static::lazy_static;
use std::sync::Arc;

const RULE_CHECK_SLOT_ORDER: u32 = 2000;

/// A RuleSlot for flow related metrics
pub struct Slot {}

lazy_static! {
    pub static ref DEFAULT_SLOT: Arc<Slot> = Arc::new(Slot {});
}

pub fn default_slot() -> Arc<Slot> {
    DEFAULT_SLOT.clone()
}

impl BaseSlot for Slot {
    fn order(&self) -> u32 {
        RULE_CHECK_SLOT_ORDER
    }
}

impl RuleCheckSlot for Slot {
    fn check(&self, ctx_ptr: &ContextPtr) -> TokenResult {
        cfg_if_async! {
            let mut ctx = ctx_ptr.write().unwrap(),
            let mut ctx = ctx_ptr.borrow_mut()
        };
        let res = ctx.resource().name();
        let stat_node = ctx.stat_node();
        let origin = ctx.origin().to_owned();
        let context_name = ctx.context_name().to_owned();
        let input = ctx.input();
        let prioritized = input.prioritized();
        let tcs = get_traffic_controller_list_for(res);
        for tc in tcs {
            let r = can_pass_check(
                tc,
                stat_node.clone(),
                &origin,
                &context_name,
                input.batch_count(),
                prioritized,
            );
            match r {
                TokenResult::Pass => {}
                TokenResult::Blocked(_) => {
                    ctx.set_result(r);
                    return ctx.result().clone();
                }
                TokenResult::Wait(nanos_to_wait) => {
                    utils::sleep_for_ns(nanos_to_wait);
                }
            }
        }
        return ctx.result().clone();
    }
}

/// Outcome of selecting the statistic node a Current/DIRECT-strategy rule
/// should check against.
enum DirectNode {
    /// Found the node to check; admission proceeds normally.
    Node(Arc<dyn StatNode>),
    /// `limit_origin` doesn't target this origin, so the rule doesn't apply
    /// here at all. Not an error.
    NotApplicable,
    /// The resource's cluster node was not found even though `given_node`
    /// (or an origin leaf of it) was expected to exist.
    Missing,
}

/// Selects the statistic node a Current/DIRECT-strategy rule should check
/// against, honoring `limit_origin`. `given_node` is the resource's own
/// (origin-independent) node, used whenever origin differentiation doesn't
/// apply.
fn select_direct_node(
    rule: &Rule,
    res: &str,
    origin: &str,
    given_node: Option<Arc<dyn StatNode>>,
) -> DirectNode {
    if rule.limit_origin.is_empty() || rule.limit_origin == LIMIT_ORIGIN_DEFAULT {
        return match given_node {
            Some(node) => DirectNode::Node(node),
            None => DirectNode::Missing,
        };
    }
    if rule.limit_origin == LIMIT_ORIGIN_OTHER {
        if origin.is_empty() || !is_other_origin(&res.to_owned(), origin) {
            return DirectNode::NotApplicable;
        }
        return match stat::get_cluster_node(&res.to_owned()) {
            Some(node) => DirectNode::Node(node.origin_stat(origin) as Arc<dyn StatNode>),
            None => DirectNode::Missing,
        };
    }
    if rule.limit_origin == origin {
        return match stat::get_cluster_node(&res.to_owned()) {
            Some(node) => DirectNode::Node(node.origin_stat(origin) as Arc<dyn StatNode>),
            None => DirectNode::Missing,
        };
    }
    DirectNode::NotApplicable
}

fn can_pass_check(
    tc: Arc<Controller>,
    given_node: Option<Arc<dyn StatNode>>,
    origin: &str,
    context_name: &str,
    batch_count: u32,
    prioritized: bool,
) -> TokenResult {
    let rule = tc.rule();
    let res = rule.resource_name();
    let actual_node = match rule.relation_strategy {
        RelationStrategy::Associated => {
            let node = stat::get_cluster_node(&rule.ref_resource).unwrap();
            let node = node.as_any_arc();
            let node = node.downcast_ref::<Arc<dyn StatNode>>().unwrap();
            DirectNode::Node(node.clone())
        }
        RelationStrategy::Chain => {
            if context_name == rule.ref_resource {
                match given_node {
                    Some(node) => DirectNode::Node(node),
                    None => DirectNode::Missing,
                }
            } else {
                DirectNode::NotApplicable
            }
        }
        RelationStrategy::Current => select_direct_node(rule, &res, origin, given_node),
    };
    match actual_node {
        DirectNode::Node(node) => tc.perform_checking_prioritized(node, batch_count, 0, prioritized),
        DirectNode::NotApplicable => TokenResult::new_pass(),
        DirectNode::Missing => {
            logging::FREQUENT_ERROR_ONCE.call_once(|| {
                logging::error!(
                    "None statistics node for flow rule in FlowSlot.can_pass_check() {:?}",
                    tc.rule()
                );
            });
            TokenResult::new_pass()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{
        EntryContext, MetricEvent, ResourceType, ResourceWrapper, GuardInput, StatSlot,
        TrafficType,
    };
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn rule_check_slot() {
        let slot = Slot {};
        let stat_slot = StandaloneStatSlot {};
        let res_name = String::from("abc");
        let res =
            ResourceWrapper::new(res_name.clone(), ResourceType::Common, TrafficType::Inbound);
        let res_node = stat::get_or_create_cluster_node(&res_name, &ResourceType::Common);
        let mut ctx = EntryContext::new();
        ctx.set_input(GuardInput::new(1, 0));
        ctx.set_stat_node(res_node);
        ctx.set_resource(res);
        cfg_if_async! {
            let ctx = Arc::new(std::sync::RwLock::new(ctx)),
            let ctx = Rc::new(RefCell::new(ctx))
        };

        slot.check(&ctx);

        let r1 = Arc::new(Rule {
            resource: res_name.clone(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            // Use standalone statistic, using single-bucket-sliding-windows
            stat_interval_ms: 20000,
            threshold: 100.0,
            relation_strategy: RelationStrategy::Current,
            ..Default::default()
        });
        load_rules(vec![r1]);

        for _ in 0..50 {
            slot.check(&ctx);
            stat_slot.on_entry_pass(Rc::clone(&ctx));
        }
        assert_eq!(
            get_traffic_controller_list_for(&res_name)[0]
                .stat()
                .read_only_metric()
                .sum(MetricEvent::Pass),
            50
        );
    }

    fn ctx_for(res_name: &str, origin: &str, context_name: &str) -> ContextPtr {
        let res = ResourceWrapper::new(
            res_name.to_string(),
            ResourceType::Common,
            TrafficType::Inbound,
        );
        let res_node = stat::get_or_create_cluster_node(&res_name.to_string(), &ResourceType::Common);
        let mut ctx = EntryContext::new_with_name(context_name.to_string(), origin.to_string());
        ctx.set_input(GuardInput::new(1, 0));
        ctx.set_stat_node(res_node);
        ctx.set_resource(res);
        cfg_if_async! {
            let ctx = Arc::new(std::sync::RwLock::new(ctx)),
            let ctx = Rc::new(RefCell::new(ctx))
        };
        ctx
    }

    /// A rule naming a `limit_origin` only checks origins that match it;
    /// other origins pass through untouched.
    #[test]
    fn limit_origin_only_applies_to_named_origin() {
        let slot = Slot {};
        let res_name = "limit_origin_only_applies_to_named_origin";
        let r1 = Arc::new(Rule {
            resource: res_name.to_string(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            stat_interval_ms: 20000,
            threshold: 0.0,
            relation_strategy: RelationStrategy::Current,
            limit_origin: "caller-a".to_string(),
            ..Default::default()
        });
        load_rules(vec![r1]);

        let other_origin_ctx = ctx_for(res_name, "caller-b", "sdk-default-context");
        assert!(slot.check(&other_origin_ctx).is_pass());

        let named_origin_ctx = ctx_for(res_name, "caller-a", "sdk-default-context");
        assert!(slot.check(&named_origin_ctx).is_blocked());
    }

    /// CHAIN-strategy rules only check admission when the call entered
    /// through the chained entry resource.
    #[test]
    fn chain_strategy_only_applies_to_matching_entry() {
        let slot = Slot {};
        let res_name = "chain_strategy_only_applies_to_matching_entry";
        let r1 = Arc::new(Rule {
            resource: res_name.to_string(),
            calculate_strategy: CalculateStrategy::Direct,
            control_strategy: ControlStrategy::Reject,
            stat_interval_ms: 20000,
            threshold: 0.0,
            relation_strategy: RelationStrategy::Chain,
            ref_resource: "entrance-a".to_string(),
            ..Default::default()
        });
        load_rules(vec![r1]);

        let other_entry_ctx = ctx_for(res_name, "", "entrance-b");
        assert!(slot.check(&other_entry_ctx).is_pass());

        let chained_ctx = ctx_for(res_name, "", "entrance-a");
        assert!(slot.check(&chained_ctx).is_blocked());
    }
}
