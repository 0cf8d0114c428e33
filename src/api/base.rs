use super::{current_context_name_and_origin, global_slot_chain};
use crate::base::{
    push_entry_context, EntryContext, EntryStrongPtr, ResourceType, ResourceWrapper, GuardEntry,
    GuardInput, SlotChain, TokenResult, TrafficType,
};
use crate::utils::format_time_nanos_curr;
use crate::{Error, Result};
use std::sync::Arc;

// EntryBuilder is the basic API of Guard.
pub struct EntryBuilder {
    resource_name: String,
    resource_type: ResourceType,
    traffic_type: TrafficType,
    batch_count: u32,
    flag: i32,
    prioritized: bool,
    slot_chain: Arc<SlotChain>,
}

// or set all items in builder to None by default?
// then use builder to change `Default` ctx and initialize Entry seems better
impl Default for EntryBuilder {
    fn default() -> Self {
        EntryBuilder {
            resource_name: format_time_nanos_curr(),
            resource_type: ResourceType::default(),
            traffic_type: TrafficType::default(),
            batch_count: 1,
            flag: 0,
            prioritized: false,
            slot_chain: global_slot_chain(),
        }
    }
}

impl EntryBuilder {
    pub fn new(resource_name: String) -> Self {
        EntryBuilder {
            resource_name,
            ..EntryBuilder::default()
        }
    }

    /// `build()` would consume EntryBuilder
    pub fn build(self) -> Result<EntryStrongPtr> {
        // a context opened by `enter_context` ambiently names the call tree
        // this entry's node should attach to; absent that, entries share the
        // default context.
        let (context_name, origin) = current_context_name_and_origin();
        let mut ctx = EntryContext::new_with_name(context_name, origin);

        ctx.set_resource(ResourceWrapper::new(
            self.resource_name,
            self.resource_type,
            self.traffic_type,
        ));

        let mut input = GuardInput::new(self.batch_count, self.flag);
        input.set_prioritized(self.prioritized);
        ctx.set_input(input);

        cfg_if_async!(
            let ctx = Arc::new(std::sync::RwLock::new(ctx)),
            let ctx = std::rc::Rc::new(std::cell::RefCell::new(ctx))
        );
        cfg_if_async!(
            let entry = Arc::new(std::sync::RwLock::new(GuardEntry::new(ctx.clone(), self.slot_chain.clone()))),
            let entry = std::rc::Rc::new(std::cell::RefCell::new(GuardEntry::new(ctx.clone(), self.slot_chain.clone())))
        );
        cfg_if_async!(
            ctx.write().unwrap().set_entry(Arc::downgrade(&entry)),
            ctx.borrow_mut().set_entry(std::rc::Rc::downgrade(&entry))
        );

        // the prepare slot consults `entry::current_entry_context()` to find
        // this entry's call-tree parent, so the stack push must happen only
        // after the chain has run.
        let r = self.slot_chain.entry(ctx.clone());
        push_entry_context(ctx.clone());
        match r {
            TokenResult::Blocked(_) => {
                // todo:
                // if return block_error,
                // must deep copy the error, since Arc only clone pointer
                cfg_if_async!(entry.read().unwrap().exit(), entry.borrow().exit());
                Err(Error::msg(r.to_string()))
            }
            _ => Ok(EntryStrongPtr::new(entry)),
        }
    }

    pub fn with_resource_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_traffic_type(mut self, traffic_type: TrafficType) -> Self {
        self.traffic_type = traffic_type;
        self
    }

    pub fn with_batch_count(mut self, batch_count: u32) -> Self {
        self.batch_count = batch_count;
        self
    }

    pub fn with_flag(mut self, flag: i32) -> Self {
        self.flag = flag;
        self
    }

    /// Marks this entry as eligible to borrow from a future statistic
    /// bucket instead of being rejected outright when a reject-on-exceed
    /// `FlowRule` is at threshold (see `RejectChecker`'s priority branch).
    pub fn with_prioritized(mut self, prioritized: bool) -> Self {
        self.prioritized = prioritized;
        self
    }

    pub fn with_slot_chain(mut self, slot_chain: Arc<SlotChain>) -> Self {
        self.slot_chain = slot_chain;
        self
    }
}

pub fn trace_error(entry: &EntryStrongPtr, err: Error) {
    entry.set_err(err);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{BlockType, MockRuleCheckSlot, MockStatPrepareSlot, MockStatSlot, TokenResult};
    use mockall::*;

    #[test]
    fn pass() {
        let mut ps = Arc::new(MockStatPrepareSlot::new());
        let mut rcs1 = Arc::new(MockRuleCheckSlot::new());
        let mut rcs2 = Arc::new(MockRuleCheckSlot::new());
        let mut ssm = Arc::new(MockStatSlot::new());

        let mut seq = Sequence::new();
        Arc::get_mut(&mut ps)
            .unwrap()
            .expect_prepare()
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        Arc::get_mut(&mut rcs1)
            .unwrap()
            .expect_check()
            .once()
            .in_sequence(&mut seq)
            .returning(|_ctx| TokenResult::new_pass());
        Arc::get_mut(&mut rcs2)
            .unwrap()
            .expect_check()
            .once()
            .in_sequence(&mut seq)
            .returning(|_ctx| TokenResult::new_pass());
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_entry_pass()
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_entry_blocked()
            .never()
            .return_const(());
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_completed()
            .once()
            .in_sequence(&mut seq)
            .return_const(());

        let mut sc = SlotChain::new();
        sc.add_stat_prepare_slot(ps.clone());
        sc.add_rule_check_slot(rcs1.clone());
        sc.add_rule_check_slot(rcs2.clone());
        sc.add_stat_slot(ssm.clone());
        let sc = Arc::new(sc);

        let builder = EntryBuilder::new("abc".into()).with_slot_chain(sc);
        let entry = builder.build().unwrap();
        let ctx = entry.context();
        cfg_if_async!(
            let name = ctx.read().unwrap().resource().name().clone(),
            let name = ctx.borrow().resource().name().clone()
        );
        assert_eq!("abc", name);
        entry.exit();
    }

    #[test]
    fn block() {
        let mut ps = Arc::new(MockStatPrepareSlot::new());
        let mut rcs1 = Arc::new(MockRuleCheckSlot::new());
        let mut rcs2 = Arc::new(MockRuleCheckSlot::new());
        let mut ssm = Arc::new(MockStatSlot::new());

        let mut seq = Sequence::new();
        Arc::get_mut(&mut ps)
            .unwrap()
            .expect_prepare()
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        Arc::get_mut(&mut rcs1)
            .unwrap()
            .expect_check()
            .once()
            .in_sequence(&mut seq)
            .returning(|_ctx| TokenResult::new_pass());
        Arc::get_mut(&mut rcs2)
            .unwrap()
            .expect_check()
            .once()
            .in_sequence(&mut seq)
            .returning(|_ctx| TokenResult::new_blocked(BlockType::Flow));
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_entry_pass()
            .never()
            .return_const(());
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_entry_blocked()
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        Arc::get_mut(&mut ssm)
            .unwrap()
            .expect_on_completed()
            .never()
            .return_const(());

        let mut sc = SlotChain::new();
        sc.add_stat_prepare_slot(ps.clone());
        sc.add_rule_check_slot(rcs1.clone());
        sc.add_rule_check_slot(rcs2.clone());
        sc.add_stat_slot(ssm.clone());
        let sc = Arc::new(sc);

        let builder = EntryBuilder::new("abc".into()).with_slot_chain(sc);
        assert!(builder.build().is_err());
    }
}
