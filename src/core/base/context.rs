//! Context
//!
use super::{EntryWeakPtr, ResourceWrapper, StatNode, TokenResult};
use crate::core::stat::{DefaultNode, EntranceNode};
use crate::utils::time::curr_time_millis;
use crate::Error;
use std::sync::Arc;

cfg_async! {
    use std::sync::RwLock;
    pub type ContextPtr = Arc<RwLock<EntryContext>>;
}

cfg_not_async! {
    use std::rc::Rc;
    use std::cell::RefCell;
    pub type ContextPtr = Rc<RefCell<EntryContext>>;
}

/// The name given to a context when the caller does not ask for one
/// explicitly. Entries opened without a surrounding `enter_context` call
/// share this context, and thus the same root of the call-tree.
pub const DEFAULT_CONTEXT_NAME: &str = "sdk-default-context";

#[derive(Default)]
pub struct EntryContext {
    /// entry<->context, cycled reference, so need Weak,
    /// context should not change entry, so here we do not use RwLock,
    /// todo: do we need this N:M mapping from context to entry, consider 1:1 mapping?
    entry: Option<EntryWeakPtr>,
    /// Use to calculate RT
    start_time: u64,
    /// The round trip time of this transaction
    round_trip: u64,
    resource: ResourceWrapper,
    /// Name of the context this entry belongs to; identifies which call tree
    /// (and thus which `EntranceNode`) the entry's statistics roll up into.
    context_name: String,
    /// Identifies the immediate caller of this context, if known. Used to
    /// key `ClusterNode::origin_stat` for per-caller statistics.
    origin: String,
    // todo: is it necessary to keep using trait object here?
    // consider replacing by `crate::core::stat::StatNodeBase`
    stat_node: Option<Arc<dyn StatNode>>,
    /// Root node of this context's call tree. Shared by every entry opened
    /// under the same context name.
    entrance_node: Option<Arc<EntranceNode>>,
    /// This entry's own node in the call tree (for the resource it was built
    /// for). Consulted by a nested entry's prepare slot to find its parent.
    default_node: Option<Arc<DefaultNode>>,
    input: GuardInput,
    /// the result of rule slots check
    rule_check_result: TokenResult,
    err: Option<Error>,
    /// Set when this context's name pushed the number of distinct live
    /// contexts past `config::max_context()`: the prepare slot couldn't
    /// allocate a real entrance node for it, so the whole slot chain admits
    /// the entry without running rule checks or statistics.
    null_context: bool,
}

impl EntryContext {
    pub fn new() -> Self {
        EntryContext {
            start_time: curr_time_millis(),
            context_name: DEFAULT_CONTEXT_NAME.to_owned(),
            ..Default::default()
        }
    }

    pub fn new_with_name(context_name: String, origin: String) -> Self {
        EntryContext {
            start_time: curr_time_millis(),
            context_name,
            origin,
            ..Default::default()
        }
    }

    pub fn set_context_name(&mut self, context_name: String) {
        self.context_name = context_name;
    }

    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    pub fn set_origin(&mut self, origin: String) {
        self.origin = origin;
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn set_entrance_node(&mut self, entrance_node: Arc<EntranceNode>) {
        self.entrance_node = Some(entrance_node);
    }

    pub fn entrance_node(&self) -> Option<Arc<EntranceNode>> {
        self.entrance_node.clone()
    }

    pub fn set_default_node(&mut self, default_node: Arc<DefaultNode>) {
        self.default_node = Some(default_node);
    }

    pub fn default_node(&self) -> Option<Arc<DefaultNode>> {
        self.default_node.clone()
    }

    pub fn set_entry(&mut self, entry: EntryWeakPtr) {
        self.entry = Some(entry);
    }

    pub fn entry(&self) -> Option<&EntryWeakPtr> {
        self.entry.as_ref()
    }

    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    pub fn is_blocked(&self) -> bool {
        self.rule_check_result.is_blocked()
    }

    pub fn set_round_trip(&mut self, round_trip: u64) {
        self.round_trip = round_trip
    }

    pub fn round_trip(&self) -> u64 {
        self.round_trip
    }

    pub fn set_resource(&mut self, resource: ResourceWrapper) {
        self.resource = resource;
    }

    pub fn resource(&self) -> &ResourceWrapper {
        &self.resource
    }

    pub fn set_input(&mut self, input: GuardInput) {
        self.input = input;
    }

    pub fn input(&self) -> &GuardInput {
        &self.input
    }

    pub fn set_stat_node(&mut self, stat_node: Arc<dyn StatNode>) {
        self.stat_node = Some(stat_node);
    }

    pub fn stat_node(&self) -> Option<Arc<dyn StatNode>> {
        self.stat_node.clone()
    }

    pub fn set_result(&mut self, result: TokenResult) {
        self.rule_check_result = result;
    }

    pub fn reset_result_to_pass(&mut self) {
        self.rule_check_result.reset_to_pass();
    }

    pub fn result(&self) -> &TokenResult {
        &self.rule_check_result
    }

    pub fn set_err(&mut self, err: Error) {
        self.err = Some(err);
    }

    pub fn get_err(&self) -> &Option<Error> {
        &self.err
    }

    pub fn set_null_context(&mut self) {
        self.null_context = true;
    }

    pub fn is_null_context(&self) -> bool {
        self.null_context
    }
}

/// Input of policy algorithms
#[derive(Debug)]
pub struct GuardInput {
    batch_count: u32,
    flag: i32,
    /// whether this entry may borrow from a future statistic bucket rather
    /// than being rejected outright when the reject-on-exceed controller
    /// is at threshold (see `TrafficShapingController`'s priority branch).
    prioritized: bool,
}

impl Default for GuardInput {
    fn default() -> Self {
        GuardInput {
            batch_count: 1,
            flag: 0,
            prioritized: false,
        }
    }
}

impl GuardInput {
    pub fn new(batch_count: u32, flag: i32) -> Self {
        GuardInput {
            batch_count,
            flag,
            prioritized: false,
        }
    }

    pub fn set_batch_count(&mut self, batch_count: u32) {
        self.batch_count = batch_count;
    }

    pub fn batch_count(&self) -> u32 {
        self.batch_count
    }

    pub fn set_flag(&mut self, flag: i32) {
        self.flag = flag;
    }

    pub fn flag(&self) -> i32 {
        self.flag
    }

    pub fn set_prioritized(&mut self, prioritized: bool) {
        self.prioritized = prioritized;
    }

    pub fn prioritized(&self) -> bool {
        self.prioritized
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::result::BlockType;
    #[test]
    fn is_blocked() {
        let mut ctx = EntryContext::new();
        assert!(!ctx.is_blocked());
        ctx.set_result(TokenResult::new_blocked(BlockType::Other(1)));
        assert!(ctx.is_blocked());
    }
}
