use super::{get_or_create_default_node, get_or_create_entrance_node, null_entrance_node, DefaultNode};
use crate::base::{current_entry_context, BaseSlot, ContextPtr, StatPrepareSlot};
use lazy_static::lazy_static;
use std::sync::Arc;

const PREPARE_SLOT_ORDER: u32 = 1000;

lazy_static! {
    pub static ref DEFAULT_RESOURCE_NODE_PREPARE_SLOT: Arc<ResourceNodePrepareSlot> =
        Arc::new(ResourceNodePrepareSlot {});
}

pub fn default_resource_node_prepare_slot() -> Arc<ResourceNodePrepareSlot> {
    DEFAULT_RESOURCE_NODE_PREPARE_SLOT.clone()
}

/// `ResourceNodePrepareSlot` plays the role of a node selector: it resolves
/// (creating on first use) the `EntranceNode` for the entry's context and the
/// `DefaultNode` for its resource, links the new `DefaultNode` under whatever
/// node the thread's currently-open entry (if any) occupies in the tree, and
/// stashes both on the context for downstream slots.
pub struct ResourceNodePrepareSlot {}

impl BaseSlot for ResourceNodePrepareSlot {
    fn order(&self) -> u32 {
        PREPARE_SLOT_ORDER
    }
}

impl StatPrepareSlot for ResourceNodePrepareSlot {
    cfg_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let (context_name, res_name, resource_type) = {
                let c = ctx.read().unwrap();
                (c.context_name().to_owned(), c.resource().name().clone(), *c.resource().resource_type())
            };
            let entrance_node = match get_or_create_entrance_node(&context_name) {
                Some(node) => node,
                None => {
                    let mut c = ctx.write().unwrap();
                    c.set_null_context();
                    c.set_entrance_node(null_entrance_node());
                    return;
                }
            };
            let parent = resolve_parent_node(&entrance_node);
            let default_node = get_or_create_default_node(&context_name, &res_name, &resource_type, &parent);

            let mut c = ctx.write().unwrap();
            c.set_entrance_node(entrance_node);
            c.set_default_node(default_node.clone());
            c.set_stat_node(default_node);
        }
    }

    cfg_not_async! {
        fn prepare(&self, ctx: ContextPtr) {
            let (context_name, res_name, resource_type) = {
                let c = ctx.borrow();
                (c.context_name().to_owned(), c.resource().name().clone(), *c.resource().resource_type())
            };
            let entrance_node = match get_or_create_entrance_node(&context_name) {
                Some(node) => node,
                None => {
                    let mut c = ctx.borrow_mut();
                    c.set_null_context();
                    c.set_entrance_node(null_entrance_node());
                    return;
                }
            };
            let parent = resolve_parent_node(&entrance_node);
            let default_node = get_or_create_default_node(&context_name, &res_name, &resource_type, &parent);

            let mut c = ctx.borrow_mut();
            c.set_entrance_node(entrance_node);
            c.set_default_node(default_node.clone());
            c.set_stat_node(default_node);
        }
    }
}

/// Finds the call-tree node this new entry's `DefaultNode` should attach
/// under: the node of whatever entry is currently open on this thread, or
/// `entrance_node` itself when this is the first entry of the context.
fn resolve_parent_node(entrance_node: &Arc<DefaultNode>) -> Arc<DefaultNode> {
    let parent_ctx = match current_entry_context() {
        Some(p) => p,
        None => return entrance_node.clone(),
    };
    cfg_if_async!(
        let c = parent_ctx.read().unwrap(),
        let c = parent_ctx.borrow()
    );
    c.default_node().unwrap_or_else(|| entrance_node.clone())
}
