use super::{ClusterNode, DefaultNode, EntranceNode};
use crate::{
    base::{ResourceType, DEFAULT_MAX_RESOURCE_AMOUNT, TOTAL_IN_BOUND_RESOURCE_NAME},
    core::config,
    logging,
};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Context name backing the shared sentinel `EntranceNode` handed out once
/// `config::max_context()` distinct context names are already live.
const NULL_CONTEXT_NAME: &str = "guard-null-context";

type ClusterNodeMap = HashMap<String, Arc<ClusterNode>>;
type EntranceNodeMap = HashMap<String, Arc<EntranceNode>>;
type DefaultNodeMap = HashMap<(String, String), Arc<DefaultNode>>;

lazy_static! {
    /// The process-wide cluster node tracking every inbound request
    /// regardless of resource, used as the root of the whole node graph.
    pub static ref INBOUND_NODE: Arc<ClusterNode> = Arc::new(ClusterNode::new(
        TOTAL_IN_BOUND_RESOURCE_NAME.into(),
        ResourceType::Common
    ));
    // one ClusterNode per resource, shared by every context's DefaultNode for that resource.
    static ref CLUSTER_NODE_MAP: RwLock<ClusterNodeMap> = RwLock::new(ClusterNodeMap::new());
    // one EntranceNode per context name: the root of that context's call tree.
    static ref ENTRANCE_NODE_MAP: RwLock<EntranceNodeMap> = RwLock::new(EntranceNodeMap::new());
    // one DefaultNode per (context name, resource name): a non-root call-tree node.
    static ref DEFAULT_NODE_MAP: RwLock<DefaultNodeMap> = RwLock::new(DefaultNodeMap::new());
    /// Shared entrance node handed to every context name that arrives once
    /// `config::max_context()` distinct names are already tracked. It is
    /// never inserted into `ENTRANCE_NODE_MAP`, so entries built on it are
    /// identified by `EntryContext::is_null_context` and skip the rest of
    /// the slot chain instead of growing the node graph without bound.
    static ref NULL_ENTRANCE_NODE: Arc<EntranceNode> = Arc::new(EntranceNode::new(
        NULL_CONTEXT_NAME.into(),
        ResourceType::Common,
        Arc::new(ClusterNode::new(NULL_CONTEXT_NAME.into(), ResourceType::Common)),
    ));
}

pub fn inbound_node() -> Arc<ClusterNode> {
    INBOUND_NODE.clone()
}

/// cluster_node_list returns the slice of all existing cluster nodes.
pub fn cluster_node_list() -> Vec<Arc<ClusterNode>> {
    let res_map = CLUSTER_NODE_MAP.read().unwrap();
    res_map.values().cloned().collect()
}

pub fn get_cluster_node(res_name: &String) -> Option<Arc<ClusterNode>> {
    let res_map = CLUSTER_NODE_MAP.read().unwrap();
    res_map.get(res_name).cloned()
}

pub fn get_or_create_cluster_node(
    res_name: &String,
    resource_type: &ResourceType,
) -> Arc<ClusterNode> {
    let node = get_cluster_node(res_name);
    match node {
        Some(node) => node,
        None => {
            if CLUSTER_NODE_MAP.read().unwrap().len() >= DEFAULT_MAX_RESOURCE_AMOUNT {
                logging::warn!(
                    "[get_or_create_cluster_node] Resource amount exceeds the threshold {}",
                    DEFAULT_MAX_RESOURCE_AMOUNT
                )
            }
            CLUSTER_NODE_MAP.write().unwrap().insert(
                res_name.clone(),
                Arc::new(ClusterNode::new(res_name.clone(), *resource_type)),
            );
            CLUSTER_NODE_MAP
                .read()
                .unwrap()
                .get(res_name)
                .unwrap()
                .clone()
        }
    }
}

/// Returns (creating on first use) the root `EntranceNode` of the call tree
/// for a given context name. All `DefaultNode`s created for entries opened
/// under that context hang, directly or transitively, off this node.
///
/// `None` means `context_name` is new and `config::max_context()` distinct
/// context names are already tracked: the caller should fall back to the
/// shared null entrance node and skip the rest of the slot chain for this
/// entry, rather than let the node graph grow without bound.
pub fn get_or_create_entrance_node(context_name: &String) -> Option<Arc<EntranceNode>> {
    if let Some(node) = ENTRANCE_NODE_MAP.read().unwrap().get(context_name) {
        return Some(node.clone());
    }
    let mut map = ENTRANCE_NODE_MAP.write().unwrap();
    if let Some(node) = map.get(context_name) {
        return Some(node.clone());
    }
    if map.len() as u32 >= config::max_context() {
        logging::FREQUENT_ERROR_ONCE.call_once(|| {
            logging::warn!(
                "[get_or_create_entrance_node] distinct context amount exceeds {}, falling back to the null context",
                config::max_context()
            )
        });
        return None;
    }
    let cluster_node = get_or_create_cluster_node(context_name, &ResourceType::Common);
    Some(
        map.entry(context_name.clone())
            .or_insert_with(|| Arc::new(EntranceNode::new(context_name.clone(), ResourceType::Common, cluster_node)))
            .clone(),
    )
}

/// The shared entrance node used for contexts that arrive once
/// `config::max_context()` is exceeded.
pub fn null_entrance_node() -> Arc<EntranceNode> {
    NULL_ENTRANCE_NODE.clone()
}

/// Returns (creating on first use) the `DefaultNode` for `res_name` within
/// the call tree rooted at `parent`, linking it as `parent`'s child and
/// wiring it to the resource's shared `ClusterNode`.
pub fn get_or_create_default_node(
    context_name: &String,
    res_name: &String,
    resource_type: &ResourceType,
    parent: &Arc<DefaultNode>,
) -> Arc<DefaultNode> {
    let key = (context_name.clone(), res_name.clone());
    if let Some(node) = DEFAULT_NODE_MAP.read().unwrap().get(&key) {
        return node.clone();
    }
    let cluster_node = get_or_create_cluster_node(res_name, resource_type);
    let node = Arc::new(DefaultNode::new(res_name.clone(), *resource_type, cluster_node));
    parent.add_child(node.clone());
    DEFAULT_NODE_MAP
        .write()
        .unwrap()
        .entry(key)
        .or_insert(node)
        .clone()
}

pub fn reset_resource_map() {
    CLUSTER_NODE_MAP.write().unwrap().clear();
    ENTRANCE_NODE_MAP.write().unwrap().clear();
    DEFAULT_NODE_MAP.write().unwrap().clear();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::config::{reset_global_config, ConfigEntity};

    /// Once `config::max_context()` distinct context names are already
    /// tracked, a brand new name falls back to `None` rather than growing
    /// `ENTRANCE_NODE_MAP` further, while already-tracked names (and the
    /// shared null entrance node itself) keep resolving normally.
    #[test]
    fn entrance_node_cap_falls_back_to_null_context() {
        let mut cfg = ConfigEntity::new();
        cfg.config.stat.max_context = 2;
        reset_global_config(cfg);

        let first = "node_storage_test::cap::first".to_string();
        let second = "node_storage_test::cap::second".to_string();
        let third = "node_storage_test::cap::third".to_string();

        let first_node = get_or_create_entrance_node(&first).expect("under cap");
        let second_node = get_or_create_entrance_node(&second).expect("reaches cap exactly");
        assert!(get_or_create_entrance_node(&third).is_none());

        // already-tracked names still resolve to their existing node, not None.
        assert!(Arc::ptr_eq(
            &get_or_create_entrance_node(&first).unwrap(),
            &first_node
        ));
        assert!(Arc::ptr_eq(
            &get_or_create_entrance_node(&second).unwrap(),
            &second_node
        ));

        // the null entrance node itself is a single shared singleton.
        assert!(Arc::ptr_eq(&null_entrance_node(), &null_entrance_node()));

        reset_global_config(ConfigEntity::new());
    }
}
