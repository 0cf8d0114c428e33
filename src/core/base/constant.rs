pub const TOTAL_IN_BOUND_RESOURCE_NAME: &str = "__total_inbound_traffic__";
pub const DEFAULT_MAX_RESOURCE_AMOUNT: usize = 10000;
pub const DEFAULT_SAMPLE_COUNT: u32 = 2;
pub const DEFAULT_INTERVAL_MS: u32 = 1000;
pub const DEFAULT_SAMPLE_COUNT_TOTAL: u32 = 20;
pub const DEFAULT_INTERVAL_MS_TOTAL: u32 = 10000;
pub const DEFAULT_STATISTIC_MAX_RT: u64 = 60000;
pub const SLOT_INIT: usize = 8;
/// upper bound on the number of slots a single `SlotChain` accepts; beyond this the chain
/// becomes a no-op pass-through rather than continuing to grow unbounded.
pub const MAX_SLOT_CHAIN_SIZE: usize = 6000;
/// upper bound on the byte length of a context name passed to `enter_context`.
pub const MAX_CONTEXT_NAME_SIZE: usize = 2000;
