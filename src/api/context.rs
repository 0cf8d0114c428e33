//! Ambient (thread-local) context name and calling origin, consulted by
//! [`crate::api::EntryBuilder::build`] when it creates a new entry.
use crate::base::{DEFAULT_CONTEXT_NAME, MAX_CONTEXT_NAME_SIZE};
use crate::logging;
use std::cell::RefCell;

thread_local! {
    static CONTEXT_NAME_STACK: RefCell<Vec<(String, String)>> = RefCell::new(Vec::new());
}

/// Declares the name (and, optionally, calling origin) of the context that
/// subsequent `EntryBuilder::build()` calls on this thread should attach to,
/// until the matching [`exit_context`]. Calls nest: the innermost
/// `enter_context` wins, and `exit_context` restores whichever was active
/// before it (or the default context, if none).
///
/// `context_name` identifies the call tree the entry's statistics roll up
/// into; `origin` identifies the immediate caller, if known, and is used to
/// key per-caller statistics on the resource's `ClusterNode`.
pub fn enter_context(context_name: &str, origin: &str) {
    if context_name.len() > MAX_CONTEXT_NAME_SIZE {
        logging::warn!(
            "[enter_context] context name length exceeds {}, falling back to the default context",
            MAX_CONTEXT_NAME_SIZE
        );
        return;
    }
    CONTEXT_NAME_STACK.with(|s| {
        s.borrow_mut()
            .push((context_name.to_owned(), origin.to_owned()))
    });
}

/// Pops the most recently entered context.
pub fn exit_context() {
    CONTEXT_NAME_STACK.with(|s| {
        s.borrow_mut().pop();
    });
}

pub(crate) fn current_context_name_and_origin() -> (String, String) {
    CONTEXT_NAME_STACK.with(|s| {
        s.borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| (DEFAULT_CONTEXT_NAME.to_owned(), String::new()))
    })
}
