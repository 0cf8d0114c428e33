use super::{ContextPtr, EntryContext, ResourceWrapper, SlotChain};
use crate::logging;
use crate::{Error, Result};
use std::cell::RefCell;
use std::sync::Arc;
use std::vec::Vec;

thread_local! {
    /// Stack of contexts for entries currently open on this thread, innermost
    /// last. Used to find the call-tree parent of a newly built entry and to
    /// detect entries exited out of LIFO order.
    static CONTEXT_STACK: RefCell<Vec<ContextPtr>> = RefCell::new(Vec::new());
}

/// The context of the nearest still-open entry on this thread, i.e. the
/// parent that a newly built entry's call-tree node should attach to.
pub fn current_entry_context() -> Option<ContextPtr> {
    CONTEXT_STACK.with(|s| s.borrow().last().cloned())
}

pub(crate) fn push_entry_context(ctx: ContextPtr) {
    CONTEXT_STACK.with(|s| s.borrow_mut().push(ctx));
}

fn context_ptr_eq(a: &ContextPtr, b: &ContextPtr) -> bool {
    cfg_if_async!(
        let eq = std::sync::Arc::ptr_eq(a, b),
        let eq = std::rc::Rc::ptr_eq(a, b)
    );
    eq
}

pub(crate) fn pop_entry_context(ctx: &ContextPtr) {
    CONTEXT_STACK.with(|s| {
        let mut stack = s.borrow_mut();
        match stack.last() {
            Some(top) if context_ptr_eq(top, ctx) => {
                stack.pop();
            }
            Some(_) => {
                logging::error!(
                    "[GuardEntry::exit] entry exited out of LIFO order; unwinding the entry stack to recover"
                );
                if let Some(pos) = stack.iter().position(|c| context_ptr_eq(c, ctx)) {
                    stack.truncate(pos);
                }
            }
            None => {
                logging::error!("[GuardEntry::exit] exit called with no open entry on this thread");
            }
        }
    });
}

type ExitHandler = Box<dyn Send + Sync + Fn(&GuardEntry, ContextPtr) -> Result<()>>;

cfg_async! {
    use std::sync::{RwLock, Weak};
    type EntryStrongPtrInner = Arc<RwLock<GuardEntry>>;
    pub struct EntryStrongPtr(EntryStrongPtrInner);
    pub type EntryWeakPtr = Weak<RwLock<GuardEntry>>;
}

cfg_not_async! {
    use std::rc::{Rc,Weak};
    use std::cell::RefCell;
    type EntryStrongPtrInner = Rc<RefCell<GuardEntry>>;
    pub struct EntryStrongPtr(EntryStrongPtrInner);
    pub type EntryWeakPtr = Weak<RefCell<GuardEntry>>;
}

pub struct GuardEntry {
    // todo: it is assumed that entry and context is visited in a single thread,
    // is it neccessary to consider concurrency?
    // Then Rc and RefCell is not suitable...
    /// inner context may need mutability in ExitHandlers, thus, RefCell is used
    ctx: ContextPtr,
    exit_handlers: Vec<ExitHandler>,
    /// each entry traverses a slot chain,
    /// global slot chain is wrapped by Arc, thus here we use Arc
    sc: Arc<SlotChain>,
}

impl GuardEntry {
    pub fn new(ctx: ContextPtr, sc: Arc<SlotChain>) -> Self {
        GuardEntry {
            ctx,
            exit_handlers: Vec::new(),
            sc,
        }
    }

    pub fn when_exit(&mut self, exit_handler: ExitHandler) {
        self.exit_handlers.push(exit_handler);
    }

    pub fn context(&self) -> &ContextPtr {
        &self.ctx
    }

    pub fn set_err(&self, err: Error) {
        cfg_if_async! {
            self.ctx.write().unwrap().set_err(err),
            self.ctx.borrow_mut().set_err(err)
        };
    }

    // todo: cleanup
    pub fn exit(&self) {
        for handler in &self.exit_handlers {
            handler(&self, self.ctx.clone()) // Rc/Arc clone
                .map_err(|err: Error| {
                    logging::error!("ERROR: {}", err);
                })
                .unwrap();
        }
        self.sc.exit(self.ctx.clone()); // Rc/Arc clone
        pop_entry_context(&self.ctx);
    }
}

impl EntryStrongPtr {
    pub fn new(entry: EntryStrongPtrInner) -> EntryStrongPtr {
        EntryStrongPtr(entry)
    }

    pub fn context(&self) -> ContextPtr {
        cfg_if_async!(
            let entry = self.0.read().unwrap(),
            let entry = self.0.borrow()
        );
        entry.context().clone()
    }

    pub fn set_err(&self, err: Error) {
        cfg_if_async!(
            self.0.read().unwrap().set_err(err),
            self.0.borrow().set_err(err)
        );
    }

    pub fn exit(&self) {
        cfg_if_async!(self.0.read().unwrap().exit(), self.0.borrow().exit());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    std::thread_local! {
        static EXIT_FLAG: RefCell<u8> = RefCell::new(0);
    }
    fn exit_handler_mock(_entry: &GuardEntry, _ctx: ContextPtr) -> Result<()> {
        EXIT_FLAG.with(|f| {
            *f.borrow_mut() += 1;
        });
        Ok(())
    }

    #[test]
    fn exit() {
        let sc = Arc::new(SlotChain::new());
        cfg_if_async! {
            let ctx = Arc::new(std::sync::RwLock::new(EntryContext::new())),
            let ctx = Rc::new(RefCell::new(EntryContext::new()))
        };
        let mut entry = GuardEntry::new(ctx.clone(), sc);

        entry.when_exit(Box::new(exit_handler_mock));
        cfg_if_async! {
            let entry = Arc::new(std::sync::RwLock::new(entry)),
            let entry = Rc::new(RefCell::new(entry))
        };
        cfg_if_async! {
            ctx.write().unwrap().set_entry(Arc::downgrade(&entry)),
            ctx.borrow_mut().set_entry(Rc::downgrade(&entry))
        };
        cfg_if_async! {
            entry.read().unwrap().exit(),
            entry.borrow().exit()
        };
        EXIT_FLAG.with(|f| {
            assert_eq!(*f.borrow(), 1);
        });
    }
}
