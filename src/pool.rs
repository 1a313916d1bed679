//! Bounded free-list of traversal stacks shared across all trees.
//!
//! Queries borrow a stack, walk the tree, and hand the buffer back when
//! the guard drops, so repeated hit-tests allocate nothing. The pool is
//! the only shared mutable state in the crate and is safe to use from
//! multiple threads even though individual trees are not.

use std::ops::{Deref, DerefMut};
use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::traversal::Frame;

/// How many idle stacks the process-wide pool retains.
const HIT_STACK_POOL_SIZE: usize = 10;

static HIT_STACK_POOL: OnceLock<StackPool> = OnceLock::new();

/// The pool backing every query in the process.
pub(crate) fn hit_stack_pool() -> &'static StackPool {
    HIT_STACK_POOL.get_or_init(|| StackPool::new(HIT_STACK_POOL_SIZE))
}

pub(crate) struct StackPool {
    tx: Sender<Vec<Frame>>,
    rx: Receiver<Vec<Frame>>,
}

impl StackPool {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Borrow a stack, allocating a fresh one when the pool is empty. The
    /// returned guard gives the stack back on drop, early exits included.
    pub fn acquire(&self) -> PooledStack<'_> {
        let stack = self.rx.try_recv().unwrap_or_default();
        PooledStack { stack, pool: self }
    }

    fn release(&self, mut stack: Vec<Frame>) {
        stack.clear();
        // A full pool simply drops the extra buffer.
        let _ = self.tx.try_send(stack);
    }
}

/// Scoped loan of a traversal stack from a [`StackPool`].
pub(crate) struct PooledStack<'a> {
    stack: Vec<Frame>,
    pool: &'a StackPool,
}

impl Deref for PooledStack<'_> {
    type Target = Vec<Frame>;

    fn deref(&self) -> &Self::Target {
        &self.stack
    }
}

impl DerefMut for PooledStack<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stack
    }
}

impl Drop for PooledStack<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.stack));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octant::OctantId;

    #[test]
    fn released_stacks_come_back_cleared() {
        let pool = StackPool::new(2);
        {
            let mut stack = pool.acquire();
            stack.push((OctantId::ROOT, 3));
            assert_eq!(stack.len(), 1);
        }
        let stack = pool.acquire();
        assert!(stack.is_empty());
    }

    #[test]
    fn pool_is_bounded() {
        let pool = StackPool::new(1);
        let first = pool.acquire();
        let second = pool.acquire();
        drop(first);
        drop(second);
        // only one buffer was retained
        assert_eq!(pool.rx.len(), 1);
    }

    #[test]
    fn concurrent_borrow_and_return() {
        let pool = std::sync::Arc::new(StackPool::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut stack = pool.acquire();
                        stack.push((OctantId::ROOT, 0));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(pool.rx.len() <= 4);
    }
}
