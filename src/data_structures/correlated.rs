//! Fan-out over renderer objects that stand for one logical entity.
//!
//! The source format deduplicates materials by index while a renderer may
//! instantiate one native material per primitive. A [`CorrelatedSet`] holds
//! all of those instances, in order, and applies every mutation to each of
//! them.

use std::{cell::RefCell, fmt, rc::Rc};

use anyhow::anyhow;

/// Ordered, non-empty collection of shared renderer objects.
pub struct CorrelatedSet<T: ?Sized> {
    targets: Vec<Rc<RefCell<T>>>,
}

impl<T: ?Sized> CorrelatedSet<T> {
    /// `None` for an empty list: a facade without renderer objects is
    /// document-only, never "live with zero targets".
    pub fn new(targets: Vec<Rc<RefCell<T>>>) -> Option<Self> {
        if targets.is_empty() {
            None
        } else {
            Some(Self { targets })
        }
    }

    /// The representative object used when members disagree.
    pub fn first(&self) -> &Rc<RefCell<T>> {
        &self.targets[0]
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<RefCell<T>>> {
        self.targets.iter()
    }

    /// Apply `mutation` to every member in order.
    ///
    /// A member that fails, or that is borrowed elsewhere, is logged and
    /// skipped; the rest still receive the mutation. Returns the number of
    /// members that failed.
    pub fn apply<F>(&self, operation: &str, mut mutation: F) -> usize
    where
        F: FnMut(&mut T) -> anyhow::Result<()>,
    {
        let mut failures = 0;
        for (position, target) in self.targets.iter().enumerate() {
            let result = match target.try_borrow_mut() {
                Ok(mut target) => mutation(&mut *target),
                Err(e) => Err(anyhow!("object is in use: {}", e)),
            };
            if let Err(e) = result {
                log::warn!(
                    "{} failed on correlated object {} of {}: {}",
                    operation,
                    position,
                    self.targets.len(),
                    e
                );
                failures += 1;
            }
        }
        failures
    }

    /// Read a value from every member that is not mutably borrowed.
    pub fn read<R, F>(&self, mut read: F) -> Vec<R>
    where
        F: FnMut(&T) -> R,
    {
        self.targets
            .iter()
            .filter_map(|target| match target.try_borrow() {
                Ok(target) => Some(read(&*target)),
                Err(e) => {
                    log::warn!("Skipping correlated object while reading: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl<T: ?Sized> Clone for CorrelatedSet<T> {
    fn clone(&self) -> Self {
        Self {
            targets: self.targets.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for CorrelatedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelatedSet")
            .field("len", &self.targets.len())
            .finish()
    }
}
