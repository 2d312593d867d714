//! Ordered fallback-until-success, shared by entry-page fetching and key validation.
//!
//! Attempts run strictly one after another; nothing past the first accepted
//! attempt is tried.

use std::future::Future;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback<T, O> {
    /// `item` produced an `output` the predicate accepted.
    Found { item: T, output: O },
    /// Every item was tried. `last` holds the final rejected output, `None` if
    /// there were no items at all.
    Exhausted { attempts: usize, last: Option<O> },
}

impl<T, O> Fallback<T, O> {
    pub fn found(self) -> Option<(T, O)> {
        match self {
            Fallback::Found { item, output } => Some((item, output)),
            Fallback::Exhausted { .. } => None,
        }
    }
}

/// Runs `attempt` over `items` in order and stops at the first output for which
/// `accept` returns true.
pub async fn first_success<I, T, O, F, Fut, P>(
    items: I,
    mut attempt: F,
    mut accept: P,
) -> Fallback<T, O>
where
    I: IntoIterator<Item = T>,
    T: Clone,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = O>,
    P: FnMut(&O) -> bool,
{
    let mut attempts = 0;
    let mut last = None;
    for item in items {
        attempts += 1;
        let output = attempt(item.clone()).await;
        if accept(&output) {
            return Fallback::Found { item, output };
        }
        last = Some(output);
    }
    Fallback::Exhausted { attempts, last }
}
