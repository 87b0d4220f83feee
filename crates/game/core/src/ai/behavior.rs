//! Minimal behavior tree.
//!
//! Every node completes within one tick: there is no `Running` state. A
//! decision either lands in the context or the node fails and the parent
//! tries the next option.

/// Result of ticking a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    /// `Success` when `condition` holds.
    #[inline]
    pub fn when(condition: bool) -> Self {
        if condition {
            Status::Success
        } else {
            Status::Failure
        }
    }
}

/// A node evaluated against a context `C`.
pub trait Behavior<C>: Send + Sync {
    fn tick(&self, ctx: &mut C) -> Status;
}

impl<'b, C> Behavior<C> for Box<dyn Behavior<C> + 'b> {
    #[inline]
    fn tick(&self, ctx: &mut C) -> Status {
        (**self).tick(ctx)
    }
}

/// Ticks children left to right until one fails (logical AND).
///
/// `'b` bounds the boxed children, so nodes may borrow from the context's
/// lifetimes instead of being `'static`.
pub struct Sequence<'b, C> {
    children: Vec<Box<dyn Behavior<C> + 'b>>,
}

impl<'b, C> Sequence<'b, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Box<dyn Behavior<C> + 'b>>) -> Self {
        assert!(!children.is_empty(), "Sequence must have at least one child");
        Self { children }
    }
}

impl<C> Behavior<C> for Sequence<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx) == Status::Failure {
                return Status::Failure;
            }
        }
        Status::Success
    }
}

/// Ticks children left to right until one succeeds (logical OR).
pub struct Selector<'b, C> {
    children: Vec<Box<dyn Behavior<C> + 'b>>,
}

impl<'b, C> Selector<'b, C> {
    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn new(children: Vec<Box<dyn Behavior<C> + 'b>>) -> Self {
        assert!(!children.is_empty(), "Selector must have at least one child");
        Self { children }
    }
}

impl<C> Behavior<C> for Selector<'_, C> {
    fn tick(&self, ctx: &mut C) -> Status {
        for child in &self.children {
            if child.tick(ctx) == Status::Success {
                return Status::Success;
            }
        }
        Status::Failure
    }
}
