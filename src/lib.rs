//! `Shrc<T>` is a heap-allocated smart pointer for sharing a value between several owners in a single thread.
//! `Shrc<T>` stands for: Shared Reference Counted.
//! `Shrc<T>` provides shared ownership of the data similar to `Rc<T>`, but a handle may also be empty, and
//! the value lives in a separate allocation from the control block holding the reference counts.
//!
//! The value is dropped exactly once, when the last `Shrc<T>` pointing at it is released. The control block
//! is freed exactly once, when both the strong and the weak count have reached zero, whichever kind of
//! handle goes last.
//!
//! A cycle between `Shrc` pointers cannot be deallocated as the reference counts will never reach zero. The solution is a `Weak<T>`.
//! A `Weak<T>` is a non-owning reference to the data held by a `Shrc<T>`.
//! They break reference cycles by adding a layer of indirection and act as an observer. They cannot access the data directly, and
//! must be promoted back into a `Shrc<T>`. `Weak<T>` does not keep the value alive, and only keeps the control block alive.
//!
//! The counts are not atomic. Neither handle type is [`Send`] or [`Sync`].
//!
//! Lifecycle events (control block allocated, value dropped, control block freed) are reported through
//! the [`log`] facade at trace level with the target `shrc`.

mod internal;
pub mod shrc;
pub mod weak;

pub use crate::shrc::make_shared;
pub use crate::shrc::Shrc;
pub use crate::weak::Weak;
