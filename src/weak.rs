use core::{fmt::Debug, ptr::NonNull};

use crate::internal::{deallocate, ShrcInternal};
use crate::shrc::Shrc;

/// `Weak<T>` is a non-owning reference to a `Shrc<T>`'s value. It is used to observe a value, or to
/// break reference cycles which would otherwise keep memory alive forever.
/// `Weak<T>` does not keep the value alive, it only keeps the control block alive. `Weak<T>` cannot
/// access the value directly, and must be promoted to a `Shrc<T>` with [`Weak::lock`] or
/// [`Weak::upgrade`] to do so. Promotion fails once every `Shrc<T>` has been released.
///
/// A `Weak<T>` may be empty, like one made by [`Weak::new`]. An empty `Weak<T>` is always expired.
///
/// To prevent name clashes, `Weak<T>`'s functions are associated.
///
/// # Examples
///
/// ```
/// use shrc::{Shrc, Weak};
///
/// let shrc = Shrc::new(100);
/// let weak = Shrc::downgrade(&shrc);
/// let new_shrc = Weak::upgrade(&weak).unwrap();
/// assert_eq!(*new_shrc, 100);
///
/// drop(shrc);
/// drop(new_shrc);
/// assert!(Weak::expired(&weak));
/// assert!(Shrc::is_empty(&Weak::lock(&weak)));
/// ```
pub struct Weak<T: ?Sized> {
    shared: Option<NonNull<ShrcInternal<T>>>,
}

impl<T: ?Sized> Weak<T> {
    /// Creates an empty `Weak<T>` with no control block. It is always expired.
    /// ```
    /// use shrc::Weak;
    ///
    /// let weak = Weak::<i32>::new();
    /// assert!(Weak::expired(&weak));
    /// assert!(Weak::upgrade(&weak).is_none());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Weak { shared: None }
    }

    /// Adopts one already-counted weak unit of `shared`.
    #[inline]
    pub(crate) fn from_inner(shared: NonNull<ShrcInternal<T>>) -> Self {
        Weak {
            shared: Some(shared),
        }
    }

    #[inline]
    fn inner(&self) -> Option<&ShrcInternal<T>> {
        self.shared.as_ref().map(|shared| unsafe { shared.as_ref() })
    }

    /// Returns `true` if this `Weak<T>` has no control block.
    #[inline]
    pub fn is_empty(this: &Self) -> bool {
        this.shared.is_none()
    }

    /// Returns `true` if the value has been dropped, or if this `Weak<T>` is empty.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let weak = Shrc::downgrade(&shrc);
    /// assert!(!Weak::expired(&weak));
    /// drop(shrc);
    /// assert!(Weak::expired(&weak));
    /// ```
    #[inline]
    pub fn expired(this: &Self) -> bool {
        this.inner().map_or(true, |inner| inner.strongcount.get() == 0)
    }

    /// Create a `Shrc<T>` from a `Weak<T>`. Because `Weak<T>` does not own the value, it might have been
    /// dropped already. If it has, an empty `Shrc<T>` is returned. Otherwise the strong count is
    /// incremented and the returned `Shrc<T>` keeps the value alive.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let weak = Shrc::downgrade(&shrc);
    /// let locked = Weak::lock(&weak);
    /// assert_eq!(Shrc::strong_count(&locked), 2);
    /// ```
    #[inline]
    pub fn lock(this: &Self) -> Shrc<T> {
        match this.shared {
            Some(shared) if !Weak::expired(this) => Shrc::from_inner(shared),
            _ => Shrc::empty(),
        }
    }

    /// Like [`Weak::lock`], but returns [`None`] instead of an empty `Shrc<T>`.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100i32);
    /// let weak = Shrc::downgrade(&shrc);
    /// let new_shrc = Weak::upgrade(&weak).expect("Value was dropped");
    /// drop(weak);
    /// assert_eq!(*new_shrc, 100i32);
    /// ```
    #[inline]
    pub fn upgrade(this: &Self) -> Option<Shrc<T>> {
        let shrc = Weak::lock(this);
        if Shrc::is_empty(&shrc) {
            None
        } else {
            Some(shrc)
        }
    }

    /// Return the strong count of the object: how many `Shrc<T>`s keep the value alive.
    /// Returns 0 for an empty `Weak<T>`.
    #[inline]
    pub fn strong_count(this: &Self) -> usize {
        this.inner().map_or(0, |inner| inner.strongcount.get())
    }

    /// Return the weak count of the object, including this `Weak<T>`.
    /// Returns 0 for an empty `Weak<T>`.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let weak = Shrc::downgrade(&shrc);
    /// drop(shrc);
    /// assert_eq!(Weak::weak_count(&weak), 1);
    /// assert_eq!(Weak::strong_count(&weak), 0);
    /// ```
    #[inline]
    pub fn weak_count(this: &Self) -> usize {
        this.inner().map_or(0, |inner| inner.weakcount.get())
    }

    /// Checks if the other `Weak<T>` observes the same control block. Two empty handles are equal.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.shared == other.shared
    }

    /// Moves the reference out of `this`, leaving it empty. No count changes.
    #[inline]
    pub fn take(this: &mut Self) -> Self {
        Weak {
            shared: this.shared.take(),
        }
    }

    /// Releases this reference and leaves the handle empty.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let mut weak = Shrc::downgrade(&shrc);
    /// Weak::reset(&mut weak);
    /// assert!(Weak::is_empty(&weak));
    /// assert_eq!(Shrc::weak_count(&shrc), 0);
    /// ```
    #[inline]
    pub fn reset(this: &mut Self) {
        this.release();
    }

    /// Releases the current reference, then observes `strong`'s control block.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let first = Shrc::new(1);
    /// let second = Shrc::new(2);
    /// let mut weak = Shrc::downgrade(&first);
    /// Weak::assign(&mut weak, &second);
    /// assert_eq!(Shrc::weak_count(&first), 0);
    /// assert_eq!(*Weak::lock(&weak), 2);
    /// ```
    #[inline]
    pub fn assign(this: &mut Self, strong: &Shrc<T>) {
        this.release();
        *this = Shrc::downgrade(strong);
    }

    /// Exchanges the control blocks of two `Weak<T>`s. No count changes.
    #[inline]
    pub fn swap(this: &mut Self, other: &mut Self) {
        core::mem::swap(&mut this.shared, &mut other.shared);
    }

    fn release(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        let inner = unsafe { shared.as_ref() };
        inner.weakcount.set(inner.weakcount.get() - 1);
        if inner.is_unreferenced() {
            unsafe { deallocate(shared) };
        }
    }
}

impl<T: ?Sized> Drop for Weak<T> {
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: ?Sized> Clone for Weak<T> {
    /// Clone a `Weak<T>` (increment the weak count).
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let weak1 = Shrc::downgrade(&shrc);
    /// let weak2 = weak1.clone();
    /// assert_eq!(Shrc::weak_count(&shrc), 2);
    /// ```
    #[inline]
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.inc_weak();
        }
        Weak {
            shared: self.shared,
        }
    }

    #[inline]
    fn clone_from(&mut self, source: &Self) {
        if Weak::ptr_eq(self, source) {
            return;
        }
        self.release();
        if let Some(inner) = source.inner() {
            inner.inc_weak();
        }
        self.shared = source.shared;
    }
}

impl<T: ?Sized> Default for Weak<T> {
    #[inline]
    fn default() -> Self {
        Weak::new()
    }
}

impl<T: ?Sized> From<&Shrc<T>> for Weak<T> {
    fn from(value: &Shrc<T>) -> Self {
        Shrc::downgrade(value)
    }
}

impl<T: ?Sized> Debug for Weak<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("(Weak)")
    }
}
