use core::{
    borrow::Borrow,
    fmt::{Debug, Display, Pointer},
    hash::{Hash, Hasher},
    marker::PhantomData,
    mem::ManuallyDrop,
    ops::Deref,
    panic::{RefUnwindSafe, UnwindSafe},
    ptr::{self, NonNull},
};

use crate::internal::{deallocate, ShrcInternal};
use crate::weak::Weak;

/// `Shrc` is a heap-allocated smart pointer for single-threaded shared ownership.
/// `Shrc` stands for: Shared Reference Counted.
///
/// Every `Shrc<T>` pointing at the same value shares one control block that holds the strong count,
/// the weak count and a pointer to the value. The value and the control block are two separate
/// heap allocations: the value is dropped as soon as the last `Shrc<T>` is released, while the
/// control block survives for as long as any [`Weak<T>`] still observes it.
///
/// Unlike [`std::rc::Rc`], a `Shrc<T>` may be empty. An empty `Shrc<T>` has no control block; it
/// is what [`Shrc::empty`], [`Default`], [`Shrc::take`] on the source, [`Shrc::reset`] and a failed
/// [`Weak::lock`] leave behind. Check [`Shrc::is_empty`] or use [`Shrc::get`] before dereferencing
/// a handle that might be empty.
///
/// ## Clone behavior
/// Cloning a `Shrc<T>` increments the strong count and returns a handle to the same control block.
/// [`Clone::clone_from`] releases the current value first, and is a no-op when both handles already
/// share a control block.
///
/// ## Drop behavior
/// When a `Shrc<T>` is dropped the strong count is decremented. If it reaches zero the value is
/// detached from the control block and dropped. If the weak count is zero as well, the control block
/// is freed too; otherwise the last [`Weak<T>`] to be dropped frees it.
///
/// ## [`Deref`] behavior
/// `Shrc<T>` dereferences to `&T`. Dereferencing an empty `Shrc<T>` panics.
/// To prevent name clashes, `Shrc<T>`'s functions are associated.
///
/// `Shrc<T>` is neither [`Send`] nor [`Sync`]: the counts are not synchronized.
///
/// ## Examples
///
/// ```
/// use shrc::Shrc;
///
/// let s1 = Shrc::new(100);
/// assert_eq!(Shrc::strong_count(&s1), 1);
///
/// let s2 = s1.clone();
/// assert_eq!(Shrc::strong_count(&s1), 2);
/// assert_eq!(*s2, 100);
///
/// let weak = Shrc::downgrade(&s1);
/// drop(s1);
/// drop(s2);
/// assert!(shrc::Weak::expired(&weak));
/// ```
pub struct Shrc<T: ?Sized> {
    shared: Option<NonNull<ShrcInternal<T>>>,
    phantom: PhantomData<ShrcInternal<T>>,
}

impl<T> Shrc<T> {
    /// Creates a new `Shrc<T>` owning `value`. The value is moved to the heap and a fresh
    /// control block is allocated for it.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(100);
    /// assert_eq!(*shrc, 100);
    /// ```
    #[inline]
    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Creates a new cyclic `Shrc<T>`. The closure receives a `Weak<T>` pointing at the allocation
    /// under construction, so that `T` can keep a non-owning reference to itself.
    /// The `Weak<T>` is expired until this function returns.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// struct Node {
    ///     me: Weak<Node>,
    /// }
    ///
    /// let node = Shrc::new_cyclic(|me| {
    ///     assert!(Weak::expired(me));
    ///     Node { me: me.clone() }
    /// });
    /// assert!(Shrc::ptr_eq(&node, &Weak::lock(&node.me)));
    /// ```
    pub fn new_cyclic<F>(data_fn: F) -> Self
    where
        F: FnOnce(&Weak<T>) -> T,
    {
        let shared = ShrcInternal::allocate_pending();

        // Holds the pending allocation's only weak unit; frees it if `data_fn` panics.
        let weak = Weak::from_inner(shared);
        let data = data_fn(&weak);

        let inner = unsafe { shared.as_ref() };
        inner.data.set(Some(NonNull::from(Box::leak(Box::new(data)))));
        inner.strongcount.set(1);
        drop(weak);

        Shrc {
            shared: Some(shared),
            phantom: PhantomData,
        }
    }

    /// Returns the inner value if this is the only strong reference.
    /// Otherwise, an [`Err`] is returned with the same `Shrc` that was passed in.
    /// Outstanding weak references do not prevent this and become expired.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(String::from("value"));
    /// let other = shrc.clone();
    /// let shrc = Shrc::try_unwrap(shrc).unwrap_err();
    /// drop(other);
    /// assert_eq!(Shrc::try_unwrap(shrc).ok().as_deref(), Some("value"));
    /// ```
    pub fn try_unwrap(this: Self) -> Result<T, Self> {
        let Some(shared) = this.shared else {
            return Err(this);
        };
        let inner = unsafe { shared.as_ref() };
        if inner.strongcount.get() != 1 {
            return Err(this);
        }
        let Some(data) = inner.data.take() else {
            return Err(this);
        };

        let _this = ManuallyDrop::new(this);
        inner.strongcount.set(0);
        if inner.weakcount.get() == 0 {
            unsafe { deallocate(shared) };
        }

        let value = unsafe { Box::from_raw(data.as_ptr()) };
        Ok(*value)
    }

    /// Returns the inner value if this is the only strong reference. Otherwise the `Shrc` is
    /// dropped and [`None`] is returned. If every owner calls `into_inner`, exactly one of them
    /// receives the value.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let x = Shrc::new(3);
    /// let y = x.clone();
    /// assert_eq!(Shrc::into_inner(x), None);
    /// assert_eq!(Shrc::into_inner(y), Some(3));
    /// ```
    #[inline]
    pub fn into_inner(this: Self) -> Option<T> {
        Shrc::try_unwrap(this).ok()
    }

    /// Releases the current value like [`Shrc::reset`], then takes ownership of `value` with a
    /// fresh control block.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(1);
    /// let weak = Shrc::downgrade(&shrc);
    /// Shrc::reset_with(&mut shrc, 2);
    /// assert!(shrc::Weak::expired(&weak));
    /// assert_eq!(*shrc, 2);
    /// ```
    #[inline]
    pub fn reset_with(this: &mut Self, value: T) {
        Shrc::reset(this);
        *this = Shrc::new(value);
    }

    /// Gets the raw pointer to the value, or a null pointer if the handle is empty or the
    /// value is gone.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(100);
    /// assert_eq!(unsafe { *Shrc::as_ptr(&shrc) }, 100);
    /// assert!(Shrc::as_ptr(&Shrc::<i32>::empty()).is_null());
    /// ```
    #[inline]
    pub fn as_ptr(this: &Self) -> *const T {
        Shrc::get(this).map_or(ptr::null(), |value| value as *const T)
    }
}

impl<T: ?Sized> Shrc<T> {
    /// Creates an empty `Shrc<T>` with no control block.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::<i32>::empty();
    /// assert!(Shrc::is_empty(&shrc));
    /// assert_eq!(Shrc::strong_count(&shrc), 0);
    /// ```
    #[inline]
    pub const fn empty() -> Self {
        Shrc {
            shared: None,
            phantom: PhantomData,
        }
    }

    /// Takes ownership of a boxed value. This allocates only the control block.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc: Shrc<str> = Shrc::from_box(Box::from("boxed"));
    /// assert_eq!(&*shrc, "boxed");
    /// ```
    #[inline]
    pub fn from_box(value: Box<T>) -> Self {
        Shrc {
            shared: Some(ShrcInternal::allocate(NonNull::from(Box::leak(value)))),
            phantom: PhantomData,
        }
    }

    /// Takes ownership of a raw pointer. A null pointer yields an empty `Shrc<T>`.
    ///
    /// # Safety
    /// A non-null `raw` must come from [`Box::into_raw`] and must not be owned by anything else.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let raw = Box::into_raw(Box::new(5));
    /// let shrc = unsafe { Shrc::from_raw(raw) };
    /// assert_eq!(*shrc, 5);
    ///
    /// let shrc = unsafe { Shrc::<i32>::from_raw(std::ptr::null_mut()) };
    /// assert!(Shrc::is_empty(&shrc));
    /// ```
    #[inline]
    pub unsafe fn from_raw(raw: *mut T) -> Self {
        match NonNull::new(raw) {
            Some(data) => Shrc {
                shared: Some(ShrcInternal::allocate(data)),
                phantom: PhantomData,
            },
            None => Shrc::empty(),
        }
    }

    /// Promotion constructor: attaches to an existing control block and increments its strong count.
    /// The caller must have checked that the value is still alive.
    #[inline]
    pub(crate) fn from_inner(shared: NonNull<ShrcInternal<T>>) -> Self {
        unsafe { shared.as_ref() }.inc_strong();
        Shrc {
            shared: Some(shared),
            phantom: PhantomData,
        }
    }

    #[inline]
    fn inner(&self) -> Option<&ShrcInternal<T>> {
        self.shared.as_ref().map(|shared| unsafe { shared.as_ref() })
    }

    /// Returns `true` if this `Shrc<T>` has no control block.
    /// An attached `Shrc<T>` always keeps its value alive, so a non-empty handle can always be
    /// dereferenced.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(100);
    /// assert!(!Shrc::is_empty(&shrc));
    /// Shrc::reset(&mut shrc);
    /// assert!(Shrc::is_empty(&shrc));
    /// ```
    #[inline]
    pub fn is_empty(this: &Self) -> bool {
        this.shared.is_none()
    }

    /// Return the strong count of the object, which is how many `Shrc<T>`s point to the value.
    /// Returns 0 for an empty handle.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(100);
    /// let _other = shrc.clone();
    /// assert_eq!(Shrc::strong_count(&shrc), 2);
    /// ```
    #[inline]
    pub fn strong_count(this: &Self) -> usize {
        this.inner().map_or(0, |inner| inner.strongcount.get())
    }

    /// Return the weak count of the object, which is how many `Weak<T>`s point to the control block.
    /// Returns 0 for an empty handle.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(100);
    /// let weak = Shrc::downgrade(&shrc);
    /// let _weak2 = weak.clone();
    /// assert_eq!(Shrc::weak_count(&shrc), 2);
    /// ```
    #[inline]
    pub fn weak_count(this: &Self) -> usize {
        this.inner().map_or(0, |inner| inner.weakcount.get())
    }

    /// Get a reference to the value, or [`None`] if the handle is empty.
    /// ```
    /// use shrc::Shrc;
    ///
    /// assert_eq!(Shrc::get(&Shrc::new(7)), Some(&7));
    /// assert_eq!(Shrc::get(&Shrc::<i32>::empty()), None);
    /// ```
    #[inline]
    pub fn get(this: &Self) -> Option<&T> {
        this.inner()?
            .data
            .get()
            .map(|data| unsafe { &*data.as_ptr() })
    }

    /// Get a &mut reference to the value if there are no other `Shrc` or [`Weak`] pointers to the same
    /// control block. Otherwise, return [`None`] because it would be unsound to mutate a shared value.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(100);
    /// *Shrc::get_mut(&mut shrc).unwrap() = 300;
    /// assert_eq!(*shrc, 300);
    ///
    /// let _weak = Shrc::downgrade(&shrc);
    /// assert!(Shrc::get_mut(&mut shrc).is_none());
    /// ```
    #[inline]
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        let inner = this.inner()?;
        if inner.strongcount.get() != 1 || inner.weakcount.get() != 0 {
            return None;
        }
        inner.data.get().map(|data| unsafe { &mut *data.as_ptr() })
    }

    /// Checks if the other `Shrc<T>` shares this one's control block. Two empty handles are equal.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc1 = Shrc::new(100);
    /// let shrc2 = shrc1.clone();
    /// assert!(Shrc::ptr_eq(&shrc1, &shrc2));
    /// assert!(!Shrc::ptr_eq(&shrc1, &Shrc::new(100)));
    /// ```
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.shared == other.shared
    }

    /// Moves the reference out of `this`, leaving it empty. No count changes.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(100);
    /// let moved = Shrc::take(&mut shrc);
    /// assert!(Shrc::is_empty(&shrc));
    /// assert_eq!(Shrc::strong_count(&moved), 1);
    /// ```
    #[inline]
    pub fn take(this: &mut Self) -> Self {
        Shrc {
            shared: this.shared.take(),
            phantom: PhantomData,
        }
    }

    /// Releases this reference and leaves the handle empty. Dropping the last strong reference
    /// drops the value.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(100);
    /// let other = shrc.clone();
    /// Shrc::reset(&mut shrc);
    /// assert_eq!(Shrc::strong_count(&other), 1);
    /// ```
    #[inline]
    pub fn reset(this: &mut Self) {
        this.release();
    }

    /// Create a `Weak<T>` from a `Shrc<T>`. This increments the weak count.
    /// Downgrading an empty `Shrc<T>` gives an empty `Weak<T>`.
    /// ```
    /// use shrc::{Shrc, Weak};
    ///
    /// let shrc = Shrc::new(100);
    /// let weak = Shrc::downgrade(&shrc);
    /// assert!(!Weak::expired(&weak));
    /// ```
    #[inline]
    pub fn downgrade(this: &Self) -> Weak<T> {
        match this.shared {
            Some(shared) => {
                unsafe { shared.as_ref() }.inc_weak();
                Weak::from_inner(shared)
            }
            None => Weak::new(),
        }
    }

    fn release(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        let inner = unsafe { shared.as_ref() };
        let strong = inner.strongcount.get() - 1;
        inner.strongcount.set(strong);
        if strong != 0 {
            return;
        }

        // The value's destructor may drop weak handles to this same block, so hold a weak
        // unit until it has run. Dropping `keepalive` frees the block if nothing else observes it.
        inner.inc_weak();
        let keepalive = Weak::from_inner(shared);
        if let Some(data) = inner.data.take() {
            log::trace!(target: "shrc", "dropping value of control block {:p}", shared);
            drop(unsafe { Box::from_raw(data.as_ptr()) });
        }
        drop(keepalive);
    }
}

impl<T: Clone> Shrc<T> {
    /// If we have the only strong reference to `T`, then unwrap it. Otherwise, clone `T` and return the clone.
    ///
    /// # Panics
    /// Panics if `this` is empty.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(String::from("Shrc"));
    /// let shrc2 = shrc.clone();
    /// assert_eq!(Shrc::unwrap_or_clone(shrc), "Shrc");
    /// assert_eq!(Shrc::unwrap_or_clone(shrc2), "Shrc");
    /// ```
    #[inline]
    pub fn unwrap_or_clone(this: Self) -> T {
        Shrc::try_unwrap(this).unwrap_or_else(|shrc| (*shrc).clone())
    }
}

/// Creates a `Shrc<T>` owning `value`. The value and the control block are separate allocations.
/// ```
/// use shrc::{make_shared, Shrc};
///
/// let shrc = make_shared(vec![1, 2, 3]);
/// assert_eq!(shrc.len(), 3);
/// assert_eq!(Shrc::strong_count(&shrc), 1);
/// ```
#[inline]
pub fn make_shared<T>(value: T) -> Shrc<T> {
    Shrc::new(value)
}

impl<T: ?Sized> Deref for Shrc<T> {
    type Target = T;

    /// Get an immutable reference to the value.
    ///
    /// # Panics
    /// Panics if the handle is empty.
    #[inline]
    fn deref(&self) -> &Self::Target {
        match Shrc::get(self) {
            Some(value) => value,
            None => panic!("Dereferenced an empty `Shrc`."),
        }
    }
}

impl<T: ?Sized> Drop for Shrc<T> {
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: ?Sized> Clone for Shrc<T> {
    /// Clone a `Shrc<T>` (increment the strong count).
    /// It will panic if the strong count overflows.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::new(100);
    /// let shrc2 = shrc.clone();
    /// assert_eq!(Shrc::strong_count(&shrc), Shrc::strong_count(&shrc2));
    /// ```
    #[inline]
    fn clone(&self) -> Self {
        if let Some(inner) = self.inner() {
            inner.inc_strong();
        }
        Shrc {
            shared: self.shared,
            phantom: PhantomData,
        }
    }

    /// Release the current reference, then share `source`'s control block.
    /// Nothing happens if both already share one.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let mut shrc = Shrc::new(1);
    /// let alias = shrc.clone();
    /// shrc.clone_from(&alias);
    /// assert_eq!(Shrc::strong_count(&shrc), 2);
    /// ```
    #[inline]
    fn clone_from(&mut self, source: &Self) {
        if Shrc::ptr_eq(self, source) {
            return;
        }
        self.release();
        if let Some(inner) = source.inner() {
            inner.inc_strong();
        }
        self.shared = source.shared;
    }
}

impl<T: ?Sized> Default for Shrc<T> {
    /// An empty `Shrc<T>`.
    #[inline]
    fn default() -> Self {
        Shrc::empty()
    }
}

impl<T: ?Sized> AsRef<T> for Shrc<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: ?Sized> Borrow<T> for Shrc<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T: ?Sized + Display> Display for Shrc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match Shrc::get(self) {
            Some(value) => Display::fmt(value, f),
            None => f.write_str("(empty)"),
        }
    }
}

impl<T: ?Sized + Debug> Debug for Shrc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match Shrc::get(self) {
            Some(value) => Debug::fmt(value, f),
            None => f.write_str("(empty)"),
        }
    }
}

impl<T: ?Sized> Pointer for Shrc<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match Shrc::get(self) {
            Some(value) => Pointer::fmt(&(value as *const T), f),
            None => Pointer::fmt(&ptr::null::<u8>(), f),
        }
    }
}

impl<T> From<T> for Shrc<T> {
    /// Create a new `Shrc<T>` from the provided data. This is equivalent to calling `Shrc::new` on the same data.
    /// ```
    /// use shrc::Shrc;
    ///
    /// let shrc = Shrc::from(100);
    /// assert_eq!(*shrc, 100);
    /// ```
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> From<Box<T>> for Shrc<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T: ?Sized + Hash> Hash for Shrc<T> {
    /// Pass the value to the provided hasher. An empty handle hashes nothing.
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        if let Some(value) = Shrc::get(self) {
            value.hash(state);
        }
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Shrc<T> {
    /// Equality by value, even if the values are in different allocations.
    /// Empty handles are equal to each other and to nothing else.
    /// ```
    /// use shrc::Shrc;
    ///
    /// assert!(Shrc::new(100) == Shrc::new(100));
    /// assert!(Shrc::new(100) != Shrc::new(200));
    /// assert!(Shrc::<i32>::empty() == Shrc::empty());
    /// ```
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Shrc::get(self) == Shrc::get(other)
    }
}

impl<T: ?Sized + Eq> Eq for Shrc<T> {}

impl<T: ?Sized + PartialOrd> PartialOrd for Shrc<T> {
    /// Partial comparison by value. An empty handle orders before every non-empty one.
    /// ```
    /// use shrc::Shrc;
    /// use std::cmp::Ordering;
    ///
    /// let shrc1 = Shrc::from(100);
    /// let shrc2 = Shrc::from(200);
    /// assert_eq!(Some(Ordering::Less), shrc1.partial_cmp(&shrc2));
    /// assert!(Shrc::empty() < shrc1);
    /// ```
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Shrc::get(self).partial_cmp(&Shrc::get(other))
    }
}

impl<T: ?Sized + Ord> Ord for Shrc<T> {
    /// Comparison by value, with empty handles first.
    #[inline]
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        Shrc::get(self).cmp(&Shrc::get(other))
    }
}

impl<T: ?Sized + RefUnwindSafe> UnwindSafe for Shrc<T> {}
