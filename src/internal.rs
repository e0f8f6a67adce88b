use core::{cell::Cell, ptr::NonNull};

pub(crate) const MAX_REFCOUNT: usize = (isize::MAX) as usize;

/// The control block shared by every `Shrc<T>` and `Weak<T>` created from the same allocation.
///
/// The pointee lives in its own heap allocation; `data` is `None` once the last strong
/// reference has been released. Dropping the record never drops the pointee.
pub(crate) struct ShrcInternal<T: ?Sized> {
    pub(crate) strongcount: Cell<usize>,
    pub(crate) weakcount: Cell<usize>,
    pub(crate) data: Cell<Option<NonNull<T>>>,
}

#[cfg(test)]
std::thread_local! {
    static LIVE_BLOCKS: Cell<usize> = const { Cell::new(0) };
}

/// Number of control blocks allocated on this thread and not yet freed.
#[cfg(test)]
pub(crate) fn live_blocks() -> usize {
    LIVE_BLOCKS.with(Cell::get)
}

impl<T: ?Sized> ShrcInternal<T> {
    /// Allocate a control block owning `data`, accounted to one strong reference.
    #[inline]
    pub(crate) fn allocate(data: NonNull<T>) -> NonNull<Self> {
        Self::leak(ShrcInternal {
            strongcount: Cell::new(1),
            weakcount: Cell::new(0),
            data: Cell::new(Some(data)),
        })
    }

    /// Allocate a control block with no pointee yet, accounted to one weak reference.
    #[inline]
    pub(crate) fn allocate_pending() -> NonNull<Self> {
        Self::leak(ShrcInternal {
            strongcount: Cell::new(0),
            weakcount: Cell::new(1),
            data: Cell::new(None),
        })
    }

    fn leak(block: Self) -> NonNull<Self> {
        let block = NonNull::from(Box::leak(Box::new(block)));
        #[cfg(test)]
        LIVE_BLOCKS.with(|live| live.set(live.get() + 1));
        log::trace!(target: "shrc", "allocated control block {:p}", block);
        block
    }

    #[inline]
    pub(crate) fn inc_strong(&self) {
        let prev = self.strongcount.get();
        if prev >= MAX_REFCOUNT {
            panic!("Overflow of maximum strong reference count.");
        }
        self.strongcount.set(prev + 1);
    }

    #[inline]
    pub(crate) fn inc_weak(&self) {
        let prev = self.weakcount.get();
        if prev >= MAX_REFCOUNT {
            panic!("Overflow of maximum weak reference count.");
        }
        self.weakcount.set(prev + 1);
    }

    #[inline]
    pub(crate) fn is_unreferenced(&self) -> bool {
        self.strongcount.get() == 0 && self.weakcount.get() == 0
    }
}

/// Free a control block.
///
/// # Safety
/// Both counts of `block` must be zero, its pointee must already be gone, and no handle may
/// refer to it afterwards.
#[inline]
pub(crate) unsafe fn deallocate<T: ?Sized>(block: NonNull<ShrcInternal<T>>) {
    debug_assert!(unsafe { block.as_ref() }.is_unreferenced());
    log::trace!(target: "shrc", "freed control block {:p}", block);
    #[cfg(test)]
    LIVE_BLOCKS.with(|live| live.set(live.get() - 1));
    drop(unsafe { Box::from_raw(block.as_ptr()) });
}
