use core::{
    alloc::Layout,
    fmt, mem,
    ops::{Deref, DerefMut, Index, IndexMut},
    ptr, slice,
    slice::SliceIndex,
};
use std::alloc::handle_alloc_error;

use log::trace;

use crate::{
    constants::grown_capacity,
    error::{AllocError, Error, Result},
    global::Global,
    raw::RawStorage,
    traits::Allocator,
};

/// A contiguous growable array type, written as `Vector<T>`.
///
/// A `Vector` owns one [`RawStorage`] block and a length. Slots `[0, len)` hold
/// live values; slots `[len, capacity)` are uninitialized.
///
/// Every operation that needs memory returns a [`Result`] instead of
/// aborting, and leaves the vector as it was when the allocation fails.
/// Values are constructed through closures (`emplace`, `resize_with`) or
/// the `Default` and `Clone` impls of `T`; if one of those panics, the
/// vector drops whatever it had constructed for the call and stays valid.
///
/// # Invalidation
///
/// Any operation that may reallocate (`reserve`, `resize`, `insert`,
/// `emplace`, `push_back`, `emplace_back`, `try_clone_from`) or shift
/// elements (`insert`, `emplace`, `erase`) invalidates raw pointers
/// previously obtained from `as_ptr`, `as_ptr_range`, and friends.
///
/// ```
/// use stowage_alloc::Vector;
///
/// let mut v = Vector::new();
/// v.push_back(1)?;
/// v.push_back(2)?;
/// v.insert(1, 5)?;
/// assert_eq!(v, [1, 5, 2]);
///
/// assert_eq!(v.erase(0)?, 1);
/// assert_eq!(v.pop_back(), Some(2));
/// assert_eq!(v, [5]);
/// # Ok::<(), stowage_alloc::Error>(())
/// ```
pub struct Vector<T, A: Allocator = Global> {
    buf: RawStorage<T, A>,
    len: usize,
}

/// Moves `count` live values from `src` into the unrelated block at `dst`.
///
/// A Rust move is a bitwise copy that cannot fail and needs nothing from
/// `T`, so every growth path relocates this way. The source slots are
/// uninitialized afterwards.
///
/// ## Safety
/// - `src..src + count` must hold live values.
/// - `dst..dst + count` must be uninitialized slots of a different block.
#[inline]
unsafe fn relocate<T>(src: *const T, dst: *mut T, count: usize) {
    ptr::copy_nonoverlapping(src, dst, count);
}

/// A run of values written into consecutive slots.
///
/// If the run is dropped (e.g. while unwinding from a panicking constructor)
/// it drops the values written so far. `commit` hands them to the caller.
struct PartialRun<T> {
    start: *mut T,
    written: usize,
}

impl<T> PartialRun<T> {
    fn new(start: *mut T) -> Self {
        Self { start, written: 0 }
    }

    /// ## Safety
    /// - The next slot must be uninitialized and inside the same block.
    unsafe fn push(&mut self, value: T) {
        self.start.add(self.written).write(value);
        self.written += 1;
    }

    /// Returns the number of values written. They are no longer dropped by
    /// the run.
    fn commit(self) -> usize {
        let written = self.written;
        mem::forget(self);
        written
    }
}

impl<T> Drop for PartialRun<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `written` values were written from `start`
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.start, self.written)) }
    }
}

/// Reports an error from an operation that has no way to return it.
#[cold]
fn handle_error(err: Error) -> ! {
    if let Error::Alloc(AllocError::OutOfMemory { size, align }) = err {
        if let Ok(layout) = Layout::from_size_align(size, align) {
            handle_alloc_error(layout);
        }
    }
    panic!("{err}");
}

impl<T> Vector<T> {
    /// Constructs a new, empty `Vector`. Does not allocate.
    pub const fn new() -> Self {
        Self {
            buf: RawStorage::new(),
            len: 0,
        }
    }

    /// Constructs an empty `Vector` with room for exactly `capacity` values.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::with_capacity_in(capacity, Global)
    }

    /// Constructs a `Vector` holding `len` default values, with a capacity
    /// of exactly `len`.
    ///
    /// If `T::default` panics, the values constructed so far are dropped and
    /// the block is freed before the panic continues.
    pub fn with_len(len: usize) -> Result<Self>
    where
        T: Default,
    {
        Self::with_len_in(len, Global)
    }

    /// Constructs a `Vector` holding clones of `items`, with a capacity of
    /// exactly `items.len()`.
    pub fn try_from_slice(items: &[T]) -> Result<Self>
    where
        T: Clone,
    {
        Self::try_from_slice_in(items, Global)
    }
}

impl<T, A: Allocator> Vector<T, A> {
    /// Constructs a new, empty `Vector` that allocates from `alloc`.
    /// Does not allocate.
    pub const fn new_in(alloc: A) -> Self {
        Self {
            buf: RawStorage::new_in(alloc),
            len: 0,
        }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        Ok(Self {
            buf: RawStorage::allocate_in(capacity, alloc)?,
            len: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of values the vector can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are live
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` slots are live
        unsafe { slice::from_raw_parts_mut(self.buf.as_mut_ptr(), self.len) }
    }

    /// Returns the last value, or `None` if the vector is empty.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Removes and returns the last value, or `None` if the vector is empty.
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: slot `len` was the last live slot and is now outside the
        // live range, so it is read exactly once
        Some(unsafe { self.buf.slot(self.len).read() })
    }

    /// Removes and returns the value at `index`, shifting everything after it
    /// one slot toward the front.
    ///
    /// After the call `index` addresses the value that followed the removed
    /// one (or the end, if it was last).
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index >= len`.
    pub fn erase(&mut self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }

        // SAFETY: `index < len`; the value is read out before its slot is
        // overwritten by the shift, and `len` shrinks by the one slot vacated
        unsafe {
            let slot = self.buf.slot(index);
            let value = slot.read();
            ptr::copy(slot.add(1), slot, self.len - index - 1);
            self.len -= 1;
            Ok(value)
        }
    }

    /// Drops every value past the first `len`. Does nothing if `len` is not
    /// less than the current length. Capacity is unchanged.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(self.buf.slot(len), self.len - len);
        // shrink first so a panicking `Drop` cannot cause a second drop
        self.len = len;
        // SAFETY: the tail was live and is now outside the live range
        unsafe { ptr::drop_in_place(tail) }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Exchanges contents, capacity, and allocator with `other`. Never
    /// allocates.
    pub fn swap(&mut self, other: &mut Self) {
        self.buf.swap(&mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
    }

    /// Move assignment: takes over the contents of `other` in O(1).
    ///
    /// Behaves exactly like [`swap`](Self::swap). The separate name marks call
    /// sites that assign rather than exchange; `other` receives this vector's
    /// previous contents and disposes of them when it is dropped or reused.
    /// To leave the source empty instead, use `mem::take`.
    pub fn move_from(&mut self, other: &mut Self) {
        self.swap(other);
    }
}

impl<T, A: Allocator + Clone> Vector<T, A> {
    /// Constructs a `Vector` holding `len` default values allocated from
    /// `alloc`, with a capacity of exactly `len`.
    pub fn with_len_in(len: usize, alloc: A) -> Result<Self>
    where
        T: Default,
    {
        let mut v = Self::with_capacity_in(len, alloc)?;
        v.resize_with(len, T::default)?;
        Ok(v)
    }

    pub fn try_from_slice_in(items: &[T], alloc: A) -> Result<Self>
    where
        T: Clone,
    {
        let mut v = Self::with_capacity_in(items.len(), alloc)?;
        // SAFETY: the block has exactly `items.len()` free slots
        unsafe { v.append_cloned(items) };
        Ok(v)
    }

    /// Clones each of `items` into the free slots after the live range.
    ///
    /// If a clone panics, the clones written so far are dropped and the
    /// length is unchanged.
    ///
    /// ## Safety
    /// - `capacity - len >= items.len()`.
    unsafe fn append_cloned(&mut self, items: &[T])
    where
        T: Clone,
    {
        let mut run = PartialRun::new(self.buf.slot(self.len));
        for item in items {
            run.push(item.clone());
        }
        self.len += run.commit();
    }

    /// Grows to at least `new_capacity` slots. Does nothing if the capacity is
    /// already at least `new_capacity`; otherwise the new capacity is exactly
    /// `new_capacity`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the block cannot be allocated. The vector is left
    /// unchanged.
    pub fn reserve(&mut self, new_capacity: usize) -> Result<()> {
        if new_capacity <= self.capacity() {
            return Ok(());
        }
        let mut new_buf = RawStorage::allocate_in(new_capacity, self.buf.allocator().clone())?;
        trace!(
            "reserving {} -> {} slots for {} values",
            self.capacity(),
            new_capacity,
            self.len
        );
        // SAFETY: the new block has room for every live value
        unsafe { relocate(self.buf.as_ptr(), new_buf.as_mut_ptr(), self.len) };
        // the old block now holds no live values and is freed as is
        self.buf.swap(&mut new_buf);
        Ok(())
    }

    /// Resizes to `new_len`, filling new slots with `T::default()` or
    /// dropping the excess tail.
    ///
    /// # Errors
    ///
    /// See [`resize_with`](Self::resize_with).
    pub fn resize(&mut self, new_len: usize) -> Result<()>
    where
        T: Default,
    {
        self.resize_with(new_len, T::default)
    }

    /// Resizes to `new_len`, filling new slots with values returned by `f` or
    /// dropping the excess tail.
    ///
    /// Growing reserves exactly `new_len` slots first. If `f` panics, the
    /// values it produced for this call are dropped and the length is
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err` if growing needs a block that cannot be allocated. The
    /// vector is left unchanged.
    pub fn resize_with<F>(&mut self, new_len: usize, mut f: F) -> Result<()>
    where
        F: FnMut() -> T,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }

        self.reserve(new_len)?;
        let mut run = PartialRun::new(self.buf.slot(self.len));
        for _ in self.len..new_len {
            // SAFETY: `reserve` made room for `new_len` values
            unsafe { run.push(f()) };
        }
        self.len += run.commit();
        Ok(())
    }

    /// Inserts `value` at `index`, shifting everything after it one slot
    /// toward the end. `index == len` appends.
    ///
    /// # Errors
    ///
    /// See [`emplace`](Self::emplace).
    pub fn insert(&mut self, index: usize, value: T) -> Result<&mut T> {
        self.emplace(index, || value)
    }

    /// Inserts the value returned by `f` at `index`, shifting everything after
    /// it one slot toward the end. `index == len` appends. Returns a reference
    /// to the new value.
    ///
    /// A full vector grows to twice its length (at least one slot). The new
    /// value is constructed in the new block before anything is moved, so if
    /// `f` panics or the allocation fails the vector is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] if `index > len`, or [`Error::Alloc`] if
    /// the vector is full and a larger block cannot be allocated.
    pub fn emplace<F>(&mut self, index: usize, f: F) -> Result<&mut T>
    where
        F: FnOnce() -> T,
    {
        if index > self.len {
            return Err(Error::OutOfBounds {
                index,
                len: self.len,
            });
        }

        if self.len == self.capacity() {
            self.grow_around(index, f)?;
        } else {
            let value = f();
            // SAFETY: there is a free slot at `len`, so `[index, len)` can
            // shift one slot toward the end before `index` is written
            unsafe {
                let slot = self.buf.slot(index);
                ptr::copy(slot, slot.add(1), self.len - index);
                slot.write(value);
            }
            self.len += 1;
        }

        // SAFETY: `index < len` now
        Ok(unsafe { &mut *self.buf.slot(index) })
    }

    /// Appends `value`.
    ///
    /// # Errors
    ///
    /// See [`emplace_back`](Self::emplace_back).
    pub fn push_back(&mut self, value: T) -> Result<&mut T> {
        self.emplace_back(|| value)
    }

    /// Appends the value returned by `f` and returns a reference to it.
    ///
    /// A full vector grows to twice its length (at least one slot). The new
    /// value is constructed in the new block before anything is moved, so if
    /// `f` panics or the allocation fails the vector is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the vector is full and a larger block cannot be
    /// allocated.
    pub fn emplace_back<F>(&mut self, f: F) -> Result<&mut T>
    where
        F: FnOnce() -> T,
    {
        let index = self.len;
        if index == self.capacity() {
            self.grow_around(index, f)?;
        } else {
            // SAFETY: slot `len` is free
            unsafe { self.buf.slot(index).write(f()) };
            self.len += 1;
        }

        // SAFETY: `index` is the last live slot
        Ok(unsafe { &mut *self.buf.slot(index) })
    }

    /// Moves into a block twice as large (at least one slot), with the value
    /// returned by `f` placed at `index` and the values from `index` onward
    /// one slot further along.
    fn grow_around<F>(&mut self, index: usize, f: F) -> Result<()>
    where
        F: FnOnce() -> T,
    {
        debug_assert!(index <= self.len);
        let capacity = grown_capacity(self.len)?;
        let mut new_buf: RawStorage<T, A> =
            RawStorage::allocate_in(capacity, self.buf.allocator().clone())?;
        trace!(
            "growing {} -> {} slots to insert at {}",
            self.capacity(),
            capacity,
            index
        );

        // SAFETY: the new block has `len + 1` or more slots. The new value is
        // written first; if `f` panics, only `new_buf` (with nothing live in
        // it) is dropped. The relocations cannot fail.
        unsafe {
            new_buf.slot(index).write(f());
            relocate(self.buf.slot(0), new_buf.slot(0), index);
            relocate(self.buf.slot(index), new_buf.slot(index + 1), self.len - index);
        }

        // the old block now holds no live values and is freed as is
        self.buf.swap(&mut new_buf);
        self.len += 1;
        Ok(())
    }

    /// Returns a copy of this vector in a clone of its allocator, with a
    /// capacity of exactly `len`.
    ///
    /// If a clone panics, the clones made so far are dropped and the new
    /// block is freed before the panic continues.
    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        self.try_clone_in(self.allocator().clone())
    }

    /// Returns a copy of this vector allocated from `alloc`, with a capacity
    /// of exactly `len`.
    pub fn try_clone_in<B: Allocator + Clone>(&self, alloc: B) -> Result<Vector<T, B>>
    where
        T: Clone,
    {
        Vector::try_from_slice_in(self.as_slice(), alloc)
    }

    /// Makes this vector a copy of `source`, reusing its block when it is
    /// large enough.
    ///
    /// - If `source` does not fit in the current capacity, a full copy is
    ///   built in a new block and swapped in. If that fails, by allocation
    ///   error or panic, `self` is unchanged.
    /// - Otherwise the overlapping prefix is assigned with `clone_from`,
    ///   then the excess tail is dropped or the missing suffix is cloned into
    ///   the free slots. If a clone panics here, `self` stays valid and
    ///   leak-free but may hold a mix of old and new values.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a new block is needed and cannot be allocated.
    pub fn try_clone_from<B: Allocator>(&mut self, source: &Vector<T, B>) -> Result<()>
    where
        T: Clone,
    {
        let source = source.as_slice();

        if source.len() > self.capacity() {
            let mut copy = Self::try_from_slice_in(source, self.allocator().clone())?;
            self.swap(&mut copy);
        } else if source.len() <= self.len {
            for (dst, src) in self.iter_mut().zip(source) {
                dst.clone_from(src);
            }
            self.truncate(source.len());
        } else {
            let (head, tail) = source.split_at(self.len);
            for (dst, src) in self.iter_mut().zip(head) {
                dst.clone_from(src);
            }
            // SAFETY: `source.len() <= capacity`, so the tail fits
            unsafe { self.append_cloned(tail) };
        }
        Ok(())
    }
}

impl<T, A: Allocator> Drop for Vector<T, A> {
    fn drop(&mut self) {
        // SAFETY: the first `len` slots are live; `buf` frees the block after
        unsafe { ptr::drop_in_place(self.as_mut_slice()) }
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => handle_error(err),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = self.try_clone_from(source) {
            handle_error(err);
        }
    }
}

impl<T, A: Allocator + Default> Default for Vector<T, A> {
    /// Constructs an empty `Vector`, so that `mem::take` moves the contents
    /// out and leaves an empty vector behind.
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, A: Allocator> Deref for Vector<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for Vector<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I: SliceIndex<[T]>, A: Allocator> Index<I> for Vector<T, A> {
    type Output = I::Output;

    #[inline]
    fn index(&self, index: I) -> &Self::Output {
        Index::index(self.as_slice(), index)
    }
}

impl<T, I: SliceIndex<[T]>, A: Allocator> IndexMut<I> for Vector<T, A> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: Allocator> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<T, U, A, B> PartialEq<Vector<U, B>> for Vector<T, A>
where
    T: PartialEq<U>,
    A: Allocator,
    B: Allocator,
{
    fn eq(&self, other: &Vector<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T, U, A: Allocator, const N: usize> PartialEq<[U; N]> for Vector<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T, U, A: Allocator> PartialEq<[U]> for Vector<T, A>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: Eq, A: Allocator> Eq for Vector<T, A> {}
