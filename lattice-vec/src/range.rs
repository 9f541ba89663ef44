//! Integer range types for size/capacity fields.
//!
//! Choosing a narrower range shrinks the container footprint: a `Vector`
//! with a `usize` range is 24 bytes, with a `u32` range 16 bytes. The
//! `Tiny*` aliases pick `u32`.

/// An unsigned integer type used for a container's size and capacity fields.
///
/// # Example
///
/// ```
/// use lattice_vec::Range;
///
/// assert_eq!(u32::from_usize(5).as_usize(), 5);
/// assert_eq!(<u32 as Range>::MAX_USIZE, u32::MAX as usize);
/// ```
pub trait Range: Copy + Eq + Ord + Default + core::fmt::Debug + 'static {
    /// Largest size/capacity this range can represent.
    const MAX_USIZE: usize;

    /// Converts from `usize`.
    ///
    /// The value must not exceed [`MAX_USIZE`](Self::MAX_USIZE); containers
    /// check this before growing.
    fn from_usize(value: usize) -> Self;

    /// Converts to `usize`.
    fn as_usize(self) -> usize;
}

macro_rules! impl_range_for_unsigned {
    ($($ty:ty),*) => {
        $(
            impl Range for $ty {
                const MAX_USIZE: usize = <$ty>::MAX as usize;

                #[inline]
                fn from_usize(value: usize) -> Self {
                    debug_assert!(value <= Self::MAX_USIZE);
                    value as $ty
                }

                #[inline]
                fn as_usize(self) -> usize {
                    self as usize
                }
            }
        )*
    };
}

impl_range_for_unsigned!(u16, u32, usize);
