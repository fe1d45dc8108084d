/// Integer conversion that is in range by construction.
///
/// Panics on overflow unless the `unsafe_conversions` feature is enabled,
/// in which case the check is skipped.
#[macro_export]
macro_rules! cast {
    ($ty:ty, $a:expr) => {
        if cfg!(feature = "unsafe_conversions") {
            unsafe { <$ty>::try_from($a).unwrap_unchecked() }
        } else {
            <$ty>::try_from($a).expect(concat!("value out of range for ", stringify!($ty)))
        }
    };
}

#[macro_export]
macro_rules! u8 {
    ($a:expr) => {
        $crate::cast!(u8, $a)
    };
}

#[macro_export]
macro_rules! u64 {
    ($a:expr) => {
        $crate::cast!(u64, $a)
    };
}

#[macro_export]
macro_rules! usize {
    ($a:expr) => {
        $crate::cast!(usize, $a)
    };
}
