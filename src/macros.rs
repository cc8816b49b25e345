/// Asserts that two `f64` values differ by less than `prec`, using
/// [`numeric::almost_eq`](crate::numeric::almost_eq).
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {
        $crate::assert_almost_eq!($a, $b, $prec, "values differ")
    };
    ($a:expr, $b:expr, $prec:expr, $($msg:tt)+) => {{
        let (left, right): (f64, f64) = ($a, $b);
        if !$crate::numeric::almost_eq(left, right, $prec) {
            panic!(
                "assertion failed: `abs(left - right) < {:e}`, (left: `{}`, right: `{}`): {}",
                $prec,
                left,
                right,
                format_args!($($msg)+)
            );
        }
    }};
}
