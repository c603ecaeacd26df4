//! Bounded cause-chain search
//!
//! Framework layers and `anyhow` context wrap the error a handler raised.
//! [`find_cause`] walks the `source()` links looking for a concrete error type
//! and gives up after [`MAX_CAUSE_DEPTH`] errors, so malformed chains always
//! terminate.

use std::error::Error as StdError;

/// Maximum number of errors inspected, the top-level error included
pub const MAX_CAUSE_DEPTH: usize = 10;

/// Find the first error of type `T` in the cause chain of `top`
///
/// `top` itself is inspected first.
///
/// ```rust
/// use anyhow::Context;
/// use orz_web::api_error::ApiError;
/// use orz_web::chain::find_cause;
///
/// let err = Err::<(), _>(ApiError::new("1"))
///     .context("loading order")
///     .unwrap_err();
/// let top: &(dyn std::error::Error + 'static) = err.as_ref();
/// assert_eq!(find_cause::<ApiError>(top).map(|e| e.code()), Some("1"));
/// ```
pub fn find_cause<'a, T>(top: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    std::iter::successors(Some(top), |err| (*err).source())
        .take(MAX_CAUSE_DEPTH)
        .find_map(|err| err.downcast_ref::<T>())
}

/// [`find_cause`] for errors carried by `anyhow`
pub fn find_in_anyhow<T>(error: &anyhow::Error) -> Option<&T>
where
    T: StdError + 'static,
{
    let top: &(dyn StdError + 'static) = error.as_ref();
    find_cause(top)
}
