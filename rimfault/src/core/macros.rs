// SPDX-License-Identifier: MIT

//! Call-site macros.
//!
//! The `*_on!` reporters evaluate the condition once, format the message only when it
//! fired, and yield the condition so callers can branch on it.

#[macro_export]
macro_rules! fault_error_wiring {
    (
        str_into => [ $($str_tgt:ty),* $(,)? ] $(,)?   // &str -> each tgt::Other
    ) => {
        $(
            impl From<&'static str> for $str_tgt {
                #[inline]
                fn from(msg: &'static str) -> Self { <$str_tgt>::Other(msg) }
            }
        )*
    };
}

/// Reports a logic bug and terminates when `cond` holds.
#[macro_export]
macro_rules! fault_bug_on {
    ($cond:expr, $scope:expr, $($arg:tt)+) => {{
        if $cond {
            use $crate::core::escalate::Reporter as _;
            ($scope).report_logic_bug(format_args!($($arg)+));
        }
    }};
}

/// Reports an on-disk inconsistency when `cond` holds. Yields `cond`.
#[macro_export]
macro_rules! fault_inconsistent_on {
    ($cond:expr, $scope:expr, $($arg:tt)+) => {{
        let fired: bool = $cond;
        if fired {
            use $crate::core::escalate::Reporter as _;
            ($scope).report_inconsistent(format_args!($($arg)+));
        }
        fired
    }};
}

/// Reports a fatal error when `cond` holds. Yields `cond`.
#[macro_export]
macro_rules! fault_fatal_on {
    ($cond:expr, $scope:expr, $($arg:tt)+) => {{
        let fired: bool = $cond;
        if fired {
            use $crate::core::escalate::Reporter as _;
            ($scope).report_fatal(format_args!($($arg)+));
        }
        fired
    }};
}

/// Reports a non-fatal IO error on a device when `cond` holds. Yields `cond`.
///
/// The invocation site is the rate-limit key.
#[macro_export]
macro_rules! fault_io_on {
    ($cond:expr, $dev:expr, $($arg:tt)+) => {{
        let fired: bool = $cond;
        if fired {
            ($dev).report_nonfatal_io(format_args!($($arg)+));
        }
        fired
    }};
}

/// Reports a fatal IO error on a device when `cond` holds. Yields `cond`.
#[macro_export]
macro_rules! fault_fatal_io_on {
    ($cond:expr, $dev:expr, $($arg:tt)+) => {{
        let fired: bool = $cond;
        if fired {
            ($dev).report_fatal_io(format_args!($($arg)+));
        }
        fired
    }};
}

/// Negotiates an fsck issue in the given [`FixMode`](crate::fsck::FixMode).
///
/// Expands to a `FsckResult<bool>`: `Ok(true)` when the caller must apply the repair,
/// `Err(FsckAbort)` when the pass has to stop. Meant to be used with `?`.
#[macro_export]
macro_rules! fsck_err_on {
    ($cond:expr, $fsck:expr, $mode:expr, $($arg:tt)+) => {
        ($fsck).negotiate_mode($cond, $mode, format_args!($($arg)+))
    };
}
