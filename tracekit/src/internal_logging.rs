#![allow(unused_macros)]
//! Internal diagnostics for tracekit components.
//!
//! These macros are for use inside tracekit and its collaborator crates,
//! not for application logging. With the `internal-logs` feature enabled
//! they emit through [`tracing`]; in tests they print to stdout so
//! `--nocapture` shows them; otherwise they compile away entirely.

/// Log an internal warning.
///
/// # Fields:
/// - `name`: the operation or anomaly being reported.
/// - Additional optional key-value pairs can be passed as attributes.
#[macro_export]
macro_rules! tracekit_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(all(not(feature = "internal-logs"), test))]
        {
            println!("tracekit_warn: name={}", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(all(not(feature = "internal-logs"), test))]
        {
            print!("tracekit_warn: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            println!();
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}

/// Log an internal debug message.
///
/// # Fields:
/// - `name`: the operation being logged.
/// - Additional optional key-value pairs can be passed as attributes.
#[macro_export]
macro_rules! tracekit_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(all(not(feature = "internal-logs"), test))]
        {
            println!("tracekit_debug: name={}", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(all(not(feature = "internal-logs"), test))]
        {
            print!("tracekit_debug: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            println!();
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}
