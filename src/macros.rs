/// Similar to `info!` macro in tracing.
/// You can pass in the starting time and it will print how long it took from starting time to now.
/// ```
/// use chrono::Local;
/// use liftscrape::info_time;
///
/// info_time!("str {}, {}", 1, 2);
/// let time = Local::now();
/// info_time!(time, "str {}, {}", 1, 2);
/// ```
#[macro_export]
macro_rules! info_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = ::chrono::Local::now();
        let res = format!("{:<30} : {}", local_now, format!($strfm, $($arg),*));
        println!("{}", res);
    }};
    ($time:expr, $strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = ::chrono::Local::now();
        let res = format!(
            "{:<30} : {}\nRUNTIME: {} sec",
            local_now,
            format!($strfm, $($arg),*),
            $crate::macros::elapsed_secs($time, local_now)
        );
        println!("{}", res);
    }};
}

/// Same as [`info_time!`] but for skips and failures. Goes to stderr.
#[macro_export]
macro_rules! warn_time {
    ($strfm:literal $(,)? $($arg:expr),*) => {{
        let local_now = ::chrono::Local::now();
        let res = format!("{:<30} : WARN {}", local_now, format!($strfm, $($arg),*));
        eprintln!("{}", res);
    }};
}

#[doc(hidden)]
pub fn elapsed_secs(
    start: chrono::DateTime<chrono::Local>,
    now: chrono::DateTime<chrono::Local>,
) -> f64 {
    (now - start)
        .num_microseconds()
        .map(|n| n as f64 / 1_000_000.0)
        .unwrap_or(0.0)
}
