/// Logs a warning, but only the first time this exact message is produced
#[macro_export]
macro_rules! warn_once(
    ($($arg:tt)*) => ({
      let message = format!($($arg)*);
      if $crate::util::first_time(&message) {
        $crate::util::log_warning(&message);
      }
    })
);

/// Bails out with an `Error::Options`, which the binaries turn into exit code 2
#[macro_export]
macro_rules! options_error(
    ($($arg:tt)*) => ({
      return Err($crate::error::Error::Options(format!($($arg)*)));
    })
);
