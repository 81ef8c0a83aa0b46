//! Result type definition and extension traits.
//!
//! Provides combinators for Result types so callers can handle errors
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for Botline operations.
///
/// All fallible operations return this type.
/// Use the `?` operator, `match`, or combinator methods to handle results.
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait providing safe combinators for Results.
pub trait ResultExt<T> {
    /// Convert a Result to an Option, logging the error if present.
    fn into_option_logged(self) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn into_option_logged(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Operation failed: {}", e);
                None
            }
        }
    }
}

/// Extension trait for Option types.
pub trait OptionExt<T> {
    /// Convert `None` into a bot-not-found error for the given id.
    ///
    /// # Errors
    ///
    /// Returns `Error::BotNotFound` when the option is empty.
    fn or_bot_not_found(self, bot_id: impl ToString) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_bot_not_found(self, bot_id: impl ToString) -> Result<T> {
        self.ok_or_else(|| Error::bot_not_found(bot_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_into_option_ok() {
        let result: Result<i32> = Ok(42);
        assert_eq!(result.into_option_logged(), Some(42));
    }

    #[test]
    fn test_result_into_option_err() {
        let result: Result<i32> = Err(Error::invalid_state("test"));
        assert_eq!(result.into_option_logged(), None);
    }

    #[test]
    fn test_or_bot_not_found() {
        let found: Option<i32> = Some(1);
        assert!(found.or_bot_not_found("bot-1").is_ok());

        let missing: Option<i32> = None;
        let result = missing.or_bot_not_found("bot-1");
        assert!(matches!(result, Err(Error::BotNotFound { bot_id }) if bot_id == "bot-1"));
    }
}
