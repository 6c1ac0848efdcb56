use std::fmt;
use std::str::FromStr;

/// A high-level command produced by buttons, keys or the CLI script.
///
/// The session consumes actions, never raw key codes, so every front end
/// drives navigation the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NextStep,
    PreviousStep,
    /// Jump to a 0-based step index.
    GoTo(usize),
    /// Restore the current model's default transform.
    ResetObject,
    /// No-op (used for input mapping that hasn't been bound yet).
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("unknown action '{0}'")]
    Unknown(String),
    #[error("invalid step index '{0}'")]
    BadIndex(String),
}

impl FromStr for Action {
    type Err = ActionParseError;

    /// Accepts `next`, `prev`/`previous`, `goto:N`, `reset` and `noop`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        if let Some(index) = word.strip_prefix("goto:") {
            return index
                .parse()
                .map(Action::GoTo)
                .map_err(|_| ActionParseError::BadIndex(index.to_string()));
        }
        match word.as_str() {
            "next" => Ok(Action::NextStep),
            "prev" | "previous" => Ok(Action::PreviousStep),
            "reset" => Ok(Action::ResetObject),
            "noop" => Ok(Action::Noop),
            _ => Err(ActionParseError::Unknown(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::NextStep => f.write_str("next"),
            Action::PreviousStep => f.write_str("prev"),
            Action::GoTo(i) => write!(f, "goto:{i}"),
            Action::ResetObject => f.write_str("reset"),
            Action::Noop => f.write_str("noop"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_words() {
        assert_eq!("next".parse(), Ok(Action::NextStep));
        assert_eq!(" Prev ".parse(), Ok(Action::PreviousStep));
        assert_eq!("previous".parse(), Ok(Action::PreviousStep));
        assert_eq!("goto:7".parse(), Ok(Action::GoTo(7)));
        assert_eq!("reset".parse(), Ok(Action::ResetObject));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            "jump".parse::<Action>(),
            Err(ActionParseError::Unknown("jump".into()))
        );
        assert_eq!(
            "goto:-1".parse::<Action>(),
            Err(ActionParseError::BadIndex("-1".into()))
        );
    }

    #[test]
    fn display_parses_back() {
        for a in [Action::NextStep, Action::GoTo(3), Action::ResetObject] {
            assert_eq!(a.to_string().parse(), Ok(a));
        }
    }
}
