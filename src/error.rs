use thiserror::Error;

/// Why a single answer was refused. Shown to the submitting client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Answer must be a list")]
    NotAList,
    #[error("Answer must be text")]
    NotText,
    #[error("No usable words in submission")]
    NoUsableWords,
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Ranking must order all {expected} options")]
    IncompleteRanking { expected: usize },
    #[error("Ranking lists an option more than once")]
    RepeatedOption,
    #[error("Not one of the offered answers")]
    NotAChoice,
}

/// Validation failures raised by the question loader before a bank is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("No valid questions found")]
    Empty,
    #[error("Question {0} has an empty prompt")]
    EmptyPrompt(usize),
    #[error("Question {0} has no correct answer")]
    MissingCorrectAnswer(usize),
    #[error("Question {0} needs between 1 and 3 wrong answers")]
    DistractorCount(usize),
    #[error("Question {0} has no time limit")]
    ZeroTimeLimit(usize),
    #[error("Question {0} needs at least two options")]
    TooFewOptions(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_ADDR is not a socket address: {0}")]
    BindAddr(#[from] std::net::AddrParseError),
    #[error("ADMIN_PASSWORD must not be empty")]
    EmptyAdminPassword,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_messages_are_client_readable() {
        assert_eq!(
            Rejection::IncompleteRanking { expected: 3 }.to_string(),
            "Ranking must order all 3 options"
        );
        assert_eq!(
            Rejection::UnknownOption("Green".into()).to_string(),
            "Unknown option: Green"
        );
    }
}
