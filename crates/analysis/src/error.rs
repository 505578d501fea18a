use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No row matches any alias of the total-assets label; composition
    /// weights have no denominator.
    MissingTotalsRow { aliases: Vec<String> },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTotalsRow { aliases } => {
                let quoted: Vec<String> = aliases.iter().map(|a| format!("'{a}'")).collect();
                write!(f, "data structure error: no line item matching {}", quoted.join(" or "))
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
