//! Investor personality archetypes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed behavioral archetype of an investor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Cautious,
    Greedy,
    Average,
    #[serde(alias = "risk-taking", alias = "risk_taker")]
    RiskTaking,
}

impl Personality {
    /// All personalities in declaration order.
    pub const ALL: [Personality; 4] = [
        Personality::Cautious,
        Personality::Greedy,
        Personality::Average,
        Personality::RiskTaking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Personality::Cautious => "cautious",
            Personality::Greedy => "greedy",
            Personality::Average => "average",
            Personality::RiskTaking => "risk_taking",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a personality name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown personality: {0:?}")]
pub struct ParsePersonalityError(pub String);

impl FromStr for Personality {
    type Err = ParsePersonalityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cautious" => Ok(Personality::Cautious),
            "greedy" => Ok(Personality::Greedy),
            "average" => Ok(Personality::Average),
            "risk_taking" | "risk-taking" | "risk_taker" => Ok(Personality::RiskTaking),
            _ => Err(ParsePersonalityError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("risk-taking".parse::<Personality>().unwrap(), Personality::RiskTaking);
        assert_eq!("risk_taker".parse::<Personality>().unwrap(), Personality::RiskTaking);
        assert_eq!("Greedy".parse::<Personality>().unwrap(), Personality::Greedy);
        assert!("reckless".parse::<Personality>().is_err());
    }

    #[test]
    fn test_serde_alias() {
        let p: Personality = serde_json::from_str("\"risk-taking\"").unwrap();
        assert_eq!(p, Personality::RiskTaking);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"risk_taking\"");
    }
}
