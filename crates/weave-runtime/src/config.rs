//! Runtime configuration
//!
//! The engine itself is language-agnostic: internal queries are program
//! templates rendered into terms and handed to the interpreter like any other
//! deploy. Defaults are written in the node's process-calculus language.

use serde::{Deserialize, Serialize};
use std::path::Path;
use weave_core::{Channel, Term, WeaveError};

/// Placeholder for the result channel name
pub const RESULT_PLACEHOLDER: &str = "{result}";
/// Placeholder for a hex-encoded identity
pub const IDENTITY_PLACEHOLDER: &str = "{identity}";
/// Placeholder for a payment amount
pub const AMOUNT_PLACEHOLDER: &str = "{amount}";

/// Well-known channel on which internal queries publish their results
pub const DEFAULT_RESULT_CHANNEL: &str = "__SCALA__";

const DEFAULT_BONDS_QUERY: &str = r#"new rl(`rho:registry:lookup`), posCh in {
  rl!(`rho:rchain:pos`, *posCh) |
  for(@(_, PoS) <- posCh) {
    @PoS!("getBonds", "{result}")
  }
}"#;

const DEFAULT_BALANCE_QUERY: &str = r#"new rl(`rho:registry:lookup`), revVaultCh, vaultCh, balanceCh in {
  rl!(`rho:rchain:revVault`, *revVaultCh) |
  for(@(_, RevVault) <- revVaultCh) {
    @RevVault!("findOrCreate", "{identity}", *vaultCh) |
    for(@(true, vault) <- vaultCh) {
      @vault!("balance", *balanceCh) |
      for(@balance <- balanceCh) { @"{result}"!(balance) }
    }
  }
}"#;

const DEFAULT_PAYMENT: &str = r#"new rl(`rho:registry:lookup`), posCh in {
  rl!(`rho:rchain:pos`, *posCh) |
  for(@(_, PoS) <- posCh) {
    @PoS!("chargeDeploy", "{identity}", {amount})
  }
}"#;

/// Source templates of the engine's internal programs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPrograms {
    /// Publishes the bonds map on `{result}`
    pub bonds: String,
    /// Publishes the vault balance of `{identity}` on `{result}`
    pub balance: String,
    /// Charges `{amount}` to `{identity}` through the fee-collection contract
    pub payment: String,
}

impl Default for SystemPrograms {
    fn default() -> Self {
        Self {
            bonds: DEFAULT_BONDS_QUERY.to_string(),
            balance: DEFAULT_BALANCE_QUERY.to_string(),
            payment: DEFAULT_PAYMENT.to_string(),
        }
    }
}

impl SystemPrograms {
    /// Bonds query publishing on `result_channel`
    pub fn bonds_query(&self, result_channel: &str) -> Term {
        Term::new(self.bonds.replace(RESULT_PLACEHOLDER, result_channel))
    }

    /// Balance query for `identity` publishing on `result_channel`
    pub fn balance_query(&self, result_channel: &str, identity: &[u8]) -> Term {
        Term::new(
            self.balance
                .replace(RESULT_PLACEHOLDER, result_channel)
                .replace(IDENTITY_PLACEHOLDER, &hex::encode(identity)),
        )
    }

    /// Fee-collection call charging `amount` to `payer`
    pub fn payment(&self, payer: &[u8], amount: u64) -> Term {
        Term::new(
            self.payment
                .replace(IDENTITY_PLACEHOLDER, &hex::encode(payer))
                .replace(AMOUNT_PLACEHOLDER, &amount.to_string()),
        )
    }

    fn validate(&self) -> Result<(), WeaveError> {
        let required: [(&str, &str, &[&str]); 3] = [
            ("bonds", self.bonds.as_str(), &[RESULT_PLACEHOLDER]),
            ("balance", self.balance.as_str(), &[RESULT_PLACEHOLDER, IDENTITY_PLACEHOLDER]),
            ("payment", self.payment.as_str(), &[IDENTITY_PLACEHOLDER, AMOUNT_PLACEHOLDER]),
        ];
        for (name, template, placeholders) in required {
            for placeholder in placeholders {
                if !template.contains(placeholder) {
                    return Err(WeaveError::invalid(format!(
                        "program template `{name}` is missing placeholder {placeholder}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Public channel internal queries publish on.
    ///
    /// The name is guessable, so a concurrent program could in principle read
    /// or forge a result. Queries run alone on a throwaway state, which is the
    /// only mitigation.
    pub result_channel: String,
    /// Phlo budget for internal query and payment deploys
    pub system_phlo_limit: u64,
    /// Internal program templates
    pub programs: SystemPrograms,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            result_channel: DEFAULT_RESULT_CHANNEL.to_string(),
            system_phlo_limit: i64::MAX as u64,
            programs: SystemPrograms::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, WeaveError> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| WeaveError::invalid(format!("Invalid runtime config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, WeaveError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            WeaveError::storage(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<(), WeaveError> {
        if self.result_channel.is_empty() {
            return Err(WeaveError::invalid("result_channel cannot be empty"));
        }
        if self.system_phlo_limit == 0 {
            return Err(WeaveError::invalid("system_phlo_limit must be positive"));
        }
        self.programs.validate()
    }

    /// The result channel as a name
    pub fn result_channel(&self) -> Channel {
        Channel::public(self.result_channel.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        RuntimeConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str("system_phlo_limit = 5000\n").unwrap();
        assert_eq!(config.system_phlo_limit, 5000);
        assert_eq!(config.result_channel, DEFAULT_RESULT_CHANNEL);
        assert_eq!(config.programs, SystemPrograms::default());
    }

    #[test]
    fn test_missing_placeholder_rejected() {
        let toml = r#"
            [programs]
            bonds = "publish nothing"
        "#;
        let err = RuntimeConfig::from_toml_str(toml).unwrap_err();
        assert!(err.to_string().contains("bonds"));
    }

    #[test]
    fn test_empty_result_channel_rejected() {
        assert!(RuntimeConfig::from_toml_str("result_channel = \"\"\n").is_err());
    }

    #[test]
    fn test_templates_render() {
        let programs = SystemPrograms::default();
        let term = programs.balance_query("__out__", &[0xab, 0xcd]);
        assert!(term.source().contains("\"abcd\""));
        assert!(term.source().contains("@\"__out__\""));
        let payment = programs.payment(&[0x01], 42);
        assert!(payment.source().contains("\"01\", 42"));
    }
}
