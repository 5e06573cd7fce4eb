//! System program templates in the test script language
//!
//! Same placeholders as the engine's defaults: `{result}`, `{identity}`
//! (hex, no prefix) and `{amount}`.

/// Publishes the bonds map on `{result}`
pub const BONDS_QUERY: &str = r#"copy "pos:bonds" "{result}""#;

/// Publishes the vault balance of `{identity}` on `{result}`
pub const BALANCE_QUERY: &str = r#"copy "vault:{identity}" "{result}""#;

/// Moves `{amount}` from the payer's vault to the proof-of-stake vault
pub const PAYMENT: &str = r#"transfer 0x{identity} "pos" {amount}"#;

/// Hex-free name of the vault payments are collected into
pub const POS_VAULT: &str = "pos";
