// src/action_token.rs
//! Command-safe spelling of a program key.
//!
//! Chat commands cannot contain `:`, so `support:123` travels as
//! `support_123`. Decoding turns only the first `_` back into `:`, which keeps
//! sequence ids containing underscores (`PBLN_000000000090001`) intact.

use anyhow::{bail, Result};

use crate::program::ProgramKind;
use crate::store::UserAction;

pub fn encode(program_key: &str) -> String {
    program_key.replacen(':', "_", 1)
}

/// Token (or an already-raw key) → program key. The kind prefix must be known.
pub fn decode(token: &str) -> Result<String> {
    let token = token.trim();
    let Some((kind, seq)) = token.split_once(':').or_else(|| token.split_once('_')) else {
        bail!("malformed action token: {token}");
    };
    let kind: ProgramKind = kind.parse()?;
    Ok(crate::program::program_key(kind, seq))
}

/// Chat command for `action` on `program_key`, e.g. `/save_support_123`.
pub fn command(action: UserAction, program_key: &str) -> String {
    let verb = match action {
        UserAction::Saved => "save",
        UserAction::Dismissed => "dismiss",
    };
    format!("/{verb}_{}", encode(program_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_underscore_only() {
        assert_eq!(encode("support:PBLN_0001"), "support_PBLN_0001");
        assert_eq!(decode("support_PBLN_0001").unwrap(), "support:PBLN_0001");
    }

    #[test]
    fn raw_key_passes_through() {
        assert_eq!(decode("event:EVT_1").unwrap(), "event:EVT_1");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(decode("notice_1").is_err());
        assert!(decode("nounderscore").is_err());
    }

    #[test]
    fn commands_round_trip_through_decode() {
        let cmd = command(UserAction::Saved, "support:PBLN_1");
        assert_eq!(cmd, "/save_support_PBLN_1");
        let token = cmd.trim_start_matches("/save_");
        assert_eq!(decode(token).unwrap(), "support:PBLN_1");
        assert_eq!(
            command(UserAction::Dismissed, "support:1"),
            "/dismiss_support_1"
        );
    }
}
