//! Capability token for privileged cross-component calls
//!
//! Karma updates, score adjustments, status transitions, stake slashing and
//! governance dispatch are not client-callable: each such entry point takes a
//! `&SystemCap`. The node mints exactly one token at construction and never
//! hands it out; client-facing operations have no way to pass one.

/// Proof that the caller is the ledger itself rather than a client
///
/// Not `Clone` and not `Serialize`: the token cannot be duplicated or smuggled
/// through a snapshot. Mint once, at node construction.
#[derive(Debug)]
pub struct SystemCap {
    _priv: (),
}

impl SystemCap {
    /// Mint the capability token. Call this exactly once, from the node.
    pub fn mint() -> Self {
        Self { _priv: () }
    }
}
