use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Signature block profiles of the application under test.
///
/// Each end-to-end run signs with one profile; the suite cycles through
/// all of them so every profile gets exercised over consecutive runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureProfile {
    SignatureBlock,
    SignatureBlockSmall,
    AmtsSignatur,
    BaseLogo,
    Invisible,
}

impl SignatureProfile {
    /// All profiles, in rotation order.
    pub const ALL: [SignatureProfile; 5] = [
        SignatureProfile::SignatureBlock,
        SignatureProfile::SignatureBlockSmall,
        SignatureProfile::AmtsSignatur,
        SignatureProfile::BaseLogo,
        SignatureProfile::Invisible,
    ];
}

impl std::fmt::Display for SignatureProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SignatureProfile::SignatureBlock => "SIGNATURBLOCK",
            SignatureProfile::SignatureBlockSmall => "SIGNATURBLOCK_SMALL",
            SignatureProfile::AmtsSignatur => "AMTSSIGNATURBLOCK",
            SignatureProfile::BaseLogo => "BASE_LOGO",
            SignatureProfile::Invisible => "INVISIBLE",
        };
        f.write_str(name)
    }
}

/// Round-robin selection over the signature profiles.
///
/// Pops from the front and refills from [`SignatureProfile::ALL`] when
/// the queue empties, so selection cycles forever and every profile is
/// yielded exactly once per cycle.
#[derive(Debug, Clone)]
pub struct ProfileRotation {
    queue: VecDeque<SignatureProfile>,
}

impl ProfileRotation {
    pub fn new() -> Self {
        Self {
            queue: SignatureProfile::ALL.into(),
        }
    }

    /// Next profile in rotation.
    pub fn next_profile(&mut self) -> SignatureProfile {
        if self.queue.is_empty() {
            self.queue.extend(SignatureProfile::ALL);
        }
        // Refill guarantees the queue is never empty here
        self.queue.pop_front().expect("profile queue refilled")
    }
}

impl Default for ProfileRotation {
    fn default() -> Self {
        Self::new()
    }
}
