use sha2::{Digest, Sha256};
use crate::error::{EmulatorError, Result};

/// Domain separator mixed into every content hash produced by the emulator.
pub const DOMAIN_SEPARATOR: &str = "utxo-emulator/v1";

/// Hashes the canonical JSON encoding of `message` with SHA-256. Same message -> same hash.
pub fn hash_message<T: serde::Serialize>(message: &T) -> Result<[u8; 32]> {
    let json = serde_json::to_string(message)
        .map_err(|e| EmulatorError::Encoding(format!("Failed to serialize message: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_SEPARATOR.as_bytes());
    hasher.update(json.as_bytes());
    let hash = hasher.finalize();

    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    Ok(result)
}

/// Hex form of [`hash_message`].
pub fn hash_message_hex<T: serde::Serialize>(message: &T) -> Result<String> {
    Ok(hex::encode(hash_message(message)?))
}

/// Formats a lovelace quantity as an ADA string with six decimals.
pub fn lovelace_to_ada_string(lovelace: u64) -> String {
    let whole = lovelace / crate::core::value::LOVELACE_PER_ADA;
    let frac = lovelace % crate::core::value::LOVELACE_PER_ADA;
    format!("{}.{:06} ADA", whole, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_message_deterministic() {
        let a = hash_message_hex(&serde_json::json!({"k": 1})).unwrap();
        let b = hash_message_hex(&serde_json::json!({"k": 1})).unwrap();
        let c = hash_message_hex(&serde_json::json!({"k": 2})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_lovelace_to_ada_string() {
        assert_eq!(lovelace_to_ada_string(1_500_000), "1.500000 ADA");
        assert_eq!(lovelace_to_ada_string(7), "0.000007 ADA");
    }
}
