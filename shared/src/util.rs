//! Clock and ID utilities shared by the server and its tests.

use rand::Rng;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms)
pub fn snowflake_id() -> i64 {
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Length of externally shared order codes
pub const ORDER_CODE_LEN: usize = 12;

/// Alphabet for order codes and blob keys. No lookalike characters
/// (0/O, 1/I/l) since codes are read back over support calls.
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz";

fn random_code(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Generate a fresh order code. The code is the externally shared order
/// identifier and is independent of the storage key.
pub fn order_code() -> String {
    random_code(ORDER_CODE_LEN)
}

/// Generate a storage key for an uploaded blob
pub fn blob_key() -> String {
    random_code(20)
}

/// Generate a human-presentable product code
pub fn product_code() -> String {
    random_code(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_code_has_fixed_length_and_alphabet() {
        for _ in 0..100 {
            let code = order_code();
            assert_eq!(code.len(), ORDER_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn snowflake_ids_are_positive_and_mostly_unique() {
        let ids: std::collections::HashSet<i64> = (0..64).map(|_| snowflake_id()).collect();
        assert!(ids.iter().all(|id| *id > 0));
        // 12 random bits within one millisecond: collisions possible but rare
        assert!(ids.len() > 32);
    }
}
