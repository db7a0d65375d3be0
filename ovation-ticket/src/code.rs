use rand::rngs::OsRng;
use rand::Rng;

/// Code alphabet: digits and uppercase letters minus the ambiguous
/// I, L, O, U and 0/1.
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTVWXYZ";

const PREFIX: &str = "OVN";

/// Random characters per code, before the trailing check character.
const PAYLOAD_LEN: usize = 11;

/// Generates a ticket code of the form `OVN-XXXX-XXXX-XXXX`. The payload is
/// drawn from the operating system's CSPRNG (~54 bits of entropy); the last
/// character is a check digit over the payload. Uniqueness is ultimately
/// enforced by the store's UNIQUE constraint, with collision retried by the
/// caller.
pub fn generate_code() -> String {
    let payload: Vec<u8> = (0..PAYLOAD_LEN)
        .map(|_| ALPHABET[OsRng.gen_range(0..ALPHABET.len())])
        .collect();
    format_code(&payload)
}

fn format_code(payload: &[u8]) -> String {
    let mut chars = payload.to_vec();
    chars.push(check_char(payload));

    let body: String = chars
        .chunks(4)
        .map(|chunk| chunk.iter().map(|&b| b as char).collect::<String>())
        .collect::<Vec<_>>()
        .join("-");

    format!("{}-{}", PREFIX, body)
}

fn check_char(payload: &[u8]) -> u8 {
    // Weighted sum so transposed characters change the check digit.
    let sum: usize = payload
        .iter()
        .enumerate()
        .map(|(i, c)| (i + 1) * alphabet_index(*c).unwrap_or(0))
        .sum();
    ALPHABET[sum % ALPHABET.len()]
}

fn alphabet_index(c: u8) -> Option<usize> {
    ALPHABET.iter().position(|&a| a == c)
}

/// Validates format and check digit. Does not consult the store; a
/// well-formed code for a ticket that was never issued still verifies.
pub fn verify_code(code: &str) -> bool {
    let mut parts = code.split('-');
    if parts.next() != Some(PREFIX) {
        return false;
    }

    let chars: Vec<u8> = parts.flat_map(|p| p.bytes()).collect();
    if chars.len() != PAYLOAD_LEN + 1 {
        return false;
    }
    if chars.iter().any(|c| alphabet_index(*c).is_none()) {
        return false;
    }

    check_char(&chars[..PAYLOAD_LEN]) == chars[PAYLOAD_LEN]
}
