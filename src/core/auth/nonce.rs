use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Generates the anti-forgery `state` parameter for one OAuth round trip.
///
/// 16 random bytes, base64url-encoded (22 characters).
pub fn generate_state() -> String {
    random_token::<16>()
}

/// Generates an opaque session identifier for the session cookie.
///
/// 32 random bytes, base64url-encoded (43 characters).
pub fn generate_session_id() -> String {
    random_token::<32>()
}

fn random_token<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_length_and_alphabet() {
        let state = generate_state();
        assert_eq!(state.len(), 22);
        assert!(state
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_session_id_length() {
        assert_eq!(generate_session_id().len(), 43);
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(generate_state(), generate_state());
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
