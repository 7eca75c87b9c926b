use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};

/// Length of every paste identifier.
pub const ID_LENGTH: usize = 8;

/// Generates a new paste identifier from OS entropy.
///
/// Identifiers double as access tokens, so they must stay unguessable.
pub fn generate() -> String {
    generate_with(&mut OsRng)
}

/// Generates an identifier from the given cryptographic RNG.
///
/// `Alphanumeric` samples uniformly from `A-Z`, `a-z` and `0-9`.
pub fn generate_with<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `id` could have been produced by [`generate`].
pub fn is_well_formed(id: &str) -> bool {
    id.len() == ID_LENGTH && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_well_formed() {
        for _ in 0..1_000 {
            let id = generate();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(is_well_formed(&id), "bad id: {}", id);
        }
    }

    #[test]
    fn generated_ids_cover_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<char> = (0..2_000)
            .flat_map(|_| generate_with(&mut rng).chars().collect::<Vec<_>>())
            .collect();
        assert_eq!(seen.len(), 62);
    }

    #[test]
    fn generated_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(is_well_formed("aB3dE6gH"));
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("aB3dE6g"));
        assert!(!is_well_formed("aB3dE6gHi"));
        assert!(!is_well_formed("aB3d-6gH"));
        assert!(!is_well_formed("aB3dé6g"));
    }
}
