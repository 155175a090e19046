//! Opaque object identifiers.

use rand::Rng;

/// Length of every minted person, event and token id.
pub const OBJECT_ID_LENGTH: usize = 32;

/// Mint a new id of [`OBJECT_ID_LENGTH`] lowercase ASCII letters.
pub fn new_object_id<R: Rng + ?Sized>(rng: &mut R) -> String {
  (0..OBJECT_ID_LENGTH)
    .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
    .collect()
}

#[cfg(test)]
mod tests {
  use rand::{SeedableRng, rngs::StdRng};

  use super::*;

  #[test]
  fn ids_have_fixed_length_and_alphabet() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
      let id = new_object_id(&mut rng);
      assert_eq!(id.len(), OBJECT_ID_LENGTH);
      assert!(id.bytes().all(|b| b.is_ascii_lowercase()));
    }
  }

  #[test]
  fn same_seed_same_ids() {
    let a = new_object_id(&mut StdRng::seed_from_u64(42));
    let b = new_object_id(&mut StdRng::seed_from_u64(42));
    assert_eq!(a, b);
  }
}
