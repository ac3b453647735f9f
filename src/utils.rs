use rand::{Rng, distributions::Alphanumeric};

use crate::prelude::*;

#[cfg(not(test))]
const COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const COST: u32 = 4;

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

/// Bcrypt hash in modular crypt format (`$2b$<cost>$...`).
pub fn hash_password(password: &str) -> Result<String> {
  Ok(bcrypt::hash(password, COST)?)
}

/// Malformed stored hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
  bcrypt::verify(password, stored).unwrap_or(false)
}

/// Random `[A-Za-z0-9]` string.
pub fn random_code(len: usize) -> String {
  rand::thread_rng()
    .sample_iter(&Alphanumeric)
    .take(len)
    .map(char::from)
    .collect()
}

/// Rejects missing or blank text fields with `"<Field> is required"`.
pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
  match value.map(str::trim) {
    Some(value) if !value.is_empty() => Ok(value),
    _ => {
      let mut chars = field.chars();
      let field = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
      };
      Err(Error::InvalidArgs(format!("{field} is required")))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_roundtrip() {
    let stored = hash_password("hunter2").unwrap();

    assert!(stored.starts_with("$2b$"));

    assert!(verify_password("hunter2", &stored));
    assert!(!verify_password("hunter3", &stored));
    assert!(!verify_password("hunter2", "garbage"));
    assert!(!verify_password("hunter2", "0011$deadbeef"));
  }

  #[test]
  fn salts_differ() {
    let (a, b) = (hash_password("same").unwrap(), hash_password("same").unwrap());

    assert_ne!(a, b);
    assert!(verify_password("same", &a) && verify_password("same", &b));
  }

  #[test]
  fn codes_are_alphanumeric() {
    let code = random_code(8);

    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
  }

  #[test]
  fn required_fields() {
    assert_eq!(required("title", Some("  Dune ")).unwrap(), "Dune");
    assert!(matches!(
      required("title", Some("   ")),
      Err(Error::InvalidArgs(msg)) if msg == "Title is required"
    ));
    assert!(required("level", None).is_err());
  }
}
