//! Randomised payloads for the "add user" button.

use rand::Rng;

use crate::types::{City, UserPayload};

pub const PLACEHOLDER_CITY: &str = "Hanoi";
pub const PLACEHOLDER_ROLE: &str = "user";

pub fn placeholder_user<R: Rng + ?Sized>(rng: &mut R) -> UserPayload {
    numbered_user(rng.gen_range(0..1000))
}

pub fn numbered_user(n: u32) -> UserPayload {
    UserPayload {
        name: format!("User {n}"),
        email: format!("user{n}@gmail.com"),
        city: City::from(PLACEHOLDER_CITY),
        role: PLACEHOLDER_ROLE.to_string(),
    }
}
