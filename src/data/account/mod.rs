use crypto::bcrypt::bcrypt;
use sha2::{Digest, Sha256};

use crate::security::Salt;

pub mod db;

pub static ACCOUNT_COLLECTION_NAME: &str = "users";

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PasswordHash([u8; 24]);

/// Derives account credentials with the installation salt.
#[derive(Clone)]
pub struct PasswordHasher {
    salt: Salt,
    cost: u32,
}

impl PasswordHasher {
    pub fn new(salt: Salt, cost: u32) -> PasswordHasher {
        PasswordHasher {
            salt,
            cost: cost.min(31),
        }
    }

    pub fn hash(&self, password: impl AsRef<str>) -> PasswordHash {
        let mut pw_hash: [u8; 24] = [0; 24];

        // bcrypt only reads 72 bytes, the digest keeps longer passwords distinct.
        let mut sha = Sha256::new();
        sha2::Digest::update(&mut sha, password.as_ref().as_bytes());

        bcrypt(
            self.cost,
            &self.salt,
            sha.finalize().as_slice(),
            &mut pw_hash,
        );

        PasswordHash(pw_hash)
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PasswordHasher(cost: {})", self.cost)
    }
}

/// Login credential stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub password_hash: PasswordHash,
}

impl Account {
    pub fn new(email: impl ToString, password: impl AsRef<str>, hasher: &PasswordHasher) -> Account {
        Account {
            email: email.to_string(),
            password_hash: hasher.hash(password),
        }
    }

    pub fn accepts(&self, password: impl AsRef<str>, hasher: &PasswordHasher) -> bool {
        self.password_hash == hasher.hash(password)
    }
}
