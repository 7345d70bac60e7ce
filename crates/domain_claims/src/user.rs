//! Signed-in users and their roles

use serde::{Deserialize, Serialize};

use core_kernel::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    BodyShop,
    Adjuster,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::BodyShop => "body_shop",
            UserRole::Adjuster => "adjuster",
            UserRole::Customer => "customer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: UserRole,
    pub name: String,
}

impl User {
    pub fn new(role: UserRole, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            role,
            name: name.into(),
        }
    }

    pub fn is_adjuster(&self) -> bool {
        self.role == UserRole::Adjuster
    }
}
