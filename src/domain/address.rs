use serde::{Deserialize, Serialize};

/// Street address resolved from a postal code.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub uf: String,
}
