//! Identifier generation

/// Generate a fresh prompt identifier (time-ordered UUID)
pub fn generate_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Short opaque token used as the catalog data version
pub fn short_version() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..8].to_string()
}
