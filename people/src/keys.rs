//! KV key layout.
//!
//! Organization-scoped records live under `org:{org}:` so a prefix scan never
//! crosses a tenant boundary. Ids are UUIDs; scans therefore return records
//! in ascending id order.

/// Format: `org:{org}`
pub fn organization_key(org: &str) -> String {
    format!("org:{org}")
}

/// Unique-name index for organizations.
/// Format: `orgname:{name}`
pub fn organization_name_key(name: &str) -> String {
    format!("orgname:{name}")
}

/// Format: `org:{org}:person:{id}`
pub fn person_key(org: &str, id: &str) -> String {
    format!("org:{org}:person:{id}")
}

/// Format: `org:{org}:person:`
pub fn person_prefix(org: &str) -> String {
    format!("org:{org}:person:")
}

/// Format: `org:{org}:product:{id}`
pub fn product_key(org: &str, id: &str) -> String {
    format!("org:{org}:product:{id}")
}

/// Format: `org:{org}:product:`
pub fn product_prefix(org: &str) -> String {
    format!("org:{org}:product:")
}

/// Unique-name index for products within an organization.
/// Format: `org:{org}:productname:{name}`
pub fn product_name_key(org: &str, name: &str) -> String {
    format!("org:{org}:productname:{name}")
}

/// Format: `org:{org}:cart:{id}`
pub fn cart_key(org: &str, id: &str) -> String {
    format!("org:{org}:cart:{id}")
}

/// Format: `org:{org}:cart:`
pub fn cart_prefix(org: &str) -> String {
    format!("org:{org}:cart:")
}

/// One entry per (cart, product) pair, which makes the pair unique.
/// Format: `org:{org}:cartproduct:{cart}:{product}`
pub fn cart_product_key(org: &str, cart: &str, product: &str) -> String {
    format!("org:{org}:cartproduct:{cart}:{product}")
}

/// Format: `org:{org}:cartproduct:{cart}:`
pub fn cart_product_prefix(org: &str, cart: &str) -> String {
    format!("org:{org}:cartproduct:{cart}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_prefix_does_not_leak_into_other_kinds() {
        let k = person_key("o1", "p1");
        assert!(k.starts_with(&person_prefix("o1")));
        assert!(!product_key("o1", "p1").starts_with(&person_prefix("o1")));
        assert!(!person_key("o10", "p1").starts_with(&person_prefix("o1")));
    }

    #[test]
    fn cart_product_prefix_scopes_to_cart() {
        let k = cart_product_key("o", "c1", "p9");
        assert!(k.starts_with(&cart_product_prefix("o", "c1")));
        assert!(!k.starts_with(&cart_product_prefix("o", "c")));
    }
}
