//! Tenant resolver.
//!
//! Decides whether a request is served in public mode or under a clinic
//! slug, and fetches the clinic row. One round trip to the store, no
//! fallback, no retry: an unknown slug is "not found" and the caller
//! renders a 404 with no clinic-branded payload.

use regex::Regex;
use rusqlite::Connection;
use std::sync::OnceLock;

use crate::access::TenantContext;
use crate::db::repository::get_clinic_by_slug;
use crate::db::DatabaseError;

/// Slugs are lowercase letters, digits and inner hyphens, 2–64 chars.
/// Anything else misses the store without a query.
fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,62}[a-z0-9]$").expect("valid regex"))
}

pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_match(slug) && !slug.contains("--")
}

/// Resolve a slug to a tenant context. `Ok(None)` means not found.
pub fn resolve_slug(conn: &Connection, slug: &str) -> Result<Option<TenantContext>, DatabaseError> {
    if !is_valid_slug(slug) {
        return Ok(None);
    }
    Ok(get_clinic_by_slug(conn, slug)?.map(TenantContext::Clinic))
}
