//! Tenant identifier generation
//!
//! Derives a tenant key, a managed subdomain label, and a database name from
//! the company name or a preferred subdomain. Candidates are confirmed free
//! through [`IdentifierAvailability`] before they are returned, and suffixed
//! (`_1`, `-2`, ...) on collision up to a bounded number of attempts.

use std::future::Future;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sitehub_storage::StorageError;
use unicode_normalization::UnicodeNormalization;

use crate::error::IdentifierError;

/// Labels that can never be handed out as a tenant subdomain
pub const RESERVED_SUBDOMAINS: &[&str] = &[
    "www", "api", "admin", "mail", "smtp", "imap", "pop", "support", "help", "docs", "static", "cdn", "assets",
    "root", "sys", "db", "mysql", "postgres", "test",
];

/// Cap for tenant keys, slugs and subdomain labels
pub const MAX_LABEL_LEN: usize = 30;
/// MySQL limit for database names
pub const MAX_DB_NAME_LEN: usize = 64;
pub const DB_NAME_PREFIX: &str = "t_";
pub const MAX_UNIQUE_ATTEMPTS: u32 = 200;

const SLUG_FALLBACK: &str = "company";
const KEY_FALLBACK: &str = "t";
const LABEL_FALLBACK: &str = "app";

static LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])$").expect("label pattern is valid"));

/// Existence checks consulted while generating identifiers
#[async_trait]
pub trait IdentifierAvailability: Send + Sync {
    async fn tenant_key_exists(&self, tenant_key: &str) -> Result<bool, StorageError>;

    /// `label` is the bare subdomain label, without the base domain
    async fn subdomain_exists(&self, label: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct IdentifierRequest {
    pub company_name: Option<String>,
    pub preferred_subdomain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantIdentifiers {
    pub tenant_key: String,
    pub subdomain_label: String,
    pub db_name: String,
}

/// Lowercase, strip diacritics, collapse everything outside `[a-z0-9]` to `-`.
pub fn slugify_company_name(name: &str) -> String {
    let ascii = fold_to_ascii(name);
    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = truncate(slug.trim_matches('-'), MAX_LABEL_LEN).trim_end_matches('-');
    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

/// Map every character outside `[a-z0-9_]` to `_`.
pub fn safe_tenant_key(input: &str) -> String {
    let key: String = fold_to_ascii(input)
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let key = truncate(key.trim_matches('_'), MAX_LABEL_LEN).trim_end_matches('_');
    if key.is_empty() {
        KEY_FALLBACK.to_string()
    } else {
        key.to_string()
    }
}

pub fn db_name_from_key(tenant_key: &str) -> String {
    let name = format!("{DB_NAME_PREFIX}{}", safe_tenant_key(tenant_key));
    truncate(&name, MAX_DB_NAME_LEN).to_string()
}

pub fn managed_label_from_key(tenant_key: &str) -> String {
    tenant_key.replace('_', "-")
}

pub fn is_valid_subdomain_label(label: &str) -> bool {
    (3..=MAX_LABEL_LEN).contains(&label.len())
        && !RESERVED_SUBDOMAINS.contains(&label)
        && LABEL_PATTERN.is_match(label)
}

/// Return `base` (capped) if free, otherwise the first free `base{sep}{n}`.
pub async fn make_unique<F, Fut>(base: &str, separator: char, mut exists: F) -> Result<String, IdentifierError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool, StorageError>>,
{
    let candidate = truncate(base, MAX_LABEL_LEN).to_string();
    if !exists(candidate.clone()).await? {
        return Ok(candidate);
    }

    for attempt in 1..=MAX_UNIQUE_ATTEMPTS {
        let suffix = format!("{separator}{attempt}");
        let keep = MAX_LABEL_LEN.saturating_sub(suffix.len()).max(1);
        let candidate = format!("{}{suffix}", truncate(base, keep));
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    Err(IdentifierError::Exhausted {
        base: base.to_string(),
        attempts: MAX_UNIQUE_ATTEMPTS,
    })
}

/// Derive identifiers that are free at generation time.
///
/// Tenant keys are suffixed with `_n` so they stay inside `[a-z0-9_]`;
/// subdomain labels are suffixed with `-n`.
pub async fn generate_identifiers<A>(
    request: &IdentifierRequest,
    availability: &A,
) -> Result<TenantIdentifiers, IdentifierError>
where
    A: IdentifierAvailability + ?Sized,
{
    let company = request.company_name.as_deref().map(str::trim).unwrap_or_default();
    let seed = match non_blank(request.preferred_subdomain.as_deref()) {
        Some(preferred) => preferred.to_lowercase(),
        None => slugify_company_name(company),
    };

    let mut tenant_key = safe_tenant_key(&seed);
    if availability.tenant_key_exists(&tenant_key).await? {
        tenant_key = make_unique(&tenant_key, '_', |candidate| async move {
            availability.tenant_key_exists(&candidate).await
        })
        .await?;
    }

    let mut label = managed_label_from_key(&tenant_key);
    if !is_valid_subdomain_label(&label) || availability.subdomain_exists(&label).await? {
        let fallback_seed = if company.is_empty() { tenant_key.as_str() } else { company };
        label = slugify_company_name(fallback_seed);
        if !is_valid_subdomain_label(&label) {
            label = LABEL_FALLBACK.to_string();
        }
        if availability.subdomain_exists(&label).await? {
            label = make_unique(&label, '-', |candidate| async move {
                availability.subdomain_exists(&candidate).await
            })
            .await?;
        }
    }

    let db_name = db_name_from_key(&tenant_key);
    Ok(TenantIdentifiers {
        tenant_key,
        subdomain_label: label,
        db_name,
    })
}

fn fold_to_ascii(input: &str) -> String {
    input
        .to_lowercase()
        .nfkd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Truncate to at most `max` characters
fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
