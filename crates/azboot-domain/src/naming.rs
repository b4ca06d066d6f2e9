use sha2::{Digest, Sha256};

/// Azure limit on federated identity credential names.
const MAX_CREDENTIAL_NAME: usize = 120;

/// Derive a federated credential name from a readable prefix and the
/// (issuer, subject, audience-set) triple it trusts.
///
/// Names are unique per application, so the suffix is a short digest of the
/// triple: two credentials that differ only in audience get distinct names.
pub fn federated_credential_name(
    prefix: &str,
    issuer: &str,
    subject: &str,
    audiences: &[String],
) -> String {
    let mut sorted: Vec<&str> = audiences.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut hasher = Sha256::new();
    hasher.update(issuer.as_bytes());
    hasher.update(b"\n");
    hasher.update(subject.as_bytes());
    for aud in sorted {
        hasher.update(b"\n");
        hasher.update(aud.as_bytes());
    }
    let digest = hasher.finalize();
    let suffix: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();

    let mut head = sanitize_credential_name(prefix, MAX_CREDENTIAL_NAME - suffix.len() - 1);
    if head.is_empty() {
        head.push_str("gh");
    }
    format!("{}-{}", head, suffix)
}

/// Keep `[A-Za-z0-9_-]`, collapse everything else into single hyphens, start
/// and end on an alphanumeric.
fn sanitize_credential_name(raw: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(raw.len().min(max_len));
    for c in raw.chars() {
        if out.len() == max_len {
            break;
        }
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            if out.is_empty() && !c.is_ascii_alphanumeric() {
                continue;
            }
            out.push(c);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with(|c: char| !c.is_ascii_alphanumeric()) {
        out.pop();
    }
    out
}
