const MAX_VISIBLE_LENGTH: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Sanitizes an audio locator for safe logging: drops userinfo, redacts query
/// values and truncates very long locators.
pub fn sanitize_url(url: &str) -> String {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return String::from("[EMPTY]");
    }

    let without_fragment = trimmed.split('#').next().unwrap_or(trimmed);
    let (base, query) = match without_fragment.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (without_fragment, None),
    };

    let mut sanitized = strip_userinfo(base);
    if let Some(query) = query {
        sanitized.push('?');
        sanitized.push_str(&redact_query(query));
    }

    if sanitized.len() > MAX_VISIBLE_LENGTH {
        let cut = (0..=MAX_VISIBLE_LENGTH)
            .rev()
            .find(|i| sanitized.is_char_boundary(*i))
            .unwrap_or(0);
        return format!("{}... ({} chars total)", &sanitized[..cut], sanitized.len());
    }

    sanitized
}

fn strip_userinfo(base: &str) -> String {
    let Some((scheme, rest)) = base.split_once("://") else {
        return base.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(authority_end);
    match authority.rsplit_once('@') {
        Some((_, host)) => format!("{}://{}@{}{}", scheme, REDACTED, host, path),
        None => base.to_string(),
    }
}

fn redact_query(query: &str) -> String {
    query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) => format!("{}={}", key, REDACTED),
            None => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}
