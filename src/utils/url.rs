//! URL helpers for logging origin locations
//!
//! Origins come straight from client paths and may embed credentials,
//! either as `user:pass@host` or as query parameters. Anything written to a
//! log or an error message goes through [`redact_credentials`] or
//! [`redact_request_target`] first.

use url::Url;

const SENSITIVE_QUERY_PARAMS: &[&str] = &[
    "username", "password", "user", "pass", "pwd", "passwd", "token", "key",
];

const MASK: &str = "****";

/// Render a URL with user info and sensitive query values masked
pub fn redact_credentials(url: &Url) -> String {
    let mut redacted = url.clone();

    if !url.username().is_empty() || url.password().is_some() {
        let _ = redacted.set_username(MASK);
        let _ = redacted.set_password(Some(MASK));
    }

    if url.query().is_some() {
        let pairs = mask_query_pairs(url.query_pairs());
        redacted.query_pairs_mut().clear().extend_pairs(pairs);
    }

    redacted.to_string()
}

/// Mask credentials in an inbound request target
///
/// Preview targets look like `/{w}/{h}/user:pass@host/path?token=x`; the
/// user info of the embedded origin and sensitive query values are masked.
/// Other targets only get their query masked.
pub fn redact_request_target(target: &str) -> String {
    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    let mut redacted = match path.splitn(4, '/').collect::<Vec<_>>().as_slice() {
        ["", width, height, origin] => {
            let (authority, rest) = match origin.split_once('/') {
                Some((authority, rest)) => (authority, Some(rest)),
                None => (*origin, None),
            };
            let authority = match authority.rsplit_once('@') {
                Some((_, host)) => format!("{MASK}@{host}"),
                None => authority.to_string(),
            };
            match rest {
                Some(rest) => format!("/{width}/{height}/{authority}/{rest}"),
                None => format!("/{width}/{height}/{authority}"),
            }
        }
        _ => path.to_string(),
    };

    if let Some(query) = query {
        let pairs = mask_query_pairs(url::form_urlencoded::parse(query.as_bytes()));
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        redacted.push('?');
        redacted.push_str(&query);
    }

    redacted
}

fn mask_query_pairs<'a, I>(pairs: I) -> Vec<(String, String)>
where
    I: Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
{
    pairs
        .map(|(name, value)| {
            let sensitive = SENSITIVE_QUERY_PARAMS
                .iter()
                .any(|param| name.eq_ignore_ascii_case(param));
            let value = if sensitive {
                MASK.to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect()
}
