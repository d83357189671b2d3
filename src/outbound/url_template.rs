//! Target URL construction.
//!
//! # Responsibilities
//! - Build `http://{domain}[:port]{path}` for an outbound call
//! - Expand `{name}` placeholders in the path from path variables
//!
//! # Design Decisions
//! - Always plain `http`; TLS is terminated outside this process
//! - The domain is a bare host (optionally `host:port`); anything else is rejected
//! - The configured path is used as written, so existing `%XX` escapes and a
//!   `?query` survive untouched
//! - Placeholders are only expanded when variables are given; an unresolved
//!   placeholder is then an error rather than a literal
//! - Only variable values are percent-encoded, each as a single path segment
//! - Deterministic: same inputs always produce the same URL string

use std::collections::BTreeMap;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;
use url::Url;

/// Everything a value must not introduce into a path segment or query.
const PATH_VALUE_ENCODING_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'/')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Error)]
pub enum UrlTemplateError {
    #[error("invalid domain '{domain}': {source}")]
    InvalidDomain {
        domain: String,
        #[source]
        source: url::ParseError,
    },

    #[error("domain '{0}' must be a bare host without path, query, fragment or credentials")]
    NotBareHost(String),

    #[error("domain '{0}' cannot carry a port")]
    InvalidPort(String),

    #[error("no value for path variable '{0}'")]
    MissingPathVariable(String),
}

/// Builds outbound URLs. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlTemplateBuilder;

impl UrlTemplateBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        domain: &str,
        path: &str,
        port: Option<u16>,
        path_variables: &BTreeMap<String, String>,
    ) -> Result<Url, UrlTemplateError> {
        tracing::debug!(domain, path, ?port, "Building outbound URL");

        let mut url = parse_domain(domain)?;
        if port.is_some() {
            url.set_port(port)
                .map_err(|_| UrlTemplateError::InvalidPort(domain.to_string()))?;
        }

        let expanded = if path_variables.is_empty() {
            path.to_string()
        } else {
            expand_placeholders(path, path_variables)?
        };
        let (path, query) = match expanded.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (expanded.as_str(), None),
        };
        url.set_path(path);
        url.set_query(query);

        Ok(url)
    }
}

fn parse_domain(domain: &str) -> Result<Url, UrlTemplateError> {
    let url = Url::parse(&format!("http://{}", domain)).map_err(|source| UrlTemplateError::InvalidDomain {
        domain: domain.to_string(),
        source,
    })?;
    if url.path() != "/"
        || url.query().is_some()
        || url.fragment().is_some()
        || !url.username().is_empty()
        || url.password().is_some()
    {
        return Err(UrlTemplateError::NotBareHost(domain.to_string()));
    }
    Ok(url)
}

/// Replace every `{name}` with its percent-encoded value.
fn expand_placeholders(template: &str, vars: &BTreeMap<String, String>) -> Result<String, UrlTemplateError> {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let value = vars
            .get(name)
            .ok_or_else(|| UrlTemplateError::MissingPathVariable(name.to_string()))?;
        expanded.push_str(&rest[..start]);
        expanded.extend(utf8_percent_encode(value, PATH_VALUE_ENCODING_SET));
        rest = &rest[start + len + 1..];
    }
    expanded.push_str(rest);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_template_with_port() {
        let builder = UrlTemplateBuilder::new();
        let vars = vars(&[("id", "1")]);
        let first = builder.build("svc", "/x/{id}", Some(9090), &vars).unwrap();
        let second = builder.build("svc", "/x/{id}", Some(9090), &vars).unwrap();
        assert_eq!(first.as_str(), "http://svc:9090/x/1");
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn test_default_port_when_absent() {
        let url = UrlTemplateBuilder::new()
            .build("localhost", "/target/path/b", None, &BTreeMap::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost/target/path/b");
        assert_eq!(url.port_or_known_default(), Some(80));
    }

    #[test]
    fn test_forwarded_port_lands_in_authority() {
        let url = UrlTemplateBuilder::new()
            .build("localhost", "/target/path/b", Some(8081), &BTreeMap::new())
            .unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert_eq!(url.port(), Some(8081));
    }

    #[test]
    fn test_variable_values_are_encoded() {
        let url = UrlTemplateBuilder::new()
            .build("svc", "/users/{name}/items", None, &vars(&[("name", "a b/c")]))
            .unwrap();
        assert_eq!(url.path(), "/users/a%20b%2Fc/items");
    }

    #[test]
    fn test_multiple_placeholders_in_segment() {
        let url = UrlTemplateBuilder::new()
            .build("svc", "/{a}-{b}", None, &vars(&[("a", "1"), ("b", "2")]))
            .unwrap();
        assert_eq!(url.path(), "/1-2");
    }

    #[test]
    fn test_missing_variable() {
        let err = UrlTemplateBuilder::new()
            .build("svc", "/x/{id}/{other}", None, &vars(&[("id", "1")]))
            .unwrap_err();
        assert!(matches!(err, UrlTemplateError::MissingPathVariable(name) if name == "other"));
    }

    #[test]
    fn test_invalid_domain() {
        let err = UrlTemplateBuilder::new()
            .build("", "/x", None, &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, UrlTemplateError::InvalidDomain { .. }));
    }

    #[test]
    fn test_existing_escapes_are_kept() {
        let url = UrlTemplateBuilder::new()
            .build("svc", "/files/a%20b", Some(9090), &BTreeMap::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://svc:9090/files/a%20b");

        let url = UrlTemplateBuilder::new()
            .build("svc", "/files/a%20b/{id}", Some(9090), &vars(&[("id", "7")]))
            .unwrap();
        assert_eq!(url.as_str(), "http://svc:9090/files/a%20b/7");
    }

    #[test]
    fn test_query_in_path_is_kept() {
        let url = UrlTemplateBuilder::new()
            .build("svc", "/search?q=1", Some(9090), &BTreeMap::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://svc:9090/search?q=1");

        let url = UrlTemplateBuilder::new()
            .build("svc", "/search?q={q}", Some(9090), &vars(&[("q", "a&b")]))
            .unwrap();
        assert_eq!(url.path(), "/search");
        assert_eq!(url.query(), Some("q=a%26b"));
    }

    #[test]
    fn test_domain_must_be_bare_host() {
        let builder = UrlTemplateBuilder::new();
        for domain in ["svc?x=1", "svc/p", "user@svc", "user:pw@svc", "svc#frag"] {
            let err = builder.build(domain, "/x", Some(9090), &BTreeMap::new()).unwrap_err();
            assert!(
                matches!(&err, UrlTemplateError::NotBareHost(d) if d == domain),
                "{}: {:?}",
                domain,
                err
            );
        }
        assert!(builder.build("svc:8080", "/x", None, &BTreeMap::new()).is_ok());
        assert!(builder.build("svc/", "/x", None, &BTreeMap::new()).is_ok());
    }
}
