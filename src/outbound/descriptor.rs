//! Outbound request descriptor.
//!
//! Everything a strategy needs to issue one outbound call. Built through
//! [`DescriptorBuilder`], which refuses to produce a descriptor when a
//! mandatory field is missing.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, Method};
use mime::Mime;
use thiserror::Error;

/// Errors raised while building a descriptor or parsing a media type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("{0} must be set")]
    MissingField(&'static str),

    #[error("invalid media type '{0}'")]
    InvalidMediaType(String),
}

/// Parse a configured media type such as `application/json; charset=utf-8`.
pub fn parse_media_type(value: &str) -> Result<Mime, DescriptorError> {
    value
        .trim()
        .parse::<Mime>()
        .map_err(|_| DescriptorError::InvalidMediaType(value.to_string()))
}

/// How the response body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Text,
    Json,
    Bytes,
}

/// Description of one outbound call.
#[derive(Debug, Clone)]
pub struct OutboundRequestDescriptor {
    media_type: Mime,
    domain: String,
    path: String,
    port: Option<u16>,
    headers: HeaderMap,
    method: Method,
    path_variables: BTreeMap<String, String>,
    body: Option<String>,
    response_type: ResponseType,
}

impl OutboundRequestDescriptor {
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    pub fn media_type(&self) -> &Mime {
        &self.media_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path_variables(&self) -> &BTreeMap<String, String> {
        &self.path_variables
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }
}

/// Builder for [`OutboundRequestDescriptor`].
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    media_type: Option<Mime>,
    domain: Option<String>,
    path: Option<String>,
    port: Option<u16>,
    headers: HeaderMap,
    method: Option<Method>,
    path_variables: BTreeMap<String, String>,
    body: Option<String>,
    response_type: Option<ResponseType>,
}

impl DescriptorBuilder {
    pub fn media_type(mut self, media_type: Mime) -> Self {
        self.media_type = Some(media_type);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_variables.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn build(self) -> Result<OutboundRequestDescriptor, DescriptorError> {
        Ok(OutboundRequestDescriptor {
            media_type: self.media_type.ok_or(DescriptorError::MissingField("media_type"))?,
            domain: self.domain.ok_or(DescriptorError::MissingField("domain"))?,
            path: self.path.ok_or(DescriptorError::MissingField("path"))?,
            port: self.port,
            headers: self.headers,
            method: self.method.ok_or(DescriptorError::MissingField("method"))?,
            path_variables: self.path_variables,
            body: self.body,
            response_type: self
                .response_type
                .ok_or(DescriptorError::MissingField("response_type"))?,
        })
    }
}
