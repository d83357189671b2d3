//! Strategy registry.
//!
//! Strategies are kept in registration order; the first one that supports a
//! descriptor wins. No match is a configuration error and is never papered
//! over with a default strategy.

use std::sync::Arc;

use mime::Mime;

use crate::outbound::client::OutboundClient;
use crate::outbound::descriptor::OutboundRequestDescriptor;
use crate::outbound::strategy::{JsonRequestStrategy, RequestStrategy, TextRequestStrategy};
use crate::outbound::types::{OutboundError, OutboundResponse, OutboundResult};

/// Ordered list of request strategies.
#[derive(Default, Clone)]
pub struct RequestStrategyFactory {
    strategies: Vec<Arc<dyn RequestStrategy>>,
}

impl RequestStrategyFactory {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in strategies: JSON first, then plain text.
    pub fn with_defaults(client: Arc<OutboundClient>) -> Self {
        let mut factory = Self::new();
        factory.register(Arc::new(JsonRequestStrategy::new(client.clone())));
        factory.register(Arc::new(TextRequestStrategy::new(client)));
        factory
    }

    /// Append a strategy; it is consulted after every earlier one.
    pub fn register(&mut self, strategy: Arc<dyn RequestStrategy>) {
        tracing::debug!(strategy = strategy.name(), position = self.strategies.len(), "Registered request strategy");
        self.strategies.push(strategy);
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Whether any registered strategy handles `media_type`.
    pub fn supports_media_type(&self, media_type: &Mime) -> bool {
        self.strategies
            .iter()
            .flat_map(|s| s.supported_media_types())
            .any(|m| m.essence_str() == media_type.essence_str())
    }

    pub fn find_strategy(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<Arc<dyn RequestStrategy>> {
        match self.strategies.iter().find(|s| s.supports(descriptor)) {
            Some(strategy) => {
                tracing::info!(strategy = strategy.name(), "[Strategy]");
                Ok(strategy.clone())
            }
            None => {
                tracing::error!(media_type = %descriptor.media_type(), "Unsupported request strategy");
                Err(OutboundError::UnsupportedStrategy(descriptor.media_type().clone()))
            }
        }
    }

    /// Find the strategy for `descriptor` and run it.
    pub async fn execute(&self, descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse> {
        self.find_strategy(descriptor)?.execute(descriptor).await
    }
}

impl std::fmt::Debug for RequestStrategyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestStrategyFactory")
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::descriptor::ResponseType;
    use crate::outbound::types::ResponseBody;
    use async_trait::async_trait;
    use axum::http::{Method, StatusCode};

    /// Answers without any I/O.
    struct FixedStrategy {
        name: &'static str,
        media_types: Vec<Mime>,
    }

    #[async_trait]
    impl RequestStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn supported_media_types(&self) -> &[Mime] {
            &self.media_types
        }

        async fn do_execute(&self, _descriptor: &OutboundRequestDescriptor) -> OutboundResult<OutboundResponse> {
            Ok(OutboundResponse::Content {
                status: StatusCode::OK,
                body: ResponseBody::Text(self.name.to_string()),
            })
        }
    }

    fn fixed(name: &'static str, media_types: Vec<Mime>) -> Arc<dyn RequestStrategy> {
        Arc::new(FixedStrategy { name, media_types })
    }

    fn descriptor(media_type: Mime) -> OutboundRequestDescriptor {
        OutboundRequestDescriptor::builder()
            .media_type(media_type)
            .domain("svc")
            .path("/")
            .method(Method::GET)
            .response_type(ResponseType::Text)
            .build()
            .unwrap()
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut factory = RequestStrategyFactory::new();
        factory.register(fixed("first", vec![mime::APPLICATION_JSON]));
        factory.register(fixed("second", vec![mime::APPLICATION_JSON, mime::TEXT_PLAIN]));

        let json = factory.find_strategy(&descriptor(mime::APPLICATION_JSON)).unwrap();
        assert_eq!(json.name(), "first");
        let text = factory.find_strategy(&descriptor(mime::TEXT_PLAIN)).unwrap();
        assert_eq!(text.name(), "second");
    }

    #[test]
    fn test_no_match_is_unsupported() {
        let mut factory = RequestStrategyFactory::new();
        factory.register(fixed("json", vec![mime::APPLICATION_JSON]));
        let xml = "application/xml".parse::<Mime>().unwrap();
        let err = factory.find_strategy(&descriptor(xml.clone())).err().unwrap();
        assert!(matches!(err, OutboundError::UnsupportedStrategy(m) if m == xml));
    }

    #[tokio::test]
    async fn test_execute_runs_selected_strategy() {
        let mut factory = RequestStrategyFactory::new();
        factory.register(fixed("text-only", vec![mime::TEXT_PLAIN]));
        let res = factory.execute(&descriptor(mime::TEXT_PLAIN)).await.unwrap();
        assert_eq!(
            res,
            OutboundResponse::Content {
                status: StatusCode::OK,
                body: ResponseBody::Text("text-only".into()),
            }
        );
    }

    #[test]
    fn test_default_registration_order() {
        let client = Arc::new(
            OutboundClient::new(std::time::Duration::from_secs(1), std::time::Duration::from_secs(1)).unwrap(),
        );
        let factory = RequestStrategyFactory::with_defaults(client);
        assert_eq!(factory.len(), 2);
        assert!(factory.supports_media_type(&mime::TEXT_PLAIN));
        assert!(!factory.supports_media_type(&"application/xml".parse::<Mime>().unwrap()));
        assert_eq!(
            factory.find_strategy(&descriptor(mime::APPLICATION_JSON)).unwrap().name(),
            "json"
        );
        assert_eq!(format!("{:?}", factory), "RequestStrategyFactory { strategies: [\"json\", \"text\"] }");
    }
}
