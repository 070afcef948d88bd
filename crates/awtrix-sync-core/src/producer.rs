//! Producer contract and the registries that enumerate producers per cycle.
//!
//! The engine never knows which concrete producers exist. It asks a
//! [`ProducerRegistry`] for handles at the start of every cycle and invokes
//! each one through the [`Producer`] trait.

use crate::error::{ProducerError, RegistryError};
use crate::slide::SlideSet;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Producer
// ---------------------------------------------------------------------------

/// What one producer reports for the current cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub name: String,
    pub slides: SlideSet,
}

impl Widget {
    pub fn new(name: impl Into<String>, slides: SlideSet) -> Self {
        Self {
            name: name.into(),
            slides,
        }
    }
}

/// A named source of one widget's content.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Label used in logs when the producer fails before reporting a name.
    fn label(&self) -> String;

    /// Produce the unit name and its current slides.
    async fn get_slides(&self) -> Result<Widget, ProducerError>;
}

// ---------------------------------------------------------------------------
// ProducerRegistry
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProducerRegistry: Send + Sync {
    /// Enumerate the producers for this cycle, in invocation order.
    async fn discover(&self) -> Result<Vec<Arc<dyn Producer>>, RegistryError>;
}

/// A fixed list of producers, registered up front.
#[derive(Default)]
pub struct StaticRegistry {
    producers: Mutex<Vec<Arc<dyn Producer>>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, producer: Arc<dyn Producer>) {
        self.producers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(producer);
    }

    pub fn len(&self) -> usize {
        self.producers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProducerRegistry for StaticRegistry {
    async fn discover(&self) -> Result<Vec<Arc<dyn Producer>>, RegistryError> {
        Ok(self
            .producers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }
}

/// Concatenates several registries. A failing child is logged and skipped;
/// discovery only fails when every child fails.
pub struct CompositeRegistry {
    children: Vec<Arc<dyn ProducerRegistry>>,
}

impl CompositeRegistry {
    pub fn new(children: Vec<Arc<dyn ProducerRegistry>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl ProducerRegistry for CompositeRegistry {
    async fn discover(&self) -> Result<Vec<Arc<dyn Producer>>, RegistryError> {
        let mut producers = Vec::new();
        let mut errors = Vec::new();
        for child in &self.children {
            match child.discover().await {
                Ok(found) => producers.extend(found),
                Err(e) => {
                    tracing::warn!(error = %e, "producer registry failed; skipping it");
                    errors.push(e.to_string());
                }
            }
        }
        if !self.children.is_empty() && errors.len() == self.children.len() {
            return Err(RegistryError::AllFailed(errors.join("; ")));
        }
        Ok(producers)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl Producer for Fixed {
        fn label(&self) -> String {
            self.0.to_string()
        }

        async fn get_slides(&self) -> Result<Widget, ProducerError> {
            Ok(Widget::new(self.0, SlideSet::empty()))
        }
    }

    struct Broken;

    #[async_trait]
    impl ProducerRegistry for Broken {
        async fn discover(&self) -> Result<Vec<Arc<dyn Producer>>, RegistryError> {
            Err(RegistryError::MissingDir("./apps".to_string()))
        }
    }

    async fn names(registry: &dyn ProducerRegistry) -> Vec<String> {
        registry
            .discover()
            .await
            .unwrap()
            .iter()
            .map(|p| p.label())
            .collect()
    }

    #[tokio::test]
    async fn static_registry_keeps_registration_order() {
        let registry = StaticRegistry::new();
        assert!(registry.is_empty());
        registry.register(Arc::new(Fixed("b")));
        registry.register(Arc::new(Fixed("a")));
        assert_eq!(names(&registry).await, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn composite_skips_failing_child() {
        let ok = StaticRegistry::new();
        ok.register(Arc::new(Fixed("clock")));
        let composite = CompositeRegistry::new(vec![Arc::new(Broken), Arc::new(ok)]);
        assert_eq!(names(&composite).await, vec!["clock"]);
    }

    #[tokio::test]
    async fn composite_fails_when_all_children_fail() {
        let composite = CompositeRegistry::new(vec![Arc::new(Broken), Arc::new(Broken)]);
        assert!(matches!(
            composite.discover().await,
            Err(RegistryError::AllFailed(_))
        ));
    }

    #[tokio::test]
    async fn empty_composite_discovers_nothing() {
        let composite = CompositeRegistry::new(Vec::new());
        assert!(composite.discover().await.unwrap().is_empty());
    }
}
