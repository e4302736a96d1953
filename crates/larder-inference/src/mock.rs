//! Mock quantity combiner for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use larder_inference::mock::MockCombiner;
//!
//! let combiner = MockCombiner::new()
//!     .with_response("garlic", "5 cloves")
//!     .with_failure("butter");
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use larder_core::{Error, QuantityCombiner, Result};

/// Mock combiner for testing.
#[derive(Clone)]
pub struct MockCombiner {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    responses: HashMap<String, String>,
    default_response: Option<String>,
    failing_ingredients: HashSet<String>,
    fail_all: bool,
}

/// One recorded `combine` invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub ingredient_name: String,
    pub quantities: Vec<String>,
}

impl MockCombiner {
    /// Create a new mock combiner. With no configured responses it echoes
    /// the quantities joined by " + ", mirroring the default combiner.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Map a specific ingredient to a fixed reply.
    pub fn with_response(mut self, ingredient: impl Into<String>, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(ingredient.into(), reply.into());
        self
    }

    /// Set a fixed reply for any ingredient without a specific mapping.
    pub fn with_default_response(mut self, reply: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = Some(reply.into());
        self
    }

    /// Make `combine` fail for a specific ingredient.
    pub fn with_failure(mut self, ingredient: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_ingredients
            .insert(ingredient.into());
        self
    }

    /// Make every `combine` call fail.
    pub fn with_all_failing(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_all = true;
        self
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of `combine` calls made.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }
}

impl Default for MockCombiner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuantityCombiner for MockCombiner {
    async fn combine(&self, ingredient_name: &str, quantities: &[String]) -> Result<String> {
        self.call_log.lock().unwrap().push(MockCall {
            ingredient_name: ingredient_name.to_string(),
            quantities: quantities.to_vec(),
        });

        if self.config.fail_all || self.config.failing_ingredients.contains(ingredient_name) {
            return Err(Error::Inference(format!(
                "mock failure for {ingredient_name}"
            )));
        }

        if let Some(reply) = self.config.responses.get(ingredient_name) {
            return Ok(reply.clone());
        }
        if let Some(reply) = &self.config.default_response {
            return Ok(reply.clone());
        }
        Ok(quantities.join(" + "))
    }
}
