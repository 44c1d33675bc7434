//! Shared test fakes for pipeline tests.
//!
//! Mirrors the scripted-responses style used across the workspace: each fake
//! returns the next canned response per call and panics when the script runs
//! out, so a test failing with "no more responses" is a test that made an
//! unexpected external call.

use async_trait::async_trait;
use menuforge_core::error::{
    GenerationError, IntentError, InventoryError, KnowledgeError, ProviderError,
};
use menuforge_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use menuforge_core::{
    AdjustInputs, ComposeInputs, Composition, Extraction, FilterSpec, Ingredient,
    IngredientSource, Intent, IntentExtractor, KnowledgeStore, MealType, Menu, MenuComposer,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that returns a sequence of scripted completions.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more responses");
        Ok(ProviderResponse {
            content,
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 }),
            model: "mock-model".into(),
        })
    }
}

/// A standard test intent: 200k budget, 2 people, Korean lunch.
pub fn test_intent() -> Intent {
    Intent {
        budget: 200_000.0,
        budget_specified: true,
        people: 2,
        cuisine: Some("Korean".into()),
        preferences: vec![],
        meal_type: MealType::Lunch,
    }
}

/// A one-dish menu at the given total, with no ingredient lines so repricing
/// leaves the total untouched.
pub fn flat_menu(total: f64) -> Menu {
    Menu {
        items: vec![menuforge_core::MenuItem {
            name: format!("Set menu at {total}"),
            category: menuforge_core::DishCategory::Main,
            ingredients: vec![],
            price: total,
        }],
    }
}

/// Scripted intent extractor.
pub struct MockExtractor {
    result: Mutex<Option<Result<Intent, IntentError>>>,
}

impl MockExtractor {
    pub fn ok(intent: Intent) -> Self {
        Self { result: Mutex::new(Some(Ok(intent))) }
    }

    pub fn failing() -> Self {
        Self { result: Mutex::new(Some(Err(IntentError::MissingBudget))) }
    }
}

#[async_trait]
impl IntentExtractor for MockExtractor {
    async fn extract(&self, _query: &str) -> Result<Extraction, IntentError> {
        match self.result.lock().unwrap().take().expect("MockExtractor used twice") {
            Ok(intent) => Ok(Extraction { intent, usage: None }),
            Err(e) => Err(e),
        }
    }
}

/// Spec builder that always returns match-all.
pub struct PassthroughSpecBuilder;

#[async_trait]
impl menuforge_core::FilterSpecBuilder for PassthroughSpecBuilder {
    async fn build(&self, _intent: &Intent) -> Result<FilterSpec, InventoryError> {
        Ok(FilterSpec::match_all())
    }
}

/// Scripted ingredient source.
pub struct MockSource {
    result: Result<Vec<Ingredient>, String>,
}

impl MockSource {
    pub fn with(rows: Vec<Ingredient>) -> Self {
        Self { result: Ok(rows) }
    }

    pub fn failing(reason: &str) -> Self {
        Self { result: Err(reason.into()) }
    }
}

#[async_trait]
impl IngredientSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, spec: &FilterSpec) -> Result<Vec<Ingredient>, InventoryError> {
        match &self.result {
            Ok(rows) => Ok(rows.iter().filter(|r| spec.matches(r)).cloned().collect()),
            Err(reason) => Err(InventoryError::Unavailable(reason.clone())),
        }
    }
}

/// Scripted knowledge store.
pub struct MockStore {
    result: Result<Vec<String>, String>,
}

impl MockStore {
    pub fn with(snippets: Vec<&str>) -> Self {
        Self { result: Ok(snippets.into_iter().map(String::from).collect()) }
    }

    pub fn empty() -> Self {
        Self::with(vec![])
    }

    pub fn failing(reason: &str) -> Self {
        Self { result: Err(reason.into()) }
    }
}

#[async_trait]
impl KnowledgeStore for MockStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<String>, KnowledgeError> {
        match &self.result {
            Ok(snippets) => Ok(snippets.iter().take(top_k).cloned().collect()),
            Err(reason) => Err(KnowledgeError::QueryFailed(reason.clone())),
        }
    }
}

/// What a [`MockComposer`] observed, for assertions.
#[derive(Debug, Default, Clone)]
pub struct ComposerObservations {
    pub generate_calls: usize,
    pub adjust_calls: usize,
    pub seen_ingredients: usize,
    pub seen_knowledge: usize,
    pub seen_breaches: Vec<&'static str>,
}

/// Scripted menu composer: one generation result, then a queue of adjustment
/// results.
pub struct MockComposer {
    generate: Mutex<Option<Result<Menu, String>>>,
    adjustments: Mutex<VecDeque<Result<Menu, String>>>,
    observations: Mutex<ComposerObservations>,
}

impl MockComposer {
    pub fn generating(menu: Menu) -> Self {
        Self {
            generate: Mutex::new(Some(Ok(menu))),
            adjustments: Mutex::new(VecDeque::new()),
            observations: Mutex::new(ComposerObservations::default()),
        }
    }

    pub fn failing_generation(reason: &str) -> Self {
        Self {
            generate: Mutex::new(Some(Err(reason.into()))),
            adjustments: Mutex::new(VecDeque::new()),
            observations: Mutex::new(ComposerObservations::default()),
        }
    }

    pub fn then_adjusting(self, menu: Menu) -> Self {
        self.adjustments.lock().unwrap().push_back(Ok(menu));
        self
    }

    pub fn observations(&self) -> ComposerObservations {
        self.observations.lock().unwrap().clone()
    }
}

#[async_trait]
impl MenuComposer for MockComposer {
    async fn generate(&self, inputs: ComposeInputs<'_>) -> Result<Composition, GenerationError> {
        let mut obs = self.observations.lock().unwrap();
        obs.generate_calls += 1;
        obs.seen_ingredients = inputs.ingredients.len();
        obs.seen_knowledge = inputs.knowledge.len();
        drop(obs);

        match self.generate.lock().unwrap().take().expect("MockComposer: generate called twice") {
            Ok(menu) => Ok(Composition { menu, usage: None }),
            Err(reason) => Err(GenerationError::Unparseable(reason)),
        }
    }

    async fn adjust(&self, inputs: AdjustInputs<'_>) -> Result<Composition, GenerationError> {
        let mut obs = self.observations.lock().unwrap();
        obs.adjust_calls += 1;
        if let Some(breach) = inputs.verdict.breach {
            obs.seen_breaches.push(breach.code());
        }
        drop(obs);

        match self
            .adjustments
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockComposer: no more adjustments scripted")
        {
            Ok(menu) => Ok(Composition { menu, usage: None }),
            Err(reason) => Err(GenerationError::Unparseable(reason)),
        }
    }
}
