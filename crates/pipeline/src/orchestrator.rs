//! The orchestrator — sequences the pipeline stages and owns the
//! loop-termination policy.
//!
//! States:
//!
//! ```text
//! ParseIntent → QueryIngredients → PrefilterIngredients → RetrieveAndGenerate
//!     → ValidateBudget → {AdjustMenu → ValidateBudget}* → BuildResponse
//! ```
//!
//! plus `Failed` as an absorbing state. The conditional edge out of
//! `ValidateBudget` is the single decision point [`route_after_validate`]:
//! without a bound, a persistently off-budget generator could loop forever,
//! so the loop is capped at [`MAX_ADJUST_ITERATIONS`] and exhaustion accepts
//! the last candidate as a best-effort success instead of erroring the
//! request.

use crate::filter::{fallback_spec, prefilter};
use crate::retrieve::build_retrieval_query;
use crate::validate::validate_budget;
use menuforge_core::{
    AdjustInputs, ComposeInputs, FailureReason, FilterSpecBuilder, IngredientSource, Intent,
    IntentExtractor, KnowledgeStore, MenuComposer, MenuResponse, PipelineState, PipelineStatus,
    ResponseMetadata, ResponseStatus, ValidationVerdict,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fixed ceiling on adjustment rounds.
pub const MAX_ADJUST_ITERATIONS: u32 = 2;

/// Pipeline stages, one per node of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ParseIntent,
    QueryIngredients,
    PrefilterIngredients,
    RetrieveAndGenerate,
    ValidateBudget,
    AdjustMenu,
    BuildResponse,
}

/// Where to go after a validation verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Verdict passed — build the response.
    Accept,
    /// Verdict failed with iterations remaining — repair the menu.
    Adjust,
    /// Verdict failed and the ceiling is reached — accept the last candidate.
    AcceptBestEffort,
}

/// The one decision point of the conditional loop. Pure, so the loop
/// terminates by construction.
pub fn route_after_validate(verdict: &ValidationVerdict, iterations: u32) -> Route {
    if verdict.passed {
        Route::Accept
    } else if iterations < MAX_ADJUST_ITERATIONS {
        Route::Adjust
    } else {
        Route::AcceptBestEffort
    }
}

/// Sequences the pipeline over injected collaborators.
///
/// One `Orchestrator` serves many concurrent requests: every call to
/// [`suggest`](Orchestrator::suggest) threads its own [`PipelineState`], so
/// no cross-request synchronization exists anywhere in the pipeline.
pub struct Orchestrator {
    extractor: Arc<dyn IntentExtractor>,
    spec_builder: Arc<dyn FilterSpecBuilder>,
    inventory: Arc<dyn IngredientSource>,
    knowledge: Arc<dyn KnowledgeStore>,
    composer: Arc<dyn MenuComposer>,
    top_k: usize,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn IntentExtractor>,
        spec_builder: Arc<dyn FilterSpecBuilder>,
        inventory: Arc<dyn IngredientSource>,
        knowledge: Arc<dyn KnowledgeStore>,
        composer: Arc<dyn MenuComposer>,
    ) -> Self {
        Self {
            extractor,
            spec_builder,
            inventory,
            knowledge,
            composer,
            top_k: 5,
        }
    }

    /// Set how many knowledge snippets are retrieved per request.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Run the full pipeline for one query.
    ///
    /// Each stage is a single collaborator call plus bounded local work, so
    /// dropping the returned future (client disconnect, deadline) aborts the
    /// run between stages.
    pub async fn suggest(&self, query: &str, previous_dishes: Vec<String>) -> MenuResponse {
        let started = Instant::now();
        let mut state = PipelineState::new(query, previous_dishes);
        let mut stage = Stage::ParseIntent;

        info!(query_len = query.len(), "Pipeline started");

        loop {
            debug_assert!(!state.is_terminal(), "terminal state must not advance");

            stage = match stage {
                Stage::ParseIntent => match self.extractor.extract(&state.query).await {
                    Ok(extraction) => {
                        state.record_usage("parse_intent", extraction.usage);
                        state.intent = Some(extraction.intent);
                        Stage::QueryIngredients
                    }
                    Err(e) => {
                        warn!(error = %e, "Intent extraction failed");
                        break self.fail(
                            &mut state,
                            FailureReason::IntentParse,
                            format!("Could not extract a usable intent: {e}"),
                            started,
                        );
                    }
                },

                Stage::QueryIngredients => {
                    let Some(intent) = state.intent.clone() else {
                        unreachable!("QueryIngredients runs only after ParseIntent")
                    };

                    let spec = match self.spec_builder.build(&intent).await {
                        Ok(spec) => spec,
                        Err(e) => {
                            warn!(error = %e, "Filter spec builder failed, using fallback spec");
                            fallback_spec(&intent)
                        }
                    };

                    match self.inventory.fetch(&spec).await {
                        Ok(rows) => {
                            // An empty inventory result is valid and propagates.
                            info!(count = rows.len(), source = self.inventory.name(), "Ingredients fetched");
                            state.candidates = rows;
                            Stage::PrefilterIngredients
                        }
                        Err(e) => {
                            warn!(error = %e, "Ingredient source failed");
                            break self.fail(
                                &mut state,
                                FailureReason::IngredientSource,
                                format!("Ingredient source unavailable: {e}"),
                                started,
                            );
                        }
                    }
                }

                Stage::PrefilterIngredients => {
                    let before = state.candidates.len();
                    state.candidates = prefilter(std::mem::take(&mut state.candidates));
                    debug!(before, after = state.candidates.len(), "Candidates prefiltered");
                    Stage::RetrieveAndGenerate
                }

                Stage::RetrieveAndGenerate => {
                    let Some(intent) = state.intent.clone() else {
                        unreachable!("RetrieveAndGenerate runs only after ParseIntent")
                    };

                    let names: Vec<String> =
                        state.candidates.iter().map(|ing| ing.name.clone()).collect();
                    let retrieval_query = build_retrieval_query(&intent, &names);

                    // Retrieval failures are recoverable: generation can still
                    // attempt a menu without extra context.
                    state.knowledge = match self.knowledge.retrieve(&retrieval_query, self.top_k).await
                    {
                        Ok(snippets) => {
                            debug!(count = snippets.len(), "Knowledge retrieved");
                            snippets
                        }
                        Err(e) => {
                            warn!(error = %e, "Knowledge retrieval failed, proceeding without context");
                            Vec::new()
                        }
                    };

                    let inputs = ComposeInputs {
                        intent: &intent,
                        ingredients: &state.candidates,
                        knowledge: &state.knowledge,
                        previous_dishes: &state.previous_dishes,
                    };

                    match self.composer.generate(inputs).await {
                        Ok(composition) => {
                            state.record_usage("generate_menu", composition.usage);
                            state.menu = Some(composition.menu);
                            Stage::ValidateBudget
                        }
                        Err(e) => {
                            warn!(error = %e, "Menu generation failed");
                            break self.fail(
                                &mut state,
                                FailureReason::MenuGeneration,
                                format!("Could not generate a menu: {e}"),
                                started,
                            );
                        }
                    }
                }

                Stage::ValidateBudget => {
                    let Some(intent) = state.intent.as_ref() else {
                        unreachable!("ValidateBudget runs only after ParseIntent")
                    };
                    let Some(menu) = state.menu.as_ref() else {
                        unreachable!("ValidateBudget runs only after a menu exists")
                    };

                    let verdict = validate_budget(menu.total_price(), intent.budget);
                    info!(
                        passed = verdict.passed,
                        total = verdict.total_price,
                        budget = verdict.budget,
                        iteration = state.iterations,
                        "Budget validated"
                    );
                    state.verdict = Some(verdict);

                    match route_after_validate(&verdict, state.iterations) {
                        Route::Accept => Stage::BuildResponse,
                        Route::Adjust => Stage::AdjustMenu,
                        Route::AcceptBestEffort => {
                            warn!(
                                iterations = state.iterations,
                                "Adjustment ceiling reached, accepting last candidate"
                            );
                            Stage::BuildResponse
                        }
                    }
                }

                Stage::AdjustMenu => {
                    state.iterations += 1;
                    let Some(intent) = state.intent.clone() else {
                        unreachable!("AdjustMenu runs only after ParseIntent")
                    };
                    let Some(menu) = state.menu.clone() else {
                        unreachable!("AdjustMenu runs only after a menu exists")
                    };
                    let Some(verdict) = state.verdict else {
                        unreachable!("AdjustMenu runs only after ValidateBudget")
                    };

                    info!(iteration = state.iterations, "Adjusting menu");

                    let inputs = AdjustInputs {
                        menu: &menu,
                        verdict: &verdict,
                        intent: &intent,
                        ingredients: &state.candidates,
                    };

                    match self.composer.adjust(inputs).await {
                        Ok(composition) => {
                            let stage_name = format!("adjust_menu_{}", state.iterations);
                            state.record_usage(&stage_name, composition.usage);
                            state.menu = Some(composition.menu);
                            Stage::ValidateBudget
                        }
                        Err(e) => {
                            warn!(error = %e, "Menu adjustment failed");
                            break self.fail(
                                &mut state,
                                FailureReason::MenuGeneration,
                                format!("Could not adjust the menu: {e}"),
                                started,
                            );
                        }
                    }
                }

                Stage::BuildResponse => {
                    break self.build_response(&mut state, started);
                }
            };
        }
    }

    fn fail(
        &self,
        state: &mut PipelineState,
        reason: FailureReason,
        message: String,
        started: Instant,
    ) -> MenuResponse {
        state.status = PipelineStatus::Failed(reason);
        let mut response = MenuResponse::failed(reason, message);
        response.metadata = self.metadata(state, started);
        response
    }

    fn build_response(&self, state: &mut PipelineState, started: Instant) -> MenuResponse {
        let Some(intent) = state.intent.clone() else {
            unreachable!("BuildResponse runs only after ParseIntent")
        };
        let menu = state.menu.take().unwrap_or_default();
        let total_price = menu.total_price();
        let validated = state.verdict.map(|v| v.passed).unwrap_or(false);

        let status = if validated {
            state.status = PipelineStatus::Success;
            ResponseStatus::Success
        } else {
            state.status = PipelineStatus::BestEffort;
            ResponseStatus::SuccessBestEffort
        };

        let message = self.rationale(&intent, menu.items.len(), total_price, validated);
        let metadata = self.metadata(state, started);

        info!(
            status = ?status,
            items = menu.items.len(),
            total = total_price,
            elapsed_ms = metadata.elapsed_ms,
            "Pipeline finished"
        );

        MenuResponse {
            status,
            reason: None,
            items: menu.items,
            total_price,
            budget: intent.budget,
            cuisine: intent.cuisine,
            meal_type: intent.meal_type,
            message,
            metadata,
        }
    }

    fn rationale(&self, intent: &Intent, dishes: usize, total: f64, validated: bool) -> String {
        let cuisine = intent.cuisine.as_deref().unwrap_or("everyday");
        let mut message = format!(
            "Suggested {dishes} {cuisine} dish(es) for {people} ({meal}), totalling {total:.0} of the {budget:.0} budget.",
            people = intent.people,
            meal = intent.meal_type,
            budget = intent.budget,
        );
        if !validated {
            message.push_str(&format!(
                " The budget window could not be met within {MAX_ADJUST_ITERATIONS} adjustments; this is the closest candidate."
            ));
        }
        message
    }

    fn metadata(&self, state: &PipelineState, started: Instant) -> ResponseMetadata {
        ResponseMetadata {
            elapsed_ms: started.elapsed().as_millis() as u64,
            total_tokens: state.total_tokens(),
            adjustment_rounds: state.iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        flat_menu, test_intent, MockComposer, MockExtractor, MockSource, MockStore,
        PassthroughSpecBuilder,
    };
    use menuforge_core::{BudgetBreach, Freshness, Ingredient};

    fn ing(name: &str, freshness: Freshness) -> Ingredient {
        Ingredient {
            name: name.into(),
            quantity: 100.0,
            unit: "g".into(),
            freshness,
            unit_price: 10.0,
            category: None,
        }
    }

    fn orchestrator(
        extractor: MockExtractor,
        source: MockSource,
        store: MockStore,
        composer: Arc<MockComposer>,
    ) -> Orchestrator {
        Orchestrator::new(
            Arc::new(extractor),
            Arc::new(PassthroughSpecBuilder),
            Arc::new(source),
            Arc::new(store),
            composer,
        )
    }

    // --- Routing decision point ---

    #[test]
    fn route_passes_straight_to_response() {
        let verdict = validate_budget(180_000.0, 200_000.0);
        assert_eq!(route_after_validate(&verdict, 0), Route::Accept);
        assert_eq!(route_after_validate(&verdict, 2), Route::Accept);
    }

    #[test]
    fn route_adjusts_below_ceiling_and_accepts_at_ceiling() {
        let verdict = validate_budget(250_000.0, 200_000.0);
        assert_eq!(route_after_validate(&verdict, 0), Route::Adjust);
        assert_eq!(route_after_validate(&verdict, 1), Route::Adjust);
        assert_eq!(route_after_validate(&verdict, 2), Route::AcceptBestEffort);
    }

    // --- Scenario A: pass on first validation ---

    #[tokio::test]
    async fn scenario_a_validated_menu_succeeds() {
        let composer = Arc::new(MockComposer::generating(flat_menu(180_000.0)));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![ing("rice", Freshness::Fresh)]),
            MockStore::with(vec!["Kimchi pairs with rice."]),
            composer.clone(),
        );

        let response = orch.suggest("Korean lunch for 2, 200k", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.total_price, 180_000.0);
        assert_eq!(response.budget, 200_000.0);
        assert_eq!(response.cuisine.as_deref(), Some("Korean"));
        assert_eq!(response.metadata.adjustment_rounds, 0);
        assert!(response.reason.is_none());

        let obs = composer.observations();
        assert_eq!(obs.generate_calls, 1);
        assert_eq!(obs.adjust_calls, 0);
        assert_eq!(obs.seen_knowledge, 1);
    }

    // --- Scenario B: two failing adjustments end in best effort ---

    #[tokio::test]
    async fn scenario_b_exhausted_loop_returns_best_effort() {
        let composer = Arc::new(
            MockComposer::generating(flat_menu(250_000.0)) // over budget
                .then_adjusting(flat_menu(140_000.0)) // under minimum
                .then_adjusting(flat_menu(150_000.0)), // still under minimum
        );
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![]),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("Korean lunch for 2, 200k", vec![]).await;
        assert_eq!(response.status, ResponseStatus::SuccessBestEffort);
        // The iteration-2 menu is the one returned.
        assert_eq!(response.total_price, 150_000.0);
        assert_eq!(response.metadata.adjustment_rounds, MAX_ADJUST_ITERATIONS);
        assert!(response.message.contains("closest candidate"));

        let obs = composer.observations();
        assert_eq!(obs.adjust_calls, 2);
        // The composer saw the failure direction each round.
        assert_eq!(
            obs.seen_breaches,
            vec![BudgetBreach::OverBudget.code(), BudgetBreach::UnderMinimum.code()]
        );
    }

    // --- Adjustment that lands in the window ---

    #[tokio::test]
    async fn successful_adjustment_ends_in_success() {
        let composer = Arc::new(
            MockComposer::generating(flat_menu(250_000.0)).then_adjusting(flat_menu(190_000.0)),
        );
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![]),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("Korean lunch", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(response.total_price, 190_000.0);
        assert_eq!(response.metadata.adjustment_rounds, 1);
        assert_eq!(composer.observations().adjust_calls, 1);
    }

    // --- Scenario C: 80 survivors are capped at 50, fresh first ---

    #[tokio::test]
    async fn scenario_c_candidates_capped_at_fifty() {
        let mut rows = Vec::new();
        for i in 0..40 {
            rows.push(ing(&format!("u{i}"), Freshness::Unknown));
        }
        for i in 0..40 {
            rows.push(ing(&format!("f{i}"), Freshness::Fresh));
        }

        let composer = Arc::new(MockComposer::generating(flat_menu(180_000.0)));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(rows),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("Korean lunch", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(composer.observations().seen_ingredients, 50);
    }

    // --- Scenario D: unusable intent fails before generation ---

    #[tokio::test]
    async fn scenario_d_intent_failure_skips_generation() {
        let composer = Arc::new(MockComposer::generating(flat_menu(180_000.0)));
        let orch = orchestrator(
            MockExtractor::failing(),
            MockSource::with(vec![]),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("???", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.reason.as_deref(), Some("intent_parse_error"));
        assert!(response.items.is_empty());
        assert_eq!(composer.observations().generate_calls, 0);
    }

    // --- Error taxonomy ---

    #[tokio::test]
    async fn ingredient_source_failure_is_fatal() {
        let composer = Arc::new(MockComposer::generating(flat_menu(180_000.0)));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::failing("database down"),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("lunch", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.reason.as_deref(), Some("ingredient_source_error"));
        assert_eq!(composer.observations().generate_calls, 0);
    }

    #[tokio::test]
    async fn knowledge_failure_is_recovered_with_empty_context() {
        let composer = Arc::new(MockComposer::generating(flat_menu(180_000.0)));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![ing("rice", Freshness::Fresh)]),
            MockStore::failing("index unreachable"),
            composer.clone(),
        );

        let response = orch.suggest("lunch", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(composer.observations().seen_knowledge, 0);
    }

    #[tokio::test]
    async fn generation_failure_is_fatal() {
        let composer = Arc::new(MockComposer::failing_generation("nonsense output"));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![]),
            MockStore::empty(),
            composer,
        );

        let response = orch.suggest("lunch", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Failed);
        assert_eq!(response.reason.as_deref(), Some("menu_generation_error"));
    }

    // --- Empty candidate set still terminates ---

    #[tokio::test]
    async fn empty_candidate_set_reaches_response() {
        let composer = Arc::new(MockComposer::generating(flat_menu(170_000.0)));
        let orch = orchestrator(
            MockExtractor::ok(test_intent()),
            MockSource::with(vec![]),
            MockStore::empty(),
            composer.clone(),
        );

        let response = orch.suggest("anything edible", vec![]).await;
        assert_eq!(response.status, ResponseStatus::Success);
        assert_eq!(composer.observations().seen_ingredients, 0);
    }

    // --- Determinism of the orchestration itself ---

    #[tokio::test]
    async fn identical_inputs_produce_identical_responses() {
        let mut responses = Vec::new();
        for _ in 0..2 {
            let composer = Arc::new(
                MockComposer::generating(flat_menu(250_000.0)).then_adjusting(flat_menu(185_000.0)),
            );
            let orch = orchestrator(
                MockExtractor::ok(test_intent()),
                MockSource::with(vec![ing("rice", Freshness::Fresh)]),
                MockStore::with(vec!["note"]),
                composer,
            );
            let mut response = orch.suggest("Korean lunch for 2, 200k", vec![]).await;
            // Wall-clock time is the one nondeterministic field.
            response.metadata.elapsed_ms = 0;
            responses.push(serde_json::to_value(response).unwrap());
        }
        assert_eq!(responses[0], responses[1]);
    }
}
