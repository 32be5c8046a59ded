//! Answer synthesis orchestration.
//!
//! Per-request state machine:
//! `Received -> Retrieving -> (InsufficientEvidence | Assembling) ->
//! Synthesizing -> (Answered | SynthesisFailed)`.
//!
//! The insufficient-evidence path short-circuits to a fixed refusal and
//! never reaches the external generator. The synthesis path embeds the
//! assembled context verbatim in the prompt, calls the provider with a
//! bounded output budget at low temperature, and retries a small fixed
//! number of times before failing the request.

use std::sync::Arc;

use crate::context::{AssembledContext, Citation, ContextAssembler};
use crate::core::config::GenerationConfig;
use crate::core::errors::ApiError;
use crate::index::VectorIndex;
use crate::llm::{ChatMessage, GenerationProvider, GenerationRequest};
use crate::retrieve::{InsufficientReason, RetrievalOutcome, Retriever};

/// Refusal shown when the corpus holds nothing at all.
const REFUSAL_EMPTY_CORPUS: &str = "I don't have any research papers in my library yet, so I \
can't give you an evidence-backed answer. Please consult a qualified healthcare professional \
for guidance on this question.";

/// Refusal shown when nothing in the corpus clears the confidence floor.
const REFUSAL_NO_MATCH: &str = "I couldn't find research in my library that is sufficiently \
relevant to your question, so I won't guess. Please consult a qualified healthcare \
professional for guidance on this question.";

const SYSTEM_PROMPT: &str = "You are a medical research assistant.\n\
Answer the health question strictly using the research context supplied by the user.\n\
If the evidence is limited, say so clearly.\n\
Do not make personal diagnostic or treatment claims.\n\
Close your answer with a References section listing the titles and source URLs of the \
papers you actually used.";

/// Phases a request moves through; used for tracing, not control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestPhase {
    Received,
    Retrieving,
    InsufficientEvidence,
    Assembling,
    Synthesizing,
    Answered,
    SynthesisFailed,
}

impl RequestPhase {
    fn as_str(&self) -> &'static str {
        match self {
            RequestPhase::Received => "received",
            RequestPhase::Retrieving => "retrieving",
            RequestPhase::InsufficientEvidence => "insufficient_evidence",
            RequestPhase::Assembling => "assembling",
            RequestPhase::Synthesizing => "synthesizing",
            RequestPhase::Answered => "answered",
            RequestPhase::SynthesisFailed => "synthesis_failed",
        }
    }
}

/// The caller-facing result of `answer`.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    /// False when the answer is a refusal rather than synthesized text.
    pub grounded: bool,
    pub citations: Vec<Citation>,
}

pub struct Orchestrator {
    retriever: Retriever,
    assembler: ContextAssembler,
    provider: Arc<dyn GenerationProvider>,
    generation: GenerationConfig,
}

impl Orchestrator {
    pub fn new(
        retriever: Retriever,
        assembler: ContextAssembler,
        provider: Arc<dyn GenerationProvider>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            retriever,
            assembler,
            provider,
            generation,
        }
    }

    /// Answer a question against the given index snapshot.
    ///
    /// In-flight requests keep the snapshot they were handed; a concurrent
    /// rebuild never affects them.
    pub async fn answer(
        &self,
        question: &str,
        index: &VectorIndex,
    ) -> Result<AnswerResult, ApiError> {
        let request_id = uuid::Uuid::new_v4();
        let mut phase = RequestPhase::Received;
        let trace = |from: RequestPhase, to: RequestPhase| {
            tracing::debug!(%request_id, "{} -> {}", from.as_str(), to.as_str());
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("question must not be empty".to_string()));
        }

        trace(phase, RequestPhase::Retrieving);
        phase = RequestPhase::Retrieving;

        let evidence = match self.retriever.rank(question, index) {
            RetrievalOutcome::Insufficient(reason) => {
                trace(phase, RequestPhase::InsufficientEvidence);
                tracing::info!(%request_id, ?reason, "refusing without synthesis");
                return Ok(AnswerResult {
                    answer: refusal_for(reason).to_string(),
                    grounded: false,
                    citations: Vec::new(),
                });
            }
            RetrievalOutcome::Ranked(evidence) => evidence,
        };

        trace(phase, RequestPhase::Assembling);
        phase = RequestPhase::Assembling;

        let top_k = self.retriever.config().top_k;
        let context = self.assembler.assemble(&evidence, top_k);
        if context.is_empty() {
            // Evidence cleared the threshold but nothing fit the budget
            // with its citation intact; treat as insufficient.
            trace(phase, RequestPhase::InsufficientEvidence);
            return Ok(AnswerResult {
                answer: REFUSAL_NO_MATCH.to_string(),
                grounded: false,
                citations: Vec::new(),
            });
        }

        trace(phase, RequestPhase::Synthesizing);
        phase = RequestPhase::Synthesizing;

        let request = GenerationRequest {
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_user_prompt(question, &context)),
            ],
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
        };

        match self.generate_with_retries(request, request_id).await {
            Ok(answer) => {
                trace(phase, RequestPhase::Answered);
                Ok(AnswerResult {
                    answer,
                    grounded: true,
                    citations: context.citations,
                })
            }
            Err(err) => {
                trace(phase, RequestPhase::SynthesisFailed);
                Err(err)
            }
        }
    }

    /// One call plus at most `max_retries` extra attempts with linear
    /// backoff. Never unbounded.
    async fn generate_with_retries(
        &self,
        request: GenerationRequest,
        request_id: uuid::Uuid,
    ) -> Result<String, ApiError> {
        let attempts = 1 + self.generation.max_retries;
        let mut last_err = None;

        for attempt in 1..=attempts {
            match self.provider.generate(request.clone()).await {
                Ok(answer) => return Ok(answer),
                Err(err) => {
                    tracing::warn!(
                        %request_id,
                        "generation attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        err
                    );
                    last_err = Some(err);
                    if attempt < attempts {
                        tokio::time::sleep(std::time::Duration::from_millis(
                            500 * attempt as u64,
                        ))
                        .await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| ApiError::SynthesisFailed("no generation attempts ran".to_string())))
    }
}

fn refusal_for(reason: InsufficientReason) -> &'static str {
    match reason {
        InsufficientReason::EmptyCorpus => REFUSAL_EMPTY_CORPUS,
        InsufficientReason::BelowThreshold => REFUSAL_NO_MATCH,
    }
}

fn build_user_prompt(question: &str, context: &AssembledContext) -> String {
    format!(
        "RESEARCH CONTEXT:\n{}\nQUESTION:\n{}\n\nANSWER:",
        context.text, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::config::{ContextConfig, IndexConfig, RetrievalConfig};
    use crate::corpus::{Document, Origin};
    use crate::index::Indexer;

    /// Scripted provider: counts calls, fails a configured number of times,
    /// then echoes a canned answer with the references it was shown.
    struct ScriptedProvider {
        calls: AtomicUsize,
        fail_first: usize,
    }

    impl ScriptedProvider {
        fn new(fail_first: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: GenerationRequest) -> Result<String, ApiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(ApiError::SynthesisFailed("scripted failure".to_string()));
            }

            let context = request
                .messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("Evidence-based answer.\n\nReferences:\n{context}"))
        }
    }

    fn make_doc(title: &str, abstract_text: &str) -> Document {
        Document {
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            source_url: format!("https://example.org/{}", title.replace(' ', "-")),
            origin: Origin::Arxiv,
            ingested_at: Utc::now(),
        }
    }

    fn orchestrator(provider: Arc<ScriptedProvider>, retries: u32) -> Orchestrator {
        let generation = GenerationConfig {
            max_retries: retries,
            ..GenerationConfig::default()
        };
        Orchestrator::new(
            Retriever::new(RetrievalConfig::default()),
            ContextAssembler::new(ContextConfig::default()),
            provider,
            generation,
        )
    }

    #[tokio::test]
    async fn empty_corpus_refuses_without_calling_provider() {
        let provider = Arc::new(ScriptedProvider::new(0));
        let orch = orchestrator(provider.clone(), 0);

        let result = orch
            .answer("What helps with migraines?", &VectorIndex::empty())
            .await
            .unwrap();

        assert!(!result.grounded);
        assert!(result.answer.contains("healthcare professional"));
        assert!(result.citations.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn irrelevant_corpus_refuses_without_calling_provider() {
        let index = Indexer::new(IndexConfig::default())
            .build(vec![make_doc("Pasta Recipes", "cooking pasta tomato sauce")]);
        let provider = Arc::new(ScriptedProvider::new(0));
        let orch = orchestrator(provider.clone(), 0);

        let result = orch
            .answer("does exercise reduce heart disease risk", &index)
            .await
            .unwrap();

        assert!(!result.grounded);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn relevant_corpus_synthesizes_with_citations() {
        let index = Indexer::new(IndexConfig::default()).build(vec![make_doc(
            "Exercise and Cardiovascular Risk",
            "regular exercise reduces heart disease risk in adults",
        )]);
        let provider = Arc::new(ScriptedProvider::new(0));
        let orch = orchestrator(provider.clone(), 0);

        let result = orch
            .answer("Does exercise reduce heart disease risk?", &index)
            .await
            .unwrap();

        assert!(result.grounded);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.citations.len(), 1);
        assert_eq!(result.citations[0].title, "Exercise and Cardiovascular Risk");
        // The provider saw the evidence verbatim, citation included.
        assert!(result.answer.contains("Exercise and Cardiovascular Risk"));
        assert!(result
            .answer
            .contains("https://example.org/Exercise-and-Cardiovascular-Risk"));
    }

    #[tokio::test]
    async fn retries_are_bounded_then_fail() {
        let index = Indexer::new(IndexConfig::default()).build(vec![make_doc(
            "Exercise and Cardiovascular Risk",
            "regular exercise reduces heart disease risk in adults",
        )]);
        let provider = Arc::new(ScriptedProvider::new(100));
        let orch = orchestrator(provider.clone(), 2);

        let err = orch
            .answer("Does exercise reduce heart disease risk?", &index)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::SynthesisFailed(_)));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn transient_failure_recovers_within_retry_budget() {
        let index = Indexer::new(IndexConfig::default()).build(vec![make_doc(
            "Exercise and Cardiovascular Risk",
            "regular exercise reduces heart disease risk in adults",
        )]);
        let provider = Arc::new(ScriptedProvider::new(1));
        let orch = orchestrator(provider.clone(), 2);

        let result = orch
            .answer("Does exercise reduce heart disease risk?", &index)
            .await
            .unwrap();

        assert!(result.grounded);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn blank_question_is_a_bad_request() {
        let orch = orchestrator(Arc::new(ScriptedProvider::new(0)), 0);
        let err = orch.answer("   ", &VectorIndex::empty()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
