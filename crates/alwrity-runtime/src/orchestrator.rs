//! Section generation orchestrator.
//!
//! Each section moves `pending -> generating -> completed | error`. A
//! generate-all run processes a queue of section ids strictly in outline
//! order: section `i` is requested only after section `i-1` has resolved
//! and been written back, so every request sees its neighbors' latest text.
//!
//! Whoever moves a section into `generating` owns it until it reaches a
//! final state. A run never touches a section another caller owns.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use alwrity_analyze::SectionScorer;
use alwrity_core::{Error, GenerationConfig, Result, ScoringConfig};
use alwrity_providers::{ContentProvider, SectionRequest};

use crate::outline::{OutlineState, OwnedBatchGuard};
use crate::types::{GenerationReport, GenerationStatus, OutlineSection, SectionOutcome};

/// Fails a section this caller moved into `generating` if dropped while
/// the section is still there, e.g. when the generating future is dropped.
struct ReconcileGuard<'a> {
    outline: &'a OutlineState,
    ids: Vec<String>,
}

impl<'a> ReconcileGuard<'a> {
    fn claim(outline: &'a OutlineState, section_id: &str) -> Self {
        Self {
            outline,
            ids: vec![section_id.to_string()],
        }
    }

    /// The section reached a final state; nothing to reconcile.
    fn disarm(mut self) {
        self.ids.clear();
    }
}

impl Drop for ReconcileGuard<'_> {
    fn drop(&mut self) {
        if !self.ids.is_empty() {
            self.outline.reconcile(&self.ids);
        }
    }
}

/// Drives AI generation for outline sections and scores the results.
pub struct SectionGenerator {
    provider: Arc<dyn ContentProvider>,
    scorer: SectionScorer,
    settle_delay: Duration,
}

impl SectionGenerator {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        scoring: ScoringConfig,
        generation: &GenerationConfig,
    ) -> Self {
        Self {
            provider,
            scorer: SectionScorer::new(scoring),
            settle_delay: Duration::from_millis(generation.settle_delay_ms),
        }
    }

    pub fn scorer(&self) -> &SectionScorer {
        &self.scorer
    }

    /// Generate one section, regardless of its neighbors' state.
    ///
    /// Provider failures end in an `error` outcome, not an `Err`. `Err` is
    /// returned only for an unknown section or one already generating.
    pub async fn generate_section(
        &self,
        outline: &OutlineState,
        section_id: &str,
        global_context: &str,
    ) -> Result<SectionOutcome> {
        let section = self.begin(outline, section_id)?;
        let guard = ReconcileGuard::claim(outline, section_id);
        let outcome = self.execute(outline, section, global_context).await;
        if outcome.is_ok() {
            guard.disarm();
        }
        outcome
    }

    /// Generate every section in order. Only one run per outline at a time.
    pub async fn generate_all(
        &self,
        outline: &OutlineState,
        global_context: &str,
    ) -> Result<GenerationReport> {
        let _batch = outline.try_begin_batch().ok_or_else(|| {
            Error::Busy(format!("outline {} is already generating", outline.id()))
        })?;
        Ok(self.run_batch(outline, global_context).await)
    }

    /// Generate every section under a slot the caller already claimed with
    /// [`OutlineState::try_begin_owned_batch`]. The slot is released on return.
    pub async fn generate_claimed(
        &self,
        batch: OwnedBatchGuard,
        global_context: &str,
    ) -> GenerationReport {
        self.run_batch(batch.outline(), global_context).await
    }

    async fn run_batch(&self, outline: &OutlineState, global_context: &str) -> GenerationReport {
        let mut queue: VecDeque<String> = outline.section_ids().into();
        let mut report = GenerationReport::new(queue.len());
        info!(
            "Generating {} sections for outline {}",
            report.total,
            outline.id()
        );

        while let Some(id) = queue.pop_front() {
            if outline.cancel_requested() {
                info!("Generation cancelled with {} sections left", queue.len() + 1);
                report.cancelled = true;
                break;
            }

            let section = match self.begin(outline, &id) {
                Ok(section) => section,
                Err(Error::InvalidTransition { .. }) => {
                    info!("Section {} is already generating elsewhere, skipping", id);
                    report.record_skipped(id);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping section {}: {}", id, e);
                    report.record(SectionOutcome::failed(id, e.to_string()));
                    continue;
                }
            };

            let guard = ReconcileGuard::claim(outline, &id);
            let outcome = match self.execute(outline, section, global_context).await {
                Ok(outcome) => {
                    guard.disarm();
                    outcome
                }
                Err(e) => {
                    drop(guard);
                    warn!("Section {} did not finish: {}", id, e);
                    SectionOutcome::failed(id, e.to_string())
                }
            };
            report.record(outcome);
        }

        info!("Outline {}: {}", outline.id(), report.summary());
        tokio::time::sleep(self.settle_delay).await;
        report
    }

    /// Move the section into `generating`, claiming it for this caller.
    ///
    /// Fails with `InvalidTransition` when another caller is generating it.
    fn begin(&self, outline: &OutlineState, section_id: &str) -> Result<OutlineSection> {
        let section = outline
            .section(section_id)
            .ok_or_else(|| Error::NotFound(format!("section {}", section_id)))?;
        outline.transition(
            section_id,
            GenerationStatus::Generating,
            format!("Generating \"{}\"...", section.title),
            None,
            None,
        )?;
        Ok(section)
    }

    async fn execute(
        &self,
        outline: &OutlineState,
        section: OutlineSection,
        global_context: &str,
    ) -> Result<SectionOutcome> {
        let section_id = section.id.as_str();

        // Neighbors are read now, after every earlier section has been written back.
        let (previous_content, next_content) = outline.neighbor_content(section_id)?;
        debug!(
            "Requesting section {} (previous={}, next={})",
            section_id,
            previous_content.is_some(),
            next_content.is_some()
        );

        let request = SectionRequest {
            title: section.title.clone(),
            keywords: section.keywords.clone(),
            section_type: section.section_type,
            previous_content,
            next_content,
            global_context: global_context.to_string(),
        };

        let generated = match self.provider.generate_section(&request).await {
            Ok(text) if text.trim().is_empty() => Err(Error::Generation(format!(
                "provider returned no text for \"{}\"",
                section.title
            ))),
            other => other,
        };

        let result = generated.and_then(|text| {
            outline.apply_generated(section_id, text.trim(), &self.scorer)
        });

        match result {
            Ok(scores) => {
                info!(
                    "Section \"{}\" generated: uniqueness={:.0} contextual={:.0} optimization={}",
                    section.title,
                    scores.uniqueness_score,
                    scores.contextual_score,
                    scores.optimization_score()
                );
                outline.transition(
                    section_id,
                    GenerationStatus::Completed,
                    format!("Generated \"{}\"", section.title),
                    Some(scores),
                    None,
                )?;
                Ok(SectionOutcome::completed(section_id, scores))
            }
            Err(e) => {
                warn!("Section \"{}\" failed: {}", section.title, e);
                let message = e.to_string();
                outline.transition(
                    section_id,
                    GenerationStatus::Error,
                    format!("Failed to generate \"{}\"", section.title),
                    None,
                    Some(message.clone()),
                )?;
                Ok(SectionOutcome::failed(section_id, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{section, ScriptedProvider};
    use alwrity_analyze::NeighborContext;
    use alwrity_core::SectionType;

    const INTRO: &str = "Content marketing helps small brands earn attention. \
                         This guide explains content marketing basics.";
    const BODY: &str = "Moreover, content marketing needs a clear editorial plan. \
                        As mentioned earlier, attention is earned with useful articles.";
    const CONCLUSION: &str = "Therefore, start your content marketing plan today. \
                              Building on this, measure results every month.";

    fn generator(provider: Arc<ScriptedProvider>) -> SectionGenerator {
        SectionGenerator::new(
            provider,
            ScoringConfig::default(),
            &GenerationConfig {
                settle_delay_ms: 0,
                ..Default::default()
            },
        )
    }

    fn three_sections() -> OutlineState {
        let mut intro = section("s1", "Intro");
        intro.section_type = SectionType::Introduction;
        let mut conclusion = section("s3", "Conclusion");
        conclusion.section_type = SectionType::Conclusion;
        OutlineState::with_id("o1", "Guide", vec![intro, section("s2", "Body1"), conclusion])
    }

    fn scripted() -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::with_responses(&[
            ("Intro", INTRO),
            ("Body1", BODY),
            ("Conclusion", CONCLUSION),
        ]))
    }

    #[tokio::test]
    async fn test_generate_all_sequential_neighbors() {
        let provider = scripted();
        let outline = three_sections();
        let report = generator(provider.clone())
            .generate_all(&outline, "content marketing guide")
            .await
            .unwrap();
        assert_eq!(report.completed, 3);

        let requests = provider.recorded();
        let titles: Vec<&str> = requests.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Body1", "Conclusion"]);

        // Intro ran first: nothing generated yet on either side.
        assert_eq!(requests[0].previous_content, None);
        assert_eq!(requests[0].next_content, None);
        // Body1 always sees the finished intro; Conclusion not yet written.
        assert_eq!(requests[1].previous_content.as_deref(), Some(INTRO));
        assert_eq!(requests[1].next_content, None);
        // Conclusion sees Body1.
        assert_eq!(requests[2].previous_content.as_deref(), Some(BODY));
        assert_eq!(requests[2].global_context, "content marketing guide");
    }

    #[tokio::test]
    async fn test_generate_all_end_to_end_scores() {
        let provider = scripted();
        let outline = three_sections();
        let runner = generator(provider);
        runner.generate_all(&outline, "").await.unwrap();

        for (id, progress) in outline.all_progress() {
            assert_eq!(progress.status, GenerationStatus::Completed, "{}", id);
            let scores = progress.scores.expect("scores present");
            for v in [
                scores.uniqueness_score,
                scores.contextual_score,
                scores.coherence_score,
                scores.thematic_score,
                scores.narrative_flow_score,
            ] {
                assert!((0.0..=100.0).contains(&v));
            }
            assert_eq!(outline.section(&id).unwrap().scores, Some(scores));
        }

        // Conclusion has no next neighbor: single-neighbor branch against Body1.
        let conclusion = outline.section("s3").unwrap();
        let expected = runner
            .scorer()
            .contextual_score(CONCLUSION, NeighborContext::new(Some(BODY), None));
        assert!((conclusion.scores.unwrap().contextual_score - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_generate_all_partial_failure() {
        let provider = Arc::new(
            ScriptedProvider::with_responses(&[("Intro", INTRO), ("Conclusion", CONCLUSION)])
                .failing_on("Body1"),
        );
        let outline = three_sections();
        let report = generator(provider.clone())
            .generate_all(&outline, "")
            .await
            .unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.summary(), "2 of 3 sections generated");

        let body = outline.progress("s2");
        assert_eq!(body.status, GenerationStatus::Error);
        assert!(body.error.unwrap().contains("timeout"));
        assert_eq!(outline.progress("s3").status, GenerationStatus::Completed);
        // Conclusion's neighbor failed, so it was requested without previous content.
        assert_eq!(provider.recorded()[2].previous_content, None);
    }

    #[tokio::test]
    async fn test_generate_all_busy() {
        let outline = three_sections();
        let runner = generator(scripted());
        let _held = outline.try_begin_batch().unwrap();
        let result = runner.generate_all(&outline, "").await;
        assert!(matches!(result, Err(Error::Busy(_))));
    }

    #[tokio::test]
    async fn test_generate_all_cancel() {
        let outline = Arc::new(three_sections());
        let provider = scripted();
        *provider.cancel_on_first.lock() = Some(outline.clone());

        let report = generator(provider.clone())
            .generate_all(&outline, "")
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.summary(), "1 of 3 sections generated (cancelled)");
        assert_eq!(outline.progress("s2").status, GenerationStatus::Pending);
        assert!(!outline.is_busy());
    }

    #[tokio::test]
    async fn test_generate_section_reads_neighbors() {
        let provider = scripted();
        let outline = three_sections();
        outline
            .update_section("s3", |s| s.content = CONCLUSION.into())
            .unwrap();

        let runner = generator(provider.clone());
        let outcome = runner.generate_section(&outline, "s2", "").await.unwrap();
        assert_eq!(outcome.status, GenerationStatus::Completed);

        let req = &provider.recorded()[0];
        assert_eq!(req.previous_content, None);
        assert_eq!(req.next_content.as_deref(), Some(CONCLUSION));
    }

    #[tokio::test]
    async fn test_generate_section_retry_after_error() {
        let outline = three_sections();
        let failing = Arc::new(ScriptedProvider::default().failing_on("Intro"));
        let outcome = generator(failing)
            .generate_section(&outline, "s1", "")
            .await
            .unwrap();
        assert_eq!(outcome.status, GenerationStatus::Error);

        let outcome = generator(scripted())
            .generate_section(&outline, "s1", "")
            .await
            .unwrap();
        assert_eq!(outcome.status, GenerationStatus::Completed);
        assert_eq!(outline.section("s1").unwrap().content, INTRO);
    }

    #[tokio::test]
    async fn test_generate_section_unknown() {
        let outline = three_sections();
        let result = generator(scripted()).generate_section(&outline, "nope", "").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_text_is_error() {
        let outline = three_sections();
        let provider = Arc::new(ScriptedProvider::with_responses(&[("Intro", "   ")]));
        let outcome = generator(provider)
            .generate_section(&outline, "s1", "")
            .await
            .unwrap();
        assert_eq!(outcome.status, GenerationStatus::Error);
        assert!(outline.section("s1").unwrap().content.is_empty());
    }

    #[tokio::test]
    async fn test_generate_all_skips_section_generating_elsewhere() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let provider = Arc::new(ScriptedProvider {
            hold: Some(("Slow".into(), gate.clone())),
            ..ScriptedProvider::with_responses(&[("A", INTRO), ("Slow", BODY)])
        });
        let outline = Arc::new(OutlineState::with_id(
            "o2",
            "Guide",
            vec![section("a", "A"), section("slow", "Slow")],
        ));
        let runner = Arc::new(generator(provider));

        let single = tokio::spawn({
            let runner = runner.clone();
            let outline = outline.clone();
            async move { runner.generate_section(&outline, "slow", "").await }
        });
        while outline.progress("slow").status != GenerationStatus::Generating {
            tokio::task::yield_now().await;
        }

        let report = runner.generate_all(&outline, "").await.unwrap();
        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, vec!["slow".to_string()]);
        // The batch finished without touching the section it does not own.
        assert_eq!(outline.progress("slow").status, GenerationStatus::Generating);

        gate.notify_one();
        let outcome = single.await.unwrap().unwrap();
        assert_eq!(outcome.status, GenerationStatus::Completed);
        assert_eq!(outline.progress("slow").status, GenerationStatus::Completed);
        assert_eq!(outline.section("slow").unwrap().content, BODY);
    }

    #[tokio::test]
    async fn test_dropped_generation_is_reconciled() {
        let gate = Arc::new(tokio::sync::Notify::new());
        let provider = Arc::new(ScriptedProvider {
            hold: Some(("Body1".into(), gate)),
            ..Default::default()
        });
        let outline = three_sections();
        let runner = generator(provider);

        let pending = runner.generate_section(&outline, "s2", "");
        let result = tokio::time::timeout(Duration::from_millis(20), pending).await;
        assert!(result.is_err());

        let progress = outline.progress("s2");
        assert_eq!(progress.status, GenerationStatus::Error);
        assert_eq!(progress.error.as_deref(), Some("interrupted"));
    }

    #[tokio::test]
    async fn test_generate_section_does_not_wait_for_settle() {
        let runner = SectionGenerator::new(
            scripted(),
            ScoringConfig::default(),
            &GenerationConfig {
                settle_delay_ms: 5_000,
                ..Default::default()
            },
        );
        let outline = three_sections();
        let outcome = tokio::time::timeout(
            Duration::from_millis(500),
            runner.generate_section(&outline, "s1", ""),
        )
        .await
        .expect("single-section generation returns without the settle delay")
        .unwrap();
        assert_eq!(outcome.status, GenerationStatus::Completed);
    }

    #[tokio::test]
    async fn test_generate_claimed_releases_slot() {
        let outline = Arc::new(three_sections());
        let runner = generator(scripted());
        let batch = outline.try_begin_owned_batch().unwrap();
        assert!(matches!(
            runner.generate_all(&outline, "").await,
            Err(Error::Busy(_))
        ));

        let report = runner.generate_claimed(batch, "").await;
        assert_eq!(report.completed, 3);
        assert!(!outline.is_busy());
    }
}
