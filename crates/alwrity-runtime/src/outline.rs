//! Shared outline state with read-modify-write updates.
//!
//! All mutation goes through methods that take the write lock for the whole
//! read-modify-write, so a generation result is always applied to the latest
//! section list rather than to a copy taken before the request was sent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use alwrity_analyze::SectionScorer;
use alwrity_core::{Error, QualityScores, Result};

use crate::types::{GenerationProgress, GenerationStatus, OutlineSection};

/// One outline: its ordered sections plus per-section progress.
pub struct OutlineState {
    id: String,
    title: String,
    sections: RwLock<Vec<OutlineSection>>,
    progress: RwLock<HashMap<String, GenerationProgress>>,
    busy: AtomicBool,
    cancel_requested: AtomicBool,
}

/// Holds the outline's single generate-all slot. Released on drop.
pub struct BatchGuard<'a> {
    outline: &'a OutlineState,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.outline.release_batch();
    }
}

/// [`BatchGuard`] that owns its outline, for runs that outlive the caller.
pub struct OwnedBatchGuard {
    outline: Arc<OutlineState>,
}

impl OwnedBatchGuard {
    pub fn outline(&self) -> &OutlineState {
        &self.outline
    }
}

impl Drop for OwnedBatchGuard {
    fn drop(&mut self) {
        self.outline.release_batch();
    }
}

impl OutlineState {
    pub fn new(title: impl Into<String>, sections: Vec<OutlineSection>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), title, sections)
    }

    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        sections: Vec<OutlineSection>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            sections: RwLock::new(sections),
            progress: RwLock::new(HashMap::new()),
            busy: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn snapshot(&self) -> Vec<OutlineSection> {
        self.sections.read().clone()
    }

    pub fn len(&self) -> usize {
        self.sections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn section(&self, id: &str) -> Option<OutlineSection> {
        self.sections.read().iter().find(|s| s.id == id).cloned()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sections.read().iter().position(|s| s.id == id)
    }

    pub fn section_ids(&self) -> Vec<String> {
        self.sections.read().iter().map(|s| s.id.clone()).collect()
    }

    /// Current non-empty content of the sections before and after `id`.
    pub fn neighbor_content(&self, id: &str) -> Result<(Option<String>, Option<String>)> {
        let sections = self.sections.read();
        let index = sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
        let content_at = |i: usize| {
            sections
                .get(i)
                .filter(|s| s.has_content())
                .map(|s| s.content.clone())
        };
        let previous = index.checked_sub(1).and_then(content_at);
        let next = content_at(index + 1);
        Ok((previous, next))
    }

    /// Full article text: each section with content, titled, in order.
    pub fn full_content(&self) -> String {
        self.sections
            .read()
            .iter()
            .filter(|s| s.has_content())
            .map(|s| format!("## {}\n\n{}", s.title, s.content.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Apply `f` to the section in place and return the updated copy.
    pub fn update_section<F>(&self, id: &str, f: F) -> Result<OutlineSection>
    where
        F: FnOnce(&mut OutlineSection),
    {
        let mut sections = self.sections.write();
        let section = sections
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
        f(section);
        Ok(section.clone())
    }

    /// Store generated text and score it against the outline as it is now.
    pub fn apply_generated(
        &self,
        id: &str,
        content: &str,
        scorer: &SectionScorer,
    ) -> Result<QualityScores> {
        let mut sections = self.sections.write();
        let index = sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;

        sections[index].content = content.to_string();
        let texts: Vec<&str> = sections.iter().map(|s| s.content.as_str()).collect();
        let scores = scorer.score(&texts, index);

        let section = &mut sections[index];
        section.optimization_score = scores.optimization_score();
        section.scores = Some(scores);
        Ok(scores)
    }

    /// Remove a section. Its former neighbors lose their scores.
    pub fn remove_section(&self, id: &str) -> Result<OutlineSection> {
        let removed = {
            let mut sections = self.sections.write();
            let index = sections
                .iter()
                .position(|s| s.id == id)
                .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
            let removed = sections.remove(index);
            // The sections now at index-1 and index were the neighbors.
            let stale = neighbor_ids(&sections, index.checked_sub(1), Some(index));
            self.invalidate(&mut sections, &stale);
            removed
        };
        self.progress.write().remove(id);
        debug!("Removed section {} from outline {}", id, self.id);
        Ok(removed)
    }

    /// Move a section to `to` (clamped). The section and its old and new
    /// neighbors lose their scores.
    pub fn move_section(&self, id: &str, to: usize) -> Result<()> {
        let mut sections = self.sections.write();
        let from = sections
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("section {}", id)))?;
        let to = to.min(sections.len() - 1);
        if from == to {
            return Ok(());
        }

        let mut stale = neighbor_ids(&sections, from.checked_sub(1), Some(from + 1));
        let section = sections.remove(from);
        sections.insert(to, section);
        stale.extend(neighbor_ids(&sections, to.checked_sub(1), Some(to + 1)));
        stale.push(id.to_string());

        self.invalidate(&mut sections, &stale);
        debug!("Moved section {} from {} to {}", id, from, to);
        Ok(())
    }

    fn invalidate(&self, sections: &mut [OutlineSection], ids: &[String]) {
        let mut progress = self.progress.write();
        for section in sections.iter_mut().filter(|s| ids.contains(&s.id)) {
            section.scores = None;
            section.optimization_score = 0;
            if let Some(p) = progress.get_mut(&section.id) {
                p.scores = None;
            }
        }
    }

    // ---------------------------------------------------------------
    // Progress
    // ---------------------------------------------------------------

    pub fn progress(&self, id: &str) -> GenerationProgress {
        self.progress.read().get(id).cloned().unwrap_or_default()
    }

    /// Progress for every section, in outline order.
    pub fn all_progress(&self) -> Vec<(String, GenerationProgress)> {
        let ids = self.section_ids();
        let progress = self.progress.read();
        ids.into_iter()
            .map(|id| {
                let p = progress.get(&id).cloned().unwrap_or_default();
                (id, p)
            })
            .collect()
    }

    /// Move a section's progress to `next`, enforcing the status machine.
    pub fn transition(
        &self,
        id: &str,
        next: GenerationStatus,
        message: impl Into<String>,
        scores: Option<QualityScores>,
        error: Option<String>,
    ) -> Result<()> {
        if self.position(id).is_none() {
            return Err(Error::NotFound(format!("section {}", id)));
        }
        let mut progress = self.progress.write();
        let entry = progress.entry(id.to_string()).or_default();
        if !entry.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: entry.status.to_string(),
                to: next.to_string(),
            });
        }
        *entry = GenerationProgress {
            status: next,
            message: message.into(),
            scores,
            error,
        };
        Ok(())
    }

    /// Fail any of `ids` still marked generating. Returns how many were reset.
    pub fn reconcile(&self, ids: &[String]) -> usize {
        let mut progress = self.progress.write();
        let mut reset = 0;
        for id in ids {
            if let Some(p) = progress.get_mut(id) {
                if p.status == GenerationStatus::Generating {
                    warn!("Section {} left generating; marking as error", id);
                    *p = GenerationProgress {
                        status: GenerationStatus::Error,
                        message: "Generation was interrupted".into(),
                        scores: None,
                        error: Some("interrupted".into()),
                    };
                    reset += 1;
                }
            }
        }
        reset
    }

    // ---------------------------------------------------------------
    // Batch control
    // ---------------------------------------------------------------

    /// Claim the outline's generate-all slot, or `None` if one is running.
    pub fn try_begin_batch(&self) -> Option<BatchGuard<'_>> {
        self.claim_batch().then(|| BatchGuard { outline: self })
    }

    /// Like [`Self::try_begin_batch`], but the guard can move into a spawned task.
    pub fn try_begin_owned_batch(self: &Arc<Self>) -> Option<OwnedBatchGuard> {
        self.claim_batch().then(|| OwnedBatchGuard {
            outline: Arc::clone(self),
        })
    }

    fn claim_batch(&self) -> bool {
        let claimed = self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if claimed {
            self.cancel_requested.store(false, Ordering::SeqCst);
        }
        claimed
    }

    fn release_batch(&self) {
        self.cancel_requested.store(false, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Ask a running generate-all to stop before its next section.
    /// Returns false when nothing is running.
    pub fn request_cancel(&self) -> bool {
        if !self.is_busy() {
            return false;
        }
        self.cancel_requested.store(true, Ordering::SeqCst);
        true
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}

fn neighbor_ids(
    sections: &[OutlineSection],
    before: Option<usize>,
    after: Option<usize>,
) -> Vec<String> {
    [before, after]
        .into_iter()
        .flatten()
        .filter_map(|i| sections.get(i))
        .map(|s| s.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::section;

    fn outline_with(ids: &[&str]) -> OutlineState {
        OutlineState::with_id(
            "o1",
            "Test",
            ids.iter().map(|id| section(id, id)).collect(),
        )
    }

    fn scored(outline: &OutlineState) {
        for id in outline.section_ids() {
            outline
                .update_section(&id, |s| {
                    s.content = format!("{} body", s.title);
                    s.scores = Some(QualityScores::default());
                    s.optimization_score = 80;
                })
                .unwrap();
        }
    }

    #[test]
    fn test_neighbor_content_skips_empty() {
        let outline = outline_with(&["a", "b", "c"]);
        outline
            .update_section("a", |s| s.content = "alpha text".into())
            .unwrap();

        let (prev, next) = outline.neighbor_content("b").unwrap();
        assert_eq!(prev.as_deref(), Some("alpha text"));
        assert_eq!(next, None);

        let (prev, next) = outline.neighbor_content("a").unwrap();
        assert_eq!(prev, None);
        assert_eq!(next, None);

        assert!(outline.neighbor_content("zzz").is_err());
    }

    #[test]
    fn test_apply_generated_scores_latest_state() {
        let outline = outline_with(&["a", "b"]);
        let scorer = SectionScorer::default();
        outline
            .update_section("a", |s| s.content = "shared words here".into())
            .unwrap();
        let scores = outline
            .apply_generated("b", "shared words here", &scorer)
            .unwrap();
        assert!(scores.uniqueness_score < 100.0);

        let b = outline.section("b").unwrap();
        assert_eq!(b.content, "shared words here");
        assert_eq!(b.scores, Some(scores));
        assert_eq!(b.optimization_score, scores.optimization_score());
    }

    #[test]
    fn test_remove_invalidates_neighbors() {
        let outline = outline_with(&["a", "b", "c", "d"]);
        scored(&outline);
        outline.remove_section("b").unwrap();

        assert_eq!(outline.section_ids(), vec!["a", "c", "d"]);
        assert!(outline.section("a").unwrap().scores.is_none());
        assert!(outline.section("c").unwrap().scores.is_none());
        assert!(outline.section("d").unwrap().scores.is_some());

        assert_eq!(outline.section("a").unwrap().optimization_score, 0);
        assert_eq!(outline.section("c").unwrap().optimization_score, 0);
        assert_eq!(outline.section("d").unwrap().optimization_score, 80);
    }

    #[test]
    fn test_move_invalidates_old_and_new_neighbors() {
        let outline = outline_with(&["a", "b", "c", "d", "e"]);
        scored(&outline);
        outline.move_section("a", 3).unwrap();

        assert_eq!(outline.section_ids(), vec!["b", "c", "d", "a", "e"]);
        // old neighbor b, new neighbors d and e, and a itself
        for id in ["a", "b", "d", "e"] {
            assert!(outline.section(id).unwrap().scores.is_none(), "{}", id);
        }
        assert!(outline.section("c").unwrap().scores.is_some());
    }

    #[test]
    fn test_move_clamps_and_noop() {
        let outline = outline_with(&["a", "b"]);
        scored(&outline);
        outline.move_section("b", 10).unwrap();
        assert_eq!(outline.section_ids(), vec!["a", "b"]);
        assert!(outline.section("a").unwrap().scores.is_some());
    }

    #[test]
    fn test_transition_enforced() {
        let outline = outline_with(&["a"]);
        assert_eq!(outline.progress("a").status, GenerationStatus::Pending);
        assert!(matches!(
            outline.transition("a", GenerationStatus::Completed, "", None, None),
            Err(Error::InvalidTransition { .. })
        ));
        outline
            .transition("a", GenerationStatus::Generating, "go", None, None)
            .unwrap();
        assert!(outline
            .transition("a", GenerationStatus::Generating, "again", None, None)
            .is_err());
        assert!(matches!(
            outline.transition("missing", GenerationStatus::Generating, "", None, None),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_reconcile_resets_generating() {
        let outline = outline_with(&["a", "b"]);
        outline
            .transition("a", GenerationStatus::Generating, "go", None, None)
            .unwrap();
        let ids = outline.section_ids();
        assert_eq!(outline.reconcile(&ids), 1);
        assert_eq!(outline.progress("a").status, GenerationStatus::Error);
        assert_eq!(outline.progress("b").status, GenerationStatus::Pending);
        assert_eq!(outline.reconcile(&ids), 0);
    }

    #[test]
    fn test_batch_guard_single_slot() {
        let outline = outline_with(&["a"]);
        assert!(!outline.request_cancel());
        {
            let _guard = outline.try_begin_batch().unwrap();
            assert!(outline.is_busy());
            assert!(outline.try_begin_batch().is_none());
            assert!(outline.request_cancel());
            assert!(outline.cancel_requested());
        }
        assert!(!outline.is_busy());
        assert!(!outline.cancel_requested());
    }

    #[test]
    fn test_owned_batch_guard_excludes_borrowed() {
        let outline = Arc::new(outline_with(&["a"]));
        let owned = outline.try_begin_owned_batch().unwrap();
        assert_eq!(owned.outline().id(), "o1");
        assert!(outline.try_begin_batch().is_none());
        assert!(outline.try_begin_owned_batch().is_none());
        // A refused claim must not release the held slot.
        assert!(outline.is_busy());

        let handle = std::thread::spawn(move || drop(owned));
        handle.join().unwrap();
        assert!(!outline.is_busy());
        assert!(outline.try_begin_batch().is_some());
    }

    #[test]
    fn test_full_content() {
        let outline = outline_with(&["a", "b", "c"]);
        outline.update_section("a", |s| s.content = "First.".into()).unwrap();
        outline.update_section("c", |s| s.content = "Third.".into()).unwrap();
        assert_eq!(outline.full_content(), "## a\n\nFirst.\n\n## c\n\nThird.");
    }
}
