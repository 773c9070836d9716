//! Sequential analysis of a full transcript.
//!
//! Segments the transcript, submits each chunk to the analysis service in
//! order, merging every response into the running result before the next
//! submission so that later prompts carry the findings accumulated so far.
//! A failed chunk fails the whole run; there is no per-chunk retry, callers
//! that want one should wrap the whole `analyze` call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use crate::config::AnalysisConfig;
use crate::segmentation::{
    inject_context, segment, CriticalDetector, KeywordCriticalDetector, SegmentationResult,
};

use super::merge::AnalysisAccumulator;
use super::progress::{phase_label, AnalysisPhase, ProgressEvent};
use super::prompt::build_chunk_prompt;
use super::types::{AnalysisClient, TranscriptAnalysis};
use super::AnalysisError;

/// Cooperative cancellation handle. Checked at chunk boundaries only;
/// an in-flight service call always runs to completion.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives segmentation, sequential submission, and merging for one
/// transcript at a time.
pub struct TranscriptAnalyzer {
    client: Box<dyn AnalysisClient + Send + Sync>,
    detector: Box<dyn CriticalDetector + Send + Sync>,
    config: AnalysisConfig,
}

impl TranscriptAnalyzer {
    /// Build an analyzer using the keyword detector configured by
    /// `config.critical_markers`.
    pub fn new(client: Box<dyn AnalysisClient + Send + Sync>, config: AnalysisConfig) -> Self {
        let detector = KeywordCriticalDetector::with_markers(&config.critical_markers);
        Self {
            client,
            detector: Box::new(detector),
            config,
        }
    }

    /// Build an analyzer with a caller-provided critical detector.
    pub fn with_detector(
        client: Box<dyn AnalysisClient + Send + Sync>,
        detector: Box<dyn CriticalDetector + Send + Sync>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            client,
            detector,
            config,
        }
    }

    /// Analyze a transcript end to end.
    ///
    /// Chunks are submitted strictly one at a time, in order. After each
    /// response the findings are merged and a progress event is emitted.
    /// Cancellation is honored between chunks and reported as an error;
    /// partial results are discarded.
    pub fn analyze(
        &self,
        transcript: &str,
        progress: Option<&dyn Fn(ProgressEvent)>,
        cancel: &CancelFlag,
    ) -> Result<TranscriptAnalysis, AnalysisError> {
        let request_id = Uuid::new_v4();
        let started_at = Utc::now();
        let clock = Instant::now();

        emit(
            progress,
            ProgressEvent {
                phase: AnalysisPhase::Segmenting,
                percent: 0,
                label: phase_label(0).to_string(),
                chunks_completed: 0,
                chunk_count: 0,
            },
        );

        let SegmentationResult {
            mut chunks,
            total_token_estimate,
            requires_chunking,
        } = segment(transcript, &self.config, self.detector.as_ref());
        inject_context(&mut chunks, &self.config, self.detector.as_ref());

        let total = chunks.len();
        tracing::info!(
            %request_id,
            chunks = total,
            tokens = total_token_estimate,
            "Starting transcript analysis"
        );

        let mut accumulator = AnalysisAccumulator::new();

        for (i, chunk) in chunks.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::warn!(%request_id, chunk = i, "Analysis cancelled");
                emit_failed(progress, i, total);
                return Err(AnalysisError::Cancelled { chunk: i, total });
            }

            emit(
                progress,
                ProgressEvent {
                    phase: AnalysisPhase::AwaitingChunk { index: i },
                    percent: percent_for(i, total),
                    label: phase_label(percent_for(i, total)).to_string(),
                    chunks_completed: i,
                    chunk_count: total,
                },
            );

            let summary = accumulator.context_summary();
            let prompt = build_chunk_prompt(chunk, summary.as_deref(), i, total);

            let findings = self.client.submit(&prompt).map_err(|e| {
                tracing::error!(%request_id, chunk = i, error = %e, "Chunk analysis failed");
                emit_failed(progress, i, total);
                e
            })?;
            accumulator.merge_chunk(&findings);

            let done = i + 1;
            emit(
                progress,
                ProgressEvent {
                    phase: AnalysisPhase::Merging { index: i },
                    percent: percent_for(done, total),
                    label: phase_label(percent_for(done, total)).to_string(),
                    chunks_completed: done,
                    chunk_count: total,
                },
            );

            if done < total && !self.config.inter_call_pause.is_zero() {
                std::thread::sleep(self.config.inter_call_pause);
            }
        }

        let merged = accumulator.snapshot();
        let completed_at = Utc::now();
        let analysis = TranscriptAnalysis {
            request_id,
            safety_flags: merged.safety_flags,
            entities: merged.entities,
            psychosocial_flags: merged.psychosocial_flags,
            suggested_tests: merged.suggested_tests,
            reasoning: merged.reasoning.unwrap_or_default(),
            chunk_count: total,
            required_chunking: requires_chunking,
            started_at,
            completed_at,
            duration_ms: clock.elapsed().as_millis() as u64,
        };

        emit(
            progress,
            ProgressEvent {
                phase: AnalysisPhase::Done,
                percent: 100,
                label: phase_label(100).to_string(),
                chunks_completed: total,
                chunk_count: total,
            },
        );
        tracing::info!(
            %request_id,
            chunks = total,
            duration_ms = analysis.duration_ms,
            "Transcript analysis complete"
        );

        Ok(analysis)
    }
}

fn percent_for(completed: usize, total: usize) -> u8 {
    if total == 0 {
        100
    } else {
        ((completed * 100) / total) as u8
    }
}

fn emit(progress: Option<&dyn Fn(ProgressEvent)>, event: ProgressEvent) {
    if let Some(cb) = progress {
        cb(event);
    }
}

fn emit_failed(progress: Option<&dyn Fn(ProgressEvent)>, completed: usize, total: usize) {
    emit(
        progress,
        ProgressEvent {
            phase: AnalysisPhase::Failed,
            percent: percent_for(completed, total),
            label: phase_label(percent_for(completed, total)).to_string(),
            chunks_completed: completed,
            chunk_count: total,
        },
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::analysis::service::MockAnalysisClient;
    use crate::analysis::types::{ChunkFindings, ClinicalEntity, EntityKind, SafetyFlag};

    fn test_config() -> AnalysisConfig {
        AnalysisConfig {
            inter_call_pause: Duration::ZERO,
            ..AnalysisConfig::default()
        }
    }

    /// Client that fails every call after the first `ok` responses.
    struct FailingClient {
        ok: usize,
        calls: Mutex<usize>,
    }

    impl AnalysisClient for FailingClient {
        fn submit(&self, _prompt: &str) -> Result<ChunkFindings, AnalysisError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls <= self.ok {
                Ok(ChunkFindings::default())
            } else {
                Err(AnalysisError::Connection("http://localhost".into()))
            }
        }
    }

    fn long_transcript(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("The patient described symptom number {i} in considerable detail today."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn short_transcript_makes_one_call() {
        let client = MockAnalysisClient::new(ChunkFindings {
            safety_flags: vec![SafetyFlag::new("penicillin allergy")],
            ..ChunkFindings::default()
        });
        let analyzer = TranscriptAnalyzer::new(Box::new(client), test_config());
        let result = analyzer
            .analyze("Patient reports mild headache for two days.", None, &CancelFlag::new())
            .unwrap();

        assert_eq!(result.chunk_count, 1);
        assert!(!result.required_chunking);
        assert_eq!(result.safety_flags.len(), 1);
    }

    #[test]
    fn empty_transcript_completes_without_calls() {
        let analyzer = TranscriptAnalyzer::new(
            Box::new(MockAnalysisClient::new(ChunkFindings::default())),
            test_config(),
        );
        let result = analyzer.analyze("", None, &CancelFlag::new()).unwrap();

        assert_eq!(result.chunk_count, 0);
        assert!(!result.required_chunking);
        assert!(result.safety_flags.is_empty());
        assert!(result.reasoning.is_empty());
    }

    #[test]
    fn whitespace_only_transcript_takes_the_short_path() {
        // Only the truly empty string yields zero chunks; whitespace-only
        // input is one chunk, preserving exact reconstruction.
        let analyzer = TranscriptAnalyzer::new(
            Box::new(MockAnalysisClient::new(ChunkFindings::default())),
            test_config(),
        );
        let result = analyzer.analyze("   \n  ", None, &CancelFlag::new()).unwrap();

        assert_eq!(result.chunk_count, 1);
        assert!(!result.required_chunking);
    }

    #[test]
    fn later_prompts_carry_accumulated_findings() {
        let first = ChunkFindings {
            entities: vec![ClinicalEntity::new(EntityKind::Medication, "metformin")],
            ..ChunkFindings::default()
        };
        let client = MockAnalysisClient::with_sequence(vec![first, ChunkFindings::default()]);
        let config = AnalysisConfig {
            max_tokens_per_chunk: 120,
            overlap_tokens: 30,
            inter_call_pause: Duration::ZERO,
            ..AnalysisConfig::default()
        };

        let analyzer = TranscriptAnalyzer::new(Box::new(client), config);
        let transcript = long_transcript(40);
        let result = analyzer.analyze(&transcript, None, &CancelFlag::new()).unwrap();
        assert!(result.required_chunking);
        assert!(result.chunk_count >= 2);

        // The mock moved into the analyzer, so re-run with a fresh one to
        // inspect prompts.
        let client = MockAnalysisClient::with_sequence(vec![
            ChunkFindings {
                entities: vec![ClinicalEntity::new(EntityKind::Medication, "metformin")],
                ..ChunkFindings::default()
            },
            ChunkFindings::default(),
        ]);
        let prompts_handle: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = RecordingClient {
            inner: client,
            prompts: Arc::clone(&prompts_handle),
        };
        let config = AnalysisConfig {
            max_tokens_per_chunk: 120,
            overlap_tokens: 30,
            inter_call_pause: Duration::ZERO,
            ..AnalysisConfig::default()
        };
        let analyzer = TranscriptAnalyzer::new(Box::new(recorder), config);
        analyzer.analyze(&transcript, None, &CancelFlag::new()).unwrap();

        let prompts = prompts_handle.lock().unwrap();
        assert!(prompts.len() >= 2);
        assert!(!prompts[0].contains("metformin"));
        assert!(prompts[1].contains("metformin"));
    }

    struct RecordingClient {
        inner: MockAnalysisClient,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl AnalysisClient for RecordingClient {
        fn submit(&self, prompt: &str) -> Result<ChunkFindings, AnalysisError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.inner.submit(prompt)
        }
    }

    #[test]
    fn mid_sequence_failure_aborts_run() {
        let client = FailingClient {
            ok: 1,
            calls: Mutex::new(0),
        };
        let config = AnalysisConfig {
            max_tokens_per_chunk: 120,
            overlap_tokens: 30,
            inter_call_pause: Duration::ZERO,
            ..AnalysisConfig::default()
        };
        let analyzer = TranscriptAnalyzer::new(Box::new(client), config);

        let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());
        let record = |e: ProgressEvent| events.lock().unwrap().push(e);
        let err = analyzer
            .analyze(&long_transcript(40), Some(&record), &CancelFlag::new())
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Connection(_)));
        let events = events.lock().unwrap();
        assert_eq!(events.last().unwrap().phase, AnalysisPhase::Failed);
    }

    #[test]
    fn preset_cancellation_stops_before_first_call() {
        let client = FailingClient {
            ok: 0,
            calls: Mutex::new(0),
        };
        let analyzer = TranscriptAnalyzer::new(Box::new(client), test_config());

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = analyzer
            .analyze("Patient reports mild headache.", None, &cancel)
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Cancelled { chunk: 0, total: 1 }));
    }

    #[test]
    fn progress_reaches_done_at_full_percent() {
        let analyzer = TranscriptAnalyzer::new(
            Box::new(MockAnalysisClient::new(ChunkFindings::default())),
            test_config(),
        );

        let events: Mutex<Vec<ProgressEvent>> = Mutex::new(Vec::new());
        let record = |e: ProgressEvent| events.lock().unwrap().push(e);
        analyzer
            .analyze("Patient reports mild headache.", Some(&record), &CancelFlag::new())
            .unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.first().unwrap().phase, AnalysisPhase::Segmenting);
        let last = events.last().unwrap();
        assert_eq!(last.phase, AnalysisPhase::Done);
        assert_eq!(last.percent, 100);
        assert_eq!(last.label, "Finalizing analysis");
    }
}
