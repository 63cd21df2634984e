//! Telemetry system for resumebuddy
//!
//! Counts what happened during a chat session: questions asked, chunks
//! retrieved, answers generated and the ways generation failed.

use colored::Colorize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    QuestionReceived {
        question: String,
        timestamp: Instant,
    },
    ChunksRetrieved {
        count: usize,
        top_score: Option<f32>,
        duration_ms: u64,
        timestamp: Instant,
    },
    AnswerGenerated {
        chars: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    EmptyAnswer {
        timestamp: Instant,
    },
    GenerationFailed {
        reason: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub questions: usize,
    pub retrievals: usize,
    pub chunks_retrieved: usize,
    pub answers_generated: usize,
    pub empty_answers: usize,
    pub generation_failures: usize,
    pub retrieval_ms: u64,
    pub generation_ms: u64,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::QuestionReceived { .. } => {
                    stats.questions += 1;
                }
                TelemetryEvent::ChunksRetrieved {
                    count, duration_ms, ..
                } => {
                    stats.retrievals += 1;
                    stats.chunks_retrieved += count;
                    stats.retrieval_ms += duration_ms;
                }
                TelemetryEvent::AnswerGenerated { duration_ms, .. } => {
                    stats.answers_generated += 1;
                    stats.generation_ms += duration_ms;
                }
                TelemetryEvent::EmptyAnswer { .. } => {
                    stats.empty_answers += 1;
                }
                TelemetryEvent::GenerationFailed { .. } => {
                    stats.generation_failures += 1;
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Share of answered questions that produced model text
    pub fn answer_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.answers_generated + stats.empty_answers + stats.generation_failures;
        if total == 0 {
            1.0
        } else {
            stats.answers_generated as f64 / total as f64
        }
    }

    /// Mean generation latency in milliseconds
    pub fn mean_generation_ms(&self) -> Option<u64> {
        let stats = lock(&self.stats);
        (stats.answers_generated > 0).then(|| stats.generation_ms / stats.answers_generated as u64)
    }

    /// Multi-line summary for the `/stats` command
    pub fn summary(&self) -> String {
        let stats = self.get_stats();
        let mean = self
            .mean_generation_ms()
            .map(|ms| format!("{}ms", ms))
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{}\n\
             Duration:           {:.0?}\n\
             Questions:          {}\n\
             Chunks retrieved:   {}\n\
             Answers generated:  {}\n\
             Empty answers:      {}\n\
             Failures:           {}\n\
             Answer rate:        {:.1}%\n\
             Mean generation:    {}",
            "Session Summary".bold(),
            self.elapsed(),
            stats.questions,
            stats.chunks_retrieved,
            stats.answers_generated,
            stats.empty_answers,
            stats.generation_failures,
            self.answer_rate() * 100.0,
            mean,
        )
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Keeps records logged from this module so tests can inspect them
    struct CapturedLog(Mutex<Vec<(log::Level, String)>>);

    impl log::Log for CapturedLog {
        fn enabled(&self, _metadata: &log::Metadata) -> bool {
            true
        }

        fn log(&self, record: &log::Record) {
            if record.target().starts_with("resumebuddy::telemetry") {
                lock(&self.0).push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURED: CapturedLog = CapturedLog(Mutex::new(Vec::new()));

    #[test]
    fn test_collector_creation() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.event_count(), 0);
        assert_eq!(collector.get_stats().questions, 0);
        assert!(collector.mean_generation_ms().is_none());
    }

    #[test]
    fn test_retrieval_event_accumulates() {
        let collector = TelemetryCollector::new();
        for _ in 0..2 {
            collector.record(TelemetryEvent::ChunksRetrieved {
                count: 2,
                top_score: Some(0.61),
                duration_ms: 5,
                timestamp: Instant::now(),
            });
        }

        let stats = collector.get_stats();
        assert_eq!(stats.retrievals, 2);
        assert_eq!(stats.chunks_retrieved, 4);
        assert_eq!(stats.retrieval_ms, 10);
    }

    #[test]
    fn test_answer_rate() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::AnswerGenerated {
            chars: 120,
            duration_ms: 900,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::AnswerGenerated {
            chars: 80,
            duration_ms: 1100,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::GenerationFailed {
            reason: "connection refused".to_string(),
            timestamp: Instant::now(),
        });

        assert!((collector.answer_rate() - 0.666).abs() < 0.01);
        assert_eq!(collector.mean_generation_ms(), Some(1000));
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        for i in 0..10 {
            collector.record(TelemetryEvent::QuestionReceived {
                question: format!("q{}", i),
                timestamp: Instant::now(),
            });
        }

        let recent = collector.recent_events(3);
        assert_eq!(recent.len(), 3);
        assert!(matches!(
            &recent[2],
            TelemetryEvent::QuestionReceived { question, .. } if question == "q9"
        ));
    }

    #[test]
    fn test_clones_share_state() {
        let collector = TelemetryCollector::new();
        let clone = collector.clone();
        clone.record(TelemetryEvent::EmptyAnswer {
            timestamp: Instant::now(),
        });
        assert_eq!(collector.get_stats().empty_answers, 1);
    }

    #[test]
    fn test_summary_mentions_counts() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::QuestionReceived {
            question: "q".to_string(),
            timestamp: Instant::now(),
        });
        let summary = collector.summary();
        assert!(summary.contains("Questions:          1"));
    }

    #[test]
    fn test_failed_generation_is_counted_without_warning() {
        let _ = log::set_logger(&CAPTURED);
        log::set_max_level(log::LevelFilter::Trace);

        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::GenerationFailed {
            reason: "HTTP 500 from llama-under-test".to_string(),
            timestamp: Instant::now(),
        });

        assert_eq!(collector.get_stats().generation_failures, 1);
        let warned = lock(&CAPTURED.0)
            .iter()
            .any(|(level, msg)| *level <= log::Level::Warn && msg.contains("llama-under-test"));
        assert!(!warned);
    }
}
