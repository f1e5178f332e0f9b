//! Streaming event sequencing.
//!
//! Converts the engine's live event stream into the ordered external event
//! sequence. The transition function is synchronous and pure over the
//! per-stream state; [`StreamSequencer::run`] drives it from an async engine
//! stream and guarantees the terminal-event invariant: exactly one
//! `response.created` first, `added` before deltas before `done` per item,
//! and exactly one terminal event closing every stream.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::{debug, warn};

use crate::engine::{
    EngineEvent, EngineStatus, GenerationSettings, InvocationDescriptor,
};
use crate::error::{GatewayError, Result};
use crate::types::{
    item_id, new_response_id, OutputItem, ResponseHead, ResponseRecord, ResponseStatus, Role,
    StreamEvent, RESPONSE_OBJECT,
};
use crate::util::estimate::TokenEstimator;

use super::assembler::usage_or_estimate;
use super::identity::Continuity;

/// Lifecycle phase of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Created,
    ItemOpen,
    ItemStreaming,
    ItemClosed,
    Completed,
    Failed,
}

struct OpenItem {
    id: String,
    index: u32,
    text: String,
}

/// Per-request stream state machine. Owned exclusively for the lifetime of
/// one streaming request.
pub struct StreamSequencer {
    response_id: String,
    created_at: i64,
    model: String,
    store: bool,
    previous_response_id: Option<String>,
    settings: GenerationSettings,
    input_text: String,
    estimator: Arc<dyn TokenEstimator>,

    phase: Phase,
    sequence: u64,
    next_index: u32,
    open_item: Option<OpenItem>,
    finished_items: Vec<OutputItem>,
}

impl StreamSequencer {
    /// Build a sequencer for an invocation, allocating a fresh response id.
    pub fn for_invocation(
        invocation: &InvocationDescriptor,
        estimator: Arc<dyn TokenEstimator>,
    ) -> Self {
        let previous_response_id = match &invocation.continuity {
            Continuity::PriorResponse(id) => Some(id.clone()),
            _ => None,
        };
        Self {
            response_id: new_response_id(),
            created_at: chrono::Utc::now().timestamp(),
            model: invocation.model.clone(),
            store: invocation.store,
            previous_response_id,
            settings: invocation.settings.clone(),
            input_text: invocation.input_text(),
            estimator,
            phase: Phase::Idle,
            sequence: 0,
            next_index: 0,
            open_item: None,
            finished_items: Vec::new(),
        }
    }

    /// Advance the state machine with one engine event.
    ///
    /// Returns the external events to emit, in order. After a terminal event
    /// has been produced, every further call returns nothing.
    pub fn handle(&mut self, event: EngineEvent) -> Vec<StreamEvent> {
        if self.is_terminal() {
            return Vec::new();
        }
        let mut out = Vec::new();
        match event {
            EngineEvent::ItemStart => {
                self.ensure_created(&mut out);
                self.close_item(&mut out);
                self.open_item(&mut out);
            }
            EngineEvent::TextDelta { text } => {
                self.ensure_created(&mut out);
                if self.open_item.is_none() {
                    self.open_item(&mut out);
                }
                // Deltas are forwarded verbatim: never reordered, merged, or
                // split.
                if let Some((id, index)) = self.open_item.as_mut().map(|item| {
                    item.text.push_str(&text);
                    (item.id.clone(), item.index)
                }) {
                    let event = StreamEvent::OutputTextDelta {
                        sequence_number: 0,
                        item_id: id,
                        output_index: index,
                        content_index: 0,
                        delta: text,
                    };
                    out.push(self.numbered(event));
                    self.phase = Phase::ItemStreaming;
                }
            }
            EngineEvent::ItemEnd => {
                self.ensure_created(&mut out);
                self.close_item(&mut out);
            }
            EngineEvent::Done { status, usage } => {
                self.ensure_created(&mut out);
                match status {
                    // A failure never closes the open item; the error event
                    // is the next and last thing the client sees.
                    EngineStatus::Failed => {
                        out.extend(self.fail(&GatewayError::EngineInvocation(
                            "engine reported a failed invocation".to_string(),
                        )));
                    }
                    EngineStatus::Completed | EngineStatus::Incomplete => {
                        self.close_item(&mut out);
                        let record = self.build_record(status, usage);
                        let event = StreamEvent::Completed {
                            sequence_number: 0,
                            response: record,
                        };
                        out.push(self.numbered(event));
                        self.phase = Phase::Completed;
                    }
                }
            }
        }
        out
    }

    /// Transition to the error state, emitting the single terminal error
    /// event. No-op once terminal.
    pub fn fail(&mut self, error: &GatewayError) -> Vec<StreamEvent> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.phase = Phase::Failed;
        let event = StreamEvent::Error {
            sequence_number: 0,
            error: error.payload(),
        };
        vec![self.numbered(event)]
    }

    /// Close out a stream whose engine ended without a terminal event.
    pub fn finish_eof(&mut self) -> Vec<StreamEvent> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.fail(&GatewayError::EngineInvocation(
            "engine stream ended without a terminal event".to_string(),
        ))
    }

    fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Failed)
    }

    fn ensure_created(&mut self, out: &mut Vec<StreamEvent>) {
        if self.phase != Phase::Idle {
            return;
        }
        let event = StreamEvent::Created {
            sequence_number: 0,
            response: ResponseHead {
                id: self.response_id.clone(),
                object: RESPONSE_OBJECT.to_string(),
                created_at: self.created_at,
                model: self.model.clone(),
                status: ResponseStatus::InProgress,
                temperature: self.settings.temperature,
                top_p: self.settings.top_p,
                max_output_tokens: self.settings.max_output_tokens,
            },
        };
        out.push(self.numbered(event));
        self.phase = Phase::Created;
    }

    fn open_item(&mut self, out: &mut Vec<StreamEvent>) {
        let index = self.next_index;
        self.next_index += 1;
        let id = item_id(&self.response_id, index);
        let event = StreamEvent::OutputItemAdded {
            sequence_number: 0,
            output_index: index,
            item: OutputItem::message(id.clone(), Role::Assistant),
        };
        out.push(self.numbered(event));
        self.open_item = Some(OpenItem { id, index, text: String::new() });
        self.phase = Phase::ItemOpen;
    }

    fn close_item(&mut self, out: &mut Vec<StreamEvent>) {
        let Some(item) = self.open_item.take() else {
            return;
        };
        let done = OutputItem::message_with_text(item.id, Role::Assistant, item.text);
        let event = StreamEvent::OutputItemDone {
            sequence_number: 0,
            output_index: item.index,
            item: done.clone(),
        };
        out.push(self.numbered(event));
        self.finished_items.push(done);
        self.phase = Phase::ItemClosed;
    }

    fn build_record(&mut self, status: EngineStatus, usage: Option<crate::types::Usage>) -> ResponseRecord {
        let output = std::mem::take(&mut self.finished_items);
        let output_text: String = output.iter().map(OutputItem::text).collect();
        let usage = usage_or_estimate(
            usage,
            self.estimator.as_ref(),
            &self.input_text,
            &output_text,
        );
        ResponseRecord {
            id: self.response_id.clone(),
            object: RESPONSE_OBJECT.to_string(),
            created_at: self.created_at,
            model: self.model.clone(),
            status: match status {
                EngineStatus::Incomplete => ResponseStatus::Incomplete,
                _ => ResponseStatus::Completed,
            },
            output,
            usage,
            store: self.store,
            previous_response_id: self.previous_response_id.clone(),
            error: None,
        }
    }

    fn numbered(&mut self, mut event: StreamEvent) -> StreamEvent {
        let n = self.sequence;
        self.sequence += 1;
        match &mut event {
            StreamEvent::Created { sequence_number, .. }
            | StreamEvent::OutputItemAdded { sequence_number, .. }
            | StreamEvent::OutputTextDelta { sequence_number, .. }
            | StreamEvent::OutputItemDone { sequence_number, .. }
            | StreamEvent::Completed { sequence_number, .. }
            | StreamEvent::Error { sequence_number, .. } => *sequence_number = n,
        }
        event
    }

    /// Drive the state machine from a live engine stream.
    ///
    /// Dropping the returned stream before its terminal event cancels the
    /// engine stream and logs the disconnect.
    pub fn run(mut self, events: BoxStream<'static, Result<EngineEvent>>) -> BoxStream<'static, StreamEvent> {
        let stream = async_stream::stream! {
            let mut guard = TransportGuard {
                response_id: self.response_id.clone(),
                finished: false,
            };
            let mut events = events;
            while let Some(item) = events.next().await {
                let produced = match item {
                    Ok(event) => self.handle(event),
                    Err(error) => {
                        debug!(
                            response_id = %self.response_id,
                            error = %error,
                            "engine stream failed mid-flight"
                        );
                        self.fail(&error)
                    }
                };
                for event in produced {
                    if event.is_terminal() {
                        guard.finished = true;
                    }
                    yield event;
                }
                if self.is_terminal() {
                    break;
                }
            }
            for event in self.finish_eof() {
                guard.finished = true;
                yield event;
            }
        };
        Box::pin(stream)
    }
}

/// Logs streams torn down by client disconnect before their terminal event.
struct TransportGuard {
    response_id: String,
    finished: bool,
}

impl Drop for TransportGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                response_id = %self.response_id,
                "transport closed before terminal event; engine invocation cancelled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Usage;
    use crate::util::estimate::CharsPerToken;

    fn sequencer() -> StreamSequencer {
        let invocation = InvocationDescriptor {
            model: "m1".to_string(),
            messages: vec![crate::engine::EngineMessage::user("hi")],
            settings: GenerationSettings {
                temperature: Some(0.5),
                ..Default::default()
            },
            continuity: Continuity::Fresh,
            store: true,
        };
        StreamSequencer::for_invocation(&invocation, Arc::new(CharsPerToken::default()))
    }

    fn kinds(events: &[StreamEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                StreamEvent::Created { .. } => "created",
                StreamEvent::OutputItemAdded { .. } => "added",
                StreamEvent::OutputTextDelta { .. } => "delta",
                StreamEvent::OutputItemDone { .. } => "done",
                StreamEvent::Completed { .. } => "completed",
                StreamEvent::Error { .. } => "error",
            })
            .collect()
    }

    #[test]
    fn first_event_emits_created_exactly_once() {
        let mut seq = sequencer();
        let first = seq.handle(EngineEvent::ItemStart);
        assert_eq!(kinds(&first), vec!["created", "added"]);
        let second = seq.handle(EngineEvent::TextDelta { text: "x".to_string() });
        assert_eq!(kinds(&second), vec!["delta"]);
    }

    #[test]
    fn created_echoes_generation_parameters() {
        let mut seq = sequencer();
        let events = seq.handle(EngineEvent::ItemStart);
        let StreamEvent::Created { response, .. } = &events[0] else {
            panic!("expected created first");
        };
        assert_eq!(response.temperature, Some(0.5));
        assert_eq!(response.status, ResponseStatus::InProgress);
    }

    #[test]
    fn delta_without_item_start_opens_an_item() {
        let mut seq = sequencer();
        let events = seq.handle(EngineEvent::TextDelta { text: "hey".to_string() });
        assert_eq!(kinds(&events), vec!["created", "added", "delta"]);
    }

    #[test]
    fn deltas_are_forwarded_verbatim_in_order() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::ItemStart);
        let mut deltas = Vec::new();
        for text in ["Hel", "", "lo "] {
            for event in seq.handle(EngineEvent::TextDelta { text: text.to_string() }) {
                if let StreamEvent::OutputTextDelta { delta, .. } = event {
                    deltas.push(delta);
                }
            }
        }
        assert_eq!(deltas, vec!["Hel", "", "lo "]);
    }

    #[test]
    fn item_done_carries_accumulated_text() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::ItemStart);
        seq.handle(EngineEvent::TextDelta { text: "Hel".to_string() });
        seq.handle(EngineEvent::TextDelta { text: "lo".to_string() });
        let events = seq.handle(EngineEvent::ItemEnd);
        let StreamEvent::OutputItemDone { item, output_index, .. } = &events[0] else {
            panic!("expected item done");
        };
        assert_eq!(item.text(), "Hello");
        assert_eq!(*output_index, 0);
    }

    #[test]
    fn second_item_gets_the_next_index() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::ItemStart);
        seq.handle(EngineEvent::ItemEnd);
        let events = seq.handle(EngineEvent::ItemStart);
        let StreamEvent::OutputItemAdded { output_index, .. } = &events[0] else {
            panic!("expected item added");
        };
        assert_eq!(*output_index, 1);
    }

    #[test]
    fn done_closes_open_item_then_completes() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::TextDelta { text: "hey".to_string() });
        let events = seq.handle(EngineEvent::Done {
            status: EngineStatus::Completed,
            usage: Some(Usage::reported(3, 1)),
        });
        assert_eq!(kinds(&events), vec!["done", "completed"]);
        let StreamEvent::Completed { response, .. } = events.last().unwrap() else {
            panic!("expected completed last");
        };
        assert_eq!(response.status, ResponseStatus::Completed);
        assert_eq!(response.output.len(), 1);
        assert_eq!(response.output[0].text(), "hey");
        assert_eq!(response.usage, Usage::reported(3, 1));
    }

    #[test]
    fn completed_usage_is_estimated_when_engine_omits_it() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::TextDelta { text: "x".repeat(20) });
        let events = seq.handle(EngineEvent::Done {
            status: EngineStatus::Completed,
            usage: None,
        });
        let StreamEvent::Completed { response, .. } = events.last().unwrap() else {
            panic!("expected completed last");
        };
        assert!(response.usage.estimated);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn failure_is_terminal_and_silences_later_events() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::TextDelta { text: "a".to_string() });
        let events = seq.fail(&GatewayError::EngineInvocation("boom".to_string()));
        assert_eq!(kinds(&events), vec!["error"]);
        assert!(seq.handle(EngineEvent::TextDelta { text: "b".to_string() }).is_empty());
        assert!(seq.fail(&GatewayError::EngineInvocation("again".to_string())).is_empty());
        assert!(seq.finish_eof().is_empty());
    }

    #[test]
    fn engine_done_with_failed_status_becomes_error_event() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::ItemStart);
        seq.handle(EngineEvent::TextDelta { text: "par".to_string() });
        let events = seq.handle(EngineEvent::Done {
            status: EngineStatus::Failed,
            usage: None,
        });
        // The partial item is abandoned: no done, no completed.
        assert_eq!(kinds(&events), vec!["error"]);
    }

    #[test]
    fn eof_without_done_produces_an_error_event() {
        let mut seq = sequencer();
        seq.handle(EngineEvent::TextDelta { text: "partial".to_string() });
        let events = seq.finish_eof();
        assert_eq!(kinds(&events), vec!["error"]);
    }

    #[test]
    fn sequence_numbers_are_consecutive_from_zero() {
        let mut seq = sequencer();
        let mut all = Vec::new();
        all.extend(seq.handle(EngineEvent::ItemStart));
        all.extend(seq.handle(EngineEvent::TextDelta { text: "a".to_string() }));
        all.extend(seq.handle(EngineEvent::ItemEnd));
        all.extend(seq.handle(EngineEvent::Done {
            status: EngineStatus::Completed,
            usage: None,
        }));
        let numbers: Vec<u64> = all.iter().map(StreamEvent::sequence_number).collect();
        assert_eq!(numbers, (0..all.len() as u64).collect::<Vec<_>>());
    }
}
