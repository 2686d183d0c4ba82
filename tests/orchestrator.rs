//! End-to-end orchestrator behavior against a scripted provider

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde_json::json;
use toolstream::provider::{ScriptedProvider, ScriptedTurn};
use toolstream::{
    EngineError, Event, EventEncoder, MessageRole, OrchestratorOptions, ResponseOrchestrator,
    StreamDelta, ToolRegistry,
};

fn orchestrator(provider: &Arc<ScriptedProvider>) -> ResponseOrchestrator {
    orchestrator_with(provider, OrchestratorOptions::default())
}

fn orchestrator_with(
    provider: &Arc<ScriptedProvider>,
    options: OrchestratorOptions,
) -> ResponseOrchestrator {
    ResponseOrchestrator::new(
        provider.clone(),
        Arc::new(ToolRegistry::with_reference_tools()),
        options,
    )
}

async fn run(orchestrator: &ResponseOrchestrator, query: &str) -> Vec<Event> {
    let events: Vec<Event> = orchestrator.handle(query).collect().await;
    assert_eq!(events.last(), Some(&Event::End), "{events:?}");
    assert_eq!(events.iter().filter(|e| e.is_end()).count(), 1);
    events
}

fn weather_output(city: &str) -> serde_json::Value {
    json!({"temperature": "22°C", "conditions": "Sunny", "city": city})
}

#[tokio::test]
async fn test_content_only_response() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new()
        .content("Hello")
        .content("   ")
        .content("")
        .content(", how can I help?")]));

    let events = run(&orchestrator(&provider), "hi").await;

    assert_eq!(
        events,
        vec![
            Event::chunk("Hello"),
            Event::chunk(", how can I help?"),
            Event::End
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages.len(), 1);
    assert_eq!(requests[0].messages[0].role, MessageRole::User);
    assert_eq!(requests[0].messages[0].content, "hi");
    assert_eq!(requests[0].tools.as_ref().map(Vec::len), Some(4));
    assert!(requests[0].allow_tool_choice);
}

#[tokio::test]
async fn test_weather_in_paris() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new().tool_call(0, "call_1", "get_weather", "{\"city\": \"Paris\"}"),
        ScriptedTurn::new()
            .content("It is 22°C")
            .content(" and sunny in Paris."),
    ]));

    let events = run(&orchestrator(&provider), "What's the weather in Paris?").await;

    assert_eq!(
        events,
        vec![
            Event::ToolUse {
                name: "get_weather".into(),
                parameters: json!({"city": "Paris"}),
            },
            Event::ToolOutput {
                name: "get_weather".into(),
                output: weather_output("Paris"),
                success: true,
            },
            Event::chunk("It is 22°C"),
            Event::chunk(" and sunny in Paris."),
            Event::End,
        ]
    );

    assert_eq!(
        EventEncoder::encode(&events[1]),
        "event: tool_output\ndata: {\"name\":\"get_weather\",\"output\":{\"city\":\"Paris\",\"conditions\":\"Sunny\",\"temperature\":\"22°C\"},\"success\":true}\n"
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let follow_up = &requests[1];
    assert!(follow_up.tools.is_none());
    assert!(!follow_up.allow_tool_choice);
    assert_eq!(follow_up.messages.len(), 2);
    assert_eq!(follow_up.messages[0].content, "What's the weather in Paris?");
    assert_eq!(follow_up.messages[1].role, MessageRole::Tool);
    assert_eq!(follow_up.messages[1].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(follow_up.messages[1].name.as_deref(), Some("get_weather"));
    let sent: serde_json::Value = serde_json::from_str(&follow_up.messages[1].content).unwrap();
    assert_eq!(sent, weather_output("Paris"));
}

#[tokio::test]
async fn test_fragmented_tool_call_is_announced_once() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new()
            .content("Checking")
            .tool_call(0, "call_1", "get_weather", "")
            .delta(StreamDelta::arguments(0, "{\"ci"))
            .delta(StreamDelta::arguments(0, "ty\": \"Oslo\"}")),
        ScriptedTurn::new().content("Sunny."),
    ]));

    let events = run(&orchestrator(&provider), "weather in Oslo").await;

    let tool_uses: Vec<&Event> = events
        .iter()
        .filter(|e| matches!(e, Event::ToolUse { .. }))
        .collect();
    // The name arrives before any argument text, so parameters are still empty
    assert_eq!(
        tool_uses,
        vec![&Event::ToolUse {
            name: "get_weather".into(),
            parameters: json!({}),
        }]
    );
    assert_eq!(events[0], Event::chunk("Checking"));
    assert_eq!(
        events[2],
        Event::ToolOutput {
            name: "get_weather".into(),
            output: weather_output("Oslo"),
            success: true,
        }
    );
}

#[tokio::test]
async fn test_unknown_tool_skips_follow_up() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new().tool_call(0, "call_1", "launch_rocket", "{}"),
    ]));

    let events = run(&orchestrator(&provider), "launch").await;

    assert_eq!(
        events,
        vec![
            Event::ToolUse {
                name: "launch_rocket".into(),
                parameters: json!({}),
            },
            Event::ToolOutput {
                name: "launch_rocket".into(),
                output: json!({"error": "unknown tool: launch_rocket"}),
                success: false,
            },
            Event::End,
        ]
    );
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_malformed_arguments_skip_follow_up() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new().tool_call(0, "call_1", "get_weather", "{\"city\": \"Par"),
    ]));

    let events = run(&orchestrator(&provider), "weather").await;

    match &events[1] {
        Event::ToolOutput {
            name,
            output,
            success,
        } => {
            assert_eq!(name, "get_weather");
            assert!(!success);
            assert!(output["error"]
                .as_str()
                .unwrap()
                .starts_with("malformed arguments"));
        }
        other => panic!("expected tool output, got {other:?}"),
    }
    assert_eq!(events.len(), 3);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_tools_run_sequentially_with_their_own_follow_up() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new()
            .tool_call(0, "call_a", "get_weather", "{\"city\": \"Rome\"}")
            .tool_call(1, "call_b", "get_dealership_address", "{\"dealership_id\": \"sc-002\"}"),
        ScriptedTurn::new().content("Rome is sunny."),
        ScriptedTurn::new().content("Westside is open."),
    ]));

    let events = run(&orchestrator(&provider), "two things").await;

    let kinds: Vec<&str> = events.iter().map(|e| e.kind().as_str()).collect();
    assert_eq!(
        kinds,
        ["tool_use", "tool_use", "tool_output", "chunk", "tool_output", "chunk", "end"]
    );
    assert_eq!(events[3], Event::chunk("Rome is sunny."));
    assert_eq!(events[5], Event::chunk("Westside is open."));

    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].messages[1].tool_call_id.as_deref(), Some("call_a"));
    assert_eq!(requests[2].messages[1].tool_call_id.as_deref(), Some("call_b"));
}

#[tokio::test]
async fn test_failed_tool_does_not_stop_siblings() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new()
            .tool_call(0, "call_a", "book_flight", "{}")
            .tool_call(1, "call_b", "get_weather", "{\"city\": \"Lima\"}"),
        ScriptedTurn::new().content("Lima is sunny."),
    ]));

    let events = run(&orchestrator(&provider), "q").await;

    let outputs: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            Event::ToolOutput { success, .. } => Some(*success),
            _ => None,
        })
        .collect();
    assert_eq!(outputs, [false, true]);
    assert_eq!(events[events.len() - 2], Event::chunk("Lima is sunny."));
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_unavailable_slot_is_reported_and_explained() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new().tool_call(
            0,
            "call_1",
            "schedule_appointment",
            "{\"user_id\": \"u-1\", \"dealership_id\": \"sc-001\", \"date\": \"2025-06-01\", \"time\": \"13:00\", \"car_model\": \"Roadster\"}",
        ),
        ScriptedTurn::new().content("Sorry, 13:00 is taken."),
    ]));

    let events = run(&orchestrator(&provider), "book me in at 1pm").await;

    match &events[1] {
        Event::ToolOutput {
            output, success, ..
        } => {
            assert!(success);
            assert_eq!(output["status"], "failed");
            assert_eq!(output["message"], "Time slot 13:00 not available");
        }
        other => panic!("expected tool output, got {other:?}"),
    }
    assert_eq!(events[2], Event::chunk("Sorry, 13:00 is taken."));
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_open_failure_becomes_error_then_end() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::open_failure(
        EngineError::provider(401, "invalid api key"),
    )]));

    let events = run(&orchestrator(&provider), "hi").await;

    assert_eq!(
        events,
        vec![
            Event::error("provider error (401): invalid api key"),
            Event::End
        ]
    );
}

#[tokio::test]
async fn test_mid_stream_failure_abandons_response() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new()
        .content("Hel")
        .fail(EngineError::Http("connection reset".into()))
        .content("never seen")]));

    let events = run(&orchestrator(&provider), "hi").await;

    assert_eq!(
        events,
        vec![
            Event::chunk("Hel"),
            Event::error("HTTP error: connection reset"),
            Event::End
        ]
    );
}

#[tokio::test]
async fn test_follow_up_failure_abandons_remaining_tools() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new()
            .tool_call(0, "call_a", "get_weather", "{\"city\": \"Paris\"}")
            .tool_call(1, "call_b", "get_weather", "{\"city\": \"Rome\"}"),
        ScriptedTurn::new()
            .content("Paris")
            .fail(EngineError::Decode("bad chunk".into())),
    ]));

    let events = run(&orchestrator(&provider), "q").await;

    let kinds: Vec<&str> = events.iter().map(|e| e.kind().as_str()).collect();
    assert_eq!(
        kinds,
        ["tool_use", "tool_use", "tool_output", "chunk", "error", "end"]
    );
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn test_stalled_stream_times_out() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new()
        .content("partial")
        .stall()]));
    let options = OrchestratorOptions {
        stream_timeout: Duration::from_millis(50),
    };

    let events = run(&orchestrator_with(&provider, options), "hi").await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], Event::chunk("partial"));
    match &events[1] {
        Event::Error { message } => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(provider.live_streams(), 0);
}

#[tokio::test]
async fn test_slow_but_steady_stream_is_not_a_timeout() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new()
        .content("one")
        .delay(Duration::from_millis(40))
        .content("two")
        .delay(Duration::from_millis(40))
        .content("three")]));
    let options = OrchestratorOptions {
        stream_timeout: Duration::from_millis(200),
    };

    let events = run(&orchestrator_with(&provider, options), "hi").await;

    assert_eq!(events.len(), 4);
}

#[tokio::test]
async fn test_dropping_the_stream_releases_the_provider() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new()
        .content("first")
        .stall()]));
    let orchestrator = orchestrator(&provider);

    let mut events = orchestrator.handle("hi");
    assert_eq!(events.next().await, Some(Event::chunk("first")));
    assert_eq!(provider.live_streams(), 1);

    drop(events);
    assert_eq!(provider.live_streams(), 0);
}

#[tokio::test]
async fn test_handle_is_lazy() {
    let provider = Arc::new(ScriptedProvider::new([ScriptedTurn::new().content("x")]));
    let orchestrator = orchestrator(&provider);

    let events = orchestrator.handle("hi");
    assert!(provider.requests().is_empty());
    drop(events);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_concurrent_queries_are_independent() {
    let provider = Arc::new(ScriptedProvider::new([
        ScriptedTurn::new().content("a"),
        ScriptedTurn::new().content("b"),
    ]));
    let orchestrator = orchestrator(&provider);

    let (first, second) = tokio::join!(
        orchestrator.handle("one").collect::<Vec<_>>(),
        orchestrator.handle("two").collect::<Vec<_>>()
    );

    for events in [first, second] {
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], Event::End);
    }
    assert_eq!(provider.requests().len(), 2);
}
