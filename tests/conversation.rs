use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chatfn::prelude::*;
use chatfn::NaturalLanguageFunction;

/// Replays canned replies and keeps every request it was sent.
#[derive(Default)]
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<Message, BackendError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn new(replies: impl IntoIterator<Item = Result<Message, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::default(),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send(&self, request: &ChatRequest) -> Result<Message, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Transport("no more replies".into())))
    }
}

fn call(name: &str, arguments: &str) -> Result<Message, BackendError> {
    Ok(Message::tool_call(FunctionCall::new(name, arguments)))
}

/// Adds two integers.
///
/// # Arguments
/// * `a` - left operand
/// * `b` - right operand
#[function]
fn add(a: i64, b: i64) -> i64 {
    a + b
}

/// Notes something without telling the model.
#[function(save_return = false)]
fn note(text: String) -> usize {
    text.len()
}

/// Answers the user directly.
#[function(interpret_as_response = true)]
fn respond(message: String) -> String {
    message
}

#[tokio::test]
async fn add_then_answer() {
    let backend = ScriptedBackend::new([
        call("add", r#"{"a": 1, "b": 2}"#),
        Ok(Message::assistant("1 + 2 = 3")),
    ]);
    let mut conversation = Conversation::new(backend.clone());
    conversation.add_function(add_function().unwrap());

    let answer = conversation.ask("What is 1 + 2?").await.unwrap();
    assert_eq!(answer, "1 + 2 = 3");

    let requests = backend.requests();
    assert_eq!(
        requests[0].to_body(),
        json!({
            "model": "gpt-3.5-turbo-0613",
            "messages": [{"role": "user", "content": "What is 1 + 2?"}],
            "functions": [{
                "name": "add",
                "description": "Adds two integers.",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "a": {"type": "integer", "description": "left operand"},
                        "b": {"type": "integer", "description": "right operand"}
                    },
                    "required": ["a", "b"]
                }
            }],
            "function_call": "auto"
        })
    );
    assert_eq!(
        requests[1].messages.last(),
        Some(&Message::tool("add", Some("3".into())))
    );
}

#[tokio::test]
async fn unsaved_results_do_not_loop() {
    let backend = ScriptedBackend::new([
        call("note", r#"{"text": "remember me"}"#),
        Ok(Message::assistant("Noted.")),
    ]);
    let mut conversation = Conversation::new(backend.clone());
    conversation.add_function(note_function().unwrap());

    assert_eq!(conversation.ask("remember me").await.unwrap(), "Noted.");
    assert_eq!(backend.requests().len(), 2);
    assert_eq!(conversation.messages().len(), 3);
}

#[tokio::test]
async fn responder_answers_for_the_model() {
    let backend = ScriptedBackend::new([call("respond", r#"{"message": "done"}"#)]);
    let mut conversation = Conversation::new(backend.clone());
    conversation.add_function(respond_function().unwrap());
    conversation.add_function(add_function().unwrap());

    assert_eq!(conversation.ask("wrap it up").await.unwrap(), "done");
    assert_eq!(backend.requests().len(), 1);
    assert_eq!(
        conversation.messages().last(),
        Some(&Message::assistant("done"))
    );
}

#[tokio::test(start_paused = true)]
async fn rate_limits_wait_and_retry_once() {
    let limited = || {
        Err(BackendError::RateLimited {
            retry_after: Duration::from_secs(2),
        })
    };

    let backend = ScriptedBackend::new([limited(), Ok(Message::assistant("hi"))]);
    let mut conversation = Conversation::new(backend.clone());
    let started = tokio::time::Instant::now();
    assert_eq!(conversation.ask("hello").await.unwrap(), "hi");
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(backend.requests().len(), 2);

    let backend = ScriptedBackend::new([limited(), limited(), Ok(Message::assistant("hi"))]);
    let mut conversation = Conversation::new(backend.clone());
    let err = conversation.ask("hello").await.unwrap_err();
    assert!(matches!(
        err,
        ConversationError::Backend(BackendError::RateLimited { .. })
    ));
    assert_eq!(backend.requests().len(), 2);

    let backend = ScriptedBackend::new([limited(), limited(), Ok(Message::assistant("hi"))]);
    let mut conversation = Conversation::new(backend.clone())
        .with_config(ConversationConfig::default().with_retries(Retries::Unlimited));
    assert_eq!(conversation.ask("hello").await.unwrap(), "hi");
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn gated_functions_unlock_on_demand() {
    let mut math = BasicFunctionSet::new();
    math.add(add_function().unwrap());
    let gated = Arc::new(TogglableSet::new("enable_math", math).with_description("Unlocks math"));

    let backend = ScriptedBackend::new([
        call("enable_math", "{}"),
        call("add", r#"{"a": 40, "b": 2}"#),
        Ok(Message::assistant("42")),
    ]);
    let mut conversation = Conversation::new(backend.clone()).with_skill(gated.clone());

    assert_eq!(conversation.ask("40 + 2?").await.unwrap(), "42");
    assert!(gated.is_enabled());
    let names: Vec<Vec<String>> = backend
        .requests()
        .iter()
        .map(|r| r.functions.iter().map(|f| f.name.clone()).collect())
        .collect();
    assert_eq!(names, vec![vec!["enable_math"], vec!["add"], vec!["add"]]);
}

#[tokio::test]
async fn natural_language_wrapper() {
    let backend = ScriptedBackend::new([
        call("add", r#"{"a": 2, "b": 2}"#),
        Ok(Message::assistant("Two plus two is four.")),
    ]);
    let mut f = NaturalLanguageFunction::new(add_function().unwrap(), backend.clone())
        .with_system_prompt("You add numbers.");

    let annotated = f.natural_language_annotated("two plus two").await.unwrap();
    assert_eq!(annotated.function_result.downcast::<i64>(), Some(4));
    assert_eq!(annotated.annotation, "Two plus two is four.");

    let requests = backend.requests();
    assert_eq!(requests[0].call_mode, CallMode::Forced("add".into()));
    assert_eq!(requests[0].to_body()["function_call"], json!({"name": "add"}));
    assert_eq!(requests[1].call_mode, CallMode::None);
    assert_eq!(requests[1].messages[0], Message::system("You add numbers."));
}
