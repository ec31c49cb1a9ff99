//! The language-model collaborator.
//!
//! An [`InferenceBackend`] offers two call shapes: an *instruction* call
//! (instructions plus multi-part input, the OpenAI Responses API shape) and a
//! *chat* call (role-tagged messages, the Chat Completions shape). The
//! [`Invoker`] picks an [`InvocationPath`] once, when it is built, by probing
//! the backend's [`Capabilities`].
//!
//! Only an [`InferenceError::Unsupported`] reply moves an instruction call to
//! the chat path. Transport failures, error statuses and malformed replies are
//! returned as they are.

mod openai;

pub use openai::OpenAiBackend;

use std::cell::Cell;

use log::{debug, info, warn};
use thiserror::Error;

use crate::config::Interface;

/// Failure of a single model call.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The backend does not offer the requested interface.
    #[error("interface unavailable: {0}")]
    Unsupported(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed model reply: {0}")]
    MalformedResponse(String),
}

/// One part of a multi-part input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPart {
    Text(String),
    /// An image given as a `data:` URL.
    Image(String),
}

/// A request for the instruction interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRequest {
    instructions: String,
    input: Vec<InputPart>,
}

impl InstructionRequest {
    /// `input` is sent as a single user turn.
    pub fn new(instructions: impl Into<String>, input: Vec<InputPart>) -> Self {
        Self {
            instructions: instructions.into(),
            input,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn input(&self) -> &[InputPart] {
        &self.input
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    role: Role,
    parts: Vec<InputPart>,
}

impl ChatMessage {
    pub fn new(role: Role, parts: Vec<InputPart>) -> Self {
        Self { role, parts }
    }

    /// A message with a single text part.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::new(role, vec![InputPart::Text(text.into())])
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[InputPart] {
        &self.parts
    }
}

/// A request for the chat interface.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    messages: Vec<ChatMessage>,
    json_object: bool,
    max_tokens: u32,
    temperature: f32,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            messages,
            json_object: false,
            max_tokens,
            temperature,
        }
    }

    /// Requests enforced JSON-object output (builder style).
    pub fn with_json_object(mut self) -> Self {
        self.json_object = true;
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn json_object(&self) -> bool {
        self.json_object
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

/// What a backend reports it can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    instructions: bool,
}

impl Capabilities {
    pub fn new(instructions: bool) -> Self {
        Self { instructions }
    }

    /// Returns `true` if the instruction interface is available.
    pub fn instructions(self) -> bool {
        self.instructions
    }
}

/// A language-model service.
pub trait InferenceBackend {
    /// Reports the interfaces the backend offers. Called once per [`Invoker`].
    fn capabilities(&self) -> Capabilities;

    /// Performs an instruction call and returns the reply text.
    fn instruct(&self, request: &InstructionRequest) -> Result<String, InferenceError>;

    /// Performs a chat call and returns the first reply message's text.
    fn chat(&self, request: &ChatRequest) -> Result<String, InferenceError>;
}

/// Which interface a call goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPath {
    Instruction,
    Chat,
}

/// A model reply together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    text: String,
    path: InvocationPath,
}

impl Reply {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> InvocationPath {
        self.path
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Dispatches calls to a backend through the selected [`InvocationPath`].
///
/// Once an instruction call comes back [`InferenceError::Unsupported`], the
/// invoker uses the chat path for the rest of its lifetime.
pub struct Invoker {
    backend: Box<dyn InferenceBackend>,
    path: Cell<InvocationPath>,
}

impl Invoker {
    /// Wraps `backend`, choosing the path from `interface` and, for
    /// [`Interface::Auto`], the backend's capabilities.
    pub fn new(backend: Box<dyn InferenceBackend>, interface: Interface) -> Self {
        let path = match interface {
            Interface::Instruction => InvocationPath::Instruction,
            Interface::Chat => InvocationPath::Chat,
            Interface::Auto if backend.capabilities().instructions() => {
                InvocationPath::Instruction
            }
            Interface::Auto => InvocationPath::Chat,
        };
        info!(path:? = path, interface:? = interface; "Selected invocation path");

        Self {
            backend,
            path: Cell::new(path),
        }
    }

    /// The path the next call will take.
    pub fn path(&self) -> InvocationPath {
        self.path.get()
    }

    /// Sends `instruction` on the instruction path, or the request built by
    /// `chat` on the chat path.
    pub fn invoke<F>(&self, instruction: &InstructionRequest, chat: F) -> Result<Reply, InferenceError>
    where
        F: FnOnce() -> ChatRequest,
    {
        if self.path.get() == InvocationPath::Instruction {
            match self.backend.instruct(instruction) {
                Ok(text) => {
                    return Ok(Reply {
                        text,
                        path: InvocationPath::Instruction,
                    });
                }
                Err(InferenceError::Unsupported(reason)) => {
                    warn!(reason; "Instruction interface unavailable, using chat interface");
                    self.path.set(InvocationPath::Chat);
                }
                Err(err) => return Err(err),
            }
        }

        let request = chat();
        debug!(
            messages = request.messages().len(),
            max_tokens = request.max_tokens(),
            json_object = request.json_object();
            "Sending chat request"
        );
        let text = self.backend.chat(&request)?;
        Ok(Reply {
            text,
            path: InvocationPath::Chat,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Default)]
    struct Calls {
        instruct: usize,
        chat: usize,
    }

    struct FakeBackend {
        instructions: bool,
        instruct_reply: fn() -> Result<String, InferenceError>,
        calls: Rc<RefCell<Calls>>,
    }

    impl InferenceBackend for FakeBackend {
        fn capabilities(&self) -> Capabilities {
            Capabilities::new(self.instructions)
        }

        fn instruct(&self, _request: &InstructionRequest) -> Result<String, InferenceError> {
            self.calls.borrow_mut().instruct += 1;
            (self.instruct_reply)()
        }

        fn chat(&self, _request: &ChatRequest) -> Result<String, InferenceError> {
            self.calls.borrow_mut().chat += 1;
            Ok("chat".to_string())
        }
    }

    fn invoker(
        instructions: bool,
        instruct_reply: fn() -> Result<String, InferenceError>,
        interface: Interface,
    ) -> (Invoker, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let backend = FakeBackend {
            instructions,
            instruct_reply,
            calls: Rc::clone(&calls),
        };
        (Invoker::new(Box::new(backend), interface), calls)
    }

    fn request() -> InstructionRequest {
        InstructionRequest::new("do it", vec![InputPart::Text("input".to_string())])
    }

    fn chat_request() -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::text(Role::User, "input")], 100, 0.2)
    }

    #[test]
    fn test_auto_probe_selects_instruction_path() {
        let (invoker, calls) = invoker(true, || Ok("primary".to_string()), Interface::Auto);
        assert_eq!(invoker.path(), InvocationPath::Instruction);

        let reply = invoker.invoke(&request(), chat_request).unwrap();

        assert_eq!(reply.text(), "primary");
        assert_eq!(reply.path(), InvocationPath::Instruction);
        assert_eq!(calls.borrow().chat, 0);
    }

    #[test]
    fn test_auto_probe_selects_chat_path() {
        let (invoker, calls) = invoker(false, || Ok("primary".to_string()), Interface::Auto);

        let reply = invoker.invoke(&request(), chat_request).unwrap();

        assert_eq!(reply.path(), InvocationPath::Chat);
        assert_eq!(calls.borrow().instruct, 0);
        assert_eq!(calls.borrow().chat, 1);
    }

    #[test]
    fn test_forced_chat_ignores_capabilities() {
        let (invoker, _calls) = invoker(true, || Ok("primary".to_string()), Interface::Chat);
        assert_eq!(invoker.path(), InvocationPath::Chat);
    }

    #[test]
    fn test_unsupported_falls_back_and_stays_on_chat() {
        let (invoker, calls) = invoker(
            true,
            || Err(InferenceError::Unsupported("404".to_string())),
            Interface::Auto,
        );

        let first = invoker.invoke(&request(), chat_request).unwrap();
        let second = invoker.invoke(&request(), chat_request).unwrap();

        assert_eq!(first.text(), "chat");
        assert_eq!(second.path(), InvocationPath::Chat);
        assert_eq!(invoker.path(), InvocationPath::Chat);
        assert_eq!(calls.borrow().instruct, 1);
        assert_eq!(calls.borrow().chat, 2);
    }

    #[test]
    fn test_content_failure_does_not_fall_back() {
        let (invoker, calls) = invoker(
            true,
            || {
                Err(InferenceError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            },
            Interface::Auto,
        );

        let err = invoker.invoke(&request(), chat_request).unwrap_err();

        assert!(matches!(err, InferenceError::Status { status: 500, .. }));
        assert_eq!(calls.borrow().chat, 0);
        assert_eq!(invoker.path(), InvocationPath::Instruction);
    }
}
