use crate::llm::{GenerateRequest, GenerateResponse, LlmClient, LlmError, Provider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

type Scripted = Box<dyn Fn() -> Result<GenerateResponse, LlmError> + Send + Sync>;

/// Test double answering by the quoted ticker found in the instruction, with a
/// fallback for anything else. Optionally blocks each call on a gate.
#[derive(Default)]
pub(crate) struct ScriptedLlm {
    by_symbol: HashMap<String, Scripted>,
    fallback: Option<Scripted>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn text(text: &str) -> Result<GenerateResponse, LlmError> {
        Ok(GenerateResponse {
            text: Some(text.to_string()),
            grounding_chunks: Vec::new(),
        })
    }

    pub(crate) fn on_symbol(
        mut self,
        symbol: &str,
        f: impl Fn() -> Result<GenerateResponse, LlmError> + Send + Sync + 'static,
    ) -> Self {
        self.by_symbol.insert(symbol.to_string(), Box::new(f));
        self
    }

    pub(crate) fn otherwise(
        mut self,
        f: impl Fn() -> Result<GenerateResponse, LlmError> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(f));
        self
    }

    /// Each call waits for one permit before answering.
    pub(crate) fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn instructions(&self) -> Vec<String> {
        self.instructions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(request.instruction.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let scripted = self
            .by_symbol
            .iter()
            .find(|(symbol, _)| request.instruction.contains(&format!("\"{symbol}\"")))
            .map(|(_, f)| f)
            .or(self.fallback.as_ref());

        match scripted {
            Some(f) => f(),
            None => Err(LlmError::EmptyResponse),
        }
    }
}
