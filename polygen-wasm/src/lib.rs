//! WASM bindings for polygen — powers the in-browser grammar playground.

use wasm_bindgen::prelude::*;

use polygen::core::expand::TraceStep;
use polygen::core::grammar::Grammar;
use polygen::core::pipeline::Polygen;

// ---------------------------------------------------------------------------
// Embedded sample grammar — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const TAVERN_GRAMMAR: &str = include_str!("../../grammar_data/tavern.pg");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct TraceInfo<'a> {
    text: String,
    steps: &'a [TraceStep],
}

#[derive(serde::Serialize)]
struct SymbolInfo {
    name: String,
    alternatives: usize,
    synthetic: bool,
}

fn js_error(context: &str, e: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// PolygenDemo — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct PolygenDemo {
    engine: Polygen,
    source: String,
}

#[wasm_bindgen]
impl PolygenDemo {
    /// Compile `source` and seed the generator.
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str, seed: u64) -> Result<PolygenDemo, JsError> {
        let grammar = Grammar::compile(source).map_err(|e| js_error("Grammar error", e))?;
        let engine = Polygen::builder()
            .seed(seed)
            .with_grammar(grammar)
            .build()
            .map_err(|e| js_error("Engine build error", e))?;

        Ok(PolygenDemo {
            engine,
            source: source.to_string(),
        })
    }

    pub fn generate(&mut self) -> Result<String, JsError> {
        self.engine
            .generate()
            .map_err(|e| js_error("Generation error", e))
    }

    /// Generate several sentences. Returns a JSON array of strings.
    pub fn generate_variants(&mut self, count: usize) -> Result<String, JsError> {
        let variants = self
            .engine
            .generate_variants(count)
            .map_err(|e| js_error("Generation error", e))?;
        serde_json::to_string(&variants).map_err(|e| js_error("Serialization error", e))
    }

    /// Generate one sentence with its expansion trace.
    ///
    /// ```json
    /// { "text": "...", "steps": [{ "depth": 0, "symbol": "$s", "choice": 0, "alternatives": 1 }] }
    /// ```
    pub fn trace(&mut self) -> Result<String, JsError> {
        let (text, steps) = self
            .engine
            .generate_traced()
            .map_err(|e| js_error("Generation error", e))?;
        serde_json::to_string(&TraceInfo {
            text,
            steps: &steps,
        })
        .map_err(|e| js_error("Serialization error", e))
    }

    /// Return a JSON array describing every symbol of the compiled table.
    pub fn symbols(&self) -> Result<String, JsError> {
        let symbols: Vec<SymbolInfo> = self
            .engine
            .grammar()
            .table()
            .iter()
            .map(|(symbol, production)| SymbolInfo {
                name: symbol.to_string(),
                alternatives: production.len(),
                synthetic: symbol.is_synthetic(),
            })
            .collect();
        serde_json::to_string(&symbols).map_err(|e| js_error("Serialization error", e))
    }

    /// Restart from a new seed with the same grammar.
    pub fn reset(&mut self, seed: u64) -> Result<(), JsError> {
        let new_demo = PolygenDemo::new(&self.source, seed)?;
        self.engine = new_demo.engine;
        Ok(())
    }

    /// The grammar bundled with the demo page.
    pub fn sample_grammar() -> String {
        data::TAVERN_GRAMMAR.to_string()
    }
}
