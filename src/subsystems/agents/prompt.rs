//! Prompt templates for the domain agents and the orchestrator.
//!
//! Templates are plain-text files under the prompts directory
//! (`config/prompts/` by default) so wording can be tuned without a
//! rebuild. Each template has a built-in fallback used when the file is
//! missing or empty.
//!
//! Variables use `{{name}}` syntax and are substituted in a single pass:
//! text inserted for one variable is never scanned again, so retrieved
//! document text containing `{{...}}` is left untouched.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const AGENT_SYSTEM: &str = "agent_system.txt";
pub const AGENT_QUESTION: &str = "agent_question.txt";
pub const ORCHESTRATOR_SYSTEM: &str = "orchestrator_system.txt";
pub const FUSION: &str = "fusion.txt";

pub const AGENT_SYSTEM_FALLBACK: &str = "Eres un asistente universitario institucional. \
Usa el bloque 'Contexto RAG' para fundamentar y cita las fuentes del bloque entre corchetes [Fuente: archivo]. \
Si hay riesgo de fechas/plazos variables, indica validar en la fuente oficial.";

pub const AGENT_QUESTION_FALLBACK: &str = "Contexto RAG (fragmentos locales):\n{{context}}\n\n\
Pregunta: {{question}}\n\n\
Responde primero en 2–3 párrafos y luego, si aplica, da pasos prácticos numerados. \
Cuando corresponda, cita fuentes entre [Fuente: archivo].";

pub const ORCHESTRATOR_SYSTEM_FALLBACK: &str = "Eres el ORQUESTADOR. Coordina agentes especializados y entrega una respuesta final priorizada. \
Extrae de las respuestas parciales las fuentes citadas y añádelas al final como 'Fuentes: ...'.";

pub const FUSION_FALLBACK: &str = "Plan sugerido:\n{{plan}}\n\n\
Respuestas parciales (incluyen posibles 'Fuentes: ...'):\n\n{{partials}}\n\n\
Entrega una respuesta final única, clara y priorizada (2–3 párrafos, con pasos concretos). \
Al final, agrega una línea 'Fuentes: [archivo1], [archivo2]' extraída de las parciales; \
si no hay fuentes, indica validar en el sitio oficial.";

/// Loads one template and fills in its variables.
///
/// ```ignore
/// let prompt = PromptBuilder::new("config/prompts")
///     .template(AGENT_QUESTION, AGENT_QUESTION_FALLBACK)
///     .var("context", &ctx)
///     .var("question", question)
///     .build();
/// ```
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    body: String,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self { prompts_dir: prompts_dir.into(), body: String::new(), vars: HashMap::new() }
    }

    /// Use `filename` from the prompts directory as the body, or `fallback`
    /// when it is missing or blank.
    pub fn template(mut self, filename: &str, fallback: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        self.body = match fs::read_to_string(&path) {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => {
                tracing::trace!("prompt: '{}' not found, using built-in template", path.display());
                fallback.to_string()
            }
        };
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> String {
        render(&self.body, &self.vars)
    }
}

/// Replace each `{{key}}` with its value in one left-to-right pass.
/// Unknown placeholders are kept verbatim.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let key = &after[..close];
                match vars.get(key.trim()) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
