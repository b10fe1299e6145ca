//! Per-conversation session memory: remembered facts plus a rolling
//! transcript summary.
//!
//! The caller owns one [`SessionMemory`] per conversation and updates it
//! only after a turn has completed, so an aborted turn leaves it untouched.

use std::collections::BTreeMap;

/// Default character budget for [`SessionMemory::summary`].
pub const DEFAULT_SUMMARY_CHARS: usize = 600;

const TURN_SEPARATOR: &str = " | ";

#[derive(Debug, Clone, Default)]
pub struct SessionMemory {
    /// Latest write wins.
    facts: BTreeMap<String, String>,
    /// Append-only `"ROLE: content"` entries.
    turns: Vec<String>,
}

impl SessionMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a fact.
    pub fn remember(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Look up a fact, falling back to `default`.
    pub fn fact(&self, key: &str, default: &str) -> String {
        self.facts.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    /// Remove a fact; returns whether it existed.
    pub fn forget(&mut self, key: &str) -> bool {
        self.facts.remove(key).is_some()
    }

    /// All facts in key order.
    pub fn facts(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Append a transcript entry as `"ROLE: content"` (role upper-cased).
    pub fn add_turn(&mut self, role: &str, content: &str) {
        self.turns.push(format!("{}: {}", role.to_uppercase(), content));
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// The last `max_chars` characters of all turns joined with `" | "`.
    ///
    /// The cut is by character count and may fall mid-word or mid-turn.
    pub fn summary(&self, max_chars: usize) -> String {
        let joined = self.turns.join(TURN_SEPARATOR);
        let len = joined.chars().count();
        if len <= max_chars {
            return joined;
        }
        joined.chars().skip(len - max_chars).collect()
    }

    /// Memory text for the model: known facts (if any) followed by the summary.
    pub fn prompt_context(&self, max_chars: usize) -> String {
        let summary = self.summary(max_chars);
        if self.facts.is_empty() {
            return summary;
        }
        let facts = self
            .facts
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        format!("Datos conocidos: {facts}\n{summary}")
    }

    /// Drop all facts and turns.
    pub fn clear(&mut self) {
        self.facts.clear();
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remember_upserts_and_fact_falls_back() {
        let mut m = SessionMemory::new();
        assert_eq!(m.fact("carrera", "desconocida"), "desconocida");
        m.remember("carrera", "Ingeniería");
        m.remember("carrera", "Derecho");
        assert_eq!(m.fact("carrera", ""), "Derecho");
        assert_eq!(m.facts().count(), 1);
    }

    #[test]
    fn forget_removes_fact() {
        let mut m = SessionMemory::new();
        m.remember("sede", "Central");
        assert!(m.forget("sede"));
        assert!(!m.forget("sede"));
        assert_eq!(m.fact("sede", "-"), "-");
    }

    #[test]
    fn add_turn_uppercases_role() {
        let mut m = SessionMemory::new();
        m.add_turn("user", "hola");
        m.add_turn("assistant", "¿en qué te ayudo?");
        assert_eq!(m.summary(DEFAULT_SUMMARY_CHARS), "USER: hola | ASSISTANT: ¿en qué te ayudo?");
        assert_eq!(m.turn_count(), 2);
    }

    #[test]
    fn summary_keeps_exact_tail_when_over_budget() {
        let mut m = SessionMemory::new();
        for i in 0..50 {
            m.add_turn("user", &format!("pregunta número {i} sobre la beca"));
        }
        let full = m.summary(usize::MAX);
        let tail = m.summary(600);
        assert!(full.chars().count() > 600);
        assert_eq!(tail.chars().count(), 600);
        assert!(full.ends_with(&tail));
    }

    #[test]
    fn summary_counts_characters() {
        let mut m = SessionMemory::new();
        m.add_turn("user", "ñandú acción");
        let tail = m.summary(6);
        assert_eq!(tail, "acción");
    }

    #[test]
    fn summary_under_budget_is_whole_log() {
        let mut m = SessionMemory::new();
        m.add_turn("user", "corto");
        assert_eq!(m.summary(600), "USER: corto");
        assert_eq!(SessionMemory::new().summary(600), "");
    }

    #[test]
    fn prompt_context_lists_facts_then_summary() {
        let mut m = SessionMemory::new();
        m.add_turn("user", "hola");
        assert_eq!(m.prompt_context(600), "USER: hola");
        m.remember("nombre", "Ana");
        m.remember("carrera", "Derecho");
        assert_eq!(
            m.prompt_context(600),
            "Datos conocidos: carrera=Derecho; nombre=Ana\nUSER: hola"
        );
    }

    #[test]
    fn clear_resets_everything() {
        let mut m = SessionMemory::new();
        m.remember("k", "v");
        m.add_turn("user", "x");
        m.clear();
        assert_eq!(m.turn_count(), 0);
        assert_eq!(m.facts().count(), 0);
    }
}
