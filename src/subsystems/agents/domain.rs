//! Keyword domain classification and plan templates.
//!
//! Classification is plain substring matching over fixed keyword lists.
//! [`Domain`]'s declaration order is the canonical order: a `BTreeSet`
//! of domains always iterates becas → academico → admin.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    Scholarships,
    Academic,
    Admin,
}

impl Domain {
    /// All domains in canonical order.
    pub const ALL: [Domain; 3] = [Domain::Scholarships, Domain::Academic, Domain::Admin];

    /// Tag used in prompts and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Scholarships => "becas",
            Domain::Academic => "academico",
            Domain::Admin => "admin",
        }
    }

    /// Keyword whose presence in a file name earns the retrieval bonus.
    pub fn retrieval_hint(self) -> &'static str {
        match self {
            Domain::Scholarships => "beca",
            Domain::Academic => "reglamento",
            Domain::Admin => "admin",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Domain::Scholarships => &["beca", "beneficio", "arancel", "alimentación", "postulación"],
            Domain::Academic => &["nota", "apelar", "retiro", "asignatura", "convalid", "reprob", "examen"],
            Domain::Admin => &["certificado", "secretaría", "horario", "correo", "formulario", "oficina"],
        }
    }

    fn plan_steps(self) -> [&'static str; 2] {
        match self {
            Domain::Scholarships => ["Revisar requisitos y plazos", "Listar documentos a presentar"],
            Domain::Academic => ["Revisar procedimiento (apelación/retiro)", "Verificar plazos máximos"],
            Domain::Admin => ["Definir canal formal (correo/formulario)", "Entregar horarios/contactos"],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every domain with at least one keyword in `question`; `{Academic}` when none match.
pub fn classify(question: &str) -> BTreeSet<Domain> {
    let q = question.to_lowercase();
    let mut domains: BTreeSet<Domain> = Domain::ALL
        .into_iter()
        .filter(|d| d.keywords().iter().any(|k| q.contains(k)))
        .collect();
    if domains.is_empty() {
        domains.insert(Domain::Academic);
    }
    domains
}

/// Ordered, duplicate-free plan for answering `question` across `domains`.
pub fn make_plan(question: &str, domains: &BTreeSet<Domain>) -> Vec<String> {
    let mut steps = vec![format!("Analizar intención: {question}")];
    for domain in domains {
        steps.extend(domain.plan_steps().iter().map(|s| s.to_string()));
    }
    steps.push("Sintetizar y priorizar acciones".to_string());
    dedup_steps(steps)
}

/// Drop repeated steps, keeping each at its first position.
pub fn dedup_steps(mut steps: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    steps.retain(|s| seen.insert(s.clone()));
    steps
}
