//! Worksheet schemas
//!
//! The header rows are the wire contract of the shared spreadsheet; the
//! column names below are exactly what the sheets carry. Each schema also
//! declares the natural key addressing one logical row.

use crate::engine::TableSchema;

/// Day columns shared by the schedule and daily-questions sheets.
pub const DAY_FIELDS: [&str; 7] = [
    "Segunda", "Terca", "Quarta", "Quinta", "Sexta", "Sabado", "Domingo",
];

/// Subjects every student starts with in the daily-questions sheet.
pub const BASELINE_SUBJECTS: [&str; 12] = [
    "Matematica",
    "Fisica",
    "Quimica",
    "Biologia",
    "Historia",
    "Geografia",
    "Filosofia",
    "Sociologia",
    "Portugues",
    "Literatura",
    "Ingles",
    "Espanhol",
];

/// Weekly planner: one row per hour slot per student.
pub fn schedule() -> TableSchema {
    let mut headers = vec!["Username", "Hora"];
    headers.extend(DAY_FIELDS);
    TableSchema::new("HORARIO", headers, vec!["Username", "Hora"])
}

/// Per-subject question counts for the running week.
pub fn daily_questions() -> TableSchema {
    let mut headers = vec!["Username", "Materia", "Meta_Semanal"];
    headers.extend(DAY_FIELDS);
    TableSchema::new("QUESTOES_DIARIAS", headers, vec!["Username", "Materia"])
}

/// Append-only archive fed by the weekly close.
pub fn questions_history() -> TableSchema {
    TableSchema::new(
        "QUESTOES_HISTORICO",
        ["Username", "Semana", "Materia", "Qtd"],
        ["Username"],
    )
}

/// Free-form goals with a pending/done status.
pub fn goals() -> TableSchema {
    TableSchema::new(
        "METAS",
        ["Username", "Descricao", "Status"],
        ["Username", "Descricao"],
    )
}

/// Syllabus tracker: one row per content item per student.
pub fn contents() -> TableSchema {
    TableSchema::new(
        "CONTEUDOS",
        [
            "Username",
            "Materia",
            "Frente",
            "Parte",
            "Conteudo",
            "Importancia",
            "Status_Dado",
            "Status_Estudado",
            "Qtd_Exercicios",
            "Qtd_Acertos",
            "R1_Feita",
            "R1_Qtd",
            "R2_Feita",
            "R2_Qtd",
            "R3_Feita",
            "R3_Qtd",
            "R4_Feita",
            "R4_Qtd",
        ],
        ["Username", "Materia", "Frente", "Parte", "Conteudo"],
    )
}

/// Scheduled spaced-repetition reviews.
pub fn reviews() -> TableSchema {
    TableSchema::new(
        "REVISOES",
        ["Username", "Data", "Tipo_Revisao", "Materia", "Qtd_Questoes"],
        ["Username", "Data", "Materia"],
    )
}

/// Mock exam scores per knowledge area.
pub fn mock_exams() -> TableSchema {
    TableSchema::new(
        "SIMULADOS",
        [
            "Username",
            "Nome_Simulado",
            "Data",
            "Linguagens",
            "Humanas",
            "Natureza",
            "Matematica",
            "Redacao",
            "Total",
        ],
        ["Username", "Nome_Simulado"],
    )
}

/// Essay scores across the five competencies.
pub fn essays() -> TableSchema {
    TableSchema::new(
        "REDACOES",
        [
            "Username",
            "Tema",
            "C1",
            "C2",
            "C3",
            "C4",
            "C5",
            "Nota_Final",
        ],
        ["Username", "Tema"],
    )
}
