//! Command-line surface
//!
//! Thin glue over the `app` workflows: parse arguments, call one operation,
//! print the outcome. All persistence decisions live below this layer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use crate::api::TableStore;
use crate::app::{
    SessionContext, contents, essays, goals, mock_exams, questions, reviews, schedule,
};
use crate::engine::{ChangeSet, NaturalKey};

#[derive(Parser)]
#[command(
    name = "semear-cli",
    about = "Command-line companion for the Semear mentorship spreadsheet",
    version
)]
pub struct Cli {
    /// Student to operate on (defaults to the configured username)
    #[arg(short, long, global = true)]
    pub student: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Weekly planner
    Schedule {
        #[command(subcommand)]
        action: ScheduleAction,
    },
    /// Daily question counts and the weekly close
    Questions {
        #[command(subcommand)]
        action: QuestionsAction,
    },
    /// Goal list
    Goals {
        #[command(subcommand)]
        action: GoalsAction,
    },
    /// Syllabus tracker
    Contents {
        #[command(subcommand)]
        action: ContentsAction,
    },
    /// Spaced-repetition reviews
    Reviews {
        #[command(subcommand)]
        action: ReviewsAction,
    },
    /// Mock exam records
    Exams {
        #[command(subcommand)]
        action: ExamsAction,
    },
    /// Essay scores
    Essays {
        #[command(subcommand)]
        action: EssaysAction,
    },
    /// Print a table's raw grid
    Grid { table: String },
}

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Show the week's planner
    Show,
    /// Plan one slot: an hour, a day column, a subject (or "Livre")
    Set {
        hora: String,
        day: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum QuestionsAction {
    /// Show the running week per subject
    Show,
    /// Record questions done on one day
    Log {
        materia: String,
        day: String,
        count: i64,
    },
    /// Set the weekly goal for a subject
    SetGoal { materia: String, meta: i64 },
    /// Archive the week's totals and zero the day columns
    CloseWeek,
}

#[derive(Subcommand)]
pub enum GoalsAction {
    List,
    Add { description: String },
    /// Mark a goal as done
    Done { description: String },
    /// Reopen a concluded goal
    Reopen { description: String },
    Remove { description: String },
}

#[derive(Subcommand)]
pub enum ContentsAction {
    /// List the student's syllabus items
    List,
    /// Mark a content item as studied
    Check {
        materia: String,
        frente: String,
        parte: String,
        conteudo: String,
    },
}

#[derive(Subcommand)]
pub enum ReviewsAction {
    List,
    Add {
        data: String,
        tipo: String,
        materia: String,
        questoes: i64,
    },
    Remove { data: String, materia: String },
}

#[derive(Subcommand)]
pub enum ExamsAction {
    List,
    Add {
        nome: String,
        data: String,
        linguagens: i64,
        humanas: i64,
        natureza: i64,
        matematica: i64,
        redacao: i64,
    },
    Remove { nome: String },
}

#[derive(Subcommand)]
pub enum EssaysAction {
    List,
    Add {
        tema: String,
        c1: i64,
        c2: i64,
        c3: i64,
        c4: i64,
        c5: i64,
    },
    Remove { tema: String },
}

/// Dispatch one parsed command against the store.
pub async fn run(command: Command, store: &dyn TableStore, ctx: &SessionContext) -> Result<()> {
    match command {
        Command::Schedule { action } => run_schedule(action, store, ctx).await,
        Command::Questions { action } => run_questions(action, store, ctx).await,
        Command::Goals { action } => run_goals(action, store, ctx).await,
        Command::Contents { action } => run_contents(action, store, ctx).await,
        Command::Reviews { action } => run_reviews(action, store, ctx).await,
        Command::Exams { action } => run_exams(action, store, ctx).await,
        Command::Essays { action } => run_essays(action, store, ctx).await,
        Command::Grid { table } => run_grid(&table, store).await,
    }
}

async fn run_schedule(
    action: ScheduleAction,
    store: &dyn TableStore,
    ctx: &SessionContext,
) -> Result<()> {
    match action {
        ScheduleAction::Show => {
            let slots = schedule::load(store, ctx)
                .await
                .context("failed to load the planner")?;
            println!("{}", format!("Planner for {}", ctx.student()).green().bold());
            for slot in slots {
                let filled: Vec<String> = slot
                    .days
                    .iter()
                    .zip(crate::app::tables::DAY_FIELDS)
                    .filter(|(v, _)| *v != schedule::SLOT_FREE && !v.is_empty())
                    .map(|(v, d)| format!("{}: {}", d, v))
                    .collect();
                if filled.is_empty() {
                    println!("  {}  {}", slot.hora.cyan(), "livre".dimmed());
                } else {
                    println!("  {}  {}", slot.hora.cyan(), filled.join(" | "));
                }
            }
        }
        ScheduleAction::Set { hora, day, value } => {
            schedule::set_slot(store, ctx, &hora, &day, &value)
                .await
                .context("failed to update the slot")?;
            println!("{} {} {} -> {}", "updated".green(), hora, day, value);
        }
    }
    Ok(())
}

async fn run_questions(
    action: QuestionsAction,
    store: &dyn TableStore,
    ctx: &SessionContext,
) -> Result<()> {
    match action {
        QuestionsAction::Show => {
            let weeks = questions::load(store, ctx)
                .await
                .context("failed to load the week")?;
            let total: i64 = weeks.iter().map(|w| w.total()).sum();
            let meta: i64 = weeks.iter().map(|w| w.meta).sum();
            println!(
                "{}",
                format!("Week for {}: {} / {} questions", ctx.student(), total, meta)
                    .green()
                    .bold()
            );
            for week in weeks.iter().filter(|w| w.total() > 0 || w.meta > 0) {
                println!(
                    "  {:<12} {:>4} / {:<4}",
                    week.materia,
                    week.total(),
                    week.meta
                );
            }
        }
        QuestionsAction::Log { materia, day, count } => {
            questions::log_day(store, ctx, &materia, &day, count)
                .await
                .context("failed to log the day")?;
            println!("{} {} {} = {}", "logged".green(), materia, day, count);
        }
        QuestionsAction::SetGoal { materia, meta } => {
            questions::set_goal(store, ctx, &materia, meta)
                .await
                .context("failed to set the goal")?;
            println!("{} {} meta = {}", "updated".green(), materia, meta);
        }
        QuestionsAction::CloseWeek => {
            let label = questions::week_label(chrono::Local::now().date_naive());
            let report = questions::close_week(store, ctx, &label)
                .await
                .context("failed to close the week")?;
            println!(
                "{} {}: {} subject(s) archived, {} cell(s) reset",
                "closed".green().bold(),
                label,
                report.archived_categories,
                report.reset_cells
            );
        }
    }
    Ok(())
}

async fn run_goals(action: GoalsAction, store: &dyn TableStore, ctx: &SessionContext) -> Result<()> {
    match action {
        GoalsAction::List => {
            let list = goals::list(store, ctx)
                .await
                .context("failed to load goals")?;
            println!("{}", format!("Goals for {}", ctx.student()).green().bold());
            for goal in list {
                let marker = match goal.status {
                    goals::GoalStatus::Done => "[x]".green(),
                    goals::GoalStatus::Pending => "[ ]".yellow(),
                };
                println!("  {} {}", marker, goal.description);
            }
        }
        GoalsAction::Add { description } => {
            goals::add(store, ctx, &description)
                .await
                .context("failed to add the goal")?;
            println!("{} {}", "added".green(), description);
        }
        GoalsAction::Done { description } => {
            goals::set_status(store, ctx, &description, goals::GoalStatus::Done)
                .await
                .context("failed to conclude the goal")?;
            println!("{} {}", "concluded".green(), description);
        }
        GoalsAction::Reopen { description } => {
            goals::set_status(store, ctx, &description, goals::GoalStatus::Pending)
                .await
                .context("failed to reopen the goal")?;
            println!("{} {}", "reopened".yellow(), description);
        }
        GoalsAction::Remove { description } => {
            goals::remove(store, ctx, &description)
                .await
                .context("failed to remove the goal")?;
            println!("{} {}", "removed".red(), description);
        }
    }
    Ok(())
}

async fn run_contents(
    action: ContentsAction,
    store: &dyn TableStore,
    ctx: &SessionContext,
) -> Result<()> {
    match action {
        ContentsAction::List => {
            let items = contents::load(store, ctx)
                .await
                .context("failed to load the syllabus")?;
            println!("{}", format!("Syllabus for {}", ctx.student()).green().bold());
            for item in items {
                let marker = if item.estudado {
                    "[x]".green()
                } else {
                    "[ ]".yellow()
                };
                println!(
                    "  {} {} / {} / {} - {} ({}/{} exercises)",
                    marker,
                    item.materia,
                    item.frente,
                    item.parte,
                    item.conteudo,
                    item.acertos,
                    item.exercicios
                );
            }
        }
        ContentsAction::Check {
            materia,
            frente,
            parte,
            conteudo,
        } => {
            let key = NaturalKey::new([
                ctx.student(),
                materia.as_str(),
                frente.as_str(),
                parte.as_str(),
                conteudo.as_str(),
            ]);
            let mut changes = ChangeSet::new();
            changes.set(key, "Status_Estudado", true);
            let report = contents::save_progress(store, &changes)
                .await
                .context("failed to update the item")?;
            if report.rows_written == 0 {
                anyhow::bail!(
                    "no syllabus row matches {} / {} / {} / {}",
                    materia,
                    frente,
                    parte,
                    conteudo
                );
            }
            println!("{} {}", "checked".green(), conteudo);
        }
    }
    Ok(())
}

async fn run_reviews(
    action: ReviewsAction,
    store: &dyn TableStore,
    ctx: &SessionContext,
) -> Result<()> {
    match action {
        ReviewsAction::List => {
            let entries = reviews::list(store, ctx)
                .await
                .context("failed to load reviews")?;
            println!("{}", format!("Reviews for {}", ctx.student()).green().bold());
            for entry in entries {
                println!(
                    "  {}  {:<10} {:<12} {} questions",
                    entry.data.cyan(),
                    entry.tipo,
                    entry.materia,
                    entry.questoes
                );
            }
        }
        ReviewsAction::Add {
            data,
            tipo,
            materia,
            questoes,
        } => {
            let entry = reviews::ReviewEntry {
                data,
                tipo,
                materia,
                questoes,
            };
            reviews::add(store, ctx, &entry)
                .await
                .context("failed to add the review")?;
            println!("{} {} {}", "added".green(), entry.data, entry.materia);
        }
        ReviewsAction::Remove { data, materia } => {
            reviews::remove(store, ctx, &data, &materia)
                .await
                .context("failed to remove the review")?;
            println!("{} {} {}", "removed".red(), data, materia);
        }
    }
    Ok(())
}

async fn run_exams(action: ExamsAction, store: &dyn TableStore, ctx: &SessionContext) -> Result<()> {
    match action {
        ExamsAction::List => {
            let exams = mock_exams::list(store, ctx)
                .await
                .context("failed to load mock exams")?;
            println!("{}", format!("Mock exams for {}", ctx.student()).green().bold());
            for exam in exams {
                println!(
                    "  {}  {}  total {}",
                    exam.data.cyan(),
                    exam.nome,
                    exam.total().to_string().bold()
                );
            }
        }
        ExamsAction::Add {
            nome,
            data,
            linguagens,
            humanas,
            natureza,
            matematica,
            redacao,
        } => {
            let exam = mock_exams::MockExam {
                nome,
                data,
                linguagens,
                humanas,
                natureza,
                matematica,
                redacao,
            };
            mock_exams::add(store, ctx, &exam)
                .await
                .context("failed to add the mock exam")?;
            println!("{} {} (total {})", "added".green(), exam.nome, exam.total());
        }
        ExamsAction::Remove { nome } => {
            mock_exams::remove(store, ctx, &nome)
                .await
                .context("failed to remove the mock exam")?;
            println!("{} {}", "removed".red(), nome);
        }
    }
    Ok(())
}

async fn run_essays(
    action: EssaysAction,
    store: &dyn TableStore,
    ctx: &SessionContext,
) -> Result<()> {
    match action {
        EssaysAction::List => {
            let list = essays::list(store, ctx)
                .await
                .context("failed to load essays")?;
            println!("{}", format!("Essays for {}", ctx.student()).green().bold());
            for essay in list {
                println!(
                    "  {:<40} {}",
                    essay.tema,
                    essay.nota_final().to_string().bold()
                );
            }
        }
        EssaysAction::Add {
            tema,
            c1,
            c2,
            c3,
            c4,
            c5,
        } => {
            let essay = essays::Essay {
                tema,
                competencias: [c1, c2, c3, c4, c5],
            };
            essays::add(store, ctx, &essay)
                .await
                .context("failed to add the essay")?;
            println!(
                "{} {} (grade {})",
                "added".green(),
                essay.tema,
                essay.nota_final()
            );
        }
        EssaysAction::Remove { tema } => {
            essays::remove(store, ctx, &tema)
                .await
                .context("failed to remove the essay")?;
            println!("{} {}", "removed".red(), tema);
        }
    }
    Ok(())
}

async fn run_grid(table: &str, store: &dyn TableStore) -> Result<()> {
    let grid = store
        .get_all_values(table)
        .await
        .with_context(|| format!("failed to fetch table '{}'", table))?;
    for (i, row) in grid.iter().enumerate() {
        let line = row.join(" | ");
        if i == 0 {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
    Ok(())
}
