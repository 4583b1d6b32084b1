use std::fmt::Write;

use dialoguer::{Confirm, Input, Select};
use sopqa_core::bootstrap::AzurePipeline;
use sopqa_core::config::MAX_TOP_K;
use sopqa_core::{AppBuilder, QueryResult};
use tokio::sync::OnceCell;

pub(crate) const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What is the parking procedure for patients at CH20?",
    "How should informed consent be obtained remotely?",
    "What should I do during a sponsor audit?",
    "What are the UAB addresses for clinical research?",
    "Who is responsible for fiscal reporting?",
];

const EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Settings {
    pub top_k: usize,
    pub show_sources: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_k: 3,
            show_sources: true,
        }
    }
}

enum MenuChoice {
    Ask(Option<&'static str>),
    Settings,
    Quit,
}

fn menu_items() -> Vec<String> {
    std::iter::once("Ask a question".to_owned())
        .chain(EXAMPLE_QUESTIONS.iter().map(|q| format!("Example: {q}")))
        .chain(["Settings".to_owned(), "Quit".to_owned()])
        .collect()
}

fn menu_choice(index: usize) -> MenuChoice {
    match index {
        0 => MenuChoice::Ask(None),
        i if i <= EXAMPLE_QUESTIONS.len() => MenuChoice::Ask(Some(EXAMPLE_QUESTIONS[i - 1])),
        i if i == EXAMPLE_QUESTIONS.len() + 1 => MenuChoice::Settings,
        _ => MenuChoice::Quit,
    }
}

struct Shell {
    app: AppBuilder,
    pipeline: OnceCell<AzurePipeline>,
    settings: Settings,
}

impl Shell {
    fn new(app: AppBuilder) -> Self {
        let settings = Settings {
            top_k: app.config().query.top_k,
            ..Settings::default()
        };
        Self {
            app,
            pipeline: OnceCell::new(),
            settings,
        }
    }

    /// Built on first use and kept for the rest of the session.
    async fn pipeline(&self) -> anyhow::Result<&AzurePipeline> {
        let pipeline = self
            .pipeline
            .get_or_try_init(|| async { self.app.build_pipeline() })
            .await?;
        Ok(pipeline)
    }

    async fn ask(&self, prefill: Option<&str>) -> anyhow::Result<()> {
        let mut input = Input::<String>::new()
            .with_prompt("Enter your question")
            .allow_empty(true);
        if let Some(text) = prefill {
            input = input.with_initial_text(text);
        }
        let question = input.interact_text()?;
        let question = question.trim();
        if question.is_empty() {
            return Ok(());
        }

        let pipeline = self.pipeline().await?;
        println!("Searching SOPs...");
        let result = pipeline.query(question, self.settings.top_k).await?;
        print!("{}", render_result(&result, self.settings.show_sources));
        Ok(())
    }

    fn edit_settings(&mut self) -> anyhow::Result<()> {
        let top_k = Input::<usize>::new()
            .with_prompt(format!("Number of sources to retrieve (1-{MAX_TOP_K})"))
            .default(self.settings.top_k)
            .validate_with(|n: &usize| -> Result<(), String> {
                if (1..=MAX_TOP_K).contains(n) {
                    Ok(())
                } else {
                    Err(format!("enter a number between 1 and {MAX_TOP_K}"))
                }
            })
            .interact_text()?;
        let show_sources = Confirm::new()
            .with_prompt("Show source documents")
            .default(self.settings.show_sources)
            .interact()?;
        self.settings = Settings { top_k, show_sources };
        Ok(())
    }
}

pub(crate) async fn run(app: AppBuilder) -> anyhow::Result<()> {
    println!("SOP Knowledge Assistant");
    println!("Ask questions about Clinical Research Enterprise Standard Operating Procedures\n");

    let mut shell = Shell::new(app);
    let items = menu_items();
    loop {
        let selected = Select::new()
            .with_prompt("What would you like to do?")
            .items(&items)
            .default(0)
            .interact()?;

        match menu_choice(selected) {
            MenuChoice::Ask(prefill) => {
                // a failed question is reported and the session continues
                if let Err(e) = shell.ask(prefill).await {
                    eprintln!("Error: {e:#}\n");
                }
            }
            MenuChoice::Settings => shell.edit_settings()?,
            MenuChoice::Quit => break,
        }
    }
    Ok(())
}

pub(crate) fn render_result(result: &QueryResult, show_sources: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nAnswer\n------\n{}\n", result.answer);

    if !show_sources {
        return out;
    }

    if !result.sources.is_empty() {
        let _ = writeln!(out, "Sources\n-------");
        for (i, source) in result.sources.iter().enumerate() {
            let _ = writeln!(out, "{}. {source}", i + 1);
        }
        out.push('\n');
    }

    for (i, doc) in result.retrieved_docs.iter().enumerate() {
        let excerpt: String = doc.content.chars().take(EXCERPT_CHARS).collect();
        let _ = writeln!(out, "Document {} (Score: {:.3})", i + 1, doc.score);
        let _ = writeln!(out, "{excerpt}...\n---");
    }
    out
}

#[cfg(test)]
mod tests {
    use sopqa_core::RetrievedDocument;

    use super::*;

    fn doc(content: &str, score: f64) -> RetrievedDocument {
        RetrievedDocument {
            content: content.into(),
            sop_number: "4.12".into(),
            title: "Patient Parking".into(),
            section: "Procedures".into(),
            score,
        }
    }

    fn result() -> QueryResult {
        QueryResult {
            answer: "Validate the ticket at the front desk (SOP 4.12).".into(),
            sources: vec!["SOP 4.12: Patient Parking (Procedures)".into()],
            retrieved_docs: vec![doc("SOP 4.12: Patient Parking\n\nProcedures ...", 0.031_25)],
        }
    }

    #[test]
    fn renders_answer_sources_and_excerpts() {
        let out = render_result(&result(), true);
        assert!(out.contains("Answer\n------\nValidate the ticket"));
        assert!(out.contains("Sources\n-------\n1. SOP 4.12: Patient Parking (Procedures)"));
        assert!(out.contains("Document 1 (Score: 0.031)"));
        assert!(out.contains("Procedures ......"));
    }

    #[test]
    fn hides_sources_when_disabled() {
        let out = render_result(&result(), false);
        assert!(out.contains("Validate the ticket"));
        assert!(!out.contains("Sources"));
        assert!(!out.contains("Document 1"));
    }

    #[test]
    fn not_found_has_no_sources_section() {
        let out = render_result(&QueryResult::not_found(), true);
        assert!(out.contains(sopqa_core::NOT_FOUND_ANSWER));
        assert!(!out.contains("Sources"));
        assert!(!out.contains("Document"));
    }

    #[test]
    fn excerpt_is_truncated_to_500_chars() {
        let mut r = result();
        r.retrieved_docs = vec![doc(&"é".repeat(700), 1.0)];
        let out = render_result(&r, true);
        let line = out
            .lines()
            .find(|l| l.starts_with('é'))
            .unwrap();
        assert_eq!(line.chars().count(), 503);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn menu_maps_examples_settings_and_quit() {
        let items = menu_items();
        assert_eq!(items.len(), 8);
        assert!(matches!(menu_choice(0), MenuChoice::Ask(None)));
        assert!(matches!(
            menu_choice(3),
            MenuChoice::Ask(Some(q)) if q == EXAMPLE_QUESTIONS[2]
        ));
        assert!(matches!(menu_choice(6), MenuChoice::Settings));
        assert!(matches!(menu_choice(7), MenuChoice::Quit));
    }

    #[test]
    fn settings_default() {
        let s = Settings::default();
        assert_eq!(s.top_k, 3);
        assert!(s.show_sources);
    }

    #[test]
    fn shell_takes_top_k_from_config() {
        let mut config = sopqa_core::Config::default();
        config.query.top_k = 5;
        let shell = Shell::new(AppBuilder::from_config(config));
        assert_eq!(shell.settings.top_k, 5);
        assert!(shell.pipeline.get().is_none());
    }
}
