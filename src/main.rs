use anyhow::Result;
use clap::Parser;
use ielts_writing_coach::app::{App, Submission};
use ielts_writing_coach::encoder::RawImage;
use ielts_writing_coach::models::WritingTaskType;
use ielts_writing_coach::render::{check_contract, render, RenderToken};
use ielts_writing_coach::session::Session;
use ielts_writing_coach::validation;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ielts-writing-coach")]
#[command(about = "Get AI feedback and band-level model answers for an IELTS writing task")]
struct CliArgs {
    /// Writing task: 1 (report on a chart or diagram) or 2 (essay).
    #[arg(short, long, value_parser = parse_task_arg)]
    task: WritingTaskType,

    /// The task topic or question.
    #[arg(long)]
    topic: String,

    /// Essay text typed on the command line.
    #[arg(long, conflicts_with_all = ["essay_file", "essay_image"])]
    essay: Option<String>,

    /// Read the essay text from a file.
    #[arg(long, value_name = "PATH", conflicts_with = "essay_image")]
    essay_file: Option<PathBuf>,

    /// Photo of a handwritten essay.
    #[arg(long, value_name = "PATH")]
    essay_image: Option<PathBuf>,

    /// Image of the Task 1 chart, graph or diagram.
    #[arg(long, value_name = "PATH")]
    reference_image: Option<PathBuf>,

    /// Print the raw reply if it does not follow the requested format.
    #[arg(long)]
    strict: bool,

    /// Print the reply exactly as received.
    #[arg(long)]
    raw: bool,
}

fn parse_task_arg(input: &str) -> std::result::Result<WritingTaskType, String> {
    input.parse()
}

/// Lay out rendered sections for a terminal.
fn format_reply(text: &str) -> String {
    let mut out = String::new();

    for (i, section) in render(text).iter().enumerate() {
        if i > 0 {
            out.push_str(&"-".repeat(60));
            out.push('\n');
        }
        for token in section.tokens() {
            match token {
                RenderToken::Heading { level: 3, text } => {
                    out.push_str(&text.to_uppercase());
                    out.push('\n');
                    out.push_str(&"=".repeat(text.chars().count()));
                }
                RenderToken::Heading { text, .. } => {
                    out.push_str(text);
                    out.push('\n');
                    out.push_str(&"~".repeat(text.chars().count()));
                }
                RenderToken::Emphasis(text) => out.push_str(&format!("> {}", text)),
                RenderToken::ListItem(text) => out.push_str(&format!("  * {}", text)),
                RenderToken::Blank => {}
                RenderToken::Paragraph(text) => out.push_str(text),
            }
            out.push('\n');
        }
    }

    out
}

async fn validate_args(args: &CliArgs) -> ielts_writing_coach::Result<()> {
    validation::validate_topic(&args.topic)?;

    if args.reference_image.is_some() && args.task != WritingTaskType::Task1 {
        return Err(ielts_writing_coach::Error::Validation(
            "A question reference image can only be attached to Task 1.".to_string(),
        ));
    }

    for path in [&args.reference_image, &args.essay_image].into_iter().flatten() {
        validation::validate_image_file(path).await?;
    }
    Ok(())
}

async fn read_essay_text(args: &CliArgs) -> ielts_writing_coach::Result<Option<String>> {
    match (&args.essay, &args.essay_file) {
        (Some(text), _) => Ok(Some(text.clone())),
        (None, Some(path)) => tokio::fs::read_to_string(path).await.map(Some).map_err(|e| {
            ielts_writing_coach::Error::Validation(format!(
                "Cannot read essay file '{}': {}",
                path.display(),
                e
            ))
        }),
        (None, None) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ielts_writing_coach=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let app = match App::new() {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let essay_text = match validate_args(&args).await {
        Ok(()) => read_essay_text(&args).await,
        Err(e) => Err(e),
    };
    let essay_text = match essay_text {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(2);
        }
    };

    let expects_analysis = args.essay_image.is_some()
        || essay_text.as_deref().is_some_and(|t| !t.trim().is_empty());

    let mut submission = Submission::new(args.task, args.topic.clone());
    if let Some(text) = essay_text {
        submission = submission.with_essay_text(text);
    }
    if let Some(path) = &args.reference_image {
        submission = submission.with_reference_image(RawImage::from_path(path));
    }
    if let Some(path) = &args.essay_image {
        submission = submission.with_essay_image(RawImage::from_path(path));
    }

    info!("Submitting {} for analysis", args.task);
    let session = Session::new();
    match app.submit(&session, &submission).await {
        Ok(text) => {
            if args.raw {
                println!("{}", text);
            } else if args.strict && !check_contract(&text, expects_analysis).is_satisfied() {
                warn!("Reply does not follow the requested format; printing it unformatted");
                println!("{}", text);
            } else {
                print!("{}", format_reply(&text));
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_arg() {
        assert_eq!(parse_task_arg("1").unwrap(), WritingTaskType::Task1);
        assert_eq!(parse_task_arg("Task 2").unwrap(), WritingTaskType::Task2);
        assert!(parse_task_arg("three").unwrap_err().contains("Task 1"));
    }

    #[test]
    fn test_essay_sources_are_exclusive() {
        let err = CliArgs::try_parse_from([
            "ielts-writing-coach",
            "--task",
            "2",
            "--topic",
            "Cities",
            "--essay",
            "text",
            "--essay-image",
            "essay.jpg",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_args_parse() {
        let args = CliArgs::try_parse_from([
            "ielts-writing-coach",
            "-t",
            "1",
            "--topic",
            "The chart shows population growth",
            "--reference-image",
            "chart.png",
        ])
        .unwrap();
        assert_eq!(args.task, WritingTaskType::Task1);
        assert!(args.essay.is_none());
        assert_eq!(args.reference_image, Some(PathBuf::from("chart.png")));
    }

    #[test]
    fn test_format_reply() {
        let out = format_reply("### Analysis\n**Score: 7.0**\n- good\n---\n#### Band 6\nText");
        assert_eq!(
            out,
            "ANALYSIS\n========\n> Score: 7.0\n  * good\n".to_string()
                + &"-".repeat(60)
                + "\nBand 6\n~~~~~~\nText\n"
        );
    }

    #[tokio::test]
    async fn test_reference_image_rejected_for_task_two() {
        let args = CliArgs::try_parse_from([
            "ielts-writing-coach",
            "--task",
            "2",
            "--topic",
            "Cities",
            "--reference-image",
            "chart.png",
        ])
        .unwrap();
        let err = validate_args(&args).await.unwrap_err();
        assert!(matches!(err, ielts_writing_coach::Error::Validation(_)));
    }
}
