use std::path::Path;

use anyhow::Context;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::warn;

use crate::app::{App, RegisterOutcome};
use crate::client::Backend;
use crate::forms::{parse_ratings, FeedbackForm, RegisterForm};
use crate::notice::Notice;
use crate::views::{self, MountOptions, Rendered};

const HELP: &str = "\
commands:
  open <path>                         navigate, e.g. open /performance
  search <term>                       filter the student dashboard
  login <enrollment> <password>
  logout
  whoami
  register <name> <enrollment> <password> <role> [subject-name] [subject-code]
  rate <teacher-id>                   show the feedback form
  rate <teacher-id> <r1,r2,r3,r4,r5> [comment]
  export <file.csv>
  help | quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Open(String),
    Search(String),
    Login { enrollment: String, password: String },
    Logout,
    WhoAmI,
    Register(Vec<String>),
    Rate {
        teacher_id: String,
        ratings: Option<String>,
        comment: String,
    },
    Export(String),
    Help,
    Quit,
}

/// Splits on whitespace; double quotes group words.
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let tokens = tokenize(line);
    let Some((head, args)) = tokens.split_first() else {
        return Err("empty command".to_string());
    };

    let command = match (head.as_str(), args) {
        ("open", [path]) => Command::Open(path.clone()),
        ("search", terms) => Command::Search(terms.join(" ")),
        ("login", [enrollment, password]) => Command::Login {
            enrollment: enrollment.clone(),
            password: password.clone(),
        },
        ("logout", []) => Command::Logout,
        ("whoami", []) => Command::WhoAmI,
        ("register", fields) if (4..=6).contains(&fields.len()) => {
            Command::Register(fields.to_vec())
        }
        ("rate", [teacher_id]) => Command::Rate {
            teacher_id: teacher_id.clone(),
            ratings: None,
            comment: String::new(),
        },
        ("rate", [teacher_id, ratings, comment @ ..]) => Command::Rate {
            teacher_id: teacher_id.clone(),
            ratings: Some(ratings.clone()),
            comment: comment.join(" "),
        },
        ("export", [path]) => Command::Export(path.clone()),
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        _ => return Err(format!("unrecognised command: {line}")),
    };
    Ok(command)
}

pub fn print_rendered(rendered: &Rendered) {
    print_notices(&rendered.notices);
    println!("{}", rendered.body);
}

pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        eprintln!("{notice}");
    }
}

pub fn register_form(fields: &[String]) -> RegisterForm {
    let field = |index: usize| fields.get(index).cloned().unwrap_or_default();
    RegisterForm {
        full_name: field(0),
        enrollment_number: field(1),
        password: field(2),
        role: field(3),
        subject_name: fields.get(4).cloned(),
        subject_code: fields.get(5).cloned(),
    }
}

pub fn print_register_outcome(outcome: RegisterOutcome) {
    match outcome {
        RegisterOutcome::Invalid(errors) => {
            for error in errors {
                eprintln!("  {error}");
            }
        }
        RegisterOutcome::Submitted(notice) => print_notices(&[notice]),
    }
}

async fn execute<B: Backend>(app: &mut App<B>, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Open(path) => print_rendered(&app.open(&path, &MountOptions::default()).await),
        Command::Search(term) => {
            let options = MountOptions { search: Some(term) };
            print_rendered(&app.open("/student-dashboard", &options).await);
        }
        Command::Login {
            enrollment,
            password,
        } => match app.login(&enrollment, &password).await {
            Ok(rendered) => print_rendered(&rendered),
            Err(notice) => print_notices(&[notice]),
        },
        Command::Logout => {
            if !app.session().state().is_authenticated() {
                println!("not signed in");
                return Ok(true);
            }
            if let Err(notice) = app.logout().await {
                print_notices(&[notice]);
            }
            print_rendered(&app.open("/login", &MountOptions::default()).await);
        }
        Command::WhoAmI => match app.session().user() {
            Some(user) => println!("{} ({}, {})", user.full_name, user.enrollment_number, user.role),
            None => println!("not signed in"),
        },
        Command::Register(fields) => match app.register(&register_form(&fields)).await {
            Ok(outcome) => print_register_outcome(outcome),
            Err(notice) => print_notices(&[notice]),
        },
        Command::Rate {
            teacher_id,
            ratings: None,
            ..
        } => match app.teacher_name(&teacher_id).await {
            Ok(name) => println!("{}", views::feedback_form(&name)),
            Err(notice) => print_notices(&[notice]),
        },
        Command::Rate {
            teacher_id,
            ratings: Some(raw),
            comment,
        } => {
            let values = match parse_ratings(&raw) {
                Ok(values) => values,
                Err(e) => {
                    eprintln!("{e}");
                    return Ok(true);
                }
            };
            let mut form = FeedbackForm::new(teacher_id).with_ratings(&values);
            form.comment = comment;
            match app.rate(&form).await {
                Ok(notice) | Err(notice) => print_notices(&[notice]),
            }
        }
        Command::Export(path) => {
            let written = app.export(Path::new(&path)).await?;
            println!("Exported {written} feedback records to {path}.");
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

pub async fn run<B: Backend>(app: &mut App<B>) -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    println!("{HELP}");

    loop {
        let prompt = match app.session().user() {
            Some(user) => format!("{}@feedback> ", user.enrollment_number),
            None => "feedback> ".to_string(),
        };
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        if line.trim().is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e} (try `help`)");
                continue;
            }
        };
        match execute(app, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Command failed: {e:#}");
                eprintln!("error: {e:#}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::Role;
    use crate::session::tests::{user, FakeBackend};

    #[test]
    fn quoted_words_stay_together() {
        assert_eq!(
            tokenize(r#"register "Asha Rao" E001 secret1 Student"#),
            vec!["register", "Asha Rao", "E001", "secret1", "Student"]
        );
    }

    #[test]
    fn parses_rate_with_comment() {
        assert_eq!(
            parse_command("rate t1 5,4,5,4,5 very clear notes").unwrap(),
            Command::Rate {
                teacher_id: "t1".to_string(),
                ratings: Some("5,4,5,4,5".to_string()),
                comment: "very clear notes".to_string(),
            }
        );
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("open /performance").unwrap(), Command::Open("/performance".to_string()));
        assert_eq!(parse_command("logout").unwrap(), Command::Logout);
        assert_eq!(
            parse_command("login E001 secret1").unwrap(),
            Command::Login {
                enrollment: "E001".to_string(),
                password: "secret1".to_string()
            }
        );
        assert!(parse_command("login E001").is_err());
        assert!(parse_command("register a b c").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn register_form_maps_optional_subject_fields() {
        let fields: Vec<String> = ["Mr Rao", "T001", "secret1", "Teacher", "Physics"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let form = register_form(&fields);
        assert_eq!(form.role, "Teacher");
        assert_eq!(form.subject_name.as_deref(), Some("Physics"));
        assert_eq!(form.subject_code, None);
    }

    #[tokio::test]
    async fn student_export_command_keeps_existing_file() {
        let path = std::env::temp_dir().join(format!("shell-export-{}.csv", std::process::id()));
        std::fs::write(&path, "precious,data\n1,2\n").unwrap();

        let backend = FakeBackend::default().with_account(
            "E001",
            "secret1",
            user("E001", "Asha", Role::Student),
        );
        let mut app = App::new(backend, Duration::from_secs(1));
        app.login("E001", "secret1").await.unwrap();

        let command = Command::Export(path.display().to_string());
        assert!(execute(&mut app, command).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "precious,data\n1,2\n");
        std::fs::remove_file(&path).unwrap();
    }
}
