// Commands - parse one input line into something the app can do

use std::path::PathBuf;

use crate::config::ThemeMode;
use crate::dispatch::{EssayLength, EssayType, ScienceSubject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Chat(String),
    Solve(String),
    Essay {
        topic: String,
        essay_type: EssayType,
        length: EssayLength,
    },
    /// Analyze the selected image
    Image(Option<String>),
    /// Extract text from the selected image
    Ocr,
    Code {
        question: String,
        code: String,
    },
    Science {
        subject: ScienceSubject,
        question: String,
    },
    Open(PathBuf),
    Screenshot,
    Overlay,
    Normal,
    /// `None` toggles
    Theme(Option<ThemeMode>),
    Retry,
    History,
    Examples,
    Help,
    Quit,
}

/// One quick-action prompt: title, hint and the line to type.
pub const EXAMPLES: [(&str, &str, &str); 3] = [
    (
        "Get Started",
        "Learn what I can help you with",
        "Hello! How can you help me with my studies?",
    ),
    ("Math Example", "Try a simple equation", "/solve 2x + 5 = 13"),
    ("Essay Example", "Generate an essay", "/essay climate change"),
];

pub const HELP: &str = "\
Type a message to chat, or use a command:
  /solve <problem>                         solve a math problem
  /essay [--type T] [--length L] <topic>   write an essay
  /image [question]                        analyze the selected image
  /ocr                                     extract text from the selected image
  /code <question> [:: code]               get help with code
  /science [subject] <question>            physics, chemistry or biology
  /open <path>                             select an image file
  /screenshot                              select a screenshot
  /overlay, /normal                        switch view mode
  /theme [light|dark]                      switch colour theme
  /retry                                   check the backend again now
  /history, /examples, /help, /quit";

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Chat(line.to_string()));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    match name {
        "solve" => Ok(Command::Solve(args.to_string())),
        "essay" => parse_essay(args),
        "image" => Ok(Command::Image(Some(args.to_string()).filter(|q| !q.is_empty()))),
        "ocr" => Ok(Command::Ocr),
        "code" => Ok(parse_code(args)),
        "science" => Ok(parse_science(args)),
        "open" if args.is_empty() => Err("usage: /open <path>".to_string()),
        "open" => Ok(Command::Open(PathBuf::from(args))),
        "screenshot" => Ok(Command::Screenshot),
        "overlay" => Ok(Command::Overlay),
        "normal" => Ok(Command::Normal),
        "theme" if args.is_empty() => Ok(Command::Theme(None)),
        "theme" => args.parse().map(|mode| Command::Theme(Some(mode))),
        "retry" => Ok(Command::Retry),
        "history" => Ok(Command::History),
        "examples" => Ok(Command::Examples),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{}", other)),
    }
}

fn parse_essay(args: &str) -> Result<Command, String> {
    let mut essay_type = EssayType::default();
    let mut length = EssayLength::default();
    let mut words = args.split_whitespace().peekable();

    while let Some(flag) = words.peek().copied() {
        match flag {
            "--type" | "--length" => {
                words.next();
                let value = words
                    .next()
                    .ok_or_else(|| format!("{} needs a value", flag))?;
                if flag == "--type" {
                    essay_type = value.parse()?;
                } else {
                    length = value.parse()?;
                }
            }
            _ => break,
        }
    }

    Ok(Command::Essay {
        topic: words.collect::<Vec<_>>().join(" "),
        essay_type,
        length,
    })
}

fn parse_code(args: &str) -> Command {
    match args.split_once("::") {
        Some((question, code)) => Command::Code {
            question: question.trim().to_string(),
            code: code.trim().to_string(),
        },
        None => Command::Code {
            question: args.to_string(),
            code: String::new(),
        },
    }
}

fn parse_science(args: &str) -> Command {
    if let Some((first, rest)) = args.split_once(char::is_whitespace) {
        if let Ok(subject) = first.parse() {
            return Command::Science {
                subject,
                question: rest.trim().to_string(),
            };
        }
    }
    Command::Science {
        subject: ScienceSubject::default(),
        question: args.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hello", Command::Chat("Hello".into()))]
    #[case("  ", Command::Chat(String::new()))]
    #[case("/solve 2x + 5 = 13", Command::Solve("2x + 5 = 13".into()))]
    #[case("/image", Command::Image(None))]
    #[case("/image what is this?", Command::Image(Some("what is this?".into())))]
    #[case("/ocr", Command::Ocr)]
    #[case("/open ~/pics/a.png", Command::Open(PathBuf::from("~/pics/a.png")))]
    #[case("/theme", Command::Theme(None))]
    #[case("/theme dark", Command::Theme(Some(ThemeMode::Dark)))]
    #[case("/quit", Command::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse(line), Ok(expected));
    }

    #[test]
    fn test_essay_flags() {
        assert_eq!(
            parse("/essay --type persuasive --length short school uniforms"),
            Ok(Command::Essay {
                topic: "school uniforms".into(),
                essay_type: EssayType::Persuasive,
                length: EssayLength::Short,
            })
        );
        assert_eq!(
            parse("/essay climate change"),
            Ok(Command::Essay {
                topic: "climate change".into(),
                essay_type: EssayType::Analytical,
                length: EssayLength::Medium,
            })
        );
        assert!(parse("/essay --type poem x").is_err());
        assert!(parse("/essay --length").is_err());
    }

    #[test]
    fn test_code_with_snippet() {
        assert_eq!(
            parse("/code why does this loop forever? :: while True: pass"),
            Ok(Command::Code {
                question: "why does this loop forever?".into(),
                code: "while True: pass".into(),
            })
        );
    }

    #[test]
    fn test_science_subject_is_optional() {
        assert_eq!(
            parse("/science chemistry what is a covalent bond?"),
            Ok(Command::Science {
                subject: ScienceSubject::Chemistry,
                question: "what is a covalent bond?".into(),
            })
        );
        assert_eq!(
            parse("/science why is the sky blue?"),
            Ok(Command::Science {
                subject: ScienceSubject::Physics,
                question: "why is the sky blue?".into(),
            })
        );
    }

    #[test]
    fn test_unknown_and_incomplete() {
        assert_eq!(parse("/frobnicate"), Err("unknown command /frobnicate".to_string()));
        assert!(parse("/open").is_err());
        assert!(parse("/theme purple").is_err());
    }
}
