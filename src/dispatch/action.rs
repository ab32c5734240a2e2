use bytes::Bytes;

/// Style of essay the backend should write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EssayType {
    #[default]
    Analytical,
    Persuasive,
    Descriptive,
    Narrative,
}

impl EssayType {
    pub const ALL: [EssayType; 4] = [
        EssayType::Analytical,
        EssayType::Persuasive,
        EssayType::Descriptive,
        EssayType::Narrative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EssayType::Analytical => "analytical",
            EssayType::Persuasive => "persuasive",
            EssayType::Descriptive => "descriptive",
            EssayType::Narrative => "narrative",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EssayLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl EssayLength {
    pub const ALL: [EssayLength; 3] = [EssayLength::Short, EssayLength::Medium, EssayLength::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            EssayLength::Short => "short",
            EssayLength::Medium => "medium",
            EssayLength::Long => "long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScienceSubject {
    #[default]
    Physics,
    Chemistry,
    Biology,
}

impl ScienceSubject {
    pub const ALL: [ScienceSubject; 3] = [
        ScienceSubject::Physics,
        ScienceSubject::Chemistry,
        ScienceSubject::Biology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScienceSubject::Physics => "physics",
            ScienceSubject::Chemistry => "chemistry",
            ScienceSubject::Biology => "biology",
        }
    }
}

macro_rules! impl_from_str {
    ($ty:ty, $what:literal) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| format!("unknown {} '{}'", $what, s.trim()))
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_from_str!(EssayType, "essay type");
impl_from_str!(EssayLength, "essay length");
impl_from_str!(ScienceSubject, "science subject");

/// Image bytes plus the name they were selected under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub name: String,
    pub bytes: Bytes,
}

impl ImagePayload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Discriminant of [`ToolAction`], used for logging and apology lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Chat,
    ProblemSolve,
    EssayWrite,
    ImageAnalyze,
    CodeHelp,
    ScienceHelp,
    TextExtract,
}

impl ActionKind {
    /// Assistant turn recorded when the call fails.
    pub fn apology(&self) -> &'static str {
        match self {
            ActionKind::Chat => "Sorry, I encountered an error. Please try again.",
            ActionKind::ProblemSolve => "Sorry, I encountered an error solving the problem.",
            ActionKind::EssayWrite => "Sorry, I encountered an error writing the essay.",
            ActionKind::ImageAnalyze => "Sorry, I encountered an error analyzing the image.",
            ActionKind::CodeHelp => "Error helping with code. Please try again.",
            ActionKind::ScienceHelp => "Error helping with science. Please try again.",
            ActionKind::TextExtract => "Sorry, I couldn't extract text from the image.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Chat => "chat",
            ActionKind::ProblemSolve => "problem_solve",
            ActionKind::EssayWrite => "essay_write",
            ActionKind::ImageAnalyze => "image_analyze",
            ActionKind::CodeHelp => "code_help",
            ActionKind::ScienceHelp => "science_help",
            ActionKind::TextExtract => "text_extract",
        }
    }
}

const DEFAULT_IMAGE_QUESTION: &str = "What's in this image?";

/// One requested operation and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolAction {
    Chat {
        message: String,
    },
    ProblemSolve {
        problem: String,
    },
    EssayWrite {
        topic: String,
        essay_type: EssayType,
        length: EssayLength,
    },
    ImageAnalyze {
        image: ImagePayload,
        question: Option<String>,
    },
    CodeHelp {
        code: String,
        question: String,
    },
    ScienceHelp {
        subject: ScienceSubject,
        question: String,
    },
    TextExtract {
        image: ImagePayload,
    },
}

impl ToolAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ToolAction::Chat { .. } => ActionKind::Chat,
            ToolAction::ProblemSolve { .. } => ActionKind::ProblemSolve,
            ToolAction::EssayWrite { .. } => ActionKind::EssayWrite,
            ToolAction::ImageAnalyze { .. } => ActionKind::ImageAnalyze,
            ToolAction::CodeHelp { .. } => ActionKind::CodeHelp,
            ToolAction::ScienceHelp { .. } => ActionKind::ScienceHelp,
            ToolAction::TextExtract { .. } => ActionKind::TextExtract,
        }
    }

    /// Whether the field this action cannot run without is present.
    ///
    /// Text fields must contain something besides whitespace; image actions
    /// need a non-empty payload.
    pub fn has_required_input(&self) -> bool {
        match self {
            ToolAction::Chat { message } => !message.trim().is_empty(),
            ToolAction::ProblemSolve { problem } => !problem.trim().is_empty(),
            ToolAction::EssayWrite { topic, .. } => !topic.trim().is_empty(),
            ToolAction::CodeHelp { question, .. } => !question.trim().is_empty(),
            ToolAction::ScienceHelp { question, .. } => !question.trim().is_empty(),
            ToolAction::ImageAnalyze { image, .. } | ToolAction::TextExtract { image } => {
                !image.bytes.is_empty()
            }
        }
    }

    /// Text of the user turn recorded for this action.
    pub fn user_turn_text(&self) -> String {
        match self {
            ToolAction::Chat { message } => message.trim().to_string(),
            ToolAction::ProblemSolve { problem } => format!("Problem: {}", problem),
            ToolAction::EssayWrite { topic, .. } => format!("Write essay about: {}", topic),
            ToolAction::ImageAnalyze { question, .. } => {
                let question = question
                    .as_deref()
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_QUESTION);
                format!("[Image Analysis] {}", question)
            }
            ToolAction::CodeHelp { question, .. } => format!("Code help: {}", question),
            ToolAction::ScienceHelp { subject, question } => {
                format!("Science help ({}): {}", subject, question)
            }
            ToolAction::TextExtract { .. } => "[Text Extraction]".to_string(),
        }
    }
}
