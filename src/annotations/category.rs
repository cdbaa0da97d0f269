//! Static error-category and task-type tables
//!
//! Every category has exactly one label and one display color. Task types
//! decide which text field is annotated, which review questions are asked,
//! and which task-specific categories are offered on top of the general set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotationError, FeedbackError};

/// Highlight color used when a label is not in the table
pub const FALLBACK_COLOR: &str = "#ffff99";

/// Error categories a reviewer can attach to a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorCategory {
    #[serde(rename = "Grammar Error")]
    GrammarError,
    #[serde(rename = "Spelling or Typographical Error")]
    SpellingError,
    #[serde(rename = "Incoherent or Illogical")]
    Incoherent,
    #[serde(rename = "Off-topic or Irrelevant")]
    OffTopic,
    #[serde(rename = "Redundancy")]
    Redundancy,
    #[serde(rename = "Ambiguity or Vagueness")]
    Ambiguity,
    #[serde(rename = "Cultural Sensitivity or Offensive Content")]
    CulturalSensitivity,
    #[serde(rename = "Mistranslation")]
    Mistranslation,
    #[serde(rename = "Omission")]
    Omission,
    #[serde(rename = "Misclassification")]
    Misclassification,
    #[serde(rename = "Hallucination")]
    Hallucination,
}

/// Which task types may use a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryScope {
    /// Offered for every task type
    General,
    /// Offered only for the listed task types
    Tasks(&'static [TaskType]),
}

/// Static metadata for one category
#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    pub category: ErrorCategory,
    pub label: &'static str,
    /// CSS background color
    pub color: &'static str,
    pub scope: CategoryScope,
}

const CATEGORY_TABLE: &[CategoryInfo] = &[
    CategoryInfo {
        category: ErrorCategory::GrammarError,
        label: "Grammar Error",
        color: "#ffcccc",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::SpellingError,
        label: "Spelling or Typographical Error",
        color: "#d1e7dd",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::Incoherent,
        label: "Incoherent or Illogical",
        color: "#fff3cd",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::OffTopic,
        label: "Off-topic or Irrelevant",
        color: "#cfe2ff",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::Redundancy,
        label: "Redundancy",
        color: "#e2e3e5",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::Ambiguity,
        label: "Ambiguity or Vagueness",
        color: "#f8d7da",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::CulturalSensitivity,
        label: "Cultural Sensitivity or Offensive Content",
        color: "#f5c2c7",
        scope: CategoryScope::General,
    },
    CategoryInfo {
        category: ErrorCategory::Mistranslation,
        label: "Mistranslation",
        color: "#e0cffc",
        scope: CategoryScope::Tasks(&[TaskType::Translation]),
    },
    CategoryInfo {
        category: ErrorCategory::Omission,
        label: "Omission",
        color: "#ffe5d0",
        scope: CategoryScope::Tasks(&[TaskType::Translation, TaskType::Summarization]),
    },
    CategoryInfo {
        category: ErrorCategory::Misclassification,
        label: "Misclassification",
        color: "#cff4fc",
        scope: CategoryScope::Tasks(&[TaskType::Classification]),
    },
    CategoryInfo {
        category: ErrorCategory::Hallucination,
        label: "Hallucination",
        color: "#f7d6e6",
        scope: CategoryScope::Tasks(&[TaskType::Summarization, TaskType::Generation]),
    },
];

impl ErrorCategory {
    /// Every category, in table order
    pub fn all() -> impl Iterator<Item = ErrorCategory> {
        CATEGORY_TABLE.iter().map(|info| info.category)
    }

    pub fn info(self) -> &'static CategoryInfo {
        // The table lists the variants in declaration order.
        &CATEGORY_TABLE[self as usize]
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn color(self) -> &'static str {
        self.info().color
    }

    /// Lowercase, dash-separated name for CSS classes
    pub fn slug(self) -> String {
        self.label()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(|part| part.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Look up a category by its display label
    pub fn from_label(label: &str) -> Result<Self, AnnotationError> {
        let label = label.trim();
        CATEGORY_TABLE
            .iter()
            .find(|info| info.label.eq_ignore_ascii_case(label))
            .map(|info| info.category)
            .ok_or_else(|| AnnotationError::InvalidCategory(label.to_string()))
    }

    /// Whether reviewers of `task` may use this category
    pub fn applies_to(self, task: TaskType) -> bool {
        match self.info().scope {
            CategoryScope::General => true,
            CategoryScope::Tasks(tasks) => tasks.contains(&task),
        }
    }
}

/// Display color for an arbitrary label, falling back for unknown ones
pub fn color_for_label(label: &str) -> &'static str {
    ErrorCategory::from_label(label)
        .map(ErrorCategory::color)
        .unwrap_or(FALLBACK_COLOR)
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ErrorCategory {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

/// Kinds of model output under review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Translation,
    Classification,
    Summarization,
    Generation,
}

impl TaskType {
    pub const ALL: [TaskType; 4] = [
        TaskType::Translation,
        TaskType::Classification,
        TaskType::Summarization,
        TaskType::Generation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Translation => "translation",
            TaskType::Classification => "classification",
            TaskType::Summarization => "summarization",
            TaskType::Generation => "generation",
        }
    }

    /// Row field holding the model output that gets annotated inline
    pub fn inline_field(self) -> &'static str {
        match self {
            TaskType::Translation => "hyp_text",
            TaskType::Classification => "predicted_category",
            TaskType::Summarization | TaskType::Generation => "output",
        }
    }

    /// Review questions offered alongside the rating
    pub fn questions(self) -> &'static [&'static str] {
        match self {
            TaskType::Translation => &[
                "Are there specific phrases that seem mistranslated?",
                "Does the translation maintain the original tone?",
                "Did the translation omit any important details?",
                "Is the translation culturally appropriate?",
            ],
            TaskType::Classification => &[
                "Does the predicted category match the input?",
                "Are there any misclassifications?",
            ],
            TaskType::Summarization => &[
                "Does the summary capture the main points?",
                "Are any crucial details missing?",
                "Is there redundant information?",
                "Is the summary coherent and well-structured?",
            ],
            TaskType::Generation => &["Is the generated text coherent?", "Is the output relevant?"],
        }
    }

    /// Row fields shown to the reviewer, in display order
    pub fn detail_fields(self) -> &'static [&'static str] {
        match self {
            TaskType::Translation => &[
                "model_name",
                "src_lang",
                "tgt_lang",
                "src_text",
                "ref_text",
                "hyp_text",
                "prompt",
            ],
            TaskType::Classification => &[
                "model_name",
                "test_lang",
                "prompt",
                "predicted_category",
                "correct_category",
            ],
            TaskType::Summarization | TaskType::Generation => {
                &["model_name", "input", "target", "output"]
            }
        }
    }

    /// Categories offered for this task: the general set plus its extensions
    pub fn categories(self) -> Vec<ErrorCategory> {
        ErrorCategory::all().filter(|c| c.applies_to(self)).collect()
    }

    pub fn allows(self, category: ErrorCategory) -> bool {
        category.applies_to(self)
    }

    /// Validate `category` for this task
    pub fn check_category(self, category: ErrorCategory) -> Result<(), AnnotationError> {
        if self.allows(category) {
            Ok(())
        } else {
            Err(AnnotationError::CategoryNotAllowed {
                category: category.label().to_string(),
                task: self.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        TaskType::ALL
            .into_iter()
            .find(|task| task.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| FeedbackError::UnknownTask(key.to_string()))
    }
}
