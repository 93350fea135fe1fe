use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{SubjectId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name is empty")]
    EmptyName,
}

//
// ─── VARIANTS ─────────────────────────────────────────────────────────────────
//

/// Icon variant selected from a stored string tag.
///
/// Unknown tags resolve to `BookOpen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubjectIcon {
    ChartBar,
    PieChart,
    Building2,
    Briefcase,
    Calculator,
    Languages,
    #[default]
    BookOpen,
}

impl SubjectIcon {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "ChartBar" => Self::ChartBar,
            "PieChart" => Self::PieChart,
            "Building2" => Self::Building2,
            "Briefcase" => Self::Briefcase,
            "Calculator" => Self::Calculator,
            "Languages" => Self::Languages,
            _ => Self::BookOpen,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::ChartBar => "ChartBar",
            Self::PieChart => "PieChart",
            Self::Building2 => "Building2",
            Self::Briefcase => "Briefcase",
            Self::Calculator => "Calculator",
            Self::Languages => "Languages",
            Self::BookOpen => "BookOpen",
        }
    }
}

/// Accent color selected from a stored string tag. Unknown tags resolve to `Gray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SubjectColor {
    Blue,
    Green,
    Purple,
    Orange,
    Red,
    Indigo,
    #[default]
    Gray,
}

impl SubjectColor {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "blue" => Self::Blue,
            "green" => Self::Green,
            "purple" => Self::Purple,
            "orange" => Self::Orange,
            "red" => Self::Red,
            "indigo" => Self::Indigo,
            _ => Self::Gray,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Indigo => "indigo",
            Self::Gray => "gray",
        }
    }
}

//
// ─── SUBJECT ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub description: String,
    pub icon: SubjectIcon,
    pub color: SubjectColor,
    /// `None` for the built-in catalog.
    pub user_id: Option<UserId>,
}

impl Subject {
    /// Create a user-defined subject. Custom subjects always use the fallback
    /// icon and color.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` if the name is blank.
    pub fn custom(
        id: SubjectId,
        name: impl Into<String>,
        description: impl Into<String>,
        user_id: UserId,
    ) -> Result<Self, SubjectError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SubjectError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            icon: SubjectIcon::BookOpen,
            color: SubjectColor::Gray,
            user_id: Some(user_id),
        })
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.user_id.is_none()
    }

    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
    }
}

/// The built-in subject catalog every user sees.
#[must_use]
pub fn default_subjects() -> Vec<Subject> {
    [
        (
            "microeconomics",
            "Microeconomics",
            "Core principles of microeconomics",
            SubjectIcon::ChartBar,
            SubjectColor::Blue,
        ),
        (
            "statistics",
            "Statistics",
            "Statistical methods and data analysis",
            SubjectIcon::PieChart,
            SubjectColor::Green,
        ),
        (
            "national-accounting",
            "National Accounting",
            "Principles of national accounting",
            SubjectIcon::Building2,
            SubjectColor::Purple,
        ),
        (
            "management",
            "Management",
            "Management theory and practice",
            SubjectIcon::Briefcase,
            SubjectColor::Orange,
        ),
        (
            "economic-calculations",
            "Economic Calculations",
            "Methods of economic calculation",
            SubjectIcon::Calculator,
            SubjectColor::Red,
        ),
        (
            "english",
            "English",
            "Business English and communication",
            SubjectIcon::Languages,
            SubjectColor::Indigo,
        ),
    ]
    .into_iter()
    .map(|(id, name, description, icon, color)| Subject {
        id: SubjectId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        icon,
        color,
        user_id: None,
    })
    .collect()
}
