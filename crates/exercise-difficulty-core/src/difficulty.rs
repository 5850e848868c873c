/// Difficulty labels used across the exercise data.
///
/// `BEGINNER` and `ELITE` are later spellings of `NOVICE` and `EXPERT` and share
/// their rank.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Difficulty {
    Novice,
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Elite,
}

impl Difficulty {
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Novice | Self::Beginner => 1,
            Self::Intermediate => 2,
            Self::Advanced => 3,
            Self::Expert | Self::Elite => 4,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Novice => "NOVICE",
            Self::Beginner => "BEGINNER",
            Self::Intermediate => "INTERMEDIATE",
            Self::Advanced => "ADVANCED",
            Self::Expert => "EXPERT",
            Self::Elite => "ELITE",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NOVICE" => Some(Self::Novice),
            "BEGINNER" => Some(Self::Beginner),
            "INTERMEDIATE" => Some(Self::Intermediate),
            "ADVANCED" => Some(Self::Advanced),
            "EXPERT" => Some(Self::Expert),
            "ELITE" => Some(Self::Elite),
            _ => None,
        }
    }
}

/// Direction of a difficulty change, by rank.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Shift {
    Raised,
    Lowered,
    Unchanged,
    /// One side is missing or not a recognized label.
    Unranked,
}

impl Shift {
    #[must_use]
    pub fn between(from: Option<&str>, to: &str) -> Self {
        let (Some(from), Some(to)) = (from.and_then(Difficulty::parse), Difficulty::parse(to))
        else {
            return Self::Unranked;
        };

        match to.rank().cmp(&from.rank()) {
            std::cmp::Ordering::Greater => Self::Raised,
            std::cmp::Ordering::Less => Self::Lowered,
            std::cmp::Ordering::Equal => Self::Unchanged,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::Lowered => "lowered",
            Self::Unchanged => "unchanged",
            Self::Unranked => "unranked",
        }
    }
}
