//! Canonical code/label tables for recipe attributes.
//!
//! Every layer that needs to render a coded attribute (prompt building,
//! response shaping, the API) goes through this module so the tables exist
//! exactly once.

/// Fallback label for codes outside the known range.
pub const UNKNOWN_LABEL: &str = "未知";

/// Cuisine codes 1-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cuisine {
    Chinese,
    Western,
    JapaneseKorean,
    SoutheastAsian,
}

impl Cuisine {
    pub const ALL: &'static [Cuisine] = &[
        Cuisine::Chinese,
        Cuisine::Western,
        Cuisine::JapaneseKorean,
        Cuisine::SoutheastAsian,
    ];

    pub fn code(&self) -> i32 {
        match self {
            Cuisine::Chinese => 1,
            Cuisine::Western => 2,
            Cuisine::JapaneseKorean => 3,
            Cuisine::SoutheastAsian => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Cuisine::Chinese),
            2 => Some(Cuisine::Western),
            3 => Some(Cuisine::JapaneseKorean),
            4 => Some(Cuisine::SoutheastAsian),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cuisine::Chinese => "中餐",
            Cuisine::Western => "西餐",
            Cuisine::JapaneseKorean => "日韩",
            Cuisine::SoutheastAsian => "东南亚",
        }
    }
}

/// Taste base codes 1-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TasteBase {
    Salty,
    Sweet,
    Sour,
    Umami,
    Bitter,
    Spicy,
}

impl TasteBase {
    pub const ALL: &'static [TasteBase] = &[
        TasteBase::Salty,
        TasteBase::Sweet,
        TasteBase::Sour,
        TasteBase::Umami,
        TasteBase::Bitter,
        TasteBase::Spicy,
    ];

    pub fn code(&self) -> i32 {
        match self {
            TasteBase::Salty => 1,
            TasteBase::Sweet => 2,
            TasteBase::Sour => 3,
            TasteBase::Umami => 4,
            TasteBase::Bitter => 5,
            TasteBase::Spicy => 6,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(TasteBase::Salty),
            2 => Some(TasteBase::Sweet),
            3 => Some(TasteBase::Sour),
            4 => Some(TasteBase::Umami),
            5 => Some(TasteBase::Bitter),
            6 => Some(TasteBase::Spicy),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TasteBase::Salty => "咸",
            TasteBase::Sweet => "甜",
            TasteBase::Sour => "酸",
            TasteBase::Umami => "鲜",
            TasteBase::Bitter => "苦",
            TasteBase::Spicy => "辣",
        }
    }
}

/// Spice level codes 0-4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiceLevel {
    None,
    Mild,
    Medium,
    Hot,
    ExtraHot,
}

impl SpiceLevel {
    pub const ALL: &'static [SpiceLevel] = &[
        SpiceLevel::None,
        SpiceLevel::Mild,
        SpiceLevel::Medium,
        SpiceLevel::Hot,
        SpiceLevel::ExtraHot,
    ];

    pub fn code(&self) -> i32 {
        match self {
            SpiceLevel::None => 0,
            SpiceLevel::Mild => 1,
            SpiceLevel::Medium => 2,
            SpiceLevel::Hot => 3,
            SpiceLevel::ExtraHot => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SpiceLevel::None),
            1 => Some(SpiceLevel::Mild),
            2 => Some(SpiceLevel::Medium),
            3 => Some(SpiceLevel::Hot),
            4 => Some(SpiceLevel::ExtraHot),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpiceLevel::None => "不辣",
            SpiceLevel::Mild => "微辣",
            SpiceLevel::Medium => "中辣",
            SpiceLevel::Hot => "重辣",
            SpiceLevel::ExtraHot => "特辣",
        }
    }
}

/// Difficulty codes 1-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: &'static [Difficulty] =
        &[Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn code(&self) -> i32 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "简单",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "复杂",
        }
    }
}

/// Display name for a cuisine code, falling back to 未知.
pub fn cuisine_label(code: i32) -> &'static str {
    Cuisine::from_code(code).map_or(UNKNOWN_LABEL, |c| c.label())
}

/// Display name for a taste base code, falling back to 未知.
pub fn taste_base_label(code: i32) -> &'static str {
    TasteBase::from_code(code).map_or(UNKNOWN_LABEL, |t| t.label())
}

/// Display name for a spice level code, falling back to 未知.
pub fn spice_level_label(code: i32) -> &'static str {
    SpiceLevel::from_code(code).map_or(UNKNOWN_LABEL, |s| s.label())
}

/// Display name for a difficulty code, falling back to 未知.
pub fn difficulty_label(code: i32) -> &'static str {
    Difficulty::from_code(code).map_or(UNKNOWN_LABEL, |d| d.label())
}
