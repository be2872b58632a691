// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Learning academy: lesson catalogue, progress and lesson completion.
//!
//! Completed lessons are tracked in the user's achievements as
//! `lesson-<id>`, so completion survives sign-in like the rest of the
//! profile.

use crate::error::AppError;
use crate::services::SessionStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    #[default]
    All,
    Beginner,
    Strategy,
    Analysis,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Lesson {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub duration: &'static str,
    pub category: Category,
    pub xp: i64,
    pub icon: &'static str,
    pub locked: bool,
    /// Lessons every player starts with
    #[serde(skip)]
    pub starter: bool,
}

pub static LESSONS: [Lesson; 6] = [
    Lesson {
        id: 1,
        title: "Stock Market Basics",
        description: "Learn the fundamentals of stock trading",
        duration: "10 min",
        category: Category::Beginner,
        xp: 50,
        icon: "📚",
        locked: false,
        starter: true,
    },
    Lesson {
        id: 2,
        title: "Reading Stock Charts",
        description: "Understand price movements and trends",
        duration: "15 min",
        category: Category::Beginner,
        xp: 75,
        icon: "📊",
        locked: false,
        starter: true,
    },
    Lesson {
        id: 3,
        title: "Risk Management",
        description: "Protect your portfolio and minimize losses",
        duration: "12 min",
        category: Category::Strategy,
        xp: 100,
        icon: "🛡️",
        locked: false,
        starter: false,
    },
    Lesson {
        id: 4,
        title: "Technical Indicators",
        description: "Master RSI, MACD, and moving averages",
        duration: "20 min",
        category: Category::Analysis,
        xp: 150,
        icon: "📈",
        locked: false,
        starter: false,
    },
    Lesson {
        id: 5,
        title: "Portfolio Diversification",
        description: "Build a balanced investment strategy",
        duration: "18 min",
        category: Category::Strategy,
        xp: 125,
        icon: "🎯",
        locked: false,
        starter: false,
    },
    Lesson {
        id: 6,
        title: "Advanced Trading Strategies",
        description: "Learn swing trading and momentum plays",
        duration: "25 min",
        category: Category::Advanced,
        xp: 200,
        icon: "🚀",
        locked: true,
        starter: false,
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonCard {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademyView {
    pub category: Category,
    pub lessons: Vec<LessonCard>,
    pub completed_count: usize,
    pub total_count: usize,
    /// Whole-catalogue completion, 0..=100
    pub progress: u8,
    /// XP still on offer from unfinished lessons
    pub xp_available: i64,
}

fn achievement_key(id: u32) -> String {
    format!("lesson-{}", id)
}

fn is_completed(lesson: &Lesson, achievements: &[String]) -> bool {
    lesson.starter || achievements.contains(&achievement_key(lesson.id))
}

pub fn build(category: Category, achievements: &[String]) -> AcademyView {
    let completed_count = LESSONS.iter().filter(|l| is_completed(l, achievements)).count();
    let xp_available = LESSONS
        .iter()
        .filter(|l| !is_completed(l, achievements))
        .map(|l| l.xp)
        .sum();

    AcademyView {
        category,
        lessons: LESSONS
            .iter()
            .filter(|l| category == Category::All || l.category == category)
            .map(|l| LessonCard {
                lesson: *l,
                completed: is_completed(l, achievements),
            })
            .collect(),
        completed_count,
        total_count: LESSONS.len(),
        progress: (completed_count * 100 / LESSONS.len()) as u8,
        xp_available,
    }
}

/// Finish a lesson and award its XP. Returns the XP awarded (zero when the
/// lesson was already done).
pub fn complete_lesson(session: &SessionStore, id: u32) -> Result<i64, AppError> {
    let lesson = LESSONS
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Lesson {}", id)))?;
    if lesson.locked {
        return Err(AppError::BadRequest(format!("{} is locked", lesson.title)));
    }

    let mut awarded = 0;
    session.update_with(|user| {
        if !is_completed(lesson, &user.profile.achievements) {
            user.profile.xp = user.profile.xp.saturating_add(lesson.xp);
            user.profile.achievements.push(achievement_key(lesson.id));
            awarded = lesson.xp;
        }
    });

    if awarded > 0 {
        tracing::info!(lesson = lesson.id, xp = awarded, "Lesson completed");
    }
    Ok(awarded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_progress() {
        let view = build(Category::All, &[]);
        assert_eq!(view.lessons.len(), 6);
        assert_eq!(view.completed_count, 2);
        assert_eq!(view.progress, 33);
        assert_eq!(view.xp_available, 100 + 150 + 125 + 200);
    }

    #[test]
    fn test_category_filter() {
        let view = build(Category::Strategy, &["lesson-3".to_string()]);
        let ids: Vec<u32> = view.lessons.iter().map(|c| c.lesson.id).collect();
        assert_eq!(ids, vec![3, 5]);
        assert!(view.lessons[0].completed);
        assert_eq!(view.completed_count, 3);
    }
}
