//! Recipe generation prompt.

use crate::labels::{Cuisine, Difficulty, SpiceLevel, TasteBase};
use crate::types::RecipeFilters;

fn code_table<T>(entries: &[T], code: impl Fn(&T) -> i32, label: impl Fn(&T) -> &'static str) -> String {
    entries
        .iter()
        .map(|entry| format!("{}={}", code(entry), label(entry)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the recipe generation prompt for the given ingredients and filters.
///
/// The instruction block pins the JSON array schema the validator expects;
/// filters are rendered human-readably via the canonical label tables.
pub fn render_recipe_prompt(ingredients: &[String], filters: Option<&RecipeFilters>) -> String {
    let cuisine_table = code_table(Cuisine::ALL, Cuisine::code, Cuisine::label);
    let taste_table = code_table(TasteBase::ALL, TasteBase::code, TasteBase::label);
    let spice_table = code_table(SpiceLevel::ALL, SpiceLevel::code, SpiceLevel::label);
    let difficulty_table = code_table(Difficulty::ALL, Difficulty::code, Difficulty::label);

    let ingredient_list = ingredients.join("、");

    let mut prompt = format!(
        r#"你是一位专业的家常菜谱助手。请根据用户现有的食材，推荐若干道可以制作的菜谱。

严格以 JSON 数组格式输出，不要输出任何其他文字。数组中每个元素包含以下字段：
- name: 菜名（非空字符串）
- cuisine: 菜系编码，{cuisine_table}
- tasteBase: 基础味型编码，{taste_table}
- spiceLevel: 辣度等级，{spice_table}
- cookingTimeMinutes: 烹饪时间（分钟，正整数）
- difficulty: 难度编码，{difficulty_table}
- ingredients: {{"available": [...], "needed": [...]}}，available 为现有食材中用到的部分，needed 为还需购买的部分，每项为 {{"name": 食材名, "quantity": 数量, "unit": 单位}}
- steps: 烹饪步骤字符串数组（至少一步）
- nutritionAnalysis: 每份营养估算 {{"calories": 卡路里, "protein": 蛋白质克数, "carbs": 碳水克数, "fat": 脂肪克数}}

现有食材：{ingredient_list}"#
    );

    match filters {
        Some(filters) if !filters.is_empty() => {
            prompt.push_str("\n\n用户偏好：");
            prompt.push_str(&render_filters(filters));
        }
        _ => {}
    }

    prompt
}

fn render_filters(filters: &RecipeFilters) -> String {
    let mut lines = Vec::new();

    if let Some(code) = filters.cuisine {
        lines.push(format!("菜系：{}", crate::labels::cuisine_label(code)));
    }
    if let Some(tastes) = &filters.taste_base {
        if !tastes.is_empty() {
            let names: Vec<&str> = tastes
                .iter()
                .map(|code| crate::labels::taste_base_label(*code))
                .collect();
            lines.push(format!("口味：{}", names.join("、")));
        }
    }
    if let Some(code) = filters.spice_level {
        lines.push(format!("辣度：{}", crate::labels::spice_level_label(code)));
    }
    if let Some(minutes) = filters.max_cooking_time {
        lines.push(format!("烹饪时间不超过{}分钟", minutes));
    }
    if let Some(code) = filters.difficulty {
        lines.push(format!("难度：{}", crate::labels::difficulty_label(code)));
    }

    lines.join("，")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredients() -> Vec<String> {
        vec!["番茄".to_string(), "鸡蛋".to_string()]
    }

    #[test]
    fn test_prompt_embeds_ingredients_and_schema() {
        let prompt = render_recipe_prompt(&ingredients(), None);

        assert!(prompt.contains("番茄、鸡蛋"));
        assert!(prompt.contains("cookingTimeMinutes"));
        assert!(prompt.contains("nutritionAnalysis"));
        assert!(prompt.contains("1=中餐 2=西餐 3=日韩 4=东南亚"));
        assert!(!prompt.contains("用户偏好"));
    }

    #[test]
    fn test_prompt_renders_present_filters() {
        let filters = RecipeFilters {
            cuisine: Some(1),
            taste_base: Some(vec![1, 4]),
            spice_level: Some(1),
            max_cooking_time: Some(30),
            difficulty: Some(1),
        };
        let prompt = render_recipe_prompt(&ingredients(), Some(&filters));

        assert!(prompt.contains("菜系：中餐"));
        assert!(prompt.contains("口味：咸、鲜"));
        assert!(prompt.contains("辣度：微辣"));
        assert!(prompt.contains("烹饪时间不超过30分钟"));
        assert!(prompt.contains("难度：简单"));
    }

    #[test]
    fn test_empty_filters_render_like_absent() {
        let with_empty = render_recipe_prompt(&ingredients(), Some(&RecipeFilters::default()));
        let with_none = render_recipe_prompt(&ingredients(), None);
        assert_eq!(with_empty, with_none);
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            render_recipe_prompt(&ingredients(), None),
            render_recipe_prompt(&ingredients(), None)
        );
    }
}
