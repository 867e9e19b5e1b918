use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use fridgechef_core::image::{HttpImageStatusSource, ImagePollerSet, ImageStatusSource};
use fridgechef_core::{GeneratedRecipe, RecipeFilters};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "fridgechef")]
#[command(about = "FridgeChef CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate recipes from available ingredients and wait for their images
    Suggest {
        /// Server URL (default: http://localhost:8081)
        #[arg(long, default_value = "http://localhost:8081")]
        server: String,
        /// Available ingredients
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Cuisine code (1-4)
        #[arg(long)]
        cuisine: Option<i32>,
        /// Maximum cooking time in minutes
        #[arg(long)]
        max_cooking_time: Option<u32>,
        /// Difficulty code (1-3)
        #[arg(long)]
        difficulty: Option<i32>,
        /// Skip waiting for image generation
        #[arg(long)]
        no_images: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Suggest {
            server,
            ingredients,
            cuisine,
            max_cooking_time,
            difficulty,
            no_images,
        } => {
            let filters = RecipeFilters {
                cuisine,
                max_cooking_time,
                difficulty,
                ..Default::default()
            };
            suggest(&server, ingredients, filters, no_images).await?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct GenerateRequest {
    ingredients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<RecipeFilters>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    recipes: Vec<GeneratedRecipe>,
}

async fn suggest(
    server: &str,
    ingredients: Vec<String>,
    filters: RecipeFilters,
    no_images: bool,
) -> Result<()> {
    let client = reqwest::Client::new();

    let request = GenerateRequest {
        ingredients,
        filters: if filters.is_empty() {
            None
        } else {
            Some(filters)
        },
    };

    let response = client
        .post(format!("{}/api/recipes/generate", server))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        bail!("Generation failed: {}", response.text().await?);
    }

    let GenerateResponse { recipes } = response.json().await?;
    println!("生成了 {} 道菜谱", recipes.len());

    let recipes = Arc::new(Mutex::new(recipes));

    if !no_images {
        // One poller per recipe still waiting for its image.
        let pollers = ImagePollerSet::new();
        let source: Arc<dyn ImageStatusSource> = Arc::new(HttpImageStatusSource::new(server));
        pollers.start_missing(&source, &recipes);

        if pollers.active_count() > 0 {
            println!("等待图片生成...");
            while pollers.active_count() > 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    for recipe in recipes.lock().unwrap().iter() {
        println!();
        println!(
            "{} [{} | {} | {}分钟]",
            recipe.name, recipe.cuisine_name, recipe.difficulty_name, recipe.cooking_time_minutes
        );
        match &recipe.image_url {
            Some(url) => println!("  图片: {}", url),
            None => println!("  图片: 生成中或失败"),
        }
        for (index, step) in recipe.steps.iter().enumerate() {
            println!("  {}. {}", index + 1, step);
        }
    }

    Ok(())
}
